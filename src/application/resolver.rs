use crate::domain::fee::FeeBasis;
use crate::domain::formula::FeeFormula;
use crate::domain::ports::{FeeFormulaRepository, FormulaRepoRef};
use crate::domain::{ServiceUnit, Shift};
use crate::error::Result;

/// Finds the single applicable formula for a (unit, shift, basis) tuple and
/// an observed quantity.
pub struct FormulaResolver {
    formulas: FormulaRepoRef,
}

impl FormulaResolver {
    pub fn new(formulas: FormulaRepoRef) -> Self {
        Self { formulas }
    }

    /// `None` means no fee is owed: quantity below every threshold, or no
    /// active formula for the tuple. That is a normal outcome, not an
    /// error.
    pub async fn resolve(
        &self,
        unit: ServiceUnit,
        shift: Shift,
        basis: FeeBasis,
        quantity: u32,
    ) -> Result<Option<FeeFormula>> {
        let candidates = self.formulas.active_for(unit, shift, basis).await?;
        Ok(pick(candidates, quantity))
    }
}

/// Highest qualifying threshold wins. Ties go to the most recently created
/// formula, then the highest id, so resolution is fully deterministic.
pub fn pick(candidates: Vec<FeeFormula>, quantity: u32) -> Option<FeeFormula> {
    candidates
        .into_iter()
        .filter(|f| f.qualifies(quantity))
        .max_by(|a, b| {
            a.threshold
                .cmp(&b.threshold)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        })
}
