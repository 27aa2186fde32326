use crate::domain::formula::{ComputationMode, FeeFormula};
use crate::domain::money::Money;
use crate::error::Result;

/// Computes the fee amount for a formula that already qualified for the
/// observed quantity.
///
/// All arithmetic is checked integer math on the smallest currency unit.
pub fn compute(formula: &FeeFormula, quantity: u32) -> Result<Money> {
    match formula.mode {
        ComputationMode::Fixed => Ok(formula.base_amount),
        ComputationMode::PerUnit => formula.base_amount.checked_mul(quantity),
        ComputationMode::Progressive { multiplier } => {
            let excess = quantity.saturating_sub(formula.threshold);
            formula.base_amount.checked_add(multiplier.checked_mul(excess)?)
        }
    }
}
