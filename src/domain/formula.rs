use crate::domain::fee::FeeBasis;
use crate::domain::money::Money;
use crate::domain::{RecordId, ServiceUnit, Shift};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a qualifying formula turns an observed quantity into an amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ComputationMode {
    /// Base amount regardless of quantity.
    Fixed,
    /// Quantity times the base amount.
    PerUnit,
    /// Base amount plus a per-unit bonus for quantity above the threshold.
    /// A zero multiplier degenerates to fixed-at-threshold.
    Progressive { multiplier: Money },
}

/// A configured fee rule, keyed by (service unit, shift, basis).
///
/// Read-only from the fee pipeline's perspective; mutated only through
/// administrative configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeFormula {
    pub id: RecordId,
    pub unit: ServiceUnit,
    pub shift: Shift,
    pub basis: FeeBasis,
    pub active: bool,
    /// Minimum qualifying quantity.
    pub threshold: u32,
    pub mode: ComputationMode,
    pub base_amount: Money,
    pub created_at: DateTime<Utc>,
}

impl FeeFormula {
    pub fn qualifies(&self, quantity: u32) -> bool {
        self.active && self.threshold <= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formula(active: bool, threshold: u32) -> FeeFormula {
        FeeFormula {
            id: 1,
            unit: ServiceUnit::General,
            shift: Shift::Morning,
            basis: FeeBasis::PatientCount,
            active,
            threshold,
            mode: ComputationMode::Fixed,
            base_amount: Money::new(50_000),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_qualification() {
        assert!(formula(true, 10).qualifies(10));
        assert!(formula(true, 10).qualifies(15));
        assert!(!formula(true, 10).qualifies(9));
        assert!(!formula(false, 0).qualifies(100));
    }
}
