//! Configuration-time validation of conditions.
//!
//! The evaluator assumes every condition passed through here. Malformed
//! operand combinations are rejected when configuration is accepted, never at
//! evaluation time.

use crate::error::ValidationError;

use super::operand::{Condition, Operand, SignalOperand, SignalSelector};

fn validate_signal_name(operand: &SignalOperand) -> Result<(), ValidationError> {
    if let SignalSelector::Signal(id) = &operand.selector {
        if id.name.trim().is_empty() {
            return Err(ValidationError::EmptySignalName);
        }
    }
    Ok(())
}

impl Condition {
    /// Validates this condition at position `index` of its list.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        validate_signal_name(&self.left)?;

        if let Operand::Signal(right) = &self.right {
            validate_signal_name(right)?;
            match &right.selector {
                SignalSelector::Signal(_) => {}
                SignalSelector::Each => {
                    if !self.left.selector.is_each() {
                        return Err(ValidationError::EachWithoutEach { index });
                    }
                }
                other @ (SignalSelector::Anything | SignalSelector::Everything) => {
                    return Err(ValidationError::QuantifierOnRight {
                        index,
                        selector: other.to_string(),
                    });
                }
            }
        }

        if index > 0 && self.combine.is_none() {
            return Err(ValidationError::MissingCombineOp { index });
        }
        Ok(())
    }
}

/// Validates an ordered condition list.
pub fn validate_conditions(conditions: &[Condition]) -> Result<(), ValidationError> {
    conditions
        .iter()
        .enumerate()
        .try_for_each(|(index, c)| c.validate(index))
}
