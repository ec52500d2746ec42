use crate::column::{Period, PeriodColumnValue};
use crate::error::{ProgressPaymentError, Result};
use crate::rollup::RollupResult;
use crate::statement::PaymentStatement;
use crate::utils::within_tolerance;

pub struct StatementVerifier<'a> {
    statement: &'a PaymentStatement,
}

impl<'a> StatementVerifier<'a> {
    pub fn new(statement: &'a PaymentStatement) -> Self {
        Self { statement }
    }

    /// Checks the column invariants of a statement: every item's total amount
    /// is its previous plus current amount, every rollup field's general
    /// column is previous plus current, and the rollup work amount matches
    /// the reconciled item totals.
    pub fn verify(&self, tolerance: f64) -> Result<()> {
        for item in &self.statement.items {
            check_column(
                &format!("item {} amount", item.code),
                item.previous_amount,
                item.current_amount,
                item.total_amount,
                tolerance,
            )?;
        }

        for (name, value) in self.statement.rollup.fields() {
            check_column(
                name,
                value.previous(),
                value.current(),
                value.general(),
                tolerance,
            )?;
        }

        let reconciled: PeriodColumnValue = self.statement.items.iter().map(|i| i.amounts()).sum();
        for period in Period::ALL {
            let rollup = self.statement.rollup.work_amount.get(period);
            let expected = reconciled.get(period);
            if !within_tolerance(rollup, expected, tolerance) {
                return Err(ProgressPaymentError::WorkAmountMismatch {
                    column: period.to_string(),
                    rollup,
                    reconciled: expected,
                });
            }
        }

        Ok(())
    }
}

fn check_column(field: &str, previous: f64, current: f64, general: f64, tolerance: f64) -> Result<()> {
    let difference = (previous + current - general).abs();
    if difference > tolerance {
        return Err(ProgressPaymentError::ColumnMismatch {
            field: field.to_string(),
            previous,
            current,
            general,
            difference,
        });
    }
    Ok(())
}

pub fn verify_statement(statement: &PaymentStatement, tolerance: f64) -> Result<()> {
    StatementVerifier::new(statement).verify(tolerance)
}

/// Opt-in policy check for callers that must not issue a negative payment.
/// The rollup itself never clamps.
pub fn require_non_negative_net_payable(rollup: &RollupResult) -> Result<()> {
    for period in Period::ALL {
        let amount = rollup.net_payable.get(period);
        if amount < 0.0 {
            return Err(ProgressPaymentError::NegativeNetPayable {
                column: period.to_string(),
                amount,
            });
        }
    }
    Ok(())
}
