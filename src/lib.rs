//! # Progress Payment Engine
//!
//! A library for turning construction take-off measurements into periodic
//! progress payment (hakediş) statements.
//!
//! ## Core Concepts
//!
//! - **Measurement Row**: one geometric take-off line (width × length × height × count)
//! - **Work Sheet**: rows recorded against one priced work item, identified by its code
//! - **Reconciliation**: sheets grouped by code, with the cumulative quantity split into
//!   what was paid previously and what is payable now
//! - **Rollup**: work amounts plus extra payments, tax and deductions down to net payable,
//!   for the previous, current and general (cumulative) columns
//!
//! Every pass recomputes from the rows. Cached subtotals are never trusted, and
//! the general column is always previous + current.
//!
//! ## Example
//!
//! ```rust,ignore
//! use progress_payment_engine::*;
//!
//! let mut sheet = WorkSheet::new("Block A Foundation", "X", "Concrete", "m3", 100.0);
//! sheet.push_row(
//!     MeasurementRow::new("Footings")
//!         .with_dimensions(Some(10.0), Some(5.0), Some(1.0))
//!         .with_count(Some(1.0)),
//! );
//!
//! let mut previous = PreviousQuantityMap::new();
//! previous.insert("X".to_string(), 20.0);
//!
//! let items = reconcile(&[sheet], &previous);
//! let config = FinancialConfig { tax_rate: 20.0, ..Default::default() };
//! let result = rollup(&items, &config);
//!
//! assert_eq!(result.invoice_amount.current(), 3600.0);
//! ```

pub mod column;
pub mod edits;
pub mod error;
pub mod ingestion;
pub mod measurement;
pub mod reconciler;
pub mod rollup;
pub mod schema;
pub mod statement;
pub mod utils;
pub mod verification;

pub use column::{Period, PeriodColumnValue};
pub use edits::{apply_single_edit, BookEdit, BookEdits};
pub use error::{ProgressPaymentError, Result};
pub use ingestion::{convert_takeoff_to_sheets, TakeoffRecord};
pub use measurement::{row_quantity, sheet_totals, RowField, SheetTotals};
pub use reconciler::{
    reconcile, reconcile_with_warnings, GroupedItem, PeriodReconciler, Reconciliation,
    ReconciliationWarning,
};
pub use rollup::{ledger_total, rollup, RollupColumn, RollupResult};
pub use schema::*;
pub use statement::PaymentStatement;
pub use utils::*;
pub use verification::{require_non_negative_net_payable, verify_statement, StatementVerifier};

use log::{debug, info};

pub struct ProgressPaymentProcessor;

impl ProgressPaymentProcessor {
    pub fn process(book: &PaymentBook) -> Result<PaymentStatement> {
        validate_financial_config(&book.financial)?;

        info!(
            "Processing {} for project: {}",
            book.project.period, book.project.project_name
        );
        debug!(
            "Book contains {} sheets, {} previous quantities, {} extra payments and {} deductions",
            book.sheets.len(),
            book.previous_quantities.len(),
            book.financial.extra_payments.len(),
            book.financial.deductions.len()
        );

        let statement =
            PaymentStatement::compute(&book.sheets, &book.previous_quantities, &book.financial)
                .with_project(book.project.clone());

        debug!(
            "Reconciled {} work items with {} warnings; current net payable {}",
            statement.items.len(),
            statement.warnings.len(),
            statement.rollup.net_payable.current()
        );

        Ok(statement)
    }

    pub fn process_with_verification(
        book: &PaymentBook,
        tolerance: f64,
    ) -> Result<PaymentStatement> {
        let statement = Self::process(book)?;

        verify_statement(&statement, tolerance)?;

        Ok(statement)
    }
}

pub fn process_progress_payment(book: &PaymentBook) -> Result<PaymentStatement> {
    ProgressPaymentProcessor::process(book)
}

pub fn process_with_verification(
    book: &PaymentBook,
    tolerance: f64,
) -> Result<PaymentStatement> {
    ProgressPaymentProcessor::process_with_verification(book, tolerance)
}

// Signed values are always accepted; only values the surrounding form should
// never hand over are rejected.
fn validate_financial_config(config: &FinancialConfig) -> Result<()> {
    if !config.tax_rate.is_finite() {
        return Err(ProgressPaymentError::InvalidTaxRate(config.tax_rate));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn book() -> PaymentBook {
        let mut concrete = WorkSheet::new(
            "Block A Foundation",
            "15.120.100",
            "C25/30 ready-mixed concrete",
            "m3",
            2450.0,
        );
        concrete.push_row(
            MeasurementRow::new("Footings")
                .with_dimensions(Some(12.0), Some(10.0), Some(1.0))
                .with_count(Some(1.0)),
        );

        let mut walls = WorkSheet::new("Ground Floor Walls", "Y.26.005/012", "13.5 brick wall", "m2", 450.0);
        walls.push_row(
            MeasurementRow::new("All rooms")
                .with_dimensions(Some(0.0), Some(0.0), Some(0.0))
                .with_count(Some(500.0)),
        );

        PaymentBook {
            project: ProjectInfo {
                project_name: "Sample Housing Project".to_string(),
                contractor: "Demir Construction Ltd.".to_string(),
                employer: "Metropolitan Municipality".to_string(),
                period: "Progress Payment No. 1".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
                signatories: ProjectInfo::default_signatories(),
            },
            sheets: vec![concrete, walls],
            previous_quantities: PreviousQuantityMap::new(),
            financial: FinancialConfig {
                tax_rate: 20.0,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_end_to_end_processing() {
        let statement = process_with_verification(&book(), 1e-9).unwrap();

        assert_eq!(statement.items.len(), 2);
        assert_eq!(statement.items[0].total_amount, 294_000.0);
        assert_eq!(statement.items[1].total_amount, 225_000.0);
        assert_eq!(statement.rollup.work_amount.general(), 519_000.0);
        assert_eq!(statement.rollup.tax_amount.current(), 103_800.0);
        assert_eq!(statement.rollup.net_payable.current(), 622_800.0);
        assert_eq!(
            statement.project.as_ref().map(|p| p.signatories.len()),
            Some(3)
        );
    }

    #[test]
    fn test_non_finite_tax_rate_rejected() {
        let mut book = book();
        book.financial.tax_rate = f64::INFINITY;
        assert!(matches!(
            process_progress_payment(&book),
            Err(ProgressPaymentError::InvalidTaxRate(_))
        ));
    }

    #[test]
    fn test_negative_tax_rate_is_not_rejected() {
        let mut book = book();
        book.financial.tax_rate = -5.0;
        let statement = process_progress_payment(&book).unwrap();
        assert!(statement.rollup.tax_amount.current() < 0.0);
    }
}
