//! Financial rollup from reconciled work amounts to net payable.
//!
//! Every figure is a [`PeriodColumnValue`], so the previous and current
//! columns are computed and the general column is derived from them. The
//! chain is never clamped: a negative net payable is a legitimate result,
//! for example when correcting an overpayment.

use crate::column::{Period, PeriodColumnValue};
use crate::reconciler::GroupedItem;
use crate::schema::{FinancialConfig, LedgerLine};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RollupResult {
    pub work_amount: PeriodColumnValue,
    pub extra_payments_total: PeriodColumnValue,
    /// Work amount plus extra payments
    pub taxable_base: PeriodColumnValue,
    pub tax_amount: PeriodColumnValue,
    pub invoice_amount: PeriodColumnValue,
    pub deductions_total: PeriodColumnValue,
    pub net_payable: PeriodColumnValue,
}

/// One column of a [`RollupResult`], flattened for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollupColumn {
    pub period: Period,
    pub work_amount: f64,
    pub extra_payments_total: f64,
    pub taxable_base: f64,
    pub tax_amount: f64,
    pub invoice_amount: f64,
    pub deductions_total: f64,
    pub net_payable: f64,
}

impl RollupResult {
    pub fn column(&self, period: Period) -> RollupColumn {
        RollupColumn {
            period,
            work_amount: self.work_amount.get(period),
            extra_payments_total: self.extra_payments_total.get(period),
            taxable_base: self.taxable_base.get(period),
            tax_amount: self.tax_amount.get(period),
            invoice_amount: self.invoice_amount.get(period),
            deductions_total: self.deductions_total.get(period),
            net_payable: self.net_payable.get(period),
        }
    }

    /// Named fields in cover-page order.
    pub fn fields(&self) -> [(&'static str, PeriodColumnValue); 7] {
        [
            ("work_amount", self.work_amount),
            ("extra_payments_total", self.extra_payments_total),
            ("taxable_base", self.taxable_base),
            ("tax_amount", self.tax_amount),
            ("invoice_amount", self.invoice_amount),
            ("deductions_total", self.deductions_total),
            ("net_payable", self.net_payable),
        ]
    }
}

pub fn ledger_total(lines: &[LedgerLine]) -> PeriodColumnValue {
    lines
        .iter()
        .map(|line| PeriodColumnValue::new(line.previous_amount, line.current_amount))
        .sum()
}

pub fn rollup(items: &[GroupedItem], config: &FinancialConfig) -> RollupResult {
    let work_amount: PeriodColumnValue = items.iter().map(GroupedItem::amounts).sum();
    let extra_payments_total = ledger_total(&config.extra_payments);
    let taxable_base = work_amount + extra_payments_total;
    let tax_amount = taxable_base.map(|base| base * config.tax_rate / 100.0);
    let invoice_amount = taxable_base + tax_amount;
    let deductions_total = ledger_total(&config.deductions);
    let net_payable = invoice_amount - deductions_total;

    RollupResult {
        work_amount,
        extra_payments_total,
        taxable_base,
        tax_amount,
        invoice_amount,
        deductions_total,
        net_payable,
    }
}
