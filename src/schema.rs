use crate::error::Result;
use crate::utils::generate_id;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Quantity already paid in earlier periods, keyed by work-item code.
/// A missing entry means zero.
pub type PreviousQuantityMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct MeasurementRow {
    #[schemars(description = "Unique identifier of the row within its sheet")]
    pub id: String,

    #[schemars(description = "Free text describing the measured part (e.g., 'Footings', 'All rooms')")]
    #[serde(default)]
    pub description: String,

    #[schemars(
        description = "Width of the measured element. Omit when the dimension was never entered. An explicit 0 means the dimension does not apply and is treated as 1."
    )]
    #[serde(default)]
    pub width: Option<f64>,

    #[schemars(
        description = "Length of the measured element. Omit when never entered. An explicit 0 is treated as 1."
    )]
    #[serde(default)]
    pub length: Option<f64>,

    #[schemars(
        description = "Height of the measured element. Omit when never entered. An explicit 0 is treated as 1."
    )]
    #[serde(default)]
    pub height: Option<f64>,

    #[schemars(
        description = "Multiplier for the row. An omitted or zero count makes the row contribute nothing."
    )]
    #[serde(default)]
    pub count: Option<f64>,

    #[schemars(
        description = "Cached quantity of the row. Always recomputed from the dimensions and count; any supplied value is overwritten on load."
    )]
    #[serde(default)]
    pub subtotal: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct WorkSheet {
    #[schemars(description = "Unique identifier of the sheet")]
    pub id: String,

    #[schemars(description = "Heading shown for the sheet (e.g., 'Block A Foundation')")]
    #[serde(default)]
    pub group_name: String,

    #[schemars(
        description = "Price-schedule code of the work item (e.g., '15.120.100'). Sheets sharing a code are merged during reconciliation."
    )]
    pub group_code: String,

    #[schemars(description = "Technical description of the work item (e.g., 'C25/30 ready-mixed concrete')")]
    #[serde(default)]
    pub description: String,

    #[schemars(description = "Unit of measure (e.g., 'm3', 'm2', 'pcs')")]
    #[serde(default)]
    pub unit: String,

    #[schemars(description = "Contract unit price for the work item")]
    pub unit_price: f64,

    #[schemars(description = "Measurement rows in insertion order")]
    #[serde(default)]
    pub rows: Vec<MeasurementRow>,

    #[schemars(description = "Cached sum of row quantities. Recomputed on load and on every edit.")]
    #[serde(default)]
    pub total_quantity: f64,

    #[schemars(description = "Cached total_quantity × unit_price. Recomputed on load and on every edit.")]
    #[serde(default)]
    pub total_cost: f64,
}

/// A manually entered monetary line, split across the previous and current
/// periods by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct LedgerLine {
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[schemars(description = "Amount recognised in earlier progress payments")]
    #[serde(default)]
    pub previous_amount: f64,

    #[schemars(description = "Amount recognised in this progress payment")]
    #[serde(default)]
    pub current_amount: f64,
}

impl LedgerLine {
    pub fn new(description: impl Into<String>, previous_amount: f64, current_amount: f64) -> Self {
        Self {
            id: generate_id(),
            description: description.into(),
            previous_amount,
            current_amount,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    #[schemars(description = "An additional payment added to the taxable base")]
    ExtraPayment,

    #[schemars(description = "A contractual deduction subtracted after tax")]
    Deduction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FinancialConfig {
    #[schemars(description = "Tax rate in percent (e.g., 20 for 20%). Zero is valid.")]
    #[serde(default)]
    pub tax_rate: f64,

    #[schemars(description = "Extra payments added to the work amount before tax")]
    #[serde(default)]
    pub extra_payments: Vec<LedgerLine>,

    #[schemars(description = "Deductions subtracted from the invoice amount")]
    #[serde(default)]
    pub deductions: Vec<LedgerLine>,
}

impl FinancialConfig {
    pub fn lines(&self, kind: LedgerKind) -> &[LedgerLine] {
        match kind {
            LedgerKind::ExtraPayment => &self.extra_payments,
            LedgerKind::Deduction => &self.deductions,
        }
    }

    pub fn lines_mut(&mut self, kind: LedgerKind) -> &mut Vec<LedgerLine> {
        match kind {
            LedgerKind::ExtraPayment => &mut self.extra_payments,
            LedgerKind::Deduction => &mut self.deductions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Signatory {
    #[schemars(description = "Role printed above the signature line (e.g., 'CONTRACTOR')")]
    pub title: String,

    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ProjectInfo {
    pub project_name: String,
    pub contractor: String,
    pub employer: String,

    #[schemars(description = "Label of the payment period (e.g., 'Progress Payment No. 1')")]
    pub period: String,

    #[schemars(description = "Date of the progress payment in YYYY-MM-DD format")]
    pub date: NaiveDate,

    #[serde(default)]
    pub signatories: Vec<Signatory>,
}

impl ProjectInfo {
    pub fn default_signatories() -> Vec<Signatory> {
        ["CONTRACTOR", "CONTROL ENGINEER", "APPROVER"]
            .into_iter()
            .map(|title| Signatory {
                title: title.to_string(),
                name: String::new(),
            })
            .collect()
    }
}

/// Everything needed to produce one progress payment statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PaymentBook {
    pub project: ProjectInfo,

    #[schemars(description = "All measurement sheets recorded to date")]
    #[serde(default)]
    pub sheets: Vec<WorkSheet>,

    #[schemars(
        description = "Quantity already paid in previous periods, keyed by work-item code. Missing codes count as zero."
    )]
    #[serde(default)]
    pub previous_quantities: PreviousQuantityMap,

    #[serde(default)]
    pub financial: FinancialConfig,
}

impl PaymentBook {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PaymentBook)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    /// Parses a book and resynchronises every cached subtotal and sheet total.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut book: PaymentBook = serde_json::from_str(json)?;
        book.recalculate();
        Ok(book)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
