use crate::error::{ProgressPaymentError, Result};
use crate::measurement::RowField;
use crate::schema::{LedgerKind, LedgerLine, MeasurementRow, PaymentBook, Signatory, WorkSheet};
use crate::utils::parse_date;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An ordered batch of user actions against a book.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct BookEdits {
    #[serde(default)]
    pub edits: Vec<BookEdit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BookEdit {
    /// Create an empty measurement sheet.
    AddSheet {
        #[schemars(description = "Id for the new sheet. Generated when omitted.")]
        #[serde(default)]
        sheet_id: Option<String>,
        group_name: String,
        group_code: String,
        #[serde(default)]
        description: String,
        unit: String,
        unit_price: f64,
    },

    RemoveSheet { sheet_id: String },

    SetUnitPrice { sheet_id: String, unit_price: f64 },

    /// Append an undimensioned row with a count of one.
    AddRow {
        sheet_id: String,
        #[schemars(description = "Id for the new row. Generated when omitted.")]
        #[serde(default)]
        row_id: Option<String>,
        #[serde(default)]
        description: String,
    },

    UpdateRow {
        sheet_id: String,
        row_id: String,
        change: RowField,
    },

    RemoveRow { sheet_id: String, row_id: String },

    /// Record the quantity already paid for a work-item code.
    SetPreviousQuantity { code: String, quantity: f64 },

    ClearPreviousQuantity { code: String },

    SetTaxRate { rate: f64 },

    AddLedgerLine {
        kind: LedgerKind,
        #[serde(default)]
        line_id: Option<String>,
        #[serde(default)]
        description: String,
        #[serde(default)]
        previous_amount: f64,
        #[serde(default)]
        current_amount: f64,
    },

    /// Overwrite only the fields that are present.
    UpdateLedgerLine {
        kind: LedgerKind,
        line_id: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        previous_amount: Option<f64>,
        #[serde(default)]
        current_amount: Option<f64>,
    },

    RemoveLedgerLine { kind: LedgerKind, line_id: String },

    /// Overwrite only the project fields that are present.
    UpdateProject {
        #[serde(default)]
        project_name: Option<String>,
        #[serde(default)]
        contractor: Option<String>,
        #[serde(default)]
        employer: Option<String>,
        #[serde(default)]
        period: Option<String>,
        #[schemars(description = "YYYY-MM-DD")]
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        signatories: Option<Vec<Signatory>>,
    },
}

impl BookEdits {
    pub fn new(edits: Vec<BookEdit>) -> Self {
        Self { edits }
    }

    /// Applies the edits in order to a copy of `base`. The base book is left
    /// untouched, and every cached total in the result is in sync.
    pub fn apply(&self, base: &PaymentBook) -> Result<PaymentBook> {
        let mut book = base.clone();
        for edit in &self.edits {
            apply_single_edit(&mut book, edit)?;
        }
        book.recalculate();
        Ok(book)
    }
}

pub fn apply_single_edit(book: &mut PaymentBook, edit: &BookEdit) -> Result<()> {
    debug!("Applying edit: {:?}", edit);

    match edit {
        BookEdit::AddSheet {
            sheet_id,
            group_name,
            group_code,
            description,
            unit,
            unit_price,
        } => {
            let mut sheet = WorkSheet::new(
                group_name.as_str(),
                group_code.as_str(),
                description.as_str(),
                unit.as_str(),
                *unit_price,
            );
            if let Some(id) = sheet_id {
                sheet.id = id.clone();
            }
            book.sheets.push(sheet);
        }

        BookEdit::RemoveSheet { sheet_id } => {
            let before = book.sheets.len();
            book.sheets.retain(|s| &s.id != sheet_id);
            if book.sheets.len() == before {
                return Err(ProgressPaymentError::SheetNotFound(sheet_id.clone()));
            }
        }

        BookEdit::SetUnitPrice {
            sheet_id,
            unit_price,
        } => {
            find_sheet_mut(book, sheet_id)?.set_unit_price(*unit_price);
        }

        BookEdit::AddRow {
            sheet_id,
            row_id,
            description,
        } => {
            let mut row = MeasurementRow::new(description.as_str());
            if let Some(id) = row_id {
                row.id = id.clone();
            }
            find_sheet_mut(book, sheet_id)?.push_row(row);
        }

        BookEdit::UpdateRow {
            sheet_id,
            row_id,
            change,
        } => {
            find_sheet_mut(book, sheet_id)?.update_row(row_id, change.clone())?;
        }

        BookEdit::RemoveRow { sheet_id, row_id } => {
            find_sheet_mut(book, sheet_id)?.remove_row(row_id)?;
        }

        BookEdit::SetPreviousQuantity { code, quantity } => {
            book.previous_quantities.insert(code.clone(), *quantity);
        }

        BookEdit::ClearPreviousQuantity { code } => {
            book.previous_quantities.remove(code);
        }

        BookEdit::SetTaxRate { rate } => {
            if !rate.is_finite() {
                return Err(ProgressPaymentError::InvalidTaxRate(*rate));
            }
            book.financial.tax_rate = *rate;
        }

        BookEdit::AddLedgerLine {
            kind,
            line_id,
            description,
            previous_amount,
            current_amount,
        } => {
            let mut line = LedgerLine::new(description.as_str(), *previous_amount, *current_amount);
            if let Some(id) = line_id {
                line.id = id.clone();
            }
            book.financial.lines_mut(*kind).push(line);
        }

        BookEdit::UpdateLedgerLine {
            kind,
            line_id,
            description,
            previous_amount,
            current_amount,
        } => {
            let line = book
                .financial
                .lines_mut(*kind)
                .iter_mut()
                .find(|l| &l.id == line_id)
                .ok_or_else(|| ProgressPaymentError::LedgerLineNotFound(line_id.clone()))?;
            if let Some(text) = description {
                line.description = text.clone();
            }
            if let Some(amount) = previous_amount {
                line.previous_amount = *amount;
            }
            if let Some(amount) = current_amount {
                line.current_amount = *amount;
            }
        }

        BookEdit::RemoveLedgerLine { kind, line_id } => {
            let lines = book.financial.lines_mut(*kind);
            let before = lines.len();
            lines.retain(|l| &l.id != line_id);
            if lines.len() == before {
                return Err(ProgressPaymentError::LedgerLineNotFound(line_id.clone()));
            }
        }

        BookEdit::UpdateProject {
            project_name,
            contractor,
            employer,
            period,
            date,
            signatories,
        } => {
            let project = &mut book.project;
            if let Some(date) = date {
                project.date = parse_date(date)?;
            }
            if let Some(v) = project_name {
                project.project_name = v.clone();
            }
            if let Some(v) = contractor {
                project.contractor = v.clone();
            }
            if let Some(v) = employer {
                project.employer = v.clone();
            }
            if let Some(v) = period {
                project.period = v.clone();
            }
            if let Some(v) = signatories {
                project.signatories = v.clone();
            }
        }
    }

    Ok(())
}

fn find_sheet_mut<'a>(book: &'a mut PaymentBook, sheet_id: &str) -> Result<&'a mut WorkSheet> {
    book.sheets
        .iter_mut()
        .find(|s| s.id == sheet_id)
        .ok_or_else(|| ProgressPaymentError::SheetNotFound(sheet_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FinancialConfig, PreviousQuantityMap, ProjectInfo};
    use chrono::NaiveDate;

    fn empty_book() -> PaymentBook {
        PaymentBook {
            project: ProjectInfo {
                project_name: "Test".to_string(),
                contractor: "Contractor".to_string(),
                employer: "Employer".to_string(),
                period: "No. 2".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
                signatories: vec![],
            },
            sheets: vec![],
            previous_quantities: PreviousQuantityMap::new(),
            financial: FinancialConfig::default(),
        }
    }

    #[test]
    fn test_build_sheet_through_edits() {
        let edits = BookEdits::new(vec![
            BookEdit::AddSheet {
                sheet_id: Some("s1".to_string()),
                group_name: "Block A Foundation".to_string(),
                group_code: "X".to_string(),
                description: "Concrete".to_string(),
                unit: "m3".to_string(),
                unit_price: 100.0,
            },
            BookEdit::AddRow {
                sheet_id: "s1".to_string(),
                row_id: Some("r1".to_string()),
                description: "Footings".to_string(),
            },
            BookEdit::UpdateRow {
                sheet_id: "s1".to_string(),
                row_id: "r1".to_string(),
                change: RowField::Width(Some(10.0)),
            },
            BookEdit::UpdateRow {
                sheet_id: "s1".to_string(),
                row_id: "r1".to_string(),
                change: RowField::Length(Some(5.0)),
            },
            BookEdit::SetPreviousQuantity {
                code: "X".to_string(),
                quantity: 20.0,
            },
            BookEdit::SetTaxRate { rate: 20.0 },
        ]);

        let base = empty_book();
        let book = edits.apply(&base).unwrap();

        assert!(base.sheets.is_empty());
        let sheet = &book.sheets[0];
        assert_eq!(sheet.rows[0].subtotal, 50.0);
        assert_eq!(sheet.total_quantity, 50.0);
        assert_eq!(sheet.total_cost, 5000.0);
        assert_eq!(book.previous_quantities.get("X"), Some(&20.0));
        assert_eq!(book.financial.tax_rate, 20.0);
    }

    #[test]
    fn test_ledger_line_lifecycle() {
        let book = BookEdits::new(vec![
            BookEdit::AddLedgerLine {
                kind: LedgerKind::Deduction,
                line_id: Some("d1".to_string()),
                description: "Stamp duty".to_string(),
                previous_amount: 0.0,
                current_amount: 100.0,
            },
            BookEdit::UpdateLedgerLine {
                kind: LedgerKind::Deduction,
                line_id: "d1".to_string(),
                description: None,
                previous_amount: None,
                current_amount: Some(500.0),
            },
        ])
        .apply(&empty_book())
        .unwrap();

        assert_eq!(book.financial.deductions[0].current_amount, 500.0);
        assert_eq!(book.financial.deductions[0].description, "Stamp duty");
        assert!(book.financial.extra_payments.is_empty());

        let removed = BookEdits::new(vec![BookEdit::RemoveLedgerLine {
            kind: LedgerKind::Deduction,
            line_id: "d1".to_string(),
        }])
        .apply(&book)
        .unwrap();
        assert!(removed.financial.deductions.is_empty());
    }

    #[test]
    fn test_unknown_targets_fail() {
        let book = empty_book();

        let err = BookEdits::new(vec![BookEdit::RemoveSheet {
            sheet_id: "nope".to_string(),
        }])
        .apply(&book)
        .unwrap_err();
        assert!(matches!(err, ProgressPaymentError::SheetNotFound(_)));

        let err = BookEdits::new(vec![BookEdit::RemoveLedgerLine {
            kind: LedgerKind::ExtraPayment,
            line_id: "nope".to_string(),
        }])
        .apply(&book)
        .unwrap_err();
        assert!(matches!(err, ProgressPaymentError::LedgerLineNotFound(_)));
    }

    #[test]
    fn test_update_project() {
        let json = r#"{"edits": [{"action": "update_project", "period": "No. 3", "date": "2024-07-31"}]}"#;
        let edits: BookEdits = serde_json::from_str(json).unwrap();
        let book = edits.apply(&empty_book()).unwrap();
        assert_eq!(book.project.period, "No. 3");
        assert_eq!(book.project.date, NaiveDate::from_ymd_opt(2024, 7, 31).unwrap());
        assert_eq!(book.project.contractor, "Contractor");

        let err = BookEdits::new(vec![BookEdit::UpdateProject {
            project_name: None,
            contractor: None,
            employer: None,
            period: None,
            date: Some("31.07.2024".to_string()),
            signatories: None,
        }])
        .apply(&empty_book())
        .unwrap_err();
        assert!(matches!(err, ProgressPaymentError::DateError(_)));
    }

    #[test]
    fn test_non_finite_tax_rate_is_rejected() {
        let err = BookEdits::new(vec![BookEdit::SetTaxRate { rate: f64::NAN }])
            .apply(&empty_book())
            .unwrap_err();
        assert!(matches!(err, ProgressPaymentError::InvalidTaxRate(_)));
    }

    #[test]
    fn test_edits_round_trip_as_json() {
        let json = r#"{
            "edits": [
                {"action": "add_sheet", "sheet_id": "s1", "group_name": "Walls",
                 "group_code": "Y.26.005", "unit": "m2", "unit_price": 450.0},
                {"action": "add_row", "sheet_id": "s1", "row_id": "r1"},
                {"action": "update_row", "sheet_id": "s1", "row_id": "r1",
                 "change": {"field": "count", "value": 500}},
                {"action": "update_row", "sheet_id": "s1", "row_id": "r1",
                 "change": {"field": "width", "value": 0}},
                {"action": "clear_previous_quantity", "code": "Y.26.005"}
            ]
        }"#;
        let edits: BookEdits = serde_json::from_str(json).unwrap();
        let book = edits.apply(&empty_book()).unwrap();
        assert_eq!(book.sheets[0].total_cost, 225_000.0);
    }
}
