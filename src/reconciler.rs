use crate::column::PeriodColumnValue;
use crate::measurement::sheet_totals;
use crate::schema::{PreviousQuantityMap, WorkSheet};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One line of the reconciliation table: every sheet sharing a work-item code,
/// split into previously paid and current-period quantities and amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedItem {
    pub code: String,
    pub description: String,
    pub unit: String,
    pub unit_price: f64,
    /// Executed to date across all member sheets
    pub cumulative_quantity: f64,
    pub previous_quantity: f64,
    /// `cumulative_quantity - previous_quantity`, never clamped
    pub current_quantity: f64,
    pub previous_amount: f64,
    pub current_amount: f64,
    /// Always `previous_amount + current_amount`
    pub total_amount: f64,
    pub sheet_count: usize,
}

impl GroupedItem {
    pub fn quantities(&self) -> PeriodColumnValue {
        PeriodColumnValue::new(self.previous_quantity, self.current_quantity)
    }

    pub fn amounts(&self) -> PeriodColumnValue {
        PeriodColumnValue::new(self.previous_amount, self.current_amount)
    }
}

/// Data-quality findings from grouping. None of them stop the reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconciliationWarning {
    DivergentUnitPrice {
        code: String,
        sheet_id: String,
        used: f64,
        ignored: f64,
    },
    DivergentDescription {
        code: String,
        sheet_id: String,
        used: String,
        ignored: String,
    },
    DivergentUnit {
        code: String,
        sheet_id: String,
        used: String,
        ignored: String,
    },
    /// A previous quantity was entered for a code that no sheet carries.
    OrphanPreviousQuantity { code: String, quantity: f64 },
}

impl fmt::Display for ReconciliationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivergentUnitPrice {
                code,
                sheet_id,
                used,
                ignored,
            } => write!(
                f,
                "Code {}: sheet {} has unit price {} but {} from the first sheet is used",
                code, sheet_id, ignored, used
            ),
            Self::DivergentDescription {
                code,
                sheet_id,
                used,
                ignored,
            } => write!(
                f,
                "Code {}: sheet {} is described as '{}' but '{}' is used",
                code, sheet_id, ignored, used
            ),
            Self::DivergentUnit {
                code,
                sheet_id,
                used,
                ignored,
            } => write!(
                f,
                "Code {}: sheet {} uses unit '{}' but '{}' is used",
                code, sheet_id, ignored, used
            ),
            Self::OrphanPreviousQuantity { code, quantity } => write!(
                f,
                "Previous quantity {} entered for code {} which has no measurement sheet",
                quantity, code
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub items: Vec<GroupedItem>,
    pub warnings: Vec<ReconciliationWarning>,
}

impl Reconciliation {
    /// Footer totals of the amount columns.
    pub fn amount_totals(&self) -> PeriodColumnValue {
        self.items.iter().map(GroupedItem::amounts).sum()
    }
}

// Accumulator for one code while walking the sheet list
struct GroupSlot {
    code: String,
    description: String,
    unit: String,
    unit_price: f64,
    cumulative_quantity: f64,
    sheet_count: usize,
}

pub struct PeriodReconciler<'a> {
    previous_quantities: &'a PreviousQuantityMap,
}

impl<'a> PeriodReconciler<'a> {
    pub fn new(previous_quantities: &'a PreviousQuantityMap) -> Self {
        Self {
            previous_quantities,
        }
    }

    pub fn reconcile(&self, sheets: &[WorkSheet]) -> Reconciliation {
        let mut warnings = Vec::new();
        let slots = self.group_sheets(sheets, &mut warnings);

        let items: Vec<GroupedItem> = slots.into_iter().map(|slot| self.split(slot)).collect();

        for (code, &quantity) in self.previous_quantities {
            if !items.iter().any(|item| &item.code == code) {
                warnings.push(ReconciliationWarning::OrphanPreviousQuantity {
                    code: code.clone(),
                    quantity,
                });
            }
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        Reconciliation { items, warnings }
    }

    fn group_sheets(
        &self,
        sheets: &[WorkSheet],
        warnings: &mut Vec<ReconciliationWarning>,
    ) -> Vec<GroupSlot> {
        let mut slots: Vec<GroupSlot> = Vec::new();
        let mut index_by_code: HashMap<&str, usize> = HashMap::new();

        for sheet in sheets {
            let quantity = sheet_totals(sheet).total_quantity;
            let label = sheet_label(sheet);

            match index_by_code.get(sheet.group_code.as_str()) {
                Some(&idx) => {
                    let slot = &mut slots[idx];
                    check_divergence(slot, sheet, label, warnings);
                    slot.cumulative_quantity += quantity;
                    slot.sheet_count += 1;
                }
                None => {
                    index_by_code.insert(sheet.group_code.as_str(), slots.len());
                    slots.push(GroupSlot {
                        code: sheet.group_code.clone(),
                        description: label.to_string(),
                        unit: sheet.unit.clone(),
                        unit_price: sheet.unit_price,
                        cumulative_quantity: quantity,
                        sheet_count: 1,
                    });
                }
            }
        }

        slots
    }

    fn split(&self, slot: GroupSlot) -> GroupedItem {
        let previous_quantity = self
            .previous_quantities
            .get(&slot.code)
            .copied()
            .unwrap_or(0.0);
        let current_quantity = slot.cumulative_quantity - previous_quantity;

        let previous_amount = previous_quantity * slot.unit_price;
        let current_amount = current_quantity * slot.unit_price;

        GroupedItem {
            code: slot.code,
            description: slot.description,
            unit: slot.unit,
            unit_price: slot.unit_price,
            cumulative_quantity: slot.cumulative_quantity,
            previous_quantity,
            current_quantity,
            previous_amount,
            current_amount,
            total_amount: previous_amount + current_amount,
            sheet_count: slot.sheet_count,
        }
    }
}

fn sheet_label(sheet: &WorkSheet) -> &str {
    if sheet.description.is_empty() {
        &sheet.group_name
    } else {
        &sheet.description
    }
}

fn check_divergence(
    slot: &GroupSlot,
    sheet: &WorkSheet,
    label: &str,
    warnings: &mut Vec<ReconciliationWarning>,
) {
    if sheet.unit_price != slot.unit_price {
        warnings.push(ReconciliationWarning::DivergentUnitPrice {
            code: slot.code.clone(),
            sheet_id: sheet.id.clone(),
            used: slot.unit_price,
            ignored: sheet.unit_price,
        });
    }
    if label != slot.description {
        warnings.push(ReconciliationWarning::DivergentDescription {
            code: slot.code.clone(),
            sheet_id: sheet.id.clone(),
            used: slot.description.clone(),
            ignored: label.to_string(),
        });
    }
    if sheet.unit != slot.unit {
        warnings.push(ReconciliationWarning::DivergentUnit {
            code: slot.code.clone(),
            sheet_id: sheet.id.clone(),
            used: slot.unit.clone(),
            ignored: sheet.unit.clone(),
        });
    }
}

/// Grouped reconciliation table in first-seen order of work-item code.
pub fn reconcile(sheets: &[WorkSheet], previous_quantities: &PreviousQuantityMap) -> Vec<GroupedItem> {
    PeriodReconciler::new(previous_quantities).reconcile(sheets).items
}

pub fn reconcile_with_warnings(
    sheets: &[WorkSheet],
    previous_quantities: &PreviousQuantityMap,
) -> Reconciliation {
    PeriodReconciler::new(previous_quantities).reconcile(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MeasurementRow;

    fn sheet(id: &str, code: &str, unit_price: f64, quantities: &[f64]) -> WorkSheet {
        WorkSheet {
            id: id.to_string(),
            group_name: format!("Group {}", id),
            group_code: code.to_string(),
            description: format!("Item {}", code),
            unit: "m3".to_string(),
            unit_price,
            rows: quantities
                .iter()
                .enumerate()
                .map(|(i, q)| MeasurementRow {
                    id: format!("{}-{}", id, i),
                    description: String::new(),
                    width: Some(*q),
                    length: None,
                    height: None,
                    count: Some(1.0),
                    subtotal: 0.0,
                })
                .collect(),
            total_quantity: 0.0,
            total_cost: 0.0,
        }
    }

    #[test]
    fn test_single_code_without_previous() {
        let items = reconcile(&[sheet("s1", "X", 100.0, &[50.0])], &PreviousQuantityMap::new());
        assert_eq!(items.len(), 1);

        let item = &items[0];
        assert_eq!(item.cumulative_quantity, 50.0);
        assert_eq!(item.previous_quantity, 0.0);
        assert_eq!(item.current_quantity, 50.0);
        assert_eq!(item.total_amount, 5000.0);
        assert_eq!(item.description, "Item X");
    }

    #[test]
    fn test_previous_quantity_split() {
        let mut previous = PreviousQuantityMap::new();
        previous.insert("X".to_string(), 20.0);

        let items = reconcile(&[sheet("s1", "X", 100.0, &[50.0])], &previous);
        let item = &items[0];
        assert_eq!(item.current_quantity, 30.0);
        assert_eq!(item.previous_amount, 2000.0);
        assert_eq!(item.current_amount, 3000.0);
        assert_eq!(item.total_amount, 5000.0);
    }

    #[test]
    fn test_over_recorded_previous_goes_negative() {
        let mut previous = PreviousQuantityMap::new();
        previous.insert("X".to_string(), 50.0);

        let items = reconcile(&[sheet("s1", "X", 100.0, &[30.0])], &previous);
        assert_eq!(items[0].current_quantity, -20.0);
        assert_eq!(items[0].current_amount, -2000.0);
        assert_eq!(items[0].total_amount, 3000.0);
    }

    #[test]
    fn test_shared_codes_merge_in_first_seen_order() {
        let sheets = vec![
            sheet("s1", "B", 10.0, &[1.0, 2.0]),
            sheet("s2", "A", 5.0, &[4.0]),
            sheet("s3", "B", 10.0, &[7.0]),
        ];
        let items = reconcile(&sheets, &PreviousQuantityMap::new());

        let codes: Vec<&str> = items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "A"]);
        assert_eq!(items[0].cumulative_quantity, 10.0);
        assert_eq!(items[0].sheet_count, 2);
        assert_eq!(items[1].cumulative_quantity, 4.0);
    }

    #[test]
    fn test_total_amount_is_sum_of_split_amounts() {
        let mut previous = PreviousQuantityMap::new();
        previous.insert("X".to_string(), 0.1);

        let items = reconcile(&[sheet("s1", "X", 0.7, &[0.3])], &previous);
        let item = &items[0];
        assert_eq!(item.total_amount, item.previous_amount + item.current_amount);
        assert_eq!(item.amounts().general(), item.total_amount);
    }

    #[test]
    fn test_empty_sheet_list() {
        let reconciliation = reconcile_with_warnings(&[], &PreviousQuantityMap::new());
        assert!(reconciliation.items.is_empty());
        assert_eq!(reconciliation.amount_totals(), PeriodColumnValue::zero());
    }

    // Divergent prices under one code are unresolved upstream: the first
    // sheet's price wins and the divergence is reported as a warning.
    #[test]
    fn test_divergent_price_takes_first_and_warns() {
        let mut second = sheet("s2", "X", 120.0, &[10.0]);
        second.unit = "m2".to_string();
        second.description = "Other wording".to_string();
        let sheets = vec![sheet("s1", "X", 100.0, &[10.0]), second];

        let reconciliation = reconcile_with_warnings(&sheets, &PreviousQuantityMap::new());
        let item = &reconciliation.items[0];
        assert_eq!(item.unit_price, 100.0);
        assert_eq!(item.total_amount, 2000.0);
        assert_eq!(item.unit, "m3");
        assert_eq!(item.description, "Item X");

        assert_eq!(reconciliation.warnings.len(), 3);
        assert!(matches!(
            &reconciliation.warnings[0],
            ReconciliationWarning::DivergentUnitPrice { sheet_id, ignored, .. }
                if sheet_id == "s2" && *ignored == 120.0
        ));
        assert!(reconciliation.warnings[0].to_string().contains("120"));
    }

    #[test]
    fn test_orphan_previous_quantity_is_reported_but_ignored() {
        let mut previous = PreviousQuantityMap::new();
        previous.insert("GONE".to_string(), 12.0);

        let reconciliation =
            reconcile_with_warnings(&[sheet("s1", "X", 100.0, &[5.0])], &previous);
        assert_eq!(reconciliation.amount_totals().general(), 500.0);
        assert_eq!(
            reconciliation.warnings,
            vec![ReconciliationWarning::OrphanPreviousQuantity {
                code: "GONE".to_string(),
                quantity: 12.0
            }]
        );
    }

    #[test]
    fn test_label_falls_back_to_group_name() {
        let mut s = sheet("s1", "X", 1.0, &[1.0]);
        s.description.clear();
        let items = reconcile(&[s], &PreviousQuantityMap::new());
        assert_eq!(items[0].description, "Group s1");
    }

    #[test]
    fn test_cached_totals_are_not_trusted() {
        let mut s = sheet("s1", "X", 10.0, &[3.0]);
        s.total_quantity = 1000.0;
        let items = reconcile(&[s], &PreviousQuantityMap::new());
        assert_eq!(items[0].cumulative_quantity, 3.0);
    }
}
