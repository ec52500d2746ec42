use crate::schema::{MeasurementRow, WorkSheet};
use crate::utils::generate_id;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One flat take-off line as exported from a spreadsheet: sheet header fields
/// repeated on every measurement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeoffRecord {
    pub group_name: String,
    pub group_code: String,
    #[serde(default)]
    pub description: String,
    pub unit: String,
    pub unit_price: f64,
    #[serde(default)]
    pub row_description: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub count: Option<f64>,
}

/// Builds one sheet per (group name, code) pair in first-seen order. The
/// sheet header comes from the first record of each pair.
pub fn convert_takeoff_to_sheets(records: &[TakeoffRecord]) -> Vec<WorkSheet> {
    let mut sheets: Vec<WorkSheet> = Vec::new();
    let mut index_by_key: HashMap<(&str, &str), usize> = HashMap::new();

    for record in records {
        let key = (record.group_name.as_str(), record.group_code.as_str());
        let idx = *index_by_key.entry(key).or_insert_with(|| {
            sheets.push(WorkSheet::new(
                record.group_name.as_str(),
                record.group_code.as_str(),
                record.description.as_str(),
                record.unit.as_str(),
                record.unit_price,
            ));
            sheets.len() - 1
        });

        sheets[idx].rows.push(MeasurementRow {
            id: generate_id(),
            description: record.row_description.clone(),
            width: record.width,
            length: record.length,
            height: record.height,
            count: record.count,
            subtotal: 0.0,
        });
    }

    for sheet in &mut sheets {
        sheet.recalculate();
    }

    debug!(
        "Converted {} take-off records into {} sheets",
        records.len(),
        sheets.len()
    );

    sheets
}
