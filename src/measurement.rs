//! Row Calculator and Sheet Aggregator.
//!
//! Cached fields (`subtotal`, `total_quantity`, `total_cost`) are only ever
//! written by the recalculation routines in this module, which derive them
//! from the dimensions, counts and unit price every time.

use crate::error::{ProgressPaymentError, Result};
use crate::schema::{MeasurementRow, PaymentBook, WorkSheet};
use crate::utils::generate_id;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetTotals {
    pub total_quantity: f64,
    pub total_cost: f64,
}

/// Quantity contributed by a single measurement row.
///
/// - A row with no width, length or height at all contributes nothing,
///   whatever its count. It is a placeholder that has not been dimensioned.
/// - A missing dimension, or one entered as `0`, is the multiplicative
///   identity: zero on a dimension means "not applicable", not "no volume".
/// - A missing count counts as `0`, so does an explicit `0`.
///
/// No rounding happens here.
pub fn row_quantity(row: &MeasurementRow) -> f64 {
    if row.width.is_none() && row.length.is_none() && row.height.is_none() {
        return 0.0;
    }

    dimension_factor(row.width)
        * dimension_factor(row.length)
        * dimension_factor(row.height)
        * count_factor(row.count)
}

fn dimension_factor(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => v,
        _ => 1.0,
    }
}

fn count_factor(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}

/// Totals for a sheet, computed from its rows rather than the cached subtotals.
pub fn sheet_totals(sheet: &WorkSheet) -> SheetTotals {
    let total_quantity = sheet
        .rows
        .iter()
        .fold(0.0, |acc, row| acc + row_quantity(row));

    SheetTotals {
        total_quantity,
        total_cost: total_quantity * sheet.unit_price,
    }
}

/// A single editable field of a measurement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum RowField {
    Description(String),
    Width(Option<f64>),
    Length(Option<f64>),
    Height(Option<f64>),
    Count(Option<f64>),
}

impl MeasurementRow {
    /// A fresh, undimensioned row with a count of one.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            description: description.into(),
            width: None,
            length: None,
            height: None,
            count: Some(1.0),
            subtotal: 0.0,
        }
    }

    pub fn with_dimensions(
        mut self,
        width: Option<f64>,
        length: Option<f64>,
        height: Option<f64>,
    ) -> Self {
        self.width = width;
        self.length = length;
        self.height = height;
        self.recalculate();
        self
    }

    pub fn with_count(mut self, count: Option<f64>) -> Self {
        self.count = count;
        self.recalculate();
        self
    }

    pub fn recalculate(&mut self) {
        self.subtotal = row_quantity(self);
    }

    pub fn apply_field(&mut self, field: RowField) {
        match field {
            RowField::Description(text) => self.description = text,
            RowField::Width(v) => self.width = v,
            RowField::Length(v) => self.length = v,
            RowField::Height(v) => self.height = v,
            RowField::Count(v) => self.count = v,
        }
        self.recalculate();
    }
}

impl WorkSheet {
    pub fn new(
        group_name: impl Into<String>,
        group_code: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        unit_price: f64,
    ) -> Self {
        Self {
            id: generate_id(),
            group_name: group_name.into(),
            group_code: group_code.into(),
            description: description.into(),
            unit: unit.into(),
            unit_price,
            rows: Vec::new(),
            total_quantity: 0.0,
            total_cost: 0.0,
        }
    }

    pub fn totals(&self) -> SheetTotals {
        sheet_totals(self)
    }

    /// Rewrites every cached row subtotal and the sheet totals from source.
    pub fn recalculate(&mut self) {
        for row in &mut self.rows {
            row.recalculate();
        }
        let totals = sheet_totals(self);
        self.total_quantity = totals.total_quantity;
        self.total_cost = totals.total_cost;
    }

    /// Appends a row and returns its id.
    pub fn push_row(&mut self, row: MeasurementRow) -> String {
        let id = row.id.clone();
        self.rows.push(row);
        self.recalculate();
        id
    }

    pub fn update_row(&mut self, row_id: &str, field: RowField) -> Result<()> {
        let sheet_id = self.id.clone();
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == row_id)
            .ok_or_else(|| ProgressPaymentError::RowNotFound {
                sheet_id,
                row_id: row_id.to_string(),
            })?;
        row.apply_field(field);
        self.recalculate();
        Ok(())
    }

    pub fn remove_row(&mut self, row_id: &str) -> Result<MeasurementRow> {
        let index = self
            .rows
            .iter()
            .position(|r| r.id == row_id)
            .ok_or_else(|| ProgressPaymentError::RowNotFound {
                sheet_id: self.id.clone(),
                row_id: row_id.to_string(),
            })?;
        let removed = self.rows.remove(index);
        self.recalculate();
        Ok(removed)
    }

    pub fn set_unit_price(&mut self, unit_price: f64) {
        self.unit_price = unit_price;
        self.recalculate();
    }
}

impl PaymentBook {
    pub fn recalculate(&mut self) {
        for sheet in &mut self.sheets {
            sheet.recalculate();
        }
    }
}
