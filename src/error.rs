use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressPaymentError {
    #[error("Invalid tax rate {0}: must be a finite percentage")]
    InvalidTaxRate(f64),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Measurement row {row_id} not found on sheet {sheet_id}")]
    RowNotFound { sheet_id: String, row_id: String },

    #[error("Ledger line not found: {0}")]
    LedgerLineNotFound(String),

    #[error("Column mismatch in {field}: previous ({previous}) + current ({current}) != general ({general})")]
    ColumnMismatch {
        field: String,
        previous: f64,
        current: f64,
        general: f64,
        difference: f64,
    },

    #[error("Work amount ({rollup}) does not match reconciled item total ({reconciled}) in {column} column")]
    WorkAmountMismatch {
        column: String,
        rollup: f64,
        reconciled: f64,
    },

    #[error("Net payable is negative in {column} column: {amount}")]
    NegativeNetPayable { column: String, amount: f64 },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProgressPaymentError>;
