use thiserror::Error;

/// Unified error type for the entire trading-journal-core library.
/// Every public function returns `Result<T, JournalError>`.
#[derive(Debug, Error)]
pub enum JournalError {
    // ── Validation ──────────────────────────────────────────────────
    #[error("Entry validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    // ── Backing store ───────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Unsupported journal version: {0}")]
    UnsupportedVersion(u32),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── View / submit flow ──────────────────────────────────────────
    #[error("Image encoding failed: {0}")]
    ImageEncoding(String),

    #[error("A submission is already in progress")]
    SubmitInFlight,

    #[error("No delete is awaiting confirmation")]
    NoPendingDelete,

    #[error("Export failed: {0}")]
    Export(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name, e.g. `"amount"`.
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl JournalError {
    /// Field-level errors when this is a validation failure, empty otherwise.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            JournalError::Validation(errors) => errors,
            _ => &[],
        }
    }

    /// Whether the caller can carry on with the in-memory state intact.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, JournalError::Config(_))
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for JournalError {
    fn from(e: std::io::Error) -> Self {
        JournalError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(e: serde_json::Error) -> Self {
        JournalError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for JournalError {
    fn from(e: csv::Error) -> Self {
        JournalError::Export(e.to_string())
    }
}

impl From<toml::de::Error> for JournalError {
    fn from(e: toml::de::Error) -> Self {
        JournalError::Config(e.to_string())
    }
}
