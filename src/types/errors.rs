use thiserror::Error;

// === StorageError ===

/// Errors raised by a key-value [`Storage`](crate::services::storage::Storage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing the value would exceed the backend's quota.
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },
    /// The backend is disabled or cannot be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    /// Database operation failed.
    #[error("Storage database error: {0}")]
    DatabaseError(String),
    /// A stored value could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    SerializationError(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}

// === FetchError ===

/// Errors raised while retrieving the post dataset.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transport failed before a response arrived.
    #[error("Dataset network error: {0}")]
    Network(String),
    /// The server answered with a non-success status code.
    #[error("Dataset request failed with status {0}")]
    Status(u16),
    /// The request did not complete in time.
    #[error("Dataset request timed out")]
    Timeout,
    /// The response body could not be read.
    #[error("Dataset body unreadable: {0}")]
    InvalidBody(String),
}

// === IngestError ===

/// Errors raised while turning a dataset body into posts.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The body is not valid JSON.
    #[error("Dataset is not valid JSON: {0}")]
    InvalidJson(String),
    /// The JSON is neither an array nor a `{"posts": [...]}` envelope.
    #[error("Dataset has unexpected shape: {0}")]
    UnexpectedShape(String),
    /// Every record in a non-empty dataset was rejected.
    #[error("All {0} dataset records were malformed")]
    AllMalformed(usize),
}

// === NormalizeError ===

/// Reasons a single raw record is rejected during normalization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The record is not a JSON object.
    #[error("Record is not an object")]
    NotAnObject,
    /// The record has no usable title.
    #[error("Record has no title")]
    MissingTitle,
    /// The record has neither `publishedAt` nor `date`.
    #[error("Record has no publication date")]
    MissingDate,
    /// The date field could not be parsed.
    #[error("Invalid publication date: {0}")]
    InvalidDate(String),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === AppError ===

/// Errors raised while wiring the application together.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Fetch source setup failed: {0}")]
    FetchSetup(String),
}
