use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    DuplicateKey { kind: &'static str, id: String },
    Validation(String),
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Other(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateKey { kind, id } => write!(f, "Duplicate key in {}: {}", kind, id),
            StoreError::Validation(e) => write!(f, "Validation error: {}", e),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::Serialization(e) => write!(f, "Serialization error: {}", e),
            StoreError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}
