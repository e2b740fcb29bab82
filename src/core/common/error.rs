use std::fmt;

#[derive(Debug)]
pub enum AssetMapError {
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidBoundary(String),
    InvalidArgument(String),
    OutsideBoundary { asset_id: String },
    DocumentNotFound(String),
    RevisionConflict { key: String, message: String },
    Timeout(String),
    CorruptDocument(String),
    Storage(String),
    Configuration(String),
    Internal(String),
}

impl fmt::Display for AssetMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO Error: {}", e),
            Self::Json(e) => write!(f, "JSON Serialization/Deserialization Error: {}", e),
            Self::InvalidBoundary(s) => write!(f, "Invalid boundary: {}", s),
            Self::InvalidArgument(s) => write!(f, "Invalid argument: {}", s),
            Self::OutsideBoundary { asset_id } => {
                write!(f, "Asset '{}' is outside of map boundary", asset_id)
            }
            Self::DocumentNotFound(key) => write!(f, "Document not found: {}", key),
            Self::RevisionConflict { key, message } => {
                write!(f, "Revision conflict on '{}': {}", key, message)
            }
            Self::Timeout(s) => write!(f, "Timeout: {}", s),
            Self::CorruptDocument(s) => write!(f, "Corrupt map document: {}", s),
            Self::Storage(s) => write!(f, "Storage Error: {}", s),
            Self::Configuration(s) => write!(f, "Configuration error: {}", s),
            Self::Internal(s) => write!(f, "Internal Error: {}", s),
        }
    }
}

impl std::error::Error for AssetMapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AssetMapError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for AssetMapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<tokio::time::error::Elapsed> for AssetMapError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::Timeout(err.to_string())
    }
}

impl AssetMapError {
    /// True for failures of the persistence round-trip (store, conflict, timeout, IO).
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::DocumentNotFound(_)
                | Self::RevisionConflict { .. }
                | Self::Timeout(_)
                | Self::Storage(_)
                | Self::CorruptDocument(_)
        )
    }

    /// True for malformed requests: bad boxes and unsupported arguments.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidBoundary(_) | Self::InvalidArgument(_))
    }
}
