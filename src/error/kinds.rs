use std::{fmt, io};

/// Crate-wide `Result` type using [`CssenseError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, CssenseError>;

/// Top-level error type for cssense operations.
///
/// Malformed CSS is never an error: the resolver answers `None` and the
/// dispatcher answers an empty candidate list. This type covers contract
/// violations and collaborator failures only.
#[derive(Debug)]
pub enum CssenseError {
    /// Configuration errors.
    Config(ConfigError),

    /// Selector query collaborator errors.
    Query(QueryError),

    /// Invalid API usage.
    InvalidArgument(String),

    /// I/O errors.
    Io(io::Error),

    /// JSON (de)serialization errors.
    Json(serde_json::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Free-form configuration problem.
    Generic(String),
}

/// Errors reported by a [`SelectorQuery`](crate::completion::SelectorQuery).
#[derive(Debug)]
pub enum QueryError {
    /// The collaborator could not answer the query.
    Failed(String),

    /// No document is attached to answer selector queries.
    Unavailable,

    /// The request was dropped before a response arrived.
    Cancelled,
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for CssenseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssenseError::Config(e) => write!(f, "Configuration error: {e}"),
            CssenseError::Query(e) => write!(f, "Selector query error: {e}"),
            CssenseError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            CssenseError::Io(e) => write!(f, "I/O error: {e}"),
            CssenseError::Json(e) => write!(f, "JSON error: {e}"),
            CssenseError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Failed(msg) => write!(f, "Query failed: {msg}"),
            QueryError::Unavailable => write!(f, "No document available for selector queries"),
            QueryError::Cancelled => write!(f, "Query cancelled"),
        }
    }
}

impl std::error::Error for CssenseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CssenseError::Io(e) => Some(e),
            CssenseError::Json(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for ConfigError {}
impl std::error::Error for QueryError {}

/* ========================= Conversions to CssenseError ========================= */

impl From<io::Error> for CssenseError {
    fn from(err: io::Error) -> Self {
        CssenseError::Io(err)
    }
}

impl From<serde_json::Error> for CssenseError {
    fn from(err: serde_json::Error) -> Self {
        CssenseError::Json(err)
    }
}

impl From<toml::de::Error> for CssenseError {
    fn from(err: toml::de::Error) -> Self {
        CssenseError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for CssenseError {
    fn from(err: toml::ser::Error) -> Self {
        CssenseError::Config(ConfigError::Generic(format!(
            "Failed to serialize config: {err}"
        )))
    }
}

impl From<ConfigError> for CssenseError {
    fn from(err: ConfigError) -> Self {
        CssenseError::Config(err)
    }
}

impl From<QueryError> for CssenseError {
    fn from(err: QueryError) -> Self {
        CssenseError::Query(err)
    }
}

impl From<String> for CssenseError {
    fn from(msg: String) -> Self {
        CssenseError::Generic(msg)
    }
}

impl From<&str> for CssenseError {
    fn from(msg: &str) -> Self {
        CssenseError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CssenseError::from(ConfigError::InvalidValue {
            field: "completion.max_entries".to_string(),
            value: "0".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid value '0' for field 'completion.max_entries'"
        );

        let err = CssenseError::from(QueryError::Failed("walker gone".to_string()));
        assert_eq!(err.to_string(), "Selector query error: Query failed: walker gone");
    }

    #[test]
    fn test_toml_error_maps_to_invalid_format() {
        let err: CssenseError = toml::from_str::<toml::Table>("= broken")
            .unwrap_err()
            .into();
        assert!(matches!(
            err,
            CssenseError::Config(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_io_error_has_source() {
        let err = CssenseError::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
