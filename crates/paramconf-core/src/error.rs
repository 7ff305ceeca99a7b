//! Error types for paramconf
//!
//! Errors are structured: a kind, the document path the failure happened at,
//! the underlying cause and an actionable help message.

use std::fmt;

use crate::placeholder::SourceType;

/// Result type alias for paramconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for paramconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Path in the document where the error occurred (e.g., "database.password")
    pub path: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document source does not exist
    SourceNotFound { source: String },
    /// The document source exists but holds no document
    SourceEmpty { source: String },
    /// Error parsing YAML/JSON
    Parse,
    /// I/O error other than "not found" while reading a source
    Io,
    /// A configured root path does not start with `/`
    InvalidRootPath { root_path: String },
    /// A relative parameter key was used with no root paths configured
    KeyNotQualified { key: String },
    /// No value, no inline default and no global default
    MissingValue {
        key: String,
        source: SourceType,
        /// Fully-qualified names tried against the parameter store
        tried: Vec<String>,
    },
    /// Error reported by the parameter store
    Backend(BackendErrorKind),
    /// Substitution on a single scalar did not settle
    SubstitutionLimit { limit: usize },
}

/// Specific parameter store error categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Missing credentials, connectivity or authorization failure.
    /// Never replaced by a default.
    Unavailable { key: String },
    /// Any other failure reported by the store
    Other { key: String },
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source_location: None,
            help: None,
            cause: None,
        }
    }

    /// Create a source not found error
    pub fn source_not_found(source: impl Into<String>) -> Self {
        let src = source.into();
        Self {
            help: Some(format!("Check that '{}' exists and is readable", src)),
            ..Self::new(ErrorKind::SourceNotFound { source: src })
        }
    }

    /// Create a source empty error
    pub fn source_empty(source: impl Into<String>) -> Self {
        let src = source.into();
        Self {
            help: Some(format!("Add at least one key to '{}'", src)),
            ..Self::new(ErrorKind::SourceEmpty { source: src })
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Parse)
        }
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Io)
        }
    }

    /// Create an invalid root path error
    pub fn invalid_root_path(root_path: impl Into<String>) -> Self {
        let root = root_path.into();
        Self {
            help: Some(format!("Root paths must be absolute, e.g. '/{}'", root)),
            ..Self::new(ErrorKind::InvalidRootPath { root_path: root })
        }
    }

    /// Create a key not qualified error
    pub fn key_not_qualified(key: impl Into<String>) -> Self {
        let k = key.into();
        let help = if k.is_empty() {
            "Configure at least one root path (SSM_ROOT_PATH) or pass an absolute path".to_string()
        } else {
            format!(
                "Configure at least one root path (SSM_ROOT_PATH) or use an absolute key: /{}",
                k
            )
        };
        Self {
            help: Some(help),
            ..Self::new(ErrorKind::KeyNotQualified { key: k })
        }
    }

    /// Create a missing value error for an environment variable
    pub fn missing_env(var_name: impl Into<String>) -> Self {
        let var = var_name.into();
        Self {
            help: Some(format!(
                "Set the {} environment variable or provide a default: {{!ENV: {} !DEFAULT: value}}",
                var, var
            )),
            ..Self::new(ErrorKind::MissingValue {
                key: var,
                source: SourceType::Environment,
                tried: Vec::new(),
            })
        }
    }

    /// Create a missing value error for a parameter store key
    pub fn missing_parameter(key: impl Into<String>, tried: Vec<String>) -> Self {
        let k = key.into();
        Self {
            help: Some(format!(
                "Create the parameter or provide a default: {{!SSM: {} !DEFAULT: value}}",
                k
            )),
            ..Self::new(ErrorKind::MissingValue {
                key: k,
                source: SourceType::ParameterStore,
                tried,
            })
        }
    }

    /// Create a parameter store unavailable error
    pub fn backend_unavailable(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            help: Some(
                "Make sure AWS credentials are available and the parameter store is reachable"
                    .into(),
            ),
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Backend(BackendErrorKind::Unavailable {
                key: key.into(),
            }))
        }
    }

    /// Create a generic parameter store error
    pub fn backend_other(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Backend(BackendErrorKind::Other { key: key.into() }))
        }
    }

    /// Create a substitution limit error
    pub fn substitution_limit(limit: usize, value: impl Into<String>) -> Self {
        Self {
            help: Some(
                "A resolved value probably contains another placeholder that never settles".into(),
            ),
            cause: Some(format!("Last value: {}", value.into())),
            ..Self::new(ErrorKind::SubstitutionLimit { limit })
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add path context unless the error already carries one
    pub fn or_path(self, path: &str) -> Self {
        if self.path.is_some() || path.is_empty() {
            self
        } else {
            self.with_path(path)
        }
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Whether this error reports a missing value
    pub fn is_missing_value(&self) -> bool {
        matches!(self.kind, ErrorKind::MissingValue { .. })
    }

    /// Whether this error reports an unreachable parameter store
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Backend(BackendErrorKind::Unavailable { .. })
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Main error message
        match &self.kind {
            ErrorKind::SourceNotFound { source } => write!(f, "Config file {} not found", source)?,
            ErrorKind::SourceEmpty { source } => write!(f, "Config file {} is empty", source)?,
            ErrorKind::Parse => write!(f, "Parse error")?,
            ErrorKind::Io => write!(f, "I/O error")?,
            ErrorKind::InvalidRootPath { root_path } => {
                write!(f, "Root path must start with '/': {}", root_path)?
            }
            ErrorKind::KeyNotQualified { key } if key.is_empty() => {
                write!(f, "No parameter path given and no root path is configured")?
            }
            ErrorKind::KeyNotQualified { key } => {
                write!(f, "Parameter key {} is relative and no root path is configured", key)?
            }
            ErrorKind::MissingValue { key, source, tried } => match source {
                SourceType::Environment => write!(
                    f,
                    "Environment variable {} not found, no default provided",
                    key
                )?,
                SourceType::ParameterStore => {
                    write!(f, "SSM key {} not found, no default provided", key)?;
                    if !tried.is_empty() {
                        write!(f, " (tried {})", tried.join(", "))?;
                    }
                }
            },
            ErrorKind::Backend(b) => match b {
                BackendErrorKind::Unavailable { key } => {
                    write!(f, "Parameter store unavailable while reading {}", key)?
                }
                BackendErrorKind::Other { key } => {
                    write!(f, "Cannot read SSM parameter {}", key)?
                }
            },
            ErrorKind::SubstitutionLimit { limit } => {
                write!(f, "Placeholder substitution limit of {} exceeded", limit)?
            }
        }

        // Path context
        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        // Source location
        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{}", line)?;
            }
        }

        // Cause
        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        // Help
        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_display() {
        let err = Error::missing_env("MY_VAR").with_path("database.password");
        let display = format!("{}", err);

        assert!(display.contains("Environment variable MY_VAR not found, no default provided"));
        assert!(display.contains("Path: database.password"));
        assert!(display.contains("{!ENV: MY_VAR !DEFAULT: value}"));
    }

    #[test]
    fn test_missing_parameter_lists_candidates() {
        let err = Error::missing_parameter("db", vec!["/a/db".into(), "/b/db".into()]);
        let display = format!("{}", err);

        assert!(display.contains("SSM key db not found"));
        assert!(display.contains("tried /a/db, /b/db"));
        assert!(err.is_missing_value());
    }

    #[test]
    fn test_backend_unavailable_is_not_missing_value() {
        let err = Error::backend_unavailable("/a/db", "no credentials");

        assert!(err.is_backend_unavailable());
        assert!(!err.is_missing_value());
        assert!(format!("{}", err).contains("no credentials"));
    }

    #[test]
    fn test_backend_other_display() {
        let err = Error::backend_other("foo", "test");
        let display = format!("{}", err);

        assert!(display.contains("Cannot read SSM parameter foo"));
        assert!(display.contains("test"));
        assert!(!err.is_backend_unavailable());
    }

    #[test]
    fn test_source_errors_display() {
        let not_found = Error::source_not_found("config/not-found.yml");
        assert!(format!("{}", not_found).contains("Config file config/not-found.yml not found"));

        let empty = Error::source_empty("config/empty.yml");
        assert!(format!("{}", empty).contains("Config file config/empty.yml is empty"));
    }

    #[test]
    fn test_or_path_keeps_innermost_path() {
        let err = Error::missing_env("X").with_path("a.b").or_path("a");
        assert_eq!(err.path, Some("a.b".into()));

        let err = Error::missing_env("X").or_path("");
        assert_eq!(err.path, None);
    }

    #[test]
    fn test_with_source_location() {
        let err = Error::parse("syntax error").with_source_location(SourceLocation {
            file: "config.yaml".into(),
            line: Some(42),
            column: None,
        });
        let display = format!("{}", err);

        assert!(display.contains("config.yaml:42"));
    }

    #[test]
    fn test_with_help() {
        let err = Error::parse("bad input").with_help("Try fixing the syntax");
        let display = format!("{}", err);

        assert!(display.contains("Help: Try fixing the syntax"));
    }

    #[test]
    fn test_substitution_limit_display() {
        let err = Error::substitution_limit(64, "{!ENV: LOOP}");
        let display = format!("{}", err);

        assert!(display.contains("limit of 64 exceeded"));
        assert!(display.contains("{!ENV: LOOP}"));
    }

    #[test]
    fn test_invalid_root_path_display() {
        let err = Error::invalid_root_path("no/starting/slash/");
        assert_eq!(
            err.kind,
            ErrorKind::InvalidRootPath {
                root_path: "no/starting/slash/".into()
            }
        );
        assert!(format!("{}", err).contains("must start with '/'"));
    }
}
