//! Parameter store abstraction
//!
//! The resolver talks to a remote key-value service through [`ParameterStore`].
//! `paramconf-aws` provides the AWS Systems Manager implementation;
//! [`MemoryStore`] is an in-process implementation for tests and offline use.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Errors reported by a parameter store
///
/// `NotFound` is the only variant the resolver absorbs (it falls through to
/// the next root path or the default chain). The others abort resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested parameter does not exist
    #[error("parameter not found: {0}")]
    NotFound(String),
    /// Missing credentials, connectivity or authorization failure
    #[error("parameter store unavailable: {0}")]
    Unavailable(String),
    /// Any other failure
    #[error("{0}")]
    Other(String),
}

/// A single parameter returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Parameter {
    /// Fully-qualified parameter name
    pub name: String,
    /// Parameter value
    pub value: String,
}

impl Parameter {
    /// Create a parameter from its fully-qualified name and value
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One page of a path listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPage {
    /// Parameters on this page, in store order
    pub parameters: Vec<Parameter>,
    /// Token for the next page; `None` on the last page
    pub next_token: Option<String>,
}

/// Trait for parameter store clients
///
/// Implementations must be safe to share across threads; the resolver holds
/// one behind an `Arc` and never mutates it.
pub trait ParameterStore: Send + Sync {
    /// Fetch one parameter by its fully-qualified name
    fn get_parameter(&self, name: &str) -> Result<String, StoreError>;

    /// Fetch one page of the parameters under `path`
    fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<&str>,
    ) -> Result<ParameterPage, StoreError>;
}

/// A call received by a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    List {
        path: String,
        next_token: Option<String>,
    },
}

/// In-memory parameter store
///
/// Parameters are listed in name order. Listings are recursive: every
/// parameter whose name starts with the path (plus a trailing `/`) is returned.
#[derive(Debug, Default)]
pub struct MemoryStore {
    parameters: BTreeMap<String, String>,
    failures: HashMap<String, StoreError>,
    page_size: Option<usize>,
    calls: Mutex<Vec<StoreCall>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Fail every request for `name` (a parameter name or a listing path)
    pub fn with_failure(mut self, name: impl Into<String>, error: StoreError) -> Self {
        self.failures.insert(name.into(), error);
        self
    }

    /// Split listings into pages of at most `size` parameters
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: StoreCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check_failure(&self, name: &str) -> Result<(), StoreError> {
        match self.failures.get(name) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl ParameterStore for MemoryStore {
    fn get_parameter(&self, name: &str) -> Result<String, StoreError> {
        self.record(StoreCall::Get(name.to_string()));
        self.check_failure(name)?;

        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<&str>,
    ) -> Result<ParameterPage, StoreError> {
        self.record(StoreCall::List {
            path: path.to_string(),
            next_token: next_token.map(String::from),
        });
        self.check_failure(path)?;

        let offset = match next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StoreError::Other(format!("invalid next token: {}", token)))?,
            None => 0,
        };

        let prefix = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{}/", path)
        };

        let matching: Vec<Parameter> = self
            .parameters
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, value)| Parameter::new(name.as_str(), value.as_str()))
            .collect();

        let end = match self.page_size {
            Some(size) => (offset + size).min(matching.len()),
            None => matching.len(),
        };
        let start = offset.min(end);

        Ok(ParameterPage {
            parameters: matching[start..end].to_vec(),
            next_token: (end < matching.len()).then(|| end.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_parameter() {
        let store = MemoryStore::new().with_parameter("/app/db", "secret");

        assert_eq!(store.get_parameter("/app/db"), Ok("secret".to_string()));
        assert_eq!(
            store.get_parameter("/app/missing"),
            Err(StoreError::NotFound("/app/missing".into()))
        );
    }

    #[test]
    fn test_forced_failure() {
        let store = MemoryStore::new()
            .with_parameter("foo", "bar")
            .with_failure("foo", StoreError::Unavailable("no credentials".into()));

        assert_eq!(
            store.get_parameter("foo"),
            Err(StoreError::Unavailable("no credentials".into()))
        );
    }

    #[test]
    fn test_listing_is_scoped_to_path() {
        let store = MemoryStore::new()
            .with_parameter("/app/a", "1")
            .with_parameter("/app/nested/b", "2")
            .with_parameter("/application/c", "3");

        let page = store.get_parameters_by_path("/app", None).unwrap();
        assert_eq!(
            page.parameters,
            vec![Parameter::new("/app/a", "1"), Parameter::new("/app/nested/b", "2")]
        );
        assert_eq!(page.next_token, None);
    }

    #[test]
    fn test_listing_pages() {
        let store = MemoryStore::new()
            .with_parameter("/p/1", "a")
            .with_parameter("/p/2", "b")
            .with_parameter("/p/3", "c")
            .with_page_size(2);

        let first = store.get_parameters_by_path("/p/", None).unwrap();
        assert_eq!(first.parameters.len(), 2);
        assert_eq!(first.next_token.as_deref(), Some("2"));

        let second = store.get_parameters_by_path("/p/", Some("2")).unwrap();
        assert_eq!(second.parameters, vec![Parameter::new("/p/3", "c")]);
        assert_eq!(second.next_token, None);
    }

    #[test]
    fn test_invalid_token() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_parameters_by_path("/p/", Some("abc")),
            Err(StoreError::Other(_))
        ));
    }

    #[test]
    fn test_calls_are_recorded() {
        let store = MemoryStore::new();
        let _ = store.get_parameter("/x");
        let _ = store.get_parameters_by_path("/y/", None);

        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Get("/x".into()),
                StoreCall::List {
                    path: "/y/".into(),
                    next_token: None
                }
            ]
        );
    }

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::NotFound("/a".into()).to_string(),
            "parameter not found: /a"
        );
        assert_eq!(StoreError::Other("boom".into()).to_string(), "boom");
    }
}
