//! Placeholder resolution
//!
//! The [`Resolver`] walks a document and rewrites every string scalar that
//! holds placeholders, looking values up in the process environment or in a
//! [`ParameterStore`].
//!
//! Precedence for a single placeholder:
//! 1. the environment variable / parameter store value
//! 2. the inline default (`!DEFAULT: value`)
//! 3. the resolver's global default
//! 4. a `MissingValue` error
//!
//! Store failures other than "not found" are never replaced by a default.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::loader;
use crate::options::ResolverOptions;
use crate::placeholder::{self, SourceType};
use crate::store::{Parameter, ParameterStore, StoreError};
use crate::value::Value;

/// Resolves placeholders in documents
///
/// A resolver holds no per-call state: it can be reused for any number of
/// documents and shared between threads.
pub struct Resolver {
    options: ResolverOptions,
    store: Option<Arc<dyn ParameterStore>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("options", &self.options)
            .field("store", &self.store.as_ref().map(|_| "<store>"))
            .finish()
    }
}

impl Resolver {
    /// Create a resolver, validating the options
    ///
    /// `store` may be `None` when `skip_remote` is set; otherwise every
    /// parameter store lookup fails with `BackendUnavailable`.
    pub fn new(options: ResolverOptions, store: Option<Arc<dyn ParameterStore>>) -> Result<Self> {
        Ok(Self {
            options: options.validated()?,
            store,
        })
    }

    /// Create a resolver backed by `store`
    pub fn with_store(options: ResolverOptions, store: Arc<dyn ParameterStore>) -> Result<Self> {
        Self::new(options, Some(store))
    }

    /// Create a resolver that never contacts a parameter store
    ///
    /// `SSM` placeholders resolve to their raw key.
    pub fn offline(options: ResolverOptions) -> Result<Self> {
        Self::new(options.with_skip_remote(true), None)
    }

    /// The validated options this resolver was built with
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve a document
    ///
    /// * `resolve_key` - only resolve the subtree under this top-level key,
    ///   copying all other top-level keys unchanged. If the key is absent the
    ///   whole document is resolved.
    /// * `return_key` - return only the resolved value under this top-level
    ///   key. If the key is absent the whole document is returned.
    pub fn resolve_document(
        &self,
        doc: &Value,
        resolve_key: Option<&str>,
        return_key: Option<&str>,
    ) -> Result<Value> {
        let resolved = match (doc, resolve_key) {
            (Value::Mapping(map), Some(key)) => match map.get(key) {
                Some(selected) => {
                    let mut out = map.clone();
                    out.insert(key.to_string(), self.walk(selected, key)?);
                    Value::Mapping(out)
                }
                None => {
                    log::debug!("Key '{}' not in document, resolving everything", key);
                    self.walk(doc, "")?
                }
            },
            _ => self.walk(doc, "")?,
        };

        Ok(select(resolved, return_key))
    }

    /// Load a document from a file and resolve it
    pub fn resolve_file(
        &self,
        path: impl AsRef<Path>,
        resolve_key: Option<&str>,
        return_key: Option<&str>,
    ) -> Result<Value> {
        let doc = loader::load_file(path)?;
        self.resolve_document(&doc, resolve_key, return_key)
    }

    /// Resolve every placeholder in a single string
    ///
    /// The leftmost placeholder is replaced first and the rebuilt string is
    /// scanned again, so a substituted value that itself looks like a
    /// placeholder is resolved too. More than `max_substitutions` passes
    /// fail with `SubstitutionLimit`.
    pub fn resolve_str(&self, input: &str) -> Result<String> {
        let mut current = input.to_string();

        for _ in 0..self.options.max_substitutions {
            let Some(found) = placeholder::find(&current) else {
                return Ok(current);
            };

            let value = match found.source {
                SourceType::Environment => self.lookup_env(found.key, found.default)?,
                SourceType::ParameterStore => self.lookup_parameter(found.key, found.default)?,
            };
            log::trace!("Substituted {} {}", found.source.tag(), found.key);

            current = found.substitute(&value);
        }

        if placeholder::contains_placeholder(&current) {
            return Err(Error::substitution_limit(
                self.options.max_substitutions,
                current,
            ));
        }
        Ok(current)
    }

    /// Look up one parameter using the configured root paths
    pub fn get_parameter(&self, key: &str) -> Result<String> {
        self.lookup_parameter(key, None)
    }

    /// List parameters under a path, following pagination
    ///
    /// * `None` lists each configured root path
    /// * an absolute path is listed as-is
    /// * a relative path is joined with each root path
    ///
    /// Candidates are tried in order and the first non-empty listing wins.
    /// When every candidate is empty, or `skip_remote` is set, the result is empty.
    pub fn list_parameters(&self, path: Option<&str>) -> Result<Vec<Parameter>> {
        if self.options.skip_remote {
            return Ok(Vec::new());
        }

        let candidates = match path {
            Some(p) => self.qualify(p)?,
            None if self.options.root_paths.is_empty() => {
                return Err(Error::key_not_qualified(""));
            }
            None => self.options.root_paths.clone(),
        };

        let store = self.store(&candidates[0])?;
        for candidate in &candidates {
            match fetch_all(store, candidate) {
                Ok(parameters) if !parameters.is_empty() => return Ok(parameters),
                Ok(_) | Err(StoreError::NotFound(_)) => {
                    log::debug!("No SSM parameters under {}", candidate);
                }
                Err(e) => return Err(store_error(candidate, e)),
            }
        }

        Ok(Vec::new())
    }

    /// Walk a value, rebuilding mappings and sequences
    fn walk(&self, value: &Value, path: &str) -> Result<Value> {
        match value {
            Value::String(s) => self
                .resolve_str(s)
                .map(Value::String)
                .map_err(|e| e.or_path(path)),
            Value::Sequence(seq) => seq
                .iter()
                .enumerate()
                .map(|(i, item)| self.walk(item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence),
            Value::Mapping(map) => {
                let mut resolved = IndexMap::with_capacity(map.len());
                for (key, val) in map {
                    let key_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    resolved.insert(key.clone(), self.walk(val, &key_path)?);
                }
                Ok(Value::Mapping(resolved))
            }
            _ => Ok(value.clone()),
        }
    }

    /// Environment lookup. A variable that is set but empty counts as found.
    fn lookup_env(&self, key: &str, default: Option<&str>) -> Result<String> {
        if let Some(value) = env_var(key) {
            return Ok(value);
        }
        self.fallback(key, default)
            .ok_or_else(|| Error::missing_env(key))
    }

    /// Parameter store lookup across the root path candidates
    fn lookup_parameter(&self, key: &str, default: Option<&str>) -> Result<String> {
        if self.options.skip_remote {
            log::debug!("Skipping SSM resolution for {}", key);
            return Ok(key.to_string());
        }

        let candidates = self.qualify(key)?;
        let store = self.store(&candidates[0])?;

        for name in &candidates {
            match store.get_parameter(name) {
                Ok(value) => return Ok(value),
                Err(StoreError::NotFound(_)) => log::debug!("SSM parameter {} not found", name),
                Err(e) => return Err(store_error(name, e)),
            }
        }

        self.fallback(key, default)
            .ok_or_else(|| Error::missing_parameter(key, candidates))
    }

    /// Fully-qualified names to try for `key`, in order
    fn qualify(&self, key: &str) -> Result<Vec<String>> {
        if key.starts_with('/') {
            return Ok(vec![key.to_string()]);
        }
        if self.options.root_paths.is_empty() {
            return Err(Error::key_not_qualified(key));
        }
        Ok(self
            .options
            .root_paths
            .iter()
            .map(|root| format!("{}{}", root, key))
            .collect())
    }

    fn store(&self, key: &str) -> Result<&dyn ParameterStore> {
        self.store
            .as_deref()
            .ok_or_else(|| Error::backend_unavailable(key, "no parameter store configured"))
    }

    /// Inline default, then global default
    fn fallback(&self, key: &str, inline: Option<&str>) -> Option<String> {
        if let Some(value) = inline {
            return Some(value.to_string());
        }
        let global = self.options.default_value.clone();
        if global.is_some() {
            log::warn!("No value for {}, using the global default", key);
        }
        global
    }
}

/// Return the value under `return_key`, or the whole value
fn select(value: Value, return_key: Option<&str>) -> Value {
    match (value, return_key) {
        (Value::Mapping(mut map), Some(key)) => match map.shift_remove(key) {
            Some(selected) => selected,
            None => Value::Mapping(map),
        },
        (value, _) => value,
    }
}

/// Read every page of a listing
fn fetch_all(
    store: &dyn ParameterStore,
    path: &str,
) -> std::result::Result<Vec<Parameter>, StoreError> {
    let mut parameters = Vec::new();
    let mut seen = HashSet::new();
    let mut token: Option<String> = None;

    loop {
        let page = store.get_parameters_by_path(path, token.as_deref())?;
        parameters.extend(page.parameters);

        match page.next_token {
            Some(next) if !seen.insert(next.clone()) => {
                return Err(StoreError::Other(format!(
                    "pagination token {} repeated while listing {}",
                    next, path
                )));
            }
            Some(next) => token = Some(next),
            None => return Ok(parameters),
        }
    }
}

fn store_error(name: &str, err: StoreError) -> Error {
    match err {
        StoreError::Unavailable(message) => Error::backend_unavailable(name, message),
        StoreError::Other(message) => Error::backend_other(name, message),
        StoreError::NotFound(_) => Error::missing_parameter(name, vec![name.to_string()]),
    }
}

fn env_var(key: &str) -> Option<String> {
    if key.is_empty() || key.contains(|c: char| c == '=' || c == '\0') {
        return None;
    }
    std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
}
