//! Document loading
//!
//! Reads YAML or JSON sources into a [`Value`] tree. A missing file and an
//! empty file are reported as distinct errors.

use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use crate::error::{Error, Result, SourceLocation};
use crate::value::Value;

/// Load a document from a YAML string
pub fn from_yaml_str(yaml: &str) -> Result<Value> {
    serde_yaml::from_str(yaml).map_err(yaml_error)
}

/// Load a document from a JSON string
pub fn from_json_str(json: &str) -> Result<Value> {
    serde_json::from_str(json).map_err(|e| Error::parse(e.to_string()))
}

/// Load a document from a file
///
/// Files ending in `.json` are parsed as JSON, everything else as YAML.
pub fn load_file(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        IoErrorKind::NotFound => Error::source_not_found(&display),
        _ => Error::io(format!("Failed to read file '{}': {}", display, e)),
    })?;

    if content.is_empty() {
        return Err(Error::source_empty(&display));
    }

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let value = if is_json {
        from_json_str(&content)
    } else {
        from_yaml_str(&content)
    }
    .map_err(|mut e| {
        let loc = e.source_location.take();
        e.with_source_location(SourceLocation {
            file: display.clone(),
            line: loc.as_ref().and_then(|l| l.line),
            column: loc.and_then(|l| l.column),
        })
    })?;

    // A file holding only comments or whitespace parses to null
    if value.is_null() {
        return Err(Error::source_empty(&display));
    }

    log::debug!("Loaded {} ({})", display, value.type_name());
    Ok(value)
}

fn yaml_error(e: serde_yaml::Error) -> Error {
    let location = e.location();
    let err = Error::parse(e.to_string());
    match location {
        Some(loc) => err.with_source_location(SourceLocation {
            file: String::new(),
            line: Some(loc.line()),
            column: Some(loc.column()),
        }),
        None => err,
    }
}
