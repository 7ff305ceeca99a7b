//! paramconf-core: Placeholder resolution for configuration documents
//!
//! This crate loads YAML/JSON documents and replaces `{!ENV: ...}` and
//! `{!SSM: ...}` placeholders in string scalars with values from the process
//! environment or a parameter store.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use paramconf_core::{loader, MemoryStore, Resolver, ResolverOptions};
//!
//! let doc = loader::from_yaml_str(r#"
//! database:
//!   host: "{!SSM: db/host !DEFAULT: localhost}"
//!   password: "{!SSM: db/password}"
//! "#).unwrap();
//!
//! let store = MemoryStore::new().with_parameter("/app/db/password", "hunter2");
//! let options = ResolverOptions::new().with_root_paths("/app").unwrap();
//! let resolver = Resolver::with_store(options, Arc::new(store)).unwrap();
//!
//! let db = resolver.resolve_document(&doc, None, Some("database")).unwrap();
//! assert_eq!(db.get("host").unwrap().as_str(), Some("localhost"));
//! assert_eq!(db.get("password").unwrap().as_str(), Some("hunter2"));
//! ```

pub mod error;
pub mod loader;
pub mod options;
pub mod placeholder;
pub mod resolver;
pub mod store;
pub mod value;

pub use error::{Error, Result};
pub use options::ResolverOptions;
pub use placeholder::SourceType;
pub use resolver::Resolver;
pub use store::{MemoryStore, Parameter, ParameterPage, ParameterStore, StoreError};
pub use value::Value;
