//! AWS backend for paramconf
//!
//! [`SsmStore`] implements [`paramconf_core::ParameterStore`] against AWS
//! Systems Manager Parameter Store.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use paramconf_aws::SsmStore;
//! use paramconf_core::{Resolver, ResolverOptions};
//!
//! let options = ResolverOptions::from_env()?;
//! let store = SsmStore::from_options(&options)?;
//! let resolver = Resolver::with_store(options, Arc::new(store))?;
//! let config = resolver.resolve_file("app_config.yml", None, Some("production"))?;
//! ```

mod client_cache;
mod ssm;

pub use ssm::SsmStore;

/// Clear the SSM client cache.
///
/// Stores created afterwards build fresh clients, picking up changed
/// credentials or profiles.
pub fn reset() {
    client_cache::clear();
}
