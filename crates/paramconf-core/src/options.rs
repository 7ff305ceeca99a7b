//! Resolver construction options
//!
//! Options are validated once when a [`Resolver`](crate::Resolver) is built
//! and never change afterwards.

use crate::error::{Error, Result};

/// Environment variable holding colon-delimited root paths
pub const ENV_ROOT_PATH: &str = "SSM_ROOT_PATH";
/// Environment variable that disables parameter store lookups when set to `Y`
pub const ENV_SKIP_RESOLUTION: &str = "SSM_SKIP_RESOLUTION";
/// Environment variable holding the AWS region
pub const ENV_REGION: &str = "AWS_REGION";
/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-west-2";
/// Substitutions allowed on one scalar before giving up
pub const DEFAULT_MAX_SUBSTITUTIONS: usize = 64;

const ROOT_PATH_SEPARATOR: char = ':';

/// Options for building a resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Root paths tried in order for relative parameter keys.
    /// Each entry starts and ends with `/` once validated.
    pub root_paths: Vec<String>,
    /// Global fallback used when no value and no inline default exist
    pub default_value: Option<String>,
    /// Echo parameter keys back instead of contacting the store
    pub skip_remote: bool,
    /// AWS region for the parameter store client
    pub region: String,
    /// Endpoint override (LocalStack, moto)
    pub endpoint: Option<String>,
    /// AWS profile name
    pub profile: Option<String>,
    /// Substitutions allowed on one scalar before failing
    pub max_substitutions: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            root_paths: Vec::new(),
            default_value: None,
            skip_remote: false,
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            profile: None,
            max_substitutions: DEFAULT_MAX_SUBSTITUTIONS,
        }
    }
}

impl ResolverOptions {
    /// Create options with no root paths and no global default
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from `SSM_ROOT_PATH`, `SSM_SKIP_RESOLUTION` and `AWS_REGION`
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();

        if let Ok(paths) = std::env::var(ENV_ROOT_PATH) {
            options.root_paths = parse_root_paths(&paths)?;
        }
        if let Ok(flag) = std::env::var(ENV_SKIP_RESOLUTION) {
            options.skip_remote = parse_flag(&flag);
        }
        if let Ok(region) = std::env::var(ENV_REGION) {
            if !region.trim().is_empty() {
                options.region = region.trim().to_string();
            }
        }

        Ok(options)
    }

    /// Set root paths from a colon-delimited string
    pub fn with_root_paths(mut self, paths: &str) -> Result<Self> {
        self.root_paths = parse_root_paths(paths)?;
        Ok(self)
    }

    /// Set root paths from a list (each entry may itself be colon-delimited)
    pub fn with_root_path_list<S: AsRef<str>>(mut self, paths: &[S]) -> Result<Self> {
        let mut roots = Vec::new();
        for path in paths {
            roots.extend(parse_root_paths(path.as_ref())?);
        }
        self.root_paths = roots;
        Ok(self)
    }

    /// Set the global default; an empty string means no default
    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.default_value = (!value.is_empty()).then_some(value);
        self
    }

    /// Enable or disable parameter store lookups
    pub fn with_skip_remote(mut self, skip: bool) -> Self {
        self.skip_remote = skip;
        self
    }

    /// Set the AWS region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the endpoint override
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the AWS profile
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the substitution cap per scalar
    pub fn with_max_substitutions(mut self, max: usize) -> Self {
        self.max_substitutions = max;
        self
    }

    /// Check and normalize root paths; an empty global default becomes `None`
    pub(crate) fn validated(mut self) -> Result<Self> {
        self.root_paths = self
            .root_paths
            .iter()
            .map(|p| normalize_root_path(p))
            .collect::<Result<Vec<_>>>()?;
        if self.default_value.as_deref() == Some("") {
            self.default_value = None;
        }
        Ok(self)
    }
}

/// Split a colon-delimited list of root paths
///
/// Empty segments are ignored. Every path must start with `/`; a trailing `/`
/// is appended where missing.
pub fn parse_root_paths(paths: &str) -> Result<Vec<String>> {
    paths
        .split(ROOT_PATH_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(normalize_root_path)
        .collect()
}

fn normalize_root_path(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(Error::invalid_root_path(path));
    }
    if path.ends_with('/') {
        Ok(path.to_string())
    } else {
        Ok(format!("{}/", path))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    )
}
