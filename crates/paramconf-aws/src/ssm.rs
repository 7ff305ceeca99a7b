//! SSM Parameter Store backend
//!
//! Implements [`ParameterStore`] on top of AWS Systems Manager. Every call
//! asks for decryption, so `SecureString` parameters come back in plain text.

use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use paramconf_core::store::{Parameter, ParameterPage, ParameterStore, StoreError};
use paramconf_core::ResolverOptions;
use tokio::runtime::Runtime;

use crate::client_cache;

/// Error codes meaning the parameter does not exist
const NOT_FOUND_CODES: &[&str] = &["ParameterNotFound", "ParameterVersionNotFound"];

/// Error code prefixes meaning the caller cannot reach or use the store
const UNAVAILABLE_CODE_PREFIXES: &[&str] = &[
    "AccessDenied",
    "UnrecognizedClient",
    "ExpiredToken",
    "InvalidSignature",
];

/// SSM Parameter Store client.
///
/// Blocks on the async SDK using the client cache's shared Tokio runtime, so
/// it must not be used from inside another Tokio runtime.
pub struct SsmStore {
    client: aws_sdk_ssm::Client,
    runtime: &'static Runtime,
}

impl std::fmt::Debug for SsmStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsmStore")
            .field("region", &self.client.config().region())
            .finish()
    }
}

impl SsmStore {
    /// Create a store for `region`, optionally against a custom endpoint
    /// (LocalStack, moto) and with a named AWS profile.
    pub fn new(
        region: &str,
        endpoint: Option<&str>,
        profile: Option<&str>,
    ) -> Result<Self, StoreError> {
        let runtime = client_cache::runtime()
            .map_err(|e| StoreError::Unavailable(format!("failed to start runtime: {}", e)))?;
        let client = runtime.block_on(client_cache::get_client(region, endpoint, profile));
        Ok(Self { client, runtime })
    }

    /// Create a store from resolver options
    pub fn from_options(options: &ResolverOptions) -> Result<Self, StoreError> {
        Self::new(
            &options.region,
            options.endpoint.as_deref(),
            options.profile.as_deref(),
        )
    }
}

impl ParameterStore for SsmStore {
    fn get_parameter(&self, name: &str) -> Result<String, StoreError> {
        log::debug!("SSM GetParameter {}", name);

        let output = self
            .runtime
            .block_on(
                self.client
                    .get_parameter()
                    .name(name)
                    .with_decryption(true)
                    .send(),
            )
            .map_err(classify)?;

        output
            .parameter()
            .and_then(|p| p.value())
            .map(str::to_string)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<&str>,
    ) -> Result<ParameterPage, StoreError> {
        let path = api_path(path);
        log::debug!("SSM GetParametersByPath {} (token: {:?})", path, next_token);

        let output = self
            .runtime
            .block_on(
                self.client
                    .get_parameters_by_path()
                    .path(path)
                    .recursive(true)
                    .with_decryption(true)
                    .set_next_token(next_token.map(String::from))
                    .send(),
            )
            .map_err(classify)?;

        let parameters = output
            .parameters()
            .iter()
            .filter_map(|p| Some(Parameter::new(p.name()?, p.value()?)))
            .collect();

        Ok(ParameterPage {
            parameters,
            next_token: output.next_token().map(String::from),
        })
    }
}

/// SSM rejects hierarchy paths with a trailing slash
fn api_path(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

/// Map an SDK error onto the store error categories
fn classify<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::ConstructionFailure(_)
        | SdkError::TimeoutError(_)
        | SdkError::DispatchFailure(_) => StoreError::Unavailable(message),
        _ => classify_code(err.code(), message),
    }
}

fn classify_code(code: Option<&str>, message: String) -> StoreError {
    match code {
        Some(code) if NOT_FOUND_CODES.contains(&code) => StoreError::NotFound(message),
        Some(code)
            if UNAVAILABLE_CODE_PREFIXES
                .iter()
                .any(|prefix| code.starts_with(prefix)) =>
        {
            StoreError::Unavailable(message)
        }
        _ => StoreError::Other(message),
    }
}
