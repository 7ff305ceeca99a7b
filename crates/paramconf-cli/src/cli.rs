//! paramconf CLI - resolve placeholders in configuration files
//!
//! Usage:
//!   paramconf resolve app_config.yml --return-key production
//!   paramconf --root-path /app/prod get db/password
//!   paramconf --root-path /app/prod list --format json

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use paramconf_aws::SsmStore;
use paramconf_core::error::ErrorKind;
use paramconf_core::{Error, Parameter, Resolver, ResolverOptions, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// paramconf - Resolve {!ENV: ...} and {!SSM: ...} placeholders in config files
#[derive(Parser)]
#[command(name = "paramconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command. Unset values fall back to
/// SSM_ROOT_PATH, SSM_SKIP_RESOLUTION and AWS_REGION.
#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// Root path for relative SSM keys (colon-delimited, repeatable)
    #[arg(long = "root-path", global = true)]
    root_paths: Vec<String>,

    /// Value used when a placeholder has no value and no inline default
    #[arg(long, global = true)]
    default_value: Option<String>,

    /// Do not contact the parameter store; SSM placeholders resolve to their key
    #[arg(long, global = true)]
    skip_remote: bool,

    /// AWS region
    #[arg(long, global = true)]
    region: Option<String>,

    /// Parameter store endpoint override (LocalStack, moto)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// AWS profile
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Log lookups to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every placeholder in a configuration file
    Resolve {
        /// Configuration file (YAML or JSON)
        file: PathBuf,

        /// Only resolve the subtree under this top-level key
        #[arg(long)]
        resolve_key: Option<String>,

        /// Only output the value under this top-level key
        #[arg(long)]
        return_key: Option<String>,

        /// Output format: yaml, json
        #[arg(short, long, default_value = "yaml", value_parser = ["yaml", "json"])]
        format: String,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the value of one parameter
    Get {
        /// Parameter key (relative keys are qualified by the root paths)
        key: String,
    },

    /// List the parameters under a path
    List {
        /// Path to list; defaults to the root paths
        path: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.global.verbose);

    let resolver = match build_options(&cli.global).and_then(build_resolver) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Resolve {
            file,
            resolve_key,
            return_key,
            format,
            output,
        } => cmd_resolve(
            &resolver,
            file,
            resolve_key.as_deref(),
            return_key.as_deref(),
            &format,
            output,
        ),
        Commands::Get { key } => cmd_get(&resolver, &key),
        Commands::List { path, format } => cmd_list(&resolver, path.as_deref(), &format),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Environment options overridden by whatever flags were given
fn build_options(global: &GlobalArgs) -> Result<ResolverOptions, String> {
    let options = ResolverOptions::from_env().map_err(|e| e.to_string())?;
    apply_flags(options, global)
}

fn apply_flags(
    mut options: ResolverOptions,
    global: &GlobalArgs,
) -> Result<ResolverOptions, String> {
    if !global.root_paths.is_empty() {
        options = options
            .with_root_path_list(&global.root_paths)
            .map_err(|e| e.to_string())?;
    }
    if let Some(default) = &global.default_value {
        options = options.with_default_value(default.as_str());
    }
    if global.skip_remote {
        options = options.with_skip_remote(true);
    }
    if let Some(region) = &global.region {
        options = options.with_region(region.as_str());
    }
    if let Some(endpoint) = &global.endpoint {
        options = options.with_endpoint(endpoint.as_str());
    }
    if let Some(profile) = &global.profile {
        options = options.with_profile(profile.as_str());
    }

    Ok(options)
}

fn build_resolver(options: ResolverOptions) -> Result<Resolver, String> {
    if options.skip_remote {
        return Resolver::offline(options).map_err(|e| e.to_string());
    }

    let store = SsmStore::from_options(&options)
        .map_err(|e| format!("Failed to create SSM client: {}", e))?;
    Resolver::with_store(options, Arc::new(store)).map_err(|e| e.to_string())
}

/// Problems with the input file are setup failures; everything else is a
/// resolution failure.
fn exit_code(err: &Error) -> u8 {
    match err.kind {
        ErrorKind::SourceNotFound { .. }
        | ErrorKind::SourceEmpty { .. }
        | ErrorKind::Parse
        | ErrorKind::Io => 2,
        _ => 1,
    }
}

fn render(value: &Value, format: &str) -> Result<String, String> {
    match format {
        "json" => serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
        _ => serde_yaml::to_string(value).map_err(|e| e.to_string()),
    }
}

fn render_parameters(parameters: &[Parameter], format: &str) -> Result<String, String> {
    match format {
        "json" => serde_json::to_string_pretty(parameters)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
        _ => Ok(parameters
            .iter()
            .map(|p| format!("{}={}\n", p.name, p.value))
            .collect()),
    }
}

fn cmd_resolve(
    resolver: &Resolver,
    file: PathBuf,
    resolve_key: Option<&str>,
    return_key: Option<&str>,
    format: &str,
    output: Option<PathBuf>,
) -> ExitCode {
    let value = match resolver.resolve_file(&file, resolve_key, return_key) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{} {}\n", "✗".red(), file.display());
            eprintln!("{}", e);
            return ExitCode::from(exit_code(&e));
        }
    };

    let content = match render(&value, format) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            return ExitCode::from(1);
        }
    };

    if let Some(output_path) = output {
        if let Err(e) = std::fs::write(&output_path, &content) {
            eprintln!("{}: {}", "Error writing file".red(), e);
            return ExitCode::from(2);
        }
        eprintln!("{} Wrote to {}", "✓".green(), output_path.display());
    } else {
        print!("{}", content);
    }

    ExitCode::SUCCESS
}

fn cmd_get(resolver: &Resolver, key: &str) -> ExitCode {
    match resolver.get_parameter(key) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_list(resolver: &Resolver, path: Option<&str>, format: &str) -> ExitCode {
    let parameters = match resolver.list_parameters(path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            return ExitCode::from(1);
        }
    };

    match render_parameters(&parameters, format) {
        Ok(content) => {
            print!("{}", content);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use paramconf_core::loader;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "paramconf",
            "resolve",
            "app.yml",
            "--return-key",
            "production",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve {
                file,
                resolve_key,
                return_key,
                format,
                output,
            } => {
                assert_eq!(file, PathBuf::from("app.yml"));
                assert_eq!(resolve_key, None);
                assert_eq!(return_key.as_deref(), Some("production"));
                assert_eq!(format, "json");
                assert_eq!(output, None);
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "paramconf",
            "get",
            "db/password",
            "--root-path",
            "/a",
            "--root-path",
            "/b:/c",
            "--skip-remote",
        ])
        .unwrap();

        assert_eq!(cli.global.root_paths, vec!["/a", "/b:/c"]);
        assert!(cli.global.skip_remote);
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(Cli::try_parse_from(["paramconf", "list", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_flags_override_base_options() {
        let base = ResolverOptions::new()
            .with_region("us-west-2")
            .with_profile("dev");
        let global = GlobalArgs {
            root_paths: vec!["/a".into(), "/b/:/c".into()],
            default_value: Some("NOT_APPLICABLE".into()),
            skip_remote: true,
            region: Some("eu-central-1".into()),
            endpoint: Some("http://localhost:4566".into()),
            profile: None,
            verbose: false,
        };

        let options = apply_flags(base, &global).unwrap();

        assert_eq!(options.root_paths, vec!["/a/", "/b/", "/c/"]);
        assert_eq!(options.default_value.as_deref(), Some("NOT_APPLICABLE"));
        assert!(options.skip_remote);
        assert_eq!(options.region, "eu-central-1");
        assert_eq!(options.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(options.profile.as_deref(), Some("dev"));
    }

    #[test]
    fn test_no_flags_keep_base_options() {
        let base = ResolverOptions::new()
            .with_root_paths("/env/root")
            .unwrap()
            .with_default_value("fallback");

        let options = apply_flags(base, &GlobalArgs::default()).unwrap();

        assert_eq!(options.root_paths, vec!["/env/root/"]);
        assert_eq!(options.default_value.as_deref(), Some("fallback"));
        assert!(!options.skip_remote);
    }

    #[test]
    fn test_invalid_root_path_flag() {
        let global = GlobalArgs {
            root_paths: vec!["relative".into()],
            ..Default::default()
        };
        assert!(apply_flags(ResolverOptions::new(), &global).is_err());
    }

    #[test]
    fn test_skip_remote_builds_offline_resolver() {
        let options = ResolverOptions::new().with_skip_remote(true);
        let resolver = build_resolver(options).unwrap();
        assert_eq!(resolver.get_parameter("db/password").unwrap(), "db/password");
    }

    #[test]
    fn test_render_yaml_keeps_key_order() {
        let value = loader::from_yaml_str("b: 1\na: two\n").unwrap();
        assert_eq!(render(&value, "yaml").unwrap(), "b: 1\na: two\n");
    }

    #[test]
    fn test_render_json() {
        let value = loader::from_yaml_str("a: [1, x]\n").unwrap();
        assert_eq!(
            render(&value, "json").unwrap(),
            "{\n  \"a\": [\n    1,\n    \"x\"\n  ]\n}\n"
        );
    }

    #[test]
    fn test_render_parameters() {
        let parameters = vec![
            Parameter::new("/app/a", "1"),
            Parameter::new("/app/b", "2"),
        ];

        assert_eq!(
            render_parameters(&parameters, "text").unwrap(),
            "/app/a=1\n/app/b=2\n"
        );
        assert!(render_parameters(&parameters, "json")
            .unwrap()
            .contains("\"name\": \"/app/a\""));
        assert_eq!(render_parameters(&[], "text").unwrap(), "");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&Error::source_not_found("x.yml")), 2);
        assert_eq!(exit_code(&Error::missing_env("X")), 1);
    }
}
