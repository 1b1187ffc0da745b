#![deny(missing_docs)]

//! # apispec CLI
//!
//! Command-line front end for the static OpenAPI extraction pipeline.
//!
//! Supported commands:
//! - `extract`: call graph + metadata in, an OpenAPI document out.

use apispec_core::tree::InMemoryTree;
use apispec_core::variable_tracer::AssignmentMapTracer;
use apispec_core::{config, run, GeneratorConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

mod error;

use error::CliResult;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Static OpenAPI extraction from a pre-built call graph")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extracts routes from a call graph and emits an OpenAPI document.
    Extract(ExtractArgs),
}

/// Output serialization format.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// `serde_json` pretty-printed output.
    Json,
    /// `serde_yaml` output.
    Yaml,
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Path to the pre-built call graph + metadata (JSON), deserialized
    /// as an `InMemoryTree`.
    #[clap(long)]
    input: PathBuf,

    /// Path to a YAML (or JSON) `ApiSpecConfig` document. Overlaid on
    /// top of `--framework`'s preset when both are given; used as-is
    /// when `--framework` is absent.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Name of a built-in framework preset (`chi`, `echo`, `fiber`,
    /// `gin`, `mux`, `net-http`) to use as the base configuration.
    #[clap(long)]
    framework: Option<String>,

    /// Output path; defaults to stdout.
    #[clap(long)]
    output: Option<PathBuf>,

    /// Output serialization format.
    #[clap(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// `openapi:` version string to emit.
    #[clap(long, default_value = "3.0.3")]
    openapi_version: String,

    /// Fallback `info.title` when the config's own `openapi.info.title`
    /// is empty.
    #[clap(long, default_value = "")]
    title: String,

    /// Fallback `info.version` when the config's own `openapi.info.version`
    /// is empty.
    #[clap(long, default_value = "")]
    api_version: String,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Extract(args) => execute(args),
    }
}

fn execute(args: &ExtractArgs) -> CliResult<()> {
    let input_text = fs::read_to_string(&args.input)?;
    let tree: InMemoryTree = serde_json::from_str(&input_text).map_err(apispec_core::AppError::from)?;

    let overlay_text = args.config.as_deref().map(fs::read_to_string).transpose()?;
    let spec_config = config::load(args.framework.as_deref(), overlay_text.as_deref())?;

    let generator = GeneratorConfig {
        open_api_version: args.openapi_version.clone(),
        title: args.title.clone(),
        api_version: args.api_version.clone(),
    };

    let tracer = AssignmentMapTracer;
    let document = run(&tree, &spec_config, &generator, &tracer);

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&document).map_err(apispec_core::AppError::from)?,
        OutputFormat::Yaml => serde_yaml::to_string(&document).map_err(apispec_core::AppError::from)?,
    };

    match &args.output {
        Some(path) => fs::write(path, rendered)?,
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{rendered}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write as _;
    use tempfile::tempdir;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn extract_reads_input_writes_output_file() {
        let dir = tempdir().unwrap();
        let input_path = dir.path().join("graph.json");
        let output_path = dir.path().join("openapi.json");

        let tree = serde_json::json!({
            "roots": ["n1"],
            "nodes": {
                "n1": {
                    "key": "n1",
                    "edge": {
                        "caller": {"name": 2, "pkg": 1, "recv_type": 0},
                        "callee": {"name": 3, "pkg": 1, "recv_type": 0},
                        "arguments": [
                            {"kind": "literal", "value": 4},
                            {"kind": "identifier", "name": 5, "resolved_type": 0}
                        ],
                        "assignment_map": {
                            "listUsers": [{"variable_name": "listUsers", "concrete_type": "", "pkg": "app"}]
                        }
                    },
                    "children": []
                }
            },
            "metadata": {
                "pool": ["", "app", "registerRoutes", "GET", "\"/users\"", "listUsers"],
                "packages": {},
                "edges": []
            }
        });
        let mut f = File::create(&input_path).unwrap();
        write!(f, "{}", tree).unwrap();

        let config_path = dir.path().join("config.json");
        let config = serde_json::json!({
            "routes": [{
                "call_regex": "^GET$",
                "path_arg_index": 0,
                "handler_arg_index": 1,
                "method_from_call": true
            }]
        });
        let mut cf = File::create(&config_path).unwrap();
        write!(cf, "{}", config).unwrap();

        let args = ExtractArgs {
            input: input_path,
            config: Some(config_path),
            framework: None,
            output: Some(output_path.clone()),
            format: OutputFormat::Json,
            openapi_version: "3.0.3".to_string(),
            title: "Test API".to_string(),
            api_version: "1.0.0".to_string(),
        };

        execute(&args).unwrap();

        let rendered = std::fs::read_to_string(&output_path).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(doc["info"]["title"], serde_json::json!("Test API"));
        assert_eq!(doc["paths"]["/users"]["get"]["operationId"], serde_json::json!("app.listUsers"));
    }
}
