//! The rules-cli command.
//!
//! Provides the `rules-cli` command with the following subcommand:
//!
//! - `rules-cli run <document>` - parse, validate, and evaluate a rules DSL document
//!
//! Options:
//! - `--input` - JSON file of input values
//! - `--constants` - JSON file of constant code -> value overrides
//! - `--config` - TOML file overriding decimal scale / loop limit / cache TTL
//! - `--cache` - REST response cache backend (memory, file, or none)
//! - `--cache-path` - file path for the `file` cache backend
//! - `--validate-only` - stop after validation, do not evaluate

mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use config::RulesCliConfig;
use rules_adapters::{json_bridge, BuiltinFunctionRegistry, CachingFunctionRegistry, FileCache, MemoryCache, StaticConstantsProvider, TracingAuditSink};
use rules_common::Value;
use rules_eval::{evaluate_document, EvalResult};
use rules_validate::Validator;
use rustc_hash::FxHashMap;

#[derive(Parser)]
#[command(name = "rules-cli", version, about = "Run rules DSL documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, validate, and evaluate a rules document
    Run {
        /// Path to the YAML rules document
        document: PathBuf,

        /// JSON file of input values
        #[arg(long)]
        input: Option<PathBuf>,

        /// JSON file of constant code -> value overrides
        #[arg(long)]
        constants: Option<PathBuf>,

        /// TOML file overriding decimal scale / loop limit / cache TTL
        #[arg(long)]
        config: Option<PathBuf>,

        /// REST response cache backend
        #[arg(long, value_enum, default_value = "memory")]
        cache: CacheKind,

        /// File path for the `file` cache backend
        #[arg(long)]
        cache_path: Option<PathBuf>,

        /// Stop after validation; do not evaluate
        #[arg(long)]
        validate_only: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CacheKind {
    Memory,
    File,
    None,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { document, input, constants, config, cache, cache_path, validate_only } => {
            let outcome =
                run(&document, input.as_deref(), constants.as_deref(), config.as_deref(), cache, cache_path.as_deref(), validate_only);
            if let Err(e) = outcome {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    }
}

/// Parse, validate, and (unless `validate_only`) evaluate the document.
fn run(
    document_path: &Path,
    input_path: Option<&Path>,
    constants_path: Option<&Path>,
    config_path: Option<&Path>,
    cache_kind: CacheKind,
    cache_path: Option<&Path>,
    validate_only: bool,
) -> Result<(), String> {
    let source = std::fs::read_to_string(document_path)
        .map_err(|e| format!("failed to read '{}': {e}", document_path.display()))?;

    let doc = rules_parser::parse_document(&source)
        .map_err(|e| format!("[{}] {e} (at {:?})", e.code(), e.span))?;

    let known_functions = BuiltinFunctionRegistry::known_function_names();
    let findings = Validator::new(&doc, Some(&known_functions)).validate(&doc);
    for finding in &findings {
        eprintln!("warning: {finding}");
    }
    if validate_only {
        return Ok(());
    }

    let cli_config = match config_path {
        Some(path) => {
            let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {e}", path.display()))?;
            RulesCliConfig::from_str(&contents)?
        }
        None => RulesCliConfig::default(),
    };

    let inputs = load_json_map(input_path)?;
    let constants_table = load_json_map(constants_path)?;
    let constants_provider = StaticConstantsProvider::new(constants_table);
    let functions = BuiltinFunctionRegistry::new();
    let audit = TracingAuditSink;
    let eval_config = cli_config.eval_config();

    let result = match cache_kind {
        CacheKind::None => evaluate_document(&doc, inputs, &constants_provider, &functions, &audit, eval_config),
        CacheKind::Memory => {
            let cache = MemoryCache::new();
            let cached = CachingFunctionRegistry::new(&functions, &cache, cli_config.cache_ttl());
            evaluate_document(&doc, inputs, &constants_provider, &cached, &audit, eval_config)
        }
        CacheKind::File => {
            let path = cache_path.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("rules-cache.json"));
            let cache = FileCache::new(path);
            let cached = CachingFunctionRegistry::new(&functions, &cache, cli_config.cache_ttl());
            evaluate_document(&doc, inputs, &constants_provider, &cached, &audit, eval_config)
        }
    };

    print_result(&result);
    if !result.success {
        return Err(result.error.unwrap_or_else(|| "evaluation failed".to_string()));
    }
    Ok(())
}

fn load_json_map(path: Option<&Path>) -> Result<FxHashMap<String, Value>, String> {
    let Some(path) = path else { return Ok(FxHashMap::default()) };
    let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {e}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| format!("invalid JSON in '{}': {e}", path.display()))?;
    let object = json.as_object().ok_or_else(|| format!("'{}' must contain a JSON object at the top level", path.display()))?;
    Ok(object.iter().map(|(k, v)| (k.clone(), json_bridge::from_json(v))).collect())
}

fn print_result(result: &EvalResult) {
    println!("success: {}", result.success);
    println!("condition_result: {}", result.condition_result);
    if result.circuit_breaker_triggered {
        println!("circuit_breaker: {}", result.circuit_breaker_message.as_deref().unwrap_or(""));
    }
    if let Some(error) = &result.error {
        println!("error: {error}");
    }
    println!("execution_time_ms: {}", result.execution_time_ms);

    let mut keys: Vec<&String> = result.output_data.keys().collect();
    keys.sort();
    for key in keys {
        println!("{key} = {}", result.output_data[key]);
    }
}
