//! ARIA CLI
//!
//! Parses a TOSCA or Cloudify document and hands the result to one consumer.
//! Exit status: 0 when clean, 1 when issues were collected, 2 on a fatal error.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod render;

use aria_core::{Locator, Map};
use aria_loader::{
    ComposeConfig, Decoder, FileLoader, JsonDecoder, LiteralLoader, Loader, YamlDecoder,
};
use aria_presentation::{GrammarTable, ValidateConfig};
use aria_topology::{NormalizeConfig, Pipeline, PipelineConfig};
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Locator of the document given inline with `--loader literal`
const LITERAL_URI: &str = "<literal>";

const EXIT_CLEAN: u8 = 0;
const EXIT_ISSUES: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Consumer {
    /// Report issues only
    Validate,
    /// Print the composed document
    Presentation,
    /// Print the type hierarchies
    Types,
    /// Print the normalized topology
    Topology,
    /// Print the deployment plan
    Plan,
    /// Print presentation types with their specification sections
    Spec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LoaderKind {
    /// Read from the filesystem
    File,
    /// Treat the locator argument as the document text
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DecoderKind {
    /// YAML (also reads JSON)
    Yaml,
    /// Strict JSON
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GrammarKind {
    /// Every known grammar
    Standard,
    /// TOSCA simple profile only
    Tosca,
    /// Cloudify DSL only
    Cloudify,
}

#[derive(Parser)]
#[command(name = "aria")]
#[command(about = "ARIA - TOSCA and Cloudify topology parser", long_about = None)]
struct Cli {
    /// Document path, or document text with `--loader literal`
    locator: Option<String>,
    /// What to do with the parsed document
    #[arg(short, long, value_enum, default_value_t = Consumer::Validate)]
    consumer: Consumer,
    /// Where document text comes from
    #[arg(long, value_enum, default_value_t = LoaderKind::File)]
    loader: LoaderKind,
    /// Document syntax
    #[arg(long, value_enum, default_value_t = DecoderKind::Yaml)]
    decoder: DecoderKind,
    /// Accepted grammars
    #[arg(long, value_enum, default_value_t = GrammarKind::Standard)]
    grammar: GrammarKind,
    /// Deployment input values, a YAML or JSON map
    #[arg(short, long)]
    inputs: Option<PathBuf>,
    /// Reject supplied inputs the document does not declare
    #[arg(long)]
    strict_inputs: bool,
    /// Do not follow imports
    #[arg(long)]
    no_imports: bool,
    /// Maximum import nesting depth
    #[arg(long, default_value_t = 64)]
    max_depth: usize,
    /// Do not warn about undeclared fields
    #[arg(long)]
    ignore_unknown_fields: bool,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = run(&cli).unwrap_or_else(|report| {
        eprintln!("{:?}", report);
        EXIT_FATAL
    });
    Ok(ExitCode::from(code))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "aria=debug" } else { "aria=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<u8> {
    if cli.consumer == Consumer::Spec {
        render::spec_entries();
        return Ok(EXIT_CLEAN);
    }
    let text = cli
        .locator
        .as_deref()
        .ok_or_else(|| eyre!("the {:?} consumer needs a document locator", cli.consumer))?;

    let (pipeline, locator) = match cli.loader {
        LoaderKind::File => (with_decoder(FileLoader::new(), cli.decoder), Locator::new(text)),
        LoaderKind::Literal => (
            with_decoder(
                LiteralLoader::new().with_document(LITERAL_URI, text),
                cli.decoder,
            ),
            Locator::new(LITERAL_URI),
        ),
    };
    let grammars = match cli.grammar {
        GrammarKind::Standard => GrammarTable::standard(),
        GrammarKind::Tosca => GrammarTable::tosca(),
        GrammarKind::Cloudify => GrammarTable::cloudify(),
    };
    let pipeline = pipeline.with_grammars(grammars).with_config(config(cli)?);
    tracing::debug!(consumer = ?cli.consumer, locator = %locator, "running pipeline");

    let output = pipeline.run(&locator).map_err(|err| {
        let chain = err.locator().describe();
        color_eyre::Report::new(err).wrap_err(format!("cannot parse {}", chain))
    })?;

    render::issues(&output.issues);
    let printed = match cli.consumer {
        Consumer::Validate | Consumer::Spec => true,
        Consumer::Presentation => {
            println!("{}", serde_json::to_string_pretty(&output.document.root.to_json())?);
            true
        }
        Consumer::Types => match &output.registry {
            Some(registry) => {
                print!("{}", render::type_tree(registry));
                true
            }
            None => false,
        },
        Consumer::Topology => match &output.topology {
            Some(topology) => {
                println!("{}", serde_json::to_string_pretty(topology)?);
                true
            }
            None => false,
        },
        Consumer::Plan => match output.plan() {
            Some(plan) => {
                println!("{}", plan.to_json_pretty()?);
                true
            }
            None => false,
        },
    };
    render::summary(&output, printed);

    Ok(if output.is_clean() { EXIT_CLEAN } else { EXIT_ISSUES })
}

fn with_decoder(loader: impl Loader + 'static, decoder: DecoderKind) -> Pipeline {
    match decoder {
        DecoderKind::Yaml => Pipeline::new(loader, YamlDecoder),
        DecoderKind::Json => Pipeline::new(loader, JsonDecoder),
    }
}

fn config(cli: &Cli) -> Result<PipelineConfig> {
    let inputs = match &cli.inputs {
        Some(path) => read_inputs(path)?,
        None => Map::new(),
    };
    Ok(PipelineConfig::new()
        .with_compose(
            ComposeConfig::default()
                .with_follow_imports(!cli.no_imports)
                .with_max_depth(cli.max_depth),
        )
        .with_validate(ValidateConfig::default().with_report_unknown_fields(!cli.ignore_unknown_fields))
        .with_normalize(
            NormalizeConfig::new()
                .with_inputs(inputs)
                .with_strict_inputs(cli.strict_inputs),
        ))
}

/// Read deployment inputs from a YAML or JSON map file
fn read_inputs(path: &Path) -> Result<Map> {
    let bytes = std::fs::read(path).wrap_err_with(|| format!("cannot read inputs file {}", path.display()))?;
    let value = YamlDecoder
        .decode(&bytes)
        .wrap_err_with(|| format!("cannot decode inputs file {}", path.display()))?;
    value
        .as_map()
        .cloned()
        .ok_or_else(|| eyre!("inputs file {} must hold a map, not a {}", path.display(), value.kind_name()))
}
