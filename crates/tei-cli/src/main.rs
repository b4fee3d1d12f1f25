//! # tei-cli
//!
//! Command-line front end for the TEI editor schema compiler.
//!
//! `teic compile` turns a directory of ODD spec files and an element
//! classification into a schema description; `teic content` prints the
//! resolved content model of a single spec.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tei_schema::{AuxTables, Classification, CompilerConfig, SchemaCompiler};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "teic")]
#[command(about = "TEI ODD to editor schema compiler")]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile spec files into a schema description
    Compile {
        /// Directory holding one <ident>.xml file per spec
        #[arg(short, long)]
        specs: PathBuf,

        /// Element classification (JSON or YAML)
        #[arg(short = 'C', long)]
        classification: PathBuf,

        /// Icon table (JSON or YAML)
        #[arg(long)]
        icons: Option<PathBuf>,

        /// Default child node table (JSON or YAML)
        #[arg(long)]
        default_nodes: Option<PathBuf>,

        /// Compiler configuration (JSON or YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file; stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Print the resolved content model of one spec
    Content {
        /// Directory holding one <ident>.xml file per spec
        #[arg(short, long)]
        specs: PathBuf,

        /// Spec ident
        ident: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compile {
            specs,
            classification,
            icons,
            default_nodes,
            config,
            output,
            format,
        } => {
            let config = match config {
                Some(path) => CompilerConfig::load_from_file(&path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None => CompilerConfig::default(),
            };
            let classification = Classification::load_from_file(&classification)
                .with_context(|| format!("reading classification {}", classification.display()))?;

            let mut aux = AuxTables::new();
            if let Some(path) = icons {
                aux = aux.load_icons(&path)?;
            }
            if let Some(path) = default_nodes {
                aux = aux.load_default_nodes(&path)?;
            }

            let schema = SchemaCompiler::new(config).compile(&specs, &classification, &aux)?;
            let rendered = match format {
                Format::Json => schema.to_json()?,
                Format::Yaml => schema.to_yaml()?,
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(
                        "Wrote {} elements and {} attributes to {}",
                        schema.elements.len(),
                        schema.attrs.len(),
                        path.display()
                    );
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Content { specs, ident } => {
            let table = tei_odd::load(&specs, [ident.as_str()])?;
            let spec = table
                .get(&ident)
                .with_context(|| format!("'{ident}' is not defined in its spec file"))?;
            let content = spec.content().map(|c| c.encode()).unwrap_or_default();
            println!(
                "{}",
                serde_json::json!({
                    "ident": ident,
                    "kind": spec.kind_name(),
                    "content": content,
                })
            );
        }
    }

    Ok(())
}
