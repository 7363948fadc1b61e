//! `phannot` command-line tool.
//!
//! Prints docblock annotations as JSON, either for a single docblock or
//! for classes found in a PHP project.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use phannot::{
    Adapter, AnnotationsError, AnnotationsFactory, PhpReader, Reader, Result, SourceIndex,
    parse_docblock,
};

#[derive(Parser)]
#[command(name = "phannot", version, about = "Read annotations from PHP docblocks")]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one docblock and print its annotation nodes
    Parse {
        /// Docblock text, including the /** */ markers
        docblock: String,
        /// File label recorded on each node
        #[arg(long)]
        file: Option<String>,
        /// Line the docblock starts on
        #[arg(long)]
        line: Option<u32>,
    },
    /// Print the annotations of one class
    Class {
        /// Fully-qualified class name
        class: String,
        /// Project root holding composer.json
        #[arg(long, short, default_value = ".")]
        workspace: PathBuf,
        /// TOML file selecting the cache adapter
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// Index every PHP file under a directory and print all annotations
    Scan {
        /// Directory to walk
        dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Parse {
            docblock,
            file,
            line,
        } => handle_parse(&docblock, file.as_deref(), line),
        Commands::Class {
            class,
            workspace,
            config,
        } => handle_class(&class, &workspace, config.as_deref()),
        Commands::Scan { dir } => handle_scan(&dir),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "phannot=debug" } else { "phannot=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_parse(docblock: &str, file: Option<&str>, line: Option<u32>) -> Result<()> {
    let nodes = parse_docblock(docblock, file, line)?;
    print_json(&nodes)
}

fn handle_class(class: &str, workspace: &Path, config: Option<&Path>) -> Result<()> {
    let mut adapter = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| AnnotationsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            AnnotationsFactory::new().load_toml(&text)?
        }
        None => Adapter::memory(),
    };
    adapter.set_reader(PhpReader::for_workspace(workspace));

    let reflection = adapter.get(class)?;
    print_json(reflection.reflection_data())
}

fn handle_scan(dir: &Path) -> Result<()> {
    let index = SourceIndex::new();
    let count = index.scan_directory(dir)?;
    tracing::info!("indexed {} class-likes under {}", count, dir.display());

    let reader = PhpReader::new(index);
    let mut output = Map::new();
    for name in reader.source().class_names() {
        match reader.parse(&name) {
            Ok(data) if data.is_empty() => {}
            Ok(data) => {
                output.insert(name, serde_json::to_value(&data)?);
            }
            Err(e) => warn!("skipping {}: {}", name, e),
        }
    }
    print_json(&Value::Object(output))
}
