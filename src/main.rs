//! Command-line interface for xmlacorn

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::sync::Arc;

#[cfg(feature = "cli")]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(feature = "cli")]
use xmlacorn::{Class, Definitions, WriteOptions};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xmlacorn")]
#[command(author, version, about = "Schema-driven XML to object mapping tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load an XML document and print the loaded objects as JSON
    Load {
        /// Path to the JSON class definitions
        #[arg(short, long, value_name = "DEFS")]
        defs: PathBuf,

        /// Class to load the document as (defaults to the definitions' root)
        #[arg(short, long)]
        class: Option<String>,

        /// Path to the XML file to load
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Load an XML document and write it back out through the schema
    Convert {
        /// Path to the JSON class definitions
        #[arg(short, long, value_name = "DEFS")]
        defs: PathBuf,

        /// Class to load the document as (defaults to the definitions' root)
        #[arg(short, long)]
        class: Option<String>,

        /// Path to the XML file to convert
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write without indentation
        #[arg(long)]
        compact: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Load {
            defs,
            class,
            file,
            pretty,
        } => cmd_load(defs, class, file, pretty),
        Commands::Convert {
            defs,
            class,
            file,
            output,
            compact,
        } => cmd_convert(defs, class, file, output, compact),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`)
#[cfg(feature = "cli")]
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second initialization is harmless; keep the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init();
}

#[cfg(feature = "cli")]
fn select_class(defs: &Definitions, name: Option<&str>) -> Result<Arc<Class>, Box<dyn std::error::Error>> {
    let class = match name {
        Some(name) => defs.require(name)?,
        None => defs
            .root()
            .ok_or("No --class given and the definitions declare no root class")?,
    };
    Ok(Arc::clone(class))
}

#[cfg(feature = "cli")]
fn cmd_load(
    defs_path: PathBuf,
    class: Option<String>,
    file: PathBuf,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let defs = Definitions::from_file(&defs_path)?;
    let class = select_class(&defs, class.as_deref())?;

    let obj = class.from_xml(file.as_path())?;
    let json = obj.to_json();

    let json_str = if pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    println!("{}", json_str);

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_convert(
    defs_path: PathBuf,
    class: Option<String>,
    file: PathBuf,
    output: Option<PathBuf>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let defs = Definitions::from_file(&defs_path)?;
    let class = select_class(&defs, class.as_deref())?;

    let obj = class.from_xml(file.as_path())?;
    let options = if compact {
        WriteOptions::compact()
    } else {
        WriteOptions::default()
    };

    if let Some(output_path) = output {
        obj.to_xml(output_path.as_path(), &options)?;
    } else {
        let xml = obj.to_xml_string(&options)?;
        println!("{}", xml);
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
