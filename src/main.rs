use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use polybind::{BindingConfig, FsSink, Generator, Invocation};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory of C++ headers
    input: PathBuf,
    /// Module name
    prefix: String,
    /// Header included by the generated entry point
    main_include: String,
    /// Name of the registration table variable
    lib_small_name: String,
    /// Lua table the glue is registered in
    lib_name: String,
    /// Output directory for the module index
    api_path: PathBuf,
    /// Output directory for class wrappers
    api_class_path: PathBuf,
    /// Output directory for generated headers
    include_path: PathBuf,
    /// Output directory for the generated source
    source_path: PathBuf,
    /// Class list file(s), comma separated, owned by this module
    manifest: Option<String>,

    /// TOML file overriding the default policy lists
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enables debug output; repeat for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
}

impl Cli {
    fn invocation(&self) -> Invocation {
        Invocation {
            input: self.input.clone(),
            prefix: self.prefix.clone(),
            main_include: self.main_include.clone(),
            lib_small_name: self.lib_small_name.clone(),
            lib_name: self.lib_name.clone(),
            api_path: self.api_path.clone(),
            api_class_path: self.api_class_path.clone(),
            include_path: self.include_path.clone(),
            source_path: self.source_path.clone(),
            manifest: self.manifest.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.debug {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let generator = match &cli.config {
        Some(path) => Generator::from_config_file(path)?,
        None => Generator::new(BindingConfig::default()),
    };

    let invocation = cli.invocation();
    let report = generator
        .run(&invocation, FsSink::new())
        .with_context(|| format!("generating module {}", invocation.prefix))?;

    info!(
        classes = report.bound.len(),
        files = report.written.len(),
        "wrote bindings for {}",
        invocation.prefix
    );
    Ok(())
}
