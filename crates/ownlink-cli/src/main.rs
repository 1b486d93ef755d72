mod error;

use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::LevelFilter;
use ownlink::{builtin_manifest, library_display_name, BindingConfig, Bindings, DynamicLibrary, Manifest};

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "ownlink")]
#[command(about = "Inspect and exercise native libraries through ownlink bindings", long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// Native library to open with the builtin manifest
    #[arg(short, long, global = true, value_name = "PATH", conflicts_with = "config")]
    library: Option<PathBuf>,

    /// Configuration file (defaults to the nearest ownlink.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Show the library's metadata
    Info,

    /// List declared symbols and whether the library exports them
    Symbols,

    /// Round-trip text through a native string
    Echo {
        /// Text to send
        #[arg(value_name = "TEXT")]
        text: String,
        /// Text to push onto the native string before reading it back
        #[arg(short, long, value_name = "TEXT")]
        append: Vec<String>,
    },
}

/// Where the library comes from and what to resolve in it.
struct Target {
    path: PathBuf,
    name: String,
    manifest: Manifest,
    log_level: Option<LevelFilter>,
}

impl Target {
    fn locate(args: &Args) -> Result<Self, CliError> {
        if let Some(path) = &args.library {
            let name = library_display_name(path);
            return Ok(Self { path: path.clone(), name, manifest: builtin_manifest(), log_level: None });
        }

        let config = match &args.config {
            Some(file) => BindingConfig::load(file),
            None => {
                let cwd = std::env::current_dir().map_err(|e| CliError::NoLibrary { source: e.into() })?;
                BindingConfig::find(&cwd)
            }
        }
        .map_err(|source| CliError::NoLibrary { source })?;

        Ok(Self {
            path: config.library_path(),
            name: config.library_name(),
            manifest: config.manifest(),
            log_level: config.log.level.parse().ok(),
        })
    }

    fn open(self) -> Result<Bindings, CliError> {
        let library = DynamicLibrary::open_named(self.path.clone(), self.name, self.manifest)
            .map_err(|source| CliError::LoadError { path: self.path, source })?;
        Ok(Bindings::new(std::rc::Rc::new(library)))
    }
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    let target = Target::locate(&args)?;

    let level = args.verbose.log_level_filter().max(target.log_level.unwrap_or(LevelFilter::Off));
    env_logger::Builder::new().filter_level(level).parse_default_env().init();

    run(args.command, target)?;
    Ok(())
}

fn run(command: Command, target: Target) -> Result<(), CliError> {
    match command {
        Command::Info => {
            let bindings = target.open()?;
            let metadata = bindings.metadata()?;
            println!("library:   {}", metadata.lib_name);
            println!("version:   {}", metadata.lib_version);
            println!("rust:      {}", metadata.rust_version);
            println!("toolchain: {}", metadata.rust_toolchain);
            println!("symbols:   {}", bindings.table().manifest().len());
            Ok(())
        }
        Command::Symbols => {
            let probed = DynamicLibrary::probe(&target.path, &target.manifest)
                .map_err(|source| CliError::LoadError { path: target.path.clone(), source })?;
            let missing = probed.iter().filter(|(_, found)| !found).count();
            for (entry, found) in &probed {
                let status = if *found { "ok" } else { "missing" };
                println!("{:<8} {} {}", status, entry.name(), entry.signature());
            }
            println!("{} declared, {} missing", probed.len(), missing);
            Ok(())
        }
        Command::Echo { text, append } => {
            let bindings = target.open()?;
            let string = bindings.string(&text)?;
            for suffix in &append {
                string.push_str(suffix)?;
            }
            println!("{}", string.read()?);
            Ok(())
        }
    }
}
