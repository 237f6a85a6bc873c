//! Oak translator - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oak::backends::{ClangToolchain, Toolchain};
use oak::util::config::{load_project_config, CONFIG_FILE_NAME};
use oak::util::logger;
use oak::{TranslateError, Translator, NAME, VERSION};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

/// Translate Oak source files into C
#[derive(Parser, Debug)]
#[command(name = "oak")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate source files into one C unit
    Translate {
        /// Source files, translated in order
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Write the C unit here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Extra dialect files to load first
        #[arg(short = 'D', long = "dialect", value_name = "FILE")]
        dialects: Vec<PathBuf>,

        /// Project configuration file
        #[arg(long, value_name = "FILE", default_value = CONFIG_FILE_NAME)]
        config: PathBuf,

        /// Start without the built-in operators
        #[arg(long)]
        no_prelude: bool,

        /// Print the translation state as JSON instead of C
        #[arg(long)]
        dump: bool,

        /// Hand the unit to the configured C compiler
        #[arg(long)]
        compile: bool,
    },

    /// Print version information
    Version,
}

fn main() {
    let args = Args::parse();
    logger::init_cli(args.verbose);

    if let Err(error) = run(args) {
        match error.downcast_ref::<TranslateError>() {
            Some(error) => report(error),
            None => eprintln!("{} {:#}", "error:".red().bold(), error),
        }
        std::process::exit(2);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Translate {
            files,
            output,
            dialects,
            config,
            no_prelude,
            dump,
            compile,
        } => {
            let mut config = load_project_config(&config)
                .with_context(|| format!("failed to load '{}'", config.display()))?;
            config.dialects.extend(dialects);
            if no_prelude {
                config.prelude = false;
            }
            let toolchain = ClangToolchain::new(config.toolchain.clone());

            let mut translator = Translator::new(config)?;
            for file in &files {
                translator.translate_file(file)?;
            }

            if dump {
                println!("{}", translator.dump()?);
                return Ok(());
            }

            let unit = translator.finish();
            if compile {
                let name = unit_name(output.as_deref().or(files.first().map(PathBuf::as_path)));
                let binary = toolchain.compile(&unit, &name, translator.links())?;
                if args.verbose {
                    eprintln!("built {}", binary.display());
                }
                return Ok(());
            }

            match output {
                Some(path) => std::fs::write(&path, unit)
                    .with_context(|| format!("failed to write '{}'", path.display()))?,
                None => print!("{}", unit),
            }
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }
    Ok(())
}

fn unit_name(path: Option<&Path>) -> String {
    path.and_then(Path::file_stem)
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "a".to_string())
}

/// `file:line` header, the message, then the offending statement
fn report(error: &TranslateError) {
    match error.location() {
        Some(location) if !location.is_dummy() => {
            eprintln!("{} {}", location.to_string().red().bold(), error);
            if let Some(code) = &location.code {
                eprintln!("    {}", code.magenta());
            }
        }
        _ => eprintln!("{} {}", "error:".red().bold(), error),
    }
}
