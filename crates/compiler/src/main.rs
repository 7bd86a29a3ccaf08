//! Bhasa Compiler CLI
//!
//! Command-line interface for compiling and running `.bhasa` programs.

use bhasa_compiler::{parser, CompileError, Compiler, CompilerConfig, SearchPathModuleLoader};
use bhasa_runtime::{Bytecode as RtBytecode, Vm};
use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{generate, Shell};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

/// The on-disk shape of a `--config` TOML file. Today this is the one
/// extension point `CompilerConfig` has: where `Import` should look for
/// modules beyond its own default candidates (spec §4.6).
#[derive(Debug, Default, Deserialize)]
struct BhasaConfigFile {
    #[serde(default)]
    module_search_paths: Vec<String>,
}

#[derive(ClapParser)]
#[command(name = "bhasac")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bhasa compiler - compile and run .bhasa programs", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv); also controlled by RUST_LOG
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .bhasa file to bytecode and report success/failure
    Build {
        /// Input .bhasa source file
        input: PathBuf,

        /// Path to a TOML configuration file (module search overrides)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compile and immediately execute a .bhasa file
    Run {
        /// Input .bhasa source file
        input: PathBuf,

        /// Path to a TOML configuration file (module search overrides)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Lex and parse a .bhasa file without compiling, reporting syntax errors
    Check {
        /// Input .bhasa file(s) to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { input, config } => run_build(&input, config.as_deref()),
        Commands::Run { input, config } => run_run(&input, config.as_deref()),
        Commands::Check { paths } => run_check(&paths),
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "bhasac", &mut io::stdout());
}

fn load_config(config_path: Option<&Path>) -> CompilerConfig {
    match config_path {
        None => CompilerConfig::new(),
        Some(path) => {
            let text = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config {}: {e}", path.display());
                process::exit(1);
            });
            // Only the module-loader is file-configurable today; a
            // malformed file is still a hard error so typos don't
            // silently fall back to defaults.
            let parsed: BhasaConfigFile = toml::from_str(&text).unwrap_or_else(|e| {
                eprintln!("Error parsing config {}: {e}", path.display());
                process::exit(1);
            });
            CompilerConfig::new()
                .with_module_loader(SearchPathModuleLoader::new(parsed.module_search_paths))
        }
    }
}

fn read_source(input: &Path) -> String {
    fs::read_to_string(input).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", input.display());
        process::exit(1);
    })
}

fn compile_source(source: &str, config: CompilerConfig) -> Result<RtBytecode, String> {
    let (program, errors) = parser::parse(source);
    if !errors.is_empty() {
        return Err(errors.join("; "));
    }
    let mut compiler = Compiler::with_config(config);
    compiler
        .compile(&program)
        .map_err(|e: CompileError| e.to_string())?;
    Ok(compiler.bytecode())
}

fn run_build(input: &Path, config_path: Option<&Path>) {
    let source = read_source(input);
    let config = load_config(config_path);
    match compile_source(&source, config) {
        Ok(bytecode) => {
            println!(
                "Compiled {} ({} bytes, {} constants)",
                input.display(),
                bytecode.instructions.len(),
                bytecode.constants.len()
            );
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_run(input: &Path, config_path: Option<&Path>) {
    let source = read_source(input);
    let config = load_config(config_path);
    let bytecode = match compile_source(&source, config) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let mut vm = Vm::new(bytecode);
    if let Err(e) = vm.run() {
        eprintln!("Runtime error: {e}");
        process::exit(1);
    }
}

fn run_check(paths: &[PathBuf]) {
    let mut had_errors = false;
    for path in paths {
        let source = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading {}: {e}", path.display());
                had_errors = true;
                continue;
            }
        };
        let (_, errors) = parser::parse(&source);
        if errors.is_empty() {
            println!("{}: ok", path.display());
        } else {
            had_errors = true;
            for err in &errors {
                eprintln!("{}: {err}", path.display());
            }
        }
    }
    if had_errors {
        process::exit(1);
    }
}
