//! redo: run do-files to build targets.
//!
//! Each target is resolved to its most specific do-file, the script is run
//! with the redo argument contract, and its output is committed atomically.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use redo::build::{BuildContext, BuildOutcome, build};
use redo::error::{BuildError, ErrorKind};
use redo::exit_codes;
use redo::io::config::{config_path, find_root, init_project, load_config};
use redo::io::dofile::resolve;
use redo::io::shell::ShellRunner;
use redo::target::Target;

#[derive(Parser)]
#[command(name = "redo", version, about = "Build targets with do-file scripts")]
struct Cli {
    /// Log each target as it is built and show full shell commands on failure.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Extra flag for the do-file shell, e.g. `x` to trace commands.
    #[arg(
        short = 'x',
        long,
        global = true,
        value_name = "FLAG",
        allow_hyphen_values = true
    )]
    shell_args: Option<String>,

    /// Project root (defaults to the nearest directory containing `.redo/`).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.redo/config.toml` in the current directory (or `--root`).
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Build targets in order, stopping at the first failure.
    Build {
        #[arg(default_value = "all")]
        targets: Vec<PathBuf>,
    },
    /// Print the do-file candidates probed for a target, then the one chosen.
    Whichdo { target: PathBuf },
}

fn main() {
    let cli = Cli::parse();
    redo::logging::init(cli.verbose);
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("redo: {:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Command::Init { force } => cmd_init(cli.root.as_deref(), *force),
        Command::Build { targets } => cmd_build(&cli, targets),
        Command::Whichdo { target } => cmd_whichdo(&cli, target),
    }
}

fn cmd_init(root: Option<&Path>, force: bool) -> Result<i32> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().context("read current directory")?,
    };
    let path = init_project(&root, force)?;
    println!("{}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_build(cli: &Cli, targets: &[PathBuf]) -> Result<i32> {
    let root = project_root(cli)?;
    let mut config = load_config(&config_path(&root))?;
    if cli.verbose {
        config.verbose = true;
    }
    if cli.shell_args.is_some() {
        config.shell_args = cli.shell_args.clone();
    }
    config.validate()?;

    let ctx = BuildContext::from_env(config);
    for path in targets {
        let target = Target::new(path, &root)?;
        let report = build(&target, &ctx, &ShellRunner)?;
        if report.outcome == BuildOutcome::Source {
            tracing::debug!(target = %target, "source file, nothing to build");
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_whichdo(cli: &Cli, path: &Path) -> Result<i32> {
    let root = project_root(cli)?;
    let target = Target::new(path, &root)?;
    let dofile = resolve(&target)?;
    for missing in &dofile.missing {
        println!("- {}", target.rel(missing).display());
    }
    if !dofile.is_found() {
        return Ok(exit_codes::NO_DOFILE);
    }
    println!("{}", target.rel(&dofile.path()).display());
    Ok(exit_codes::OK)
}

fn project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.root {
        Some(root) => {
            if !root.is_dir() {
                return Err(anyhow!("root {} is not a directory", root.display()));
            }
            Ok(root.clone())
        }
        None => {
            let cwd = std::env::current_dir().context("read current directory")?;
            find_root(&cwd)
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<BuildError>().map(BuildError::kind) {
        Some(ErrorKind::NoDoFile) => exit_codes::NO_DOFILE,
        Some(_) => exit_codes::FAILED,
        None => exit_codes::INVALID,
    }
}
