//! `seeder`: apply ordered data seed steps exactly once.
//!
//! Reads step definitions from the configured directory, records completed
//! steps in a JSON state file and hands items to the built-in catalog.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use seeder::core::hash::{ContentHasher, Sha256Hasher};
use seeder::io::config::{CONFIG_FILE, SeederConfig, load_config, write_config};
use seeder::io::repository::JsonFileRepository;
use seeder::io::source::DirectorySource;
use seeder::{IgnoreSettings, SeedError, SeedRunner};
use seeder_cli::catalog::catalog_registry;
use seeder_cli::{exit_codes, render};

#[derive(Parser)]
#[command(
    name = "seeder",
    version,
    about = "Apply ordered data seed steps exactly once"
)]
struct Cli {
    /// Config file. Relative paths inside it resolve against its directory.
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Directory the built-in catalog writes seeded items to.
    #[arg(long, global = true, default_value = "seed-out")]
    out: PathBuf,

    /// Print results as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy, Default)]
struct IgnoreArgs {
    /// Accept steps whose definition changed after they ran.
    #[arg(long)]
    ignore_hash_mismatch: bool,

    /// Accept unexecuted steps ordered before a completed one.
    #[arg(long)]
    ignore_out_of_order: bool,
}

impl From<IgnoreArgs> for IgnoreSettings {
    fn from(args: IgnoreArgs) -> Self {
        IgnoreSettings {
            hash_mismatch: args.ignore_hash_mismatch,
            out_of_order: args.ignore_out_of_order,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config file and create its definitions directory.
    Init,
    /// Show every step with its status.
    Status,
    /// Validate definitions against recorded state without executing.
    Validate {
        /// Only fail on violations involving this step.
        #[arg(long)]
        order: Option<i64>,
        #[command(flatten)]
        ignore: IgnoreArgs,
    },
    /// Execute every due step in order.
    Run,
    /// Execute a single step.
    RunStep {
        order: i64,
        #[command(flatten)]
        ignore: IgnoreArgs,
    },
    /// Print the content hash of a definition file.
    Hash { file: PathBuf },
}

type Runner = SeedRunner<DirectorySource, JsonFileRepository>;

fn main() {
    seeder::logging::init();
    let cli = Cli::parse();
    let code = match dispatch(&cli) {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            report(&err, cli.json);
            exit_codes::for_error(&err)
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: &Cli) -> Result<(), SeedError> {
    match &cli.command {
        Command::Init => {
            let config = init_project(&cli.config)?;
            let written = json!({
                "config": cli.config.display().to_string(),
                "definitions": config.definitions_dir.display().to_string(),
            });
            emit(cli.json, &written, || format!("wrote {}\n", cli.config.display()))
        }
        Command::Status => {
            let summaries = build_runner(cli)?.step_summaries()?;
            emit(cli.json, &summaries, || render::summaries(&summaries))
        }
        Command::Validate { order, ignore } => {
            let runner = build_runner(cli)?;
            match order {
                Some(order) => runner.validate_step(*order, (*ignore).into())?,
                None => runner.validate_steps((*ignore).into())?,
            }
            emit(cli.json, &json!({ "valid": true }), || "valid\n".to_string())
        }
        Command::Run => {
            let executed = build_runner(cli)?.run()?;
            emit(cli.json, &executed, || render::summaries(&executed))
        }
        Command::RunStep { order, ignore } => {
            let summary = build_runner(cli)?.run_step(*order, (*ignore).into())?;
            let rows = [summary];
            emit(cli.json, &rows[0], || render::summaries(&rows))
        }
        Command::Hash { file } => {
            let hash = hash_file(file)?;
            emit(
                cli.json,
                &json!({ "file": file.display().to_string(), "hash": hash }),
                || format!("{hash}\n"),
            )
        }
    }
}

fn build_runner(cli: &Cli) -> Result<Runner, SeedError> {
    let config: SeederConfig = load_config(&cli.config)?;
    debug!(
        definitions = %config.definitions_dir.display(),
        state = %config.state_path.display(),
        out = %cli.out.display(),
        "configured"
    );
    Ok(SeedRunner::new(
        DirectorySource::with_extension(&config.definitions_dir, &config.extension),
        JsonFileRepository::new(&config.state_path),
        catalog_registry(&cli.out),
    ))
}

/// Refuses to overwrite an existing config.
fn init_project(path: &Path) -> anyhow::Result<SeederConfig> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    let config = SeederConfig::default();
    write_config(path, &config)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let config = config.resolve(base);
    fs::create_dir_all(&config.definitions_dir)
        .with_context(|| format!("create {}", config.definitions_dir.display()))?;
    debug!(config = %path.display(), "initialized seed project");
    Ok(config)
}

fn hash_file(path: &Path) -> anyhow::Result<String> {
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(Sha256Hasher.hash(&content))
}

fn emit<T: Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<(), SeedError> {
    if json {
        let payload = serde_json::to_string_pretty(value).context("serialize output")?;
        println!("{payload}");
    } else {
        print!("{}", text());
    }
    Ok(())
}

fn report(err: &SeedError, json: bool) {
    if let Some(violations) = err.violations() {
        if json {
            match serde_json::to_string_pretty(violations) {
                Ok(payload) => println!("{payload}"),
                Err(ser) => eprintln!("error: serialize violations: {ser}"),
            }
        } else {
            eprintln!("rejected:");
            eprint!("{}", render::violations(violations));
        }
        return;
    }
    eprintln!("error: {err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}
