//! Main CLI application for the Cosmic Express theory engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cosmic_express_theory::{
    config::{CliOverrides, OutputFormat, Settings, SolverBackend},
    level::{create_example_levels, io::load_levels_from_directory, load_level_from_file},
    theory::CosmicExpressTheory,
    utils::{ColorOutput, SolutionFormatter},
    LevelDescription, TheoryError,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cosmic_express")]
#[command(about = "Cosmic Express level theory: satisfiability, counting and likelihood")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config/default.yaml")]
    config: PathBuf,

    /// SAT backend (overrides config)
    #[arg(long, global = true)]
    backend: Option<BackendArg>,

    /// Maximum models enumerated while counting (overrides config)
    #[arg(long, global = true)]
    enumeration_limit: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Cadical,
    Varisat,
}

impl From<BackendArg> for SolverBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Cadical => SolverBackend::Cadical,
            BackendArg::Varisat => SolverBackend::Varisat,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check satisfiability, count solutions and show one
    Solve {
        /// Level file (overrides config)
        #[arg(short, long)]
        level: Option<PathBuf>,

        /// Also enumerate up to N models (the configured maximum when N is omitted)
        #[arg(short, long)]
        models: Option<Option<usize>>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the exact number of solutions
    Count {
        /// Level file (overrides config)
        #[arg(short, long)]
        level: Option<PathBuf>,
    },

    /// Conditional likelihood of literals such as `after:0@1,0` or `~rail_out:E@2,1`
    Likelihood {
        /// Level file (overrides config)
        #[arg(short, long)]
        level: Option<PathBuf>,

        /// Literal to evaluate (repeatable)
        #[arg(short = 'L', long = "literal", required = true)]
        literals: Vec<String>,
    },

    /// Create example configuration and level files
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },

    /// Analyze every level file in a directory
    Batch {
        /// Directory containing level files
        #[arg(short, long)]
        directory: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level_override = match &cli.command {
        Commands::Solve { level, .. } | Commands::Count { level } | Commands::Likelihood { level, .. } => level.clone(),
        _ => None,
    };
    let json = matches!(cli.command, Commands::Solve { json: true, .. });

    let settings = load_settings(
        &cli.config,
        &CliOverrides {
            backend: cli.backend.map(SolverBackend::from),
            enumeration_limit: cli.enumeration_limit,
            level_file: level_override,
            max_models: None,
            json,
            verbose: cli.verbose,
        },
    )?;
    init_logging(&settings.logging.level);

    match cli.command {
        Commands::Solve { models, .. } => solve_command(&settings, models),
        Commands::Count { .. } => count_command(&settings),
        Commands::Likelihood { literals, .. } => likelihood_command(&settings, &literals),
        Commands::Setup { directory, force } => setup_command(directory, force),
        Commands::Batch { directory } => batch_command(&settings, &directory),
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // a second initialisation (tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn load_settings(config_path: &Path, overrides: &CliOverrides) -> Result<Settings> {
    let mut settings = if config_path.exists() {
        Settings::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        Settings::default()
    };

    settings.merge_with_cli(overrides);
    settings.validate()
        .context("Configuration validation failed")?;
    Ok(settings)
}

fn build_theory(settings: &Settings) -> Result<CosmicExpressTheory> {
    let level = load_level_from_file(&settings.input.level_file)
        .with_context(|| format!("Failed to load level {}", settings.input.level_file.display()))?;

    let theory = CosmicExpressTheory::new(level, settings)
        .context("Failed to build theory")?;
    tracing::debug!("{}", theory.statistics());
    Ok(theory)
}

#[derive(Serialize)]
struct SolveReport {
    satisfiable: bool,
    count: u128,
    solution: Option<cosmic_express_theory::Solution>,
    models: Vec<Vec<String>>,
}

fn solve_command(settings: &Settings, models: Option<Option<usize>>) -> Result<()> {
    let start_time = Instant::now();
    let theory = build_theory(settings)?;

    let satisfiable = theory.is_satisfiable()?;
    let count = theory.count_solutions(&[])?;
    let solution = if satisfiable { Some(theory.solve()?) } else { None };

    let mut listed = Vec::new();
    if let Some(limit) = models {
        let limit = limit.unwrap_or(settings.output.max_models);
        for model in theory.models()?.take(limit) {
            let model = model?;
            listed.push(model.true_propositions().map(|p| p.to_string()).collect::<Vec<_>>());
        }
    }

    if settings.output.format == OutputFormat::Json {
        let report = SolveReport { satisfiable, count, solution, models: listed };
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
        return Ok(());
    }

    println!("{}", SolutionFormatter::format_level(theory.level()));

    match &solution {
        Some(solution) => {
            println!("{}", ColorOutput::success(&format!(
                "✅ Satisfiable: {} solution(s) in {:.3}s",
                count,
                start_time.elapsed().as_secs_f64()
            )));
            println!("\n{}", SolutionFormatter::format_solution(theory.level(), solution));
            if settings.logging.level == "debug" {
                println!("{}", SolutionFormatter::format_groups(solution));
            }
        }
        None => {
            println!("{}", ColorOutput::warning("❌ Unsatisfiable: no valid rail layout"));
        }
    }

    for (i, model) in listed.iter().enumerate() {
        println!("{}", ColorOutput::info(&format!("Model {}:", i + 1)));
        println!("  {}", model.join(" "));
    }

    Ok(())
}

fn count_command(settings: &Settings) -> Result<()> {
    let theory = build_theory(settings)?;
    let count = theory.count_solutions(&[])?;
    println!("{count}");
    Ok(())
}

fn likelihood_command(settings: &Settings, literals: &[String]) -> Result<()> {
    let theory = build_theory(settings)?;

    if !theory.is_satisfiable()? {
        println!("{}", ColorOutput::warning("❌ Unsatisfiable: likelihoods are undefined"));
        return Err(TheoryError::DivideByZeroLikelihood.into());
    }

    for text in literals {
        let literal = theory.parse_literal(text)
            .with_context(|| format!("Invalid literal '{text}'"))?;
        let likelihood = theory.likelihood(&literal)?;
        println!("{text}: {likelihood:.4}");
    }

    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("🛠️  Setting up project structure..."));

    let config_dir = directory.join("config");
    let levels_dir = directory.join("levels");

    for dir in [&config_dir, &levels_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        let mut default_settings = Settings::default();
        default_settings.input.level_file = levels_dir.join("straight.yaml");
        default_settings.to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    create_example_levels(&levels_dir)
        .context("Failed to create example levels")?;
    println!("Created example levels in: {}", levels_dir.display());

    println!("\n{}", ColorOutput::success("✅ Setup complete!"));
    println!("\nNext steps:");
    println!("1. Edit {}", config_path.display());
    println!("2. Run: cargo run -- solve --level {}", levels_dir.join("delivery.yaml").display());

    Ok(())
}

/// Outcome of analysing one level in a batch
struct BatchEntry {
    name: String,
    outcome: Result<(bool, u128)>,
}

fn analyze_level(level: LevelDescription, settings: &Settings) -> Result<(bool, u128)> {
    let theory = CosmicExpressTheory::new(level, settings)?;
    let satisfiable = theory.is_satisfiable()?;
    let count = theory.count_solutions(&[])?;
    Ok((satisfiable, count))
}

fn batch_command(settings: &Settings, directory: &Path) -> Result<()> {
    let levels = load_levels_from_directory(directory)?;
    println!("{}", ColorOutput::info(&format!("Analyzing {} level(s)...", levels.len())));

    // every level gets its own theory instance
    let entries: Vec<BatchEntry> = levels
        .into_par_iter()
        .map(|(name, level)| BatchEntry {
            name,
            outcome: analyze_level(level, settings),
        })
        .collect();

    println!("Level            | Satisfiable | Solutions");
    println!("-----------------|-------------|----------");
    for entry in &entries {
        match &entry.outcome {
            Ok((satisfiable, count)) => {
                println!("{:16} | {:11} | {}", entry.name, satisfiable, count);
            }
            Err(e) => {
                println!("{:16} | {}", entry.name, ColorOutput::error(&format!("error: {e:#}")));
            }
        }
    }

    Ok(())
}
