//! symcheckctl - interactive symptom checker
//!
//! Asks the most informative yes/no questions about symptoms, then reviews
//! the remaining candidate conditions one by one.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;

use symcheck_common::config::{config_path, SymcheckConfig};
use symcheck_common::{ExclusionPolicy, NavigatorSettings, ReferenceSource};
use symcheckctl::commands::{self, Collaborators};
use symcheckctl::{errors, logging};

// Version is embedded at build time
const VERSION: &str = env!("SYMCHECK_VERSION");

#[derive(Parser)]
#[command(name = "symcheckctl")]
#[command(about = "Symcheck - interactive symptom checker", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Configuration file (default: $SYMCHECK_CONFIG or the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the built-in demo graph instead of DBpedia
    #[arg(long, global = true)]
    offline_demo: bool,

    /// SPARQL endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Use the chat assistant during the plausibility check
    #[arg(long, global = true, conflicts_with = "no_assistant")]
    assistant: bool,

    /// Never use the chat assistant
    #[arg(long, global = true)]
    no_assistant: bool,

    /// How a "no" answer affects diseases listing the symptom (eliminate, filter-only)
    #[arg(long, global = true)]
    policy: Option<ExclusionPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive symptom check
    Check {
        /// Symptom to report up front (repeatable)
        #[arg(long = "symptom")]
        symptoms: Vec<String>,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List symptoms that occur together with the given ones
    Symptoms {
        /// Only labels containing this text
        #[arg(long)]
        search: Option<String>,

        /// Symptom already present (repeatable)
        #[arg(long)]
        given: Vec<String>,
    },

    /// Rank open symptoms by how well they split the candidates
    Rank {
        /// Symptom present (repeatable)
        #[arg(long, required = true)]
        given: Vec<String>,

        /// Symptom absent (repeatable)
        #[arg(long)]
        not: Vec<String>,
    },

    /// Show the effective configuration
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}  {:#}", "✗".bright_red(), e);
            errors::exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let path = cli.config.clone().unwrap_or_else(config_path);

    if let Commands::Config { init } = cli.command {
        logging::init("warn", cli.verbose);
        return commands::config(&path, init, &mut io::stdout());
    }

    let mut config = SymcheckConfig::load(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    logging::init(&config.log.level, cli.verbose);
    apply_overrides(&mut config, &cli);

    let collab = if cli.offline_demo {
        // Demo articles are keyed by Wikipedia page id
        config.reference.source = ReferenceSource::Wikipedia;
        Collaborators::offline_demo(&config)
    } else {
        Collaborators::online(&config)?
    };
    let settings = NavigatorSettings::from_config(&config);

    match cli.command {
        Commands::Check { symptoms, json } => commands::check(&collab, settings, &symptoms, json),
        Commands::Symptoms { search, given } => {
            commands::symptoms(&collab, settings, search.as_deref(), &given, &mut io::stdout())
        }
        Commands::Rank { given, not } => {
            commands::rank_symptoms(&collab, &settings, &given, &not, &mut io::stdout())
        }
        Commands::Config { .. } => Ok(errors::EXIT_SUCCESS),
    }
}

fn apply_overrides(config: &mut SymcheckConfig, cli: &Cli) {
    if let Some(endpoint) = &cli.endpoint {
        config.graph.endpoint = endpoint.clone();
    }
    if cli.assistant {
        config.assistant.enabled = true;
    }
    if cli.no_assistant {
        config.assistant.enabled = false;
    }
    if let Some(policy) = cli.policy {
        config.engine.exclusion_policy = policy;
    }
}
