// src/main.rs

use clap::Parser;
use log::LevelFilter;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use token_renamer::core::{
    BoundaryPolicy, CaseChange, ChangeCaseTransform, ConfigManagerOperations, CoreConfigManager,
    EngineConfig, RenameEngine, RenameOutcome, RenameStatus, ReplaceTextTransform,
    list_candidate_files,
};
use token_renamer::initialize_logging_with_level;

const APP_NAME: &str = "TokenRenamer";

#[derive(Parser)]
#[command(
    name = "token_renamer",
    about = "Propose and apply fragment-based renames for the files in a directory"
)]
struct Cli {
    /// Directory holding the files to rename
    directory: PathBuf,

    /// Only consider file names matching this glob (case-insensitive)
    #[arg(long)]
    pattern: Option<String>,

    /// Characters that split a file name into fragments
    #[arg(long)]
    separators: Option<String>,

    /// Always lowercase the extension in proposed names
    #[arg(long)]
    lowercase_ext: bool,

    /// Ignore discarded fragments when choosing the first and last fragment
    #[arg(long)]
    visible_boundaries: bool,

    /// Literal text to strip from every name before splitting (repeatable)
    #[arg(long = "remove", value_name = "TEXT")]
    remove: Vec<String>,

    /// Uppercase every fragment
    #[arg(long, conflicts_with_all = ["downcase", "capitalize"])]
    upcase: bool,

    /// Lowercase every fragment
    #[arg(long, conflicts_with = "capitalize")]
    downcase: bool,

    /// Capitalize the first letter of every fragment
    #[arg(long)]
    capitalize: bool,

    /// Replace text inside fragments; emptied fragments are dropped (repeatable)
    #[arg(long = "replace", value_name = "FROM=TO")]
    replace: Vec<String>,

    /// Perform the renames instead of only listing them
    #[arg(long)]
    apply: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Store the effective engine settings as the new defaults
    #[arg(long)]
    save_config: bool,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

#[derive(Serialize)]
struct ProposalReport<'a> {
    source: &'a str,
    destination: &'a str,
    changed: bool,
}

#[derive(Serialize)]
struct OutcomeReport<'a> {
    source: &'a str,
    destination: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a RenameOutcome> for OutcomeReport<'a> {
    fn from(outcome: &'a RenameOutcome) -> Self {
        let (status, error) = match &outcome.status {
            RenameStatus::Renamed => ("renamed", None),
            RenameStatus::Unchanged => ("unchanged", None),
            RenameStatus::Failed(e) => ("failed", Some(e.to_string())),
        };
        OutcomeReport {
            source: &outcome.source,
            destination: &outcome.destination,
            status,
            error,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logging_with_level(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli, config_manager: &dyn ConfigManagerOperations) -> EngineConfig {
    let mut config = match config_manager.load_engine_config(APP_NAME) {
        Ok(Some(config)) => config,
        Ok(None) => EngineConfig::default(),
        Err(e) => {
            log::warn!("Main: Could not load engine config, using defaults: {e}");
            EngineConfig::default()
        }
    };
    if let Some(separators) = &cli.separators {
        config.default_separators = separators.clone();
    }
    if cli.lowercase_ext {
        config.always_lowercase_extension = true;
    }
    if cli.visible_boundaries {
        config.boundary_policy = BoundaryPolicy::VisibleLeaves;
    }
    if !cli.remove.is_empty() {
        config.strings_to_remove = cli.remove.clone();
    }
    config
}

fn build_engine(cli: &Cli, config: EngineConfig) -> Result<RenameEngine, Box<dyn Error>> {
    let mut engine = RenameEngine::new(config);
    for pair in &cli.replace {
        let (find, replace) = pair
            .split_once('=')
            .ok_or_else(|| format!("Expected FROM=TO for --replace, got {pair:?}"))?;
        engine.add_transform(Box::new(ReplaceTextTransform::new(find, replace).discarding_empty()));
    }
    let case_change = if cli.upcase {
        Some(CaseChange::Upper)
    } else if cli.downcase {
        Some(CaseChange::Lower)
    } else if cli.capitalize {
        Some(CaseChange::CapitalizeFirst)
    } else {
        None
    };
    if let Some(mode) = case_change {
        engine.add_transform(Box::new(ChangeCaseTransform::new(mode)));
    }
    Ok(engine)
}

fn run(cli: &Cli) -> Result<ExitCode, Box<dyn Error>> {
    let config_manager = CoreConfigManager::new();
    let config = load_config(cli, &config_manager);
    if cli.save_config {
        config_manager.save_engine_config(APP_NAME, &config)?;
    }

    let mut engine = build_engine(cli, config)?;
    let names = list_candidate_files(&cli.directory, cli.pattern.as_deref())?;
    for name in &names {
        engine.select_file(name);
        let outcome = engine.apply_transforms_to_active();
        log::debug!("Main: Transforms on {name:?}: {outcome:?}.");
    }
    engine.select_file("");

    if !cli.apply {
        print_proposals(cli, &engine)?;
        return Ok(ExitCode::SUCCESS);
    }

    if !engine.has_files_to_rename() && !cli.json {
        println!("Nothing to rename.");
    }
    let outcomes = engine.rename_all(&cli.directory);
    print_outcomes(cli, &outcomes)?;

    let failed = outcomes
        .iter()
        .any(|o| matches!(o.status, RenameStatus::Failed(_)));
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_proposals(cli: &Cli, engine: &RenameEngine) -> Result<(), Box<dyn Error>> {
    let proposals = engine.cache().proposals();
    if cli.json {
        let reports: Vec<ProposalReport> = proposals
            .iter()
            .map(|(source, destination)| ProposalReport {
                source,
                destination,
                changed: source != destination,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    for (source, destination) in &proposals {
        if source == destination {
            println!("  {source}");
        } else {
            println!("* {source} -> {destination}");
        }
    }
    Ok(())
}

fn print_outcomes(cli: &Cli, outcomes: &[RenameOutcome]) -> Result<(), Box<dyn Error>> {
    if cli.json {
        let reports: Vec<OutcomeReport> = outcomes.iter().map(OutcomeReport::from).collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    for outcome in outcomes {
        match &outcome.status {
            RenameStatus::Renamed => {
                println!("renamed   {} -> {}", outcome.source, outcome.destination)
            }
            RenameStatus::Unchanged => println!("unchanged {}", outcome.source),
            RenameStatus::Failed(e) => println!("failed    {}: {e}", outcome.source),
        }
    }
    Ok(())
}
