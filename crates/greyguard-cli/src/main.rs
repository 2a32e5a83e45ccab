use std::num::NonZeroU32;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use greyguard_api::{MatchRequest, MatcherConfig, TrialMatcherApi};
use serde_json::Value;

const CLI_CONTRACT_VERSION: &str = "cli.v1";

#[derive(Debug, Parser)]
#[command(name = "gg")]
#[command(about = "GreyGuard trial matching CLI")]
struct Cli {
    /// JSON catalog to use instead of the built-in trials.
    #[arg(long, env = "GREYGUARD_CATALOG")]
    catalog: Option<PathBuf>,

    /// Delay before answering a match, in milliseconds.
    #[arg(long, env = "GREYGUARD_LATENCY_MS", default_value_t = 0)]
    latency_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Match free-text symptoms against the catalog.
    Match(MatchArgs),
    /// Inspect the trial catalog.
    Trials {
        #[command(subcommand)]
        command: TrialsCommand,
    },
}

#[derive(Debug, Args)]
struct MatchArgs {
    #[arg(long)]
    symptoms: String,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    age: Option<NonZeroU32>,
    #[arg(long)]
    patient_id: Option<String>,
}

#[derive(Debug, Subcommand)]
enum TrialsCommand {
    /// List every trial in catalog order.
    List,
    /// Show one trial by its registry id.
    Show { trial_id: String },
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = MatcherConfig::with_latency_ms(cli.latency_ms);
    let api = TrialMatcherApi::load(cli.catalog.as_deref(), config)?;
    match cli.command {
        Command::Match(args) => run_match(&api, args),
        Command::Trials { command } => run_trials(&api, command),
    }
}

fn run_match(api: &TrialMatcherApi, args: MatchArgs) -> Result<()> {
    let latency = api.config().artificial_latency;
    if !latency.is_zero() {
        std::thread::sleep(latency);
    }
    let response = api.match_trials(MatchRequest {
        symptoms: Some(args.symptoms),
        location: args.location,
        age: args.age,
        patient_id: args.patient_id,
    })?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_trials(api: &TrialMatcherApi, command: TrialsCommand) -> Result<()> {
    match command {
        TrialsCommand::List => {
            let trials = api.list_trials();
            emit_json(serde_json::json!({
                "trial_count": trials.len(),
                "trials": trials
            }))
        }
        TrialsCommand::Show { trial_id } => {
            let listing = api.get_trial(&trial_id)?;
            emit_json(serde_json::json!({ "trial": listing }))
        }
    }
}
