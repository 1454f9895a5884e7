use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use tradefunnel::cli::commands::{Cli, Commands};
use tradefunnel::domain::entities::trade_recommendation::TradeRecommendation;
use tradefunnel::domain::values::run_type::RunType;
use tradefunnel::domain::values::stage::CandidateStage;
use tradefunnel::TradeFunnel;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = std::env::var("TRADEFUNNEL_DB").unwrap_or_else(|_| "./tradefunnel.db".into());

    let tf = match TradeFunnel::new(&db_path) {
        Ok(tf) => tf,
        Err(e) => {
            eprintln!("Error initializing tradefunnel: {e}");
            std::process::exit(1);
        }
    };

    match run_command(tf, cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Returns the process exit code; a rejected recommendation exits with 2.
async fn run_command(tf: TradeFunnel, cmd: Commands) -> Result<i32, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Run {
            run_type,
            limit,
            symbols,
        } => {
            let rt: RunType = run_type.parse().map_err(|e: String| e)?;
            let run = if symbols.is_empty() {
                tf.run_funnel(rt, None, limit).await?
            } else {
                tf.run_funnel_for_symbols(rt, &symbols, limit).await?
            };
            print_json(&run)?;
        }
        Commands::Runs { run_type, limit } => {
            let rt = run_type
                .map(|t| t.parse::<RunType>())
                .transpose()
                .map_err(|e: String| e)?;
            print_json(&tf.list_runs(rt, Some(limit))?)?;
        }
        Commands::Show { run_id, stage } => {
            let stage = stage
                .map(|s| s.parse::<CandidateStage>())
                .transpose()
                .map_err(|e: String| e)?;
            let run = tf.get_run(&run_id)?;
            let candidates = tf.run_candidates(&run_id, stage)?;
            print_json(&json!({ "run": run, "candidates": candidates }))?;
        }
        Commands::Intents { run_id } => {
            print_json(&tf.trade_intents(&run_id)?)?;
        }
        Commands::Validate { json } => {
            let rec: TradeRecommendation = serde_json::from_str(&json)?;
            let verdict = tf.evaluate_gates(&rec);
            print_json(&verdict)?;
            if !verdict.approved {
                return Ok(2);
            }
        }
        Commands::Context => {
            print_json(&tf.system_context()?)?;
        }
    }
    Ok(0)
}
