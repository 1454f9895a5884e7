use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tradefunnel", about = "Four-layer trade candidate funnel with pre-execution gates")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a funnel run and print the finished run
    Run {
        /// Run type (swing, longterm)
        run_type: String,
        /// Final selection size
        #[arg(long)]
        limit: Option<usize>,
        /// Comma separated symbols to restrict the universe to
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
    },
    /// List recent runs
    Runs {
        #[arg(long = "type")]
        run_type: Option<String>,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Show one run with its candidates
    Show {
        run_id: String,
        /// Only candidates of this stage (screened, ranked, ai_evaluated, final)
        #[arg(long)]
        stage: Option<String>,
    },
    /// Trade intents for a run's final candidates
    Intents { run_id: String },
    /// Run both pre-execution gates over a trade recommendation given as JSON
    Validate { json: String },
    /// Print the current system context
    Context,
}
