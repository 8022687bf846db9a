mod case;
mod cli;
mod engine;
mod fixture_io;
mod quality;

use cli::{CliError, CliOptions};
use engine::run_eval;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("llm_eval=info,shared=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = match CliOptions::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(CliError::HelpRequested) => {
            print_usage();
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(err) = shared::config::load_dotenv() {
        eprintln!("failed to read .env: {err}");
        std::process::exit(2);
    }

    match run_eval(&options).await {
        Ok(summary) => {
            summary.print();
            if summary.has_failures() {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("failed to run llm eval harness: {err}");
            std::process::exit(2);
        }
    }
}

fn print_usage() {
    eprintln!(
        "Usage: cargo run -p llm-eval -- [--mode mocked|live] [--case <case_id>]\n\
         \n\
         Modes:\n\
         - mocked (default): fixture outputs replayed through the dialog and synthesis services\n\
         - live: cases with include_in_live_smoke=true sent to the configured OpenAI endpoint\n\
         \n\
         Options:\n\
         - --case <case_id>  Run a single fixture\n\
         - --help            Show this help text"
    );
}
