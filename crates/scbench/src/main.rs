//! scbench command-line entry point
//!
//! - `scbench run --tool hevm [--tool halmos ...]`: run tools over the corpus
//! - `scbench cases`: list the cases discovery would produce
//! - `scbench summary [FILE]`: per-run counts and incorrect cases

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use scbench::{tool_specs, Orchestrator};
use scbench_core::discover_cases;
use scbench_store::{load_document, summarize, LATEST_JSON};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => {
            let tools = args.tools.clone();
            let config = args.into_config()?;
            let specs = tool_specs(&tools, &config);
            let orchestrator = Orchestrator::from_config(config)?;
            let outcome = orchestrator.run(&specs).await?;
            println!("{}", outcome.manifest);
        }
        Commands::Cases(args) => {
            let config = args.into_config()?;
            let cases = discover_cases(&config)?;
            for case in &cases {
                println!(
                    "{}\t{}\t{}",
                    case.id,
                    case.expected,
                    if case.legacy_harness { "ds-test" } else { "1tx-abstract" }
                );
            }
            info!("{} cases", cases.len());
        }
        Commands::Summary { file, output_dir } => {
            let path = file.unwrap_or_else(|| output_dir.join(LATEST_JSON));
            let document = load_document(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            for summary in summarize(&document) {
                println!("{summary}");
            }
        }
    }
    Ok(())
}
