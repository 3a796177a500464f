use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use settle_rs::settle::batch::{self, BatchMode};
use settle_rs::settle::config::WaitLoader;
use settle_rs::settle::fetchers::AnyFetcher;
use settle_rs::wait::condition::{CompiledConditions, Evaluation};
use settle_rs::wait::{ConditionWaiter, ResourceSnapshot, WaitSettings};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wait until resources reach the conditions in a wait file
    Wait {
        /// Path to the wait file
        #[arg(short, long)]
        file: PathBuf,

        /// Resource id to wait for (repeatable, replaces the file's list)
        #[arg(short, long = "resource")]
        resources: Vec<String>,

        /// Override the file's timeout
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Override the file's poll interval
        #[arg(long)]
        poll_interval_secs: Option<u64>,

        /// Stop all waits as soon as one fails
        #[arg(long)]
        fail_fast: bool,
    },
    /// Evaluate a wait file's conditions once against a JSON document
    Check {
        /// Path to the wait file
        #[arg(short, long)]
        file: PathBuf,

        /// Path to the JSON snapshot
        #[arg(short, long)]
        snapshot: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Wait {
            file,
            resources,
            timeout_secs,
            poll_interval_secs,
            fail_fast,
        } => {
            let def = WaitLoader::new().load_file(&file)?;

            let resources = if resources.is_empty() {
                def.resources.clone()
            } else {
                resources
            };
            if resources.is_empty() {
                bail!(
                    "no resources to wait for: add `resources` to {} or pass --resource",
                    file.display()
                );
            }

            let settings = WaitSettings::new(
                Duration::from_secs(timeout_secs.unwrap_or(def.timeout_secs)),
                Duration::from_secs(poll_interval_secs.unwrap_or(def.poll_interval_secs)),
            )?;
            let fetcher = AnyFetcher::from_config(&def.fetcher)?;
            let waiter = ConditionWaiter::new(settings);

            log::info!(
                "Waiting for {} resource(s) via {} fetcher",
                resources.len(),
                fetcher.kind()
            );

            let token = waiter.cancellation_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupted, cancelling waits");
                    token.cancel();
                }
            });

            let mode = if fail_fast {
                BatchMode::FailFast
            } else {
                BatchMode::Independent
            };
            let results =
                batch::wait_all(&waiter, &fetcher, &resources, &def.conditions, mode).await;

            for result in &results {
                match &result.outcome {
                    Ok(satisfied) => println!(
                        "{}: satisfied after {} poll(s) ({:.1}s)",
                        result.resource_id,
                        satisfied.ticks,
                        satisfied.elapsed.as_secs_f64()
                    ),
                    Err(e) => println!("{}: {}", result.resource_id, e),
                }
            }

            let failed = results.iter().filter(|r| !r.is_satisfied()).count();
            if failed > 0 {
                bail!("{} of {} resource(s) did not settle", failed, results.len());
            }
        }
        Commands::Check { file, snapshot } => {
            let def = WaitLoader::new().load_file(&file)?;
            let content = std::fs::read_to_string(&snapshot)
                .with_context(|| format!("cannot read snapshot {}", snapshot.display()))?;
            let document: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("snapshot {} is not valid JSON", snapshot.display()))?;

            let compiled = CompiledConditions::compile(&def.conditions)
                .map_err(|e| anyhow!("invalid condition '{}': {}", e.name, e.error))?;

            match ResourceSnapshot::from_value(document).evaluate(&compiled) {
                Evaluation::Satisfied => {
                    println!("satisfied ({} condition(s))", compiled.len())
                }
                Evaluation::Unsatisfied(unsatisfied) => {
                    bail!("not satisfied: {}", unsatisfied)
                }
            }
        }
    }

    Ok(())
}
