use anyhow::{Context, Result};
use std::path::PathBuf;
use structopt::StructOpt;

use xbrl_facts::core::EngineConfig;
use xbrl_facts::error::{BatchFailure, FilingError};
use xbrl_facts::output;
use xbrl_facts::pipeline::process_batch;
use xbrl_facts::taxonomy::{self, Taxonomy};
use xbrl_facts::utils::dirs::collect_instance_files;
use xbrl_facts::utils::progress::ProgressTracker;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "xbrl-normalize",
    about = "Extract and normalize financial facts from XBRL instance documents"
)]
struct Opt {
    /// Instance files or directories to walk for *.xbrl
    #[structopt(parse(from_os_str), required = true)]
    inputs: Vec<PathBuf>,

    /// Mapping tables to use instead of the built-in ones
    #[structopt(long, parse(from_os_str))]
    taxonomy: Option<PathBuf>,

    /// Dataset directory to write records into; stdout when omitted
    #[structopt(short, long, parse(from_os_str))]
    output_dir: Option<PathBuf>,

    /// Filings processed in parallel
    #[structopt(short, long)]
    jobs: Option<usize>,

    /// Pretty-print JSON
    #[structopt(long)]
    pretty: bool,

    /// Hide the progress bar
    #[structopt(short, long)]
    quiet: bool,
}

fn load_taxonomy(path: Option<&PathBuf>) -> Result<Taxonomy> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read taxonomy {}", path.display()))?;
            let taxonomy = Taxonomy::from_json_str(&raw)
                .with_context(|| format!("Invalid taxonomy {}", path.display()))?;
            log::info!("Loaded taxonomy from {}", path.display());
            Ok(taxonomy)
        }
        None => Ok(Taxonomy::builtin().context("Built-in taxonomy is invalid")?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let opt = Opt::from_args();
    let config = EngineConfig::from_env()?;

    let taxonomy_path = opt.taxonomy.as_ref().or(config.taxonomy_path.as_ref());
    let taxonomy = taxonomy::install(load_taxonomy(taxonomy_path)?);

    let files = collect_instance_files(&opt.inputs, taxonomy)?;
    if files.is_empty() {
        eprintln!("No instance documents found");
        return Ok(());
    }

    let workers = opt.jobs.unwrap_or(config.workers);
    log::info!("Processing {} filings with {} workers", files.len(), workers);

    let progress = ProgressTracker::new(files.len() as u64, !opt.quiet);
    let mut items = process_batch(files, taxonomy, workers, |item| {
        progress.advance(&item.doc_id)
    })
    .await;
    items.sort_by(|a, b| a.path.cmp(&b.path));

    let output_dir = opt.output_dir.as_ref().or(config.dataset_dir.as_ref());
    let (mut written, mut rejected, mut failed) = (0usize, 0usize, 0usize);

    for item in &items {
        match &item.result {
            Ok(outcome) => {
                match output_dir {
                    Some(dir) => {
                        output::write_record(dir, &outcome.record, opt.pretty)?;
                    }
                    None => println!("{}", output::to_json(&outcome.record, opt.pretty)?),
                }
                written += 1;
            }
            Err(BatchFailure::Filing(FilingError::Rejected(_))) => rejected += 1,
            Err(_) => failed += 1,
        }
    }

    let summary = format!("{} written, {} rejected, {} failed", written, rejected, failed);
    progress.finish(&summary);
    log::info!("{}", summary);

    if written == 0 && failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
