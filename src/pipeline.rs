//! Per-filing pipeline and the batch runner on top of it.

use futures::stream::{self, StreamExt};
use std::path::PathBuf;

use crate::core::PeriodBucket;
use crate::error::{BatchFailure, DocumentParseError, FilingError, UnresolvedContext};
use crate::financial::{FilingIdentity, FinancialMaster, FinancialRecord};
use crate::normalizer::{FactNormalizer, FilingFacts, FilingHeader};
use crate::taxonomy::Taxonomy;
use crate::utils::dirs::doc_id_for;
use crate::xbrl::Instance;

/// A finished filing plus the notices raised along the way.
#[derive(Debug, Clone)]
pub struct FilingOutcome {
    pub record: FinancialRecord,
    pub unresolved: Vec<UnresolvedContext>,
    pub profiles: Vec<String>,
}

/// Extracts, normalizes and integrates one instance document. Depends only
/// on `content` and `taxonomy`.
pub fn process_filing(
    doc_id: &str,
    content: &str,
    taxonomy: &Taxonomy,
) -> Result<FilingOutcome, FilingError> {
    let instance = Instance::parse(content).map_err(|source| FilingError::Parse {
        doc_id: doc_id.to_string(),
        source,
    })?;

    let facts = FilingFacts::join(&instance);
    let header = FilingHeader::extract(&facts, taxonomy);
    let identity = FilingIdentity::from_header(doc_id, &header)?;

    let normalizer = FactNormalizer::new(
        taxonomy,
        &facts,
        identity.accounting_standard,
        identity.consolidation_scope,
        identity.period_target,
    );

    let current = normalizer
        .normalize_period(PeriodBucket::CurrentYear)
        .ok_or_else(|| FilingError::Parse {
            doc_id: doc_id.to_string(),
            source: DocumentParseError::NoReportingPeriod,
        })?;
    let prior = normalizer.normalize_period(PeriodBucket::PriorYear);

    let record = FinancialMaster::new(taxonomy).assemble(
        &identity,
        &current,
        prior.as_ref(),
        &instance.units,
    );

    Ok(FilingOutcome {
        record,
        unresolved: facts.unresolved().to_vec(),
        profiles: normalizer.profiles().to_vec(),
    })
}

/// Result for one input file of a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub path: PathBuf,
    pub doc_id: String,
    pub result: Result<FilingOutcome, BatchFailure>,
}

/// Processes `paths` with up to `workers` filings in flight. Each filing runs
/// on the blocking pool against the installed taxonomy; one failure never
/// stops the others. Items arrive in completion order and `on_done` sees
/// each as it finishes.
pub async fn process_batch<F>(
    paths: Vec<PathBuf>,
    taxonomy: &'static Taxonomy,
    workers: usize,
    mut on_done: F,
) -> Vec<BatchItem>
where
    F: FnMut(&BatchItem),
{
    let tasks = paths.into_iter().map(|path| async move {
        let doc_id = doc_id_for(&path);
        let worker_path = path.clone();
        let worker_doc_id = doc_id.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let content =
                std::fs::read_to_string(&worker_path).map_err(|source| BatchFailure::Io {
                    path: worker_path.clone(),
                    source,
                })?;
            process_filing(&worker_doc_id, &content, taxonomy).map_err(BatchFailure::from)
        })
        .await;

        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                log::error!("worker for {} failed: {}", doc_id, e);
                Err(BatchFailure::Join(doc_id.clone()))
            }
        };
        BatchItem {
            path,
            doc_id,
            result,
        }
    });

    let mut results = Vec::new();
    let mut stream = stream::iter(tasks).buffer_unordered(workers.max(1));
    while let Some(item) = stream.next().await {
        match &item.result {
            Ok(outcome) => log::debug!(
                "{}: done, {} unresolved contexts",
                item.doc_id,
                outcome.unresolved.len()
            ),
            Err(BatchFailure::Filing(FilingError::Rejected(rejected))) => {
                log::warn!("{}", rejected);
            }
            Err(e) => log::error!("{}: {}", item.doc_id, e),
        }
        on_done(&item);
        results.push(item);
    }
    results
}
