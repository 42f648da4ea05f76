//! Pipelined crawl orchestration
//!
//! The pipeline runs three stages and a collector as separate tasks,
//! connected only by bounded queues of capacity `max_pages`:
//!
//! ```text
//!            +------------------- next URLs (supervisor) -----------------+
//!            v                                                            |
//!   URLs -> [A: fetch] --documents--> [B: next link] ---------------------+
//!               |  \
//!               |   +--fetch results--> [C: records] --batches--+
//!               |                                                v
//!               +---------------- page arrived ------------> [collector]
//! ```
//!
//! Stage B's supervisor is the only URL sender and the only place the page
//! budget is enforced. Closing the URL queue is the shutdown signal: each
//! stage drops its outputs once its input closes, and the collector returns
//! once both of its inputs have closed.
//!
//! Parsed documents are not `Send`, so all tasks run on one `LocalSet` and
//! interleave at `.await` points; fetch I/O overlaps parsing and extraction.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{extract_dependents, extract_next_page};
use crate::crawler::supervisor::Supervisor;
use crate::crawler::CrawlOutcome;
use crate::model::{DependentRecord, PageFetchResult};
use crate::CrawlError;
use std::rc::Rc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::{spawn_local, JoinHandle, LocalSet};
use tracing::Instrument;
use url::Url;

/// Notification that stage A fetched a page
#[derive(Debug)]
struct PageArrived {
    index: usize,
    url: Url,
}

/// Records extracted from one page by stage C
#[derive(Debug)]
struct RecordBatch {
    url: Url,
    records: Vec<DependentRecord>,
}

/// What the collector saw before both of its inputs closed
#[derive(Debug, Default)]
struct Collected {
    records: Vec<DependentRecord>,
    pages: usize,
    batches: usize,
}

/// Runs the pipelined crawl starting at `seed`
///
/// Visits at most `max_pages` pages. Records from all visited pages are
/// returned; their order follows batch arrival and is not guaranteed.
///
/// The returned future is not `Send`: await it directly rather than
/// spawning it onto a multi-threaded runtime.
pub async fn crawl_pipelined(
    fetcher: &PageFetcher,
    seed: Url,
    max_pages: usize,
) -> Result<CrawlOutcome, CrawlError> {
    if max_pages == 0 {
        tracing::info!("Page budget is 0, nothing to crawl");
        return Ok(CrawlOutcome::default());
    }

    LocalSet::new()
        .run_until(run_stages(fetcher.clone(), seed, max_pages))
        .await
}

async fn run_stages(
    fetcher: PageFetcher,
    seed: Url,
    max_pages: usize,
) -> Result<CrawlOutcome, CrawlError> {
    // No queue carries more than max_pages messages, so sends never wait
    // on a consumer that is itself waiting on this sender.
    let capacity = max_pages;

    let (url_tx, url_rx) = mpsc::channel::<Url>(capacity);
    let (document_tx, document_rx) = mpsc::channel::<Rc<PageFetchResult>>(capacity);
    let (result_tx, result_rx) = mpsc::channel::<Rc<PageFetchResult>>(capacity);
    let (arrived_tx, arrived_rx) = mpsc::channel::<PageArrived>(capacity);
    let (batch_tx, batch_rx) = mpsc::channel::<RecordBatch>(capacity);

    let mut supervisor = Supervisor::new(url_tx, max_pages);
    supervisor.dispatch(seed).await;

    let fetch = spawn_local(
        fetch_stage(fetcher, url_rx, document_tx, result_tx, arrived_tx)
            .instrument(tracing::debug_span!("fetch_stage")),
    );
    let next_link = spawn_local(
        next_link_stage(document_rx, supervisor)
            .instrument(tracing::debug_span!("next_link_stage")),
    );
    let records = spawn_local(
        record_stage(result_rx, batch_tx).instrument(tracing::debug_span!("record_stage")),
    );

    let collected = collect(arrived_rx, batch_rx).await;

    let mut first_error = None;
    for (stage, handle) in [
        ("fetch", fetch),
        ("next link", next_link),
        ("records", records),
    ] {
        if let Err(e) = join_stage(stage, handle).await {
            tracing::error!("Stage {} failed: {}", stage, e);
            first_error.get_or_insert(e);
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    if collected.pages != collected.batches {
        return Err(CrawlError::Pipeline(format!(
            "{} pages arrived but {} record batches were collected",
            collected.pages, collected.batches
        )));
    }

    tracing::info!(
        "Pipeline finished: {} pages, {} dependents",
        collected.pages,
        collected.records.len()
    );

    Ok(CrawlOutcome {
        records: collected.records,
        pages_fetched: collected.pages,
    })
}

async fn join_stage(
    stage: &str,
    handle: JoinHandle<Result<(), CrawlError>>,
) -> Result<(), CrawlError> {
    handle
        .await
        .map_err(|e| CrawlError::Pipeline(format!("{} stage did not finish: {}", stage, e)))?
}

/// Stage A: URL -> fetched page, published to stages B and C
///
/// Stops when the URL queue closes or a downstream stage is gone. A
/// downstream stage that is gone has reported its own error.
async fn fetch_stage(
    fetcher: PageFetcher,
    mut urls: Receiver<Url>,
    documents: Sender<Rc<PageFetchResult>>,
    results: Sender<Rc<PageFetchResult>>,
    arrived: Sender<PageArrived>,
) -> Result<(), CrawlError> {
    let mut index = 0;

    while let Some(url) = urls.recv().await {
        let page = Rc::new(fetcher.fetch(&url).await?);
        index += 1;

        if documents.send(Rc::clone(&page)).await.is_err()
            || results.send(page).await.is_err()
            || arrived.send(PageArrived { index, url }).await.is_err()
        {
            tracing::debug!("Downstream stage gone, stopping fetch stage");
            break;
        }
    }

    tracing::debug!("URL queue closed after {} pages", index);
    Ok(())
}

/// Stage B: document -> next URL, fed back through the supervisor
async fn next_link_stage(
    mut documents: Receiver<Rc<PageFetchResult>>,
    mut supervisor: Supervisor,
) -> Result<(), CrawlError> {
    while let Some(page) = documents.recv().await {
        let next = extract_next_page(&page.document, &page.url)?;
        if !supervisor.complete(next).await {
            break;
        }
    }

    Ok(())
}

/// Stage C: fetch result -> record batch
async fn record_stage(
    mut results: Receiver<Rc<PageFetchResult>>,
    batches: Sender<RecordBatch>,
) -> Result<(), CrawlError> {
    while let Some(page) = results.recv().await {
        let records = extract_dependents(&page)?;
        let batch = RecordBatch {
            url: page.url.clone(),
            records,
        };
        if batches.send(batch).await.is_err() {
            break;
        }
    }

    Ok(())
}

/// Fan-in: merges record batches as they arrive
///
/// Returns once both the page notifications and the batches have closed,
/// which happens only after every stage upstream has shut down.
async fn collect(
    mut arrived: Receiver<PageArrived>,
    mut batches: Receiver<RecordBatch>,
) -> Collected {
    let mut collected = Collected::default();
    let mut arrived_open = true;
    let mut batches_open = true;

    while arrived_open || batches_open {
        tokio::select! {
            page = arrived.recv(), if arrived_open => match page {
                Some(page) => {
                    collected.pages += 1;
                    tracing::info!("Fetched page {}: {}", page.index, page.url);
                }
                None => arrived_open = false,
            },
            batch = batches.recv(), if batches_open => match batch {
                Some(batch) => {
                    collected.batches += 1;
                    tracing::debug!(
                        "Received {} dependents from {}",
                        batch.records.len(),
                        batch.url
                    );
                    collected.records.extend(batch.records);
                }
                None => batches_open = false,
            },
        }
    }

    collected
}
