// src/pipeline/scan.rs

use crate::pipeline::matcher::{MatchingPipeline, OutcomeTally};
use crate::scraper::{looks_like_captcha, Fetcher, SourceExtractor};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Shared stop flag, set from the Ctrl+C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub jobs: usize,
    pub jobs_failed: usize,
    pub outcomes: OutcomeTally,
    pub cancelled: bool,
}

/// One (region, source) search page.
struct Job<'a> {
    region: &'a str,
    source: &'a dyn SourceExtractor,
}

/// Walks every (region, source) pair through fetch → extract → match,
/// writing a snapshot after each one.
pub struct Scanner {
    fetcher: Arc<dyn Fetcher>,
    sources: Vec<Box<dyn SourceExtractor>>,
    pipeline: MatchingPipeline,
    snapshot_path: PathBuf,
    state_code: String,
    workers: usize,
    cancel: CancelToken,
}

impl Scanner {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        sources: Vec<Box<dyn SourceExtractor>>,
        pipeline: MatchingPipeline,
        snapshot_path: impl Into<PathBuf>,
        state_code: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            sources,
            pipeline,
            snapshot_path: snapshot_path.into(),
            state_code: state_code.into(),
            workers: 1,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run(&self, regions: &[String]) -> ScanSummary {
        let jobs: VecDeque<Job> = regions
            .iter()
            .flat_map(|region| {
                self.sources.iter().map(move |source| Job {
                    region: region.as_str(),
                    source: source.as_ref(),
                })
            })
            .collect();

        let total_jobs = jobs.len();
        let workers = self.workers.min(total_jobs.max(1));
        info!(jobs = total_jobs, workers, "🔎 Starting scan");

        let queue = Mutex::new(jobs);
        let summary = Mutex::new(ScanSummary::default());

        std::thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(|| self.worker(&queue, &summary));
            }
        });

        let mut summary = summary.into_inner().unwrap_or_else(|p| p.into_inner());
        summary.cancelled = self.cancel.is_cancelled();

        // Flush whatever we have, even after an interrupt.
        self.pipeline.store().checkpoint(&self.snapshot_path);

        let o = summary.outcomes;
        info!(
            jobs = summary.jobs,
            jobs_failed = summary.jobs_failed,
            records = o.records,
            matched = o.matched,
            duplicates = o.duplicates,
            geocode_failed = o.geocode_failed,
            out_of_range = o.out_of_range,
            cancelled = summary.cancelled,
            "🏁 Scan finished with {} listings stored",
            self.pipeline.store().len()
        );

        summary
    }

    fn worker(&self, queue: &Mutex<VecDeque<Job>>, summary: &Mutex<ScanSummary>) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let job = queue.lock().unwrap_or_else(|p| p.into_inner()).pop_front();
            let Some(job) = job else {
                return;
            };

            let (ok, tally) = self.scan_one(&job);

            let mut s = summary.lock().unwrap_or_else(|p| p.into_inner());
            s.jobs += 1;
            if !ok {
                s.jobs_failed += 1;
            }
            s.outcomes.merge(tally);
        }
    }

    /// Returns whether the page was fetched and understood, plus record outcomes.
    fn scan_one(&self, job: &Job) -> (bool, OutcomeTally) {
        let source = job.source;
        let url = source.search_url(job.region, &self.state_code);
        info!("--- Scraping {} for {} ---", source.name(), job.region);

        let mut tally = OutcomeTally::default();

        let html = match self.fetcher.fetch(&url) {
            Ok(html) => html,
            Err(e) => {
                error!("❌ {} fetch error for {}: {e}", source.name(), job.region);
                return (false, tally);
            }
        };

        let records = match source.extract(&html, job.region) {
            Ok(records) => records,
            Err(e) => {
                error!("❌ {} scrape error for {}: {e}", source.name(), job.region);
                return (false, tally);
            }
        };

        if records.is_empty() && looks_like_captcha(&html) {
            warn!("⚠️ DETECTED CAPTCHA on {} for {}, no cards extracted", source.name(), job.region);
            return (false, tally);
        }

        info!("Found {} cards on {} in {}", records.len(), source.name(), job.region);

        for record in records {
            if self.cancel.is_cancelled() {
                warn!("⚠️ Scan interrupted during {} / {}", source.name(), job.region);
                break;
            }
            let outcome = self.pipeline.process(record);
            tally.record(&outcome);
        }

        self.pipeline.store().checkpoint(&self.snapshot_path);
        (true, tally)
    }
}
