//! Core functionality for building a labelled vehicle image dataset.
//!
//! This library provides the pieces of a collection run:
//! - Reference table loading and work list planning
//! - Link harvesting from an image search results page
//! - Image fetching, normalisation and content-addressed storage
//! - A provenance index mapping every stored image to its source URL

// -- External Dependencies --

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

// -- Standard Library --
use std::fs;
use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod browser;
pub mod config;
pub mod fetch;
pub mod harvest;
pub mod logging;
pub mod naming;
pub mod pipeline;
pub mod platform;
pub mod provenance;
pub mod store;
pub mod timeout_utils;
pub mod types;
pub mod worklist;

// -- Test Modules --
#[cfg(test)]
pub mod test_utils;

use fetch::ImageSource;
use harvest::{harvest_links, HarvestSettings, ResultsPage, StopReason};
use provenance::ProvenanceIndex;
use worklist::WorkItem;

/// What happened to one class during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassReport {
    pub class: VehicleClass,

    /// Links returned by the harvester
    pub harvested: usize,

    /// New images written to disk
    pub stored: usize,

    /// Downloads identical to an image already on disk
    pub duplicates: usize,

    /// Links that could not be fetched or stored
    pub failed: usize,

    pub stop: StopReason,
}

/// Totals for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Classes whose search and downloads completed
    pub classes: usize,
    pub images_stored: usize,
    pub duplicates: usize,
    pub failures: usize,

    /// The run stopped early because shutdown was requested
    pub interrupted: bool,
}

/// Main entry point for a collection run
pub struct VehicleScraper {
    config: Config,
    shutdown_requested: Arc<AtomicBool>,
}

impl VehicleScraper {
    /// Create a new VehicleScraper with the provided configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Flag that stops the run between classes and between downloads
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown_requested.clone()
    }

    /// Classes under `output_root` that still have fewer than `target` images
    pub fn build_worklist(
        &self,
        output_root: &Path,
        target: usize,
        order: SortOrder,
    ) -> Result<Vec<WorkItem>> {
        let classes = worklist::load_reference_table(&self.config.reference_table)?;
        let counts = worklist::count_existing_images(output_root)?;
        let total = classes.len();
        let items = worklist::build_worklist(classes, &counts, target, order);
        info!(
            "{} of {} classes need images (target {})",
            items.len(),
            total,
            target
        );

        Ok(items)
    }

    /// Search for one class and download what the search turns up
    pub fn scrape_class<P, S>(
        &self,
        page: &mut P,
        source: &S,
        output_root: &Path,
        item: &WorkItem,
    ) -> Result<ClassReport>
    where
        P: ResultsPage + ?Sized,
        S: ImageSource + ?Sized,
    {
        let class = &item.class;
        let dir = output_root.join(class.subpath());
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            logging::log_fs_modification("create_dir", &dir, None);
        }

        let query = class.query();
        let url = browser::search_url(&self.config.search_url_template, &query);
        let known = ProvenanceIndex::load(&self.config.index_path)?.known_urls();

        info!(
            "Searching '{}' for {} images ({} already stored)",
            query, item.wanted, item.existing
        );
        let harvest = harvest_links(
            page,
            &url,
            item.wanted,
            &known,
            &HarvestSettings::from_config(&self.config),
            &self.shutdown_requested,
        )?;

        if harvest.urls.is_empty() {
            warn!("Failed to return links for term: {}", query);
        }

        let report = pipeline::download_links(
            source,
            &harvest.urls,
            output_root,
            class,
            &self.config.index_path,
            self.config.jpeg_quality,
            &self.shutdown_requested,
        );

        Ok(ClassReport {
            class: class.clone(),
            harvested: harvest.urls.len(),
            stored: report.stored,
            duplicates: report.duplicates,
            failed: report.failed,
            stop: harvest.stop,
        })
    }

    /// Work through `worklist` in order, one class at a time
    pub fn run<P, S>(
        &self,
        page: &mut P,
        source: &S,
        output_root: &Path,
        worklist: &[WorkItem],
    ) -> Result<RunSummary>
    where
        P: ResultsPage + ?Sized,
        S: ImageSource + ?Sized,
    {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        let progress_bar = if self.config.show_progress {
            let bar = ProgressBar::new(worklist.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("[{eta}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        for item in worklist {
            if self.shutdown_requested.load(Ordering::SeqCst) {
                summary.interrupted = true;
                break;
            }

            progress_bar.set_message(item.class.key().to_string());
            let report = self.scrape_class(page, source, output_root, item)?;
            info!(
                "{}: stored {} of {} links ({:?})",
                item.class.key(),
                report.stored,
                report.harvested,
                report.stop
            );

            summary.images_stored += report.stored;
            summary.duplicates += report.duplicates;
            summary.failures += report.failed;

            if self.shutdown_requested.load(Ordering::SeqCst) {
                summary.interrupted = true;
                break;
            }
            summary.classes += 1;
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();

        if summary.interrupted {
            warn!(
                "Run interrupted after {} classes, {} images stored",
                summary.classes, summary.images_stored
            );
        } else {
            info!(
                "Finished {} classes in {:.2?}: {} images stored, {} duplicates, {} failures",
                summary.classes,
                start_time.elapsed(),
                summary.images_stored,
                summary.duplicates,
                summary.failures
            );
        }

        Ok(summary)
    }
}
