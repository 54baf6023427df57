use log::{error, info};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;
use crate::fetch::ImageSource;
use crate::logging::{log_fetch_error, log_store_error};
use crate::provenance::ProvenanceIndex;
use crate::store::{store_image, StoredImage};
use crate::types::VehicleClass;

/// Outcome of downloading one class's links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// New images written to disk
    pub stored: usize,

    /// Downloads identical to an image already on disk
    pub duplicates: usize,

    /// Links that could not be fetched or stored
    pub failed: usize,
}

/// Fetch each URL, store it under the class directory and record it.
///
/// Failures are logged and skipped; nothing is retried. The index is reloaded
/// and rewritten after every stored-or-failed attempt so it is current even if
/// the process dies mid-class.
pub fn download_links<S: ImageSource + ?Sized>(
    source: &S,
    urls: &[String],
    output_root: &Path,
    class: &VehicleClass,
    index_path: &Path,
    quality: u8,
    shutdown: &AtomicBool,
) -> DownloadReport {
    let dir = output_root.join(class.subpath());
    let mut report = DownloadReport::default();

    for url in urls {
        if shutdown.load(Ordering::SeqCst) {
            info!("Shutdown requested, leaving {} unfetched", class.key());
            break;
        }

        let bytes = match source.fetch(url) {
            Ok(bytes) => bytes,
            Err(e) => {
                log_fetch_error(url, &e);
                report.failed += 1;
                continue;
            }
        };

        let stored = match store_image(&bytes, &dir, quality) {
            Ok(stored) if stored.replaced => {
                info!("DUPLICATE - {} - same as {}", url, stored.path.display());
                report.duplicates += 1;
                Some(stored)
            }
            Ok(stored) => {
                info!("SUCCESS - saved {} - as {}", url, stored.path.display());
                report.stored += 1;
                Some(stored)
            }
            Err(e) => {
                log_store_error(url, &dir, &e);
                report.failed += 1;
                None
            }
        };

        if let Err(e) = update_index(index_path, class, stored.as_ref(), url) {
            error!(
                "Could not update provenance index {}: {}",
                index_path.display(),
                e
            );
        }
    }

    report
}

fn update_index(
    index_path: &Path,
    class: &VehicleClass,
    stored: Option<&StoredImage>,
    url: &str,
) -> Result<()> {
    let mut index = ProvenanceIndex::load(index_path)?;
    if let Some(stored) = stored {
        index.record(class.index_key(&stored.file_name), url);
    }
    index.save(index_path)
}
