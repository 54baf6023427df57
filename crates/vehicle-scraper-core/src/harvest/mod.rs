//! Incremental link discovery on an image search results page.
//!
//! One search session scrolls the page, clicks every thumbnail it has not
//! seen yet and collects the full-size image URLs each click reveals. The
//! session ends when enough new URLs are collected, when the page says it has
//! no more results, when the session's wall-clock ceiling is exceeded, or when
//! shutdown is requested.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::Result;

/// The page operations the harvester needs.
///
/// Implementations own the element-selection strategy; the harvester only
/// sees thumbnails by index.
pub trait ResultsPage {
    /// Navigate to a search results URL
    fn open(&mut self, url: &str) -> Result<()>;

    /// Scroll to the bottom so more thumbnails load
    fn scroll_to_end(&mut self) -> Result<()>;

    /// Number of thumbnails currently on the page
    fn thumbnail_count(&mut self) -> Result<usize>;

    /// Click thumbnail `index` to reveal its full-size image
    fn click_thumbnail(&mut self, index: usize) -> Result<()>;

    /// `src` attributes of the full-size images currently revealed
    fn full_size_sources(&mut self) -> Result<Vec<String>>;

    /// Whether the page shows its "no more results" indicator
    fn no_more_results(&mut self) -> Result<bool>;

    /// Trigger the "load more" action if present. Returns whether it fired.
    fn load_more(&mut self) -> Result<bool>;
}

/// Why a harvest stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of links was collected
    Satisfied,
    /// The page reported it has no more results
    Exhausted,
    /// The session ran past its wall-clock ceiling
    TimedOut,
    /// Shutdown was requested mid-session
    Interrupted,
}

/// Links collected in one session, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harvest {
    pub urls: Vec<String>,
    pub stop: StopReason,
}

/// Timing knobs for a harvest session
#[derive(Debug, Clone, Copy)]
pub struct HarvestSettings {
    /// Pause after each scroll and click so the page can render
    pub interaction_delay: Duration,

    /// Pause before asking for more results when a pass found nothing new
    pub stall_delay: Duration,

    /// Wall-clock ceiling for the whole session
    pub session_timeout: Duration,
}

impl HarvestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interaction_delay: config.interaction_delay(),
            stall_delay: config.stall_delay(),
            session_timeout: config.session_timeout(),
        }
    }
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Accumulates unique, previously unseen links up to a limit
struct LinkCollector<'a> {
    known: &'a HashSet<String>,
    wanted: usize,
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl<'a> LinkCollector<'a> {
    fn new(known: &'a HashSet<String>, wanted: usize) -> Self {
        Self {
            known,
            wanted,
            seen: HashSet::new(),
            urls: Vec::new(),
        }
    }

    fn offer(&mut self, url: String) {
        if self.is_full() || !is_http_url(&url) || self.known.contains(&url) {
            return;
        }
        if self.seen.insert(url.clone()) {
            self.urls.push(url);
        }
    }

    fn is_full(&self) -> bool {
        self.urls.len() >= self.wanted
    }

    fn finish(self, stop: StopReason) -> Harvest {
        Harvest {
            urls: self.urls,
            stop,
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Collect up to `wanted` full-size image URLs for one search.
///
/// URLs in `known` are never returned. Per-thumbnail failures are logged and
/// skipped; only a failure to open `search_url` is returned as an error.
/// `shutdown` is checked before every pass and every click; once set the
/// links collected so far are returned.
pub fn harvest_links<P: ResultsPage + ?Sized>(
    page: &mut P,
    search_url: &str,
    wanted: usize,
    known: &HashSet<String>,
    settings: &HarvestSettings,
    shutdown: &AtomicBool,
) -> Result<Harvest> {
    let mut collector = LinkCollector::new(known, wanted);
    if collector.is_full() {
        return Ok(collector.finish(StopReason::Satisfied));
    }
    if shutdown.load(Ordering::SeqCst) {
        return Ok(collector.finish(StopReason::Interrupted));
    }

    page.open(search_url)?;
    let started = Instant::now();
    let mut results_start = 0;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            info!("Shutdown requested, keeping {} links", collector.urls.len());
            return Ok(collector.finish(StopReason::Interrupted));
        }

        // SCROLLING
        if let Err(e) = page.scroll_to_end() {
            warn!("Scroll failed: {}", e);
        }
        pause(settings.interaction_delay, shutdown);

        let number_results = match page.thumbnail_count() {
            Ok(count) => count,
            Err(e) => {
                warn!("Could not read thumbnails: {}", e);
                results_start
            }
        };

        // EXTRACTING
        info!(
            "Found: {} search results. Extracting links from {}:{}",
            number_results, results_start, number_results
        );

        for index in results_start..number_results {
            if shutdown.load(Ordering::SeqCst) {
                info!("Shutdown requested, keeping {} links", collector.urls.len());
                return Ok(collector.finish(StopReason::Interrupted));
            }
            if let Err(e) = page.click_thumbnail(index) {
                debug!("Skipping thumbnail {}: {}", index, e);
                continue;
            }
            pause(settings.interaction_delay, shutdown);

            match page.full_size_sources() {
                Ok(sources) => sources.into_iter().for_each(|url| collector.offer(url)),
                Err(e) => {
                    debug!("Could not read full-size image for thumbnail {}: {}", index, e);
                    continue;
                }
            }

            if collector.is_full() {
                info!("Found: {} image links, done!", collector.urls.len());
                return Ok(collector.finish(StopReason::Satisfied));
            }
        }

        let found_new_thumbnails = number_results > results_start;
        results_start = results_start.max(number_results);

        info!(
            "Found: {} image links, looking for more ...",
            collector.urls.len()
        );

        if page.no_more_results().unwrap_or_else(|e| {
            warn!("Could not check for end of results: {}", e);
            false
        }) {
            info!("No more images available.");
            return Ok(collector.finish(StopReason::Exhausted));
        }

        if started.elapsed() >= settings.session_timeout {
            info!(
                "Search ran past {:?}, keeping {} links",
                settings.session_timeout,
                collector.urls.len()
            );
            return Ok(collector.finish(StopReason::TimedOut));
        }

        if !found_new_thumbnails {
            pause(settings.stall_delay, shutdown);
            if shutdown.load(Ordering::SeqCst) {
                continue;
            }
            match page.load_more() {
                Ok(true) => debug!("Requested more results"),
                Ok(false) => debug!("No load-more control on the page"),
                Err(e) => warn!("Load more failed: {}", e),
            }
        }
    }
}

/// Sleep for `duration`, waking early once shutdown is requested
fn pause(duration: Duration, shutdown: &AtomicBool) {
    const SLICE: Duration = Duration::from_millis(100);

    let deadline = Instant::now() + duration;
    while !shutdown.load(Ordering::SeqCst) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(SLICE));
    }
}
