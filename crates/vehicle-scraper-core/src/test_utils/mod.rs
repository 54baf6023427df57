#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fetch::ImageSource;
use crate::harvest::ResultsPage;

/// Create a file with an image extension and dummy content
pub fn create_dummy_image(dir: &Path, name: &str, ext: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();

    let file_path = dir.join(format!("{}.{}", name, ext));
    let mut file = File::create(&file_path).unwrap();
    file.write_all(b"DUMMY IMAGE DATA").unwrap();
    file_path
}

/// Write a reference table CSV and return its path
pub fn write_reference_table(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("make_model_database_mod.csv");
    fs::write(&path, contents).unwrap();
    path
}

/// A small RGBA PNG whose pixels depend on `seed`
pub fn png_bytes(seed: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(16, 12, |x, y| {
        image::Rgba([seed, x as u8 * 10, y as u8 * 10, 200])
    });

    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// One image URL per thumbnail: `https://img.example/<prefix>/<i>.jpg`
pub fn thumbnail_sources(count: usize, prefix: &str) -> Vec<Vec<String>> {
    (0..count)
        .map(|i| vec![format!("https://img.example/{}/{}.jpg", prefix, i)])
        .collect()
}

/// Scripted results page.
///
/// Each thumbnail reveals a fixed list of full-size sources. Scrolling shows
/// `page_size` more thumbnails, unless the page requires "load more", in
/// which case only the first scroll and each load-more call reveal more.
pub struct FakePage {
    thumbnails: Vec<Vec<String>>,
    page_size: usize,
    visible: usize,
    requires_load_more: bool,
    end_indicator: bool,
    failing_clicks: HashSet<usize>,
    fail_open: bool,
    shutdown_on_open: Option<Arc<AtomicBool>>,
    shutdown_on_click: Option<(usize, Arc<AtomicBool>)>,
    current: Option<usize>,
    pub opened: Vec<String>,
    pub clicks: Vec<usize>,
    pub load_more_calls: usize,
}

impl FakePage {
    pub fn new(thumbnails: Vec<Vec<String>>) -> Self {
        let page_size = thumbnails.len();
        Self {
            thumbnails,
            page_size,
            visible: 0,
            requires_load_more: false,
            end_indicator: false,
            failing_clicks: HashSet::new(),
            fail_open: false,
            shutdown_on_open: None,
            shutdown_on_click: None,
            current: None,
            opened: Vec::new(),
            clicks: Vec::new(),
            load_more_calls: 0,
        }
    }

    /// Reveal `page_size` thumbnails at a time
    pub fn paged(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Only load-more reveals thumbnails after the first batch
    pub fn requiring_load_more(mut self) -> Self {
        self.requires_load_more = true;
        self
    }

    /// Show the "no more results" indicator once every thumbnail is visible
    pub fn with_end_indicator(mut self) -> Self {
        self.end_indicator = true;
        self
    }

    pub fn failing_click(mut self, index: usize) -> Self {
        self.failing_clicks.insert(index);
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Raise `flag` when the page is opened
    pub fn shutdown_on_open(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_on_open = Some(flag);
        self
    }

    /// Raise `flag` when thumbnail `index` is clicked
    pub fn shutdown_on_click(mut self, index: usize, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_on_click = Some((index, flag));
        self
    }

    fn reveal_more(&mut self) -> bool {
        let before = self.visible;
        self.visible = (self.visible + self.page_size).min(self.thumbnails.len());
        self.visible > before
    }
}

impl ResultsPage for FakePage {
    fn open(&mut self, url: &str) -> Result<()> {
        if self.fail_open {
            return Err(Error::Browser("navigation failed".to_string()));
        }
        self.opened.push(url.to_string());
        if let Some(flag) = &self.shutdown_on_open {
            flag.store(true, Ordering::SeqCst);
        }
        self.visible = 0;
        self.current = None;
        Ok(())
    }

    fn scroll_to_end(&mut self) -> Result<()> {
        if !self.requires_load_more || self.visible == 0 {
            self.reveal_more();
        }
        Ok(())
    }

    fn thumbnail_count(&mut self) -> Result<usize> {
        Ok(self.visible)
    }

    fn click_thumbnail(&mut self, index: usize) -> Result<()> {
        self.clicks.push(index);
        if let Some((trip_index, flag)) = &self.shutdown_on_click {
            if *trip_index == index {
                flag.store(true, Ordering::SeqCst);
            }
        }
        if self.failing_clicks.contains(&index) || index >= self.visible {
            return Err(Error::Browser(format!("thumbnail {} not clickable", index)));
        }
        self.current = Some(index);
        Ok(())
    }

    fn full_size_sources(&mut self) -> Result<Vec<String>> {
        Ok(self
            .current
            .map(|i| self.thumbnails[i].clone())
            .unwrap_or_default())
    }

    fn no_more_results(&mut self) -> Result<bool> {
        Ok(self.end_indicator && self.visible == self.thumbnails.len())
    }

    fn load_more(&mut self) -> Result<bool> {
        self.load_more_calls += 1;
        Ok(self.requires_load_more && self.reveal_more())
    }
}

/// In-memory image source keyed by URL
#[derive(Default)]
pub struct FakeSource {
    responses: HashMap<String, Vec<u8>>,
    timeouts: HashSet<String>,
    pub requested: std::cell::RefCell<Vec<String>>,
    /// Set when `trip_on` is requested
    trip: Option<(String, Arc<AtomicBool>)>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), bytes);
        self
    }

    pub fn with_timeout(mut self, url: &str) -> Self {
        self.timeouts.insert(url.to_string());
        self
    }

    /// Raise `flag` when `url` is fetched
    pub fn tripping(mut self, url: &str, flag: Arc<AtomicBool>) -> Self {
        self.trip = Some((url.to_string(), flag));
        self
    }
}

impl ImageSource for FakeSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requested.borrow_mut().push(url.to_string());

        if let Some((trip_url, flag)) = &self.trip {
            if trip_url == url {
                flag.store(true, Ordering::SeqCst);
            }
        }

        if self.timeouts.contains(url) {
            return Err(Error::FetchTimeout {
                url: url.to_string(),
                seconds: 2,
            });
        }

        self.responses.get(url).cloned().ok_or_else(|| Error::HttpStatus {
            url: url.to_string(),
            status: 404,
        })
    }
}
