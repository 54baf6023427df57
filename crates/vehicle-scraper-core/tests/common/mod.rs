#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use vehicle_scraper_core::fetch::ImageSource;
use vehicle_scraper_core::harvest::ResultsPage;
use vehicle_scraper_core::{Config, Error, Result};

/// Config pointing at `root` with every delay switched off
pub fn test_config(root: &Path) -> Config {
    Config {
        reference_table: root.join("make_model_database_mod.csv"),
        index_path: root.join("results").join("image_sources.json"),
        interaction_delay_ms: 0,
        stall_delay_secs: 0,
        session_timeout_secs: 5,
        show_progress: false,
        keep_awake: false,
        ..Default::default()
    }
}

pub fn write_reference_table(config: &Config, contents: &str) -> PathBuf {
    fs::write(&config.reference_table, contents).unwrap();
    config.reference_table.clone()
}

/// A small PNG whose pixels depend on `seed`
pub fn png_bytes(seed: u8) -> Vec<u8> {
    let img = image::RgbImage::from_fn(20, 10, |x, y| {
        image::Rgb([seed, (x * 12) as u8, (y * 25) as u8])
    });

    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Results page serving the same thumbnails for every search.
///
/// Every thumbnail is visible after the first scroll and the page reports
/// the end of results once they have all been shown.
pub struct StaticPage {
    sources: Vec<String>,
    visible: bool,
    current: Option<usize>,
    pub searches: Vec<String>,
}

impl StaticPage {
    pub fn new(sources: Vec<String>) -> Self {
        Self {
            sources,
            visible: false,
            current: None,
            searches: Vec::new(),
        }
    }
}

impl ResultsPage for StaticPage {
    fn open(&mut self, url: &str) -> Result<()> {
        self.searches.push(url.to_string());
        self.visible = false;
        self.current = None;
        Ok(())
    }

    fn scroll_to_end(&mut self) -> Result<()> {
        self.visible = true;
        Ok(())
    }

    fn thumbnail_count(&mut self) -> Result<usize> {
        Ok(if self.visible { self.sources.len() } else { 0 })
    }

    fn click_thumbnail(&mut self, index: usize) -> Result<()> {
        self.current = Some(index);
        Ok(())
    }

    fn full_size_sources(&mut self) -> Result<Vec<String>> {
        Ok(self
            .current
            .and_then(|i| self.sources.get(i).cloned())
            .into_iter()
            .collect())
    }

    fn no_more_results(&mut self) -> Result<bool> {
        Ok(self.visible)
    }

    fn load_more(&mut self) -> Result<bool> {
        Ok(false)
    }
}

/// Image source backed by a URL -> bytes map
#[derive(Default)]
pub struct MapSource {
    images: HashMap<String, Vec<u8>>,
}

impl MapSource {
    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }
}

impl ImageSource for MapSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.images.get(url).cloned().ok_or_else(|| Error::HttpStatus {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Files directly inside `dir`, sorted by name
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
