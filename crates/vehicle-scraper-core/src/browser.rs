//! Chromium-backed results page.
//!
//! chromiumoxide is async; the rest of the crate is not. The page owns a small
//! tokio runtime that pumps browser events in the background while each
//! operation blocks on its own future.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use log::{info, warn};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use url::form_urlencoded;

use crate::config::{Config, Selectors};
use crate::error::{Error, Result};
use crate::harvest::ResultsPage;

/// Fill the `{q}` placeholders of a search URL template with `query`
pub fn search_url(template: &str, query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    template.replace("{q}", &encoded)
}

/// A single browser tab reused for every search
pub struct ChromeResultsPage {
    runtime: Runtime,
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    selectors: Selectors,
    thumbnails: Vec<Element>,
}

impl ChromeResultsPage {
    /// Launch a browser and open a blank tab
    pub fn launch(config: &Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .thread_name("browser-events")
            .build()?;

        let mut builder = BrowserConfig::builder().window_size(1280, 1024);
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(Error::Browser)?;

        let (browser, page, handler_task) = runtime.block_on(async {
            let (browser, mut handler) = Browser::launch(browser_config).await?;

            let handler_task = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        warn!("Browser event error: {}", e);
                    }
                }
            });

            let page = browser.new_page("about:blank").await?;
            Ok::<_, Error>((browser, page, handler_task))
        })?;

        info!(
            "Browser launched ({})",
            if config.headless { "headless" } else { "windowed" }
        );

        Ok(Self {
            runtime,
            browser,
            page,
            handler_task,
            selectors: config.selectors.clone(),
            thumbnails: Vec::new(),
        })
    }

    /// Close the browser and stop the event pump
    pub fn close(self) {
        let Self {
            runtime,
            mut browser,
            handler_task,
            ..
        } = self;

        let closed = runtime.block_on(async {
            browser.close().await?;
            browser.wait().await?;
            Ok::<_, Error>(())
        });
        if let Err(e) = closed {
            warn!("Browser did not close cleanly: {}", e);
        }
        handler_task.abort();
    }

    /// Run `script` in the page and decode its result
    fn evaluate<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        self.runtime.block_on(async {
            let result = self.page.evaluate(script).await?;
            result
                .into_value::<T>()
                .map_err(|e| Error::Browser(format!("unexpected script result: {}", e)))
        })
    }
}

impl ResultsPage for ChromeResultsPage {
    fn open(&mut self, url: &str) -> Result<()> {
        self.thumbnails.clear();
        self.runtime.block_on(async {
            self.page.goto(url).await?;
            Ok(())
        })
    }

    fn scroll_to_end(&mut self) -> Result<()> {
        self.evaluate::<serde_json::Value>(
            "window.scrollTo(0, document.body.scrollHeight); true".to_string(),
        )?;
        Ok(())
    }

    fn thumbnail_count(&mut self) -> Result<usize> {
        let selector = self.selectors.thumbnail.clone();
        self.thumbnails = self
            .runtime
            .block_on(async { self.page.find_elements(selector).await })?;
        Ok(self.thumbnails.len())
    }

    fn click_thumbnail(&mut self, index: usize) -> Result<()> {
        let thumbnail = self
            .thumbnails
            .get(index)
            .ok_or_else(|| Error::Browser(format!("no thumbnail at index {}", index)))?;

        self.runtime.block_on(async {
            thumbnail.click().await?;
            Ok(())
        })
    }

    fn full_size_sources(&mut self) -> Result<Vec<String>> {
        let selector = self.selectors.full_image.clone();
        self.runtime.block_on(async {
            let images = self.page.find_elements(selector).await?;
            let mut sources = Vec::with_capacity(images.len());
            for image in images {
                if let Some(src) = image.attribute("src").await? {
                    sources.push(src);
                }
            }
            Ok(sources)
        })
    }

    fn no_more_results(&mut self) -> Result<bool> {
        let selector = self.selectors.end_of_results.clone();
        let found = self
            .runtime
            .block_on(async { self.page.find_elements(selector).await })?;
        Ok(!found.is_empty())
    }

    fn load_more(&mut self) -> Result<bool> {
        let selector = serde_json::to_string(&self.selectors.load_more)?;
        self.evaluate(format!(
            "(() => {{ const b = document.querySelector({}); if (b) {{ b.click(); return true; }} return false; }})()",
            selector
        ))
    }
}
