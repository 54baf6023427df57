//! Downloading image bytes.

use log::debug;
use reqwest::blocking::Client;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::timeout_utils::execute_with_timeout;

/// Anything that can turn an image URL into bytes
pub trait ImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Downloads images over HTTP with a hard per-request deadline
pub struct HttpImageSource {
    client: Client,
    deadline: Duration,
}

impl HttpImageSource {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_deadline(config.fetch_timeout(), config.accept_invalid_certs)
    }

    pub fn with_deadline(deadline: Duration, accept_invalid_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(deadline)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self { client, deadline })
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Getting image {}", url);

        let client = self.client.clone();
        let request_url = url.to_string();
        let seconds = self.deadline.as_secs();

        // Hard deadline around the whole download
        let outcome = execute_with_timeout(url, "Fetch", self.deadline, move || {
            download(&client, &request_url, seconds)
        });

        match outcome {
            Ok(result) => result,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(Error::FetchTimeout {
                url: url.to_string(),
                seconds: self.deadline.as_secs(),
            }),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

fn download(client: &Client, url: &str, seconds: u64) -> Result<Vec<u8>> {
    let response = client.get(url).send().map_err(|e| {
        if e.is_timeout() {
            Error::FetchTimeout {
                url: url.to_string(),
                seconds,
            }
        } else {
            Error::Http(e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response.bytes()?.to_vec())
}
