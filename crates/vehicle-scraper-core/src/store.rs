//! Content-addressed JPEG storage.
//!
//! Files are named by the SHA-1 of the bytes as downloaded, so fetching the
//! same source twice lands on the same file regardless of how the re-encode
//! turns out.

use image::codecs::jpeg::JpegEncoder;
use sha1::{Digest, Sha1};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Number of hex characters of the digest kept in the file name
const NAME_HASH_LEN: usize = 10;

/// A successfully written image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Full path of the written file
    pub path: PathBuf,

    /// File name, `<hash>.jpg`
    pub file_name: String,

    /// Whether an identical download was already on disk
    pub replaced: bool,
}

/// Hex SHA-1 of the source bytes
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// File name for an image downloaded as `bytes`
pub fn content_file_name(bytes: &[u8]) -> String {
    format!("{}.jpg", &content_hash(bytes)[..NAME_HASH_LEN])
}

/// Decode `bytes`, re-encode as RGB JPEG and write it into `dir`.
///
/// The file appears atomically: a failure at any step leaves nothing behind.
pub fn store_image(bytes: &[u8], dir: &Path, quality: u8) -> Result<StoredImage> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality).encode_image(&rgb)?;

    let file_name = content_file_name(bytes);
    let path = dir.join(&file_name);
    let replaced = path.exists();

    let temp_path = dir.join(format!(".{}.part", file_name));
    if let Err(e) = fs::write(&temp_path, &encoded).and_then(|_| fs::rename(&temp_path, &path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(StoredImage {
        path,
        file_name,
        replaced,
    })
}
