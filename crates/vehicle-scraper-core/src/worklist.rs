use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::SortOrder;
use crate::error::{Error, Result};
use crate::naming::restore_component;
use crate::types::{ClassKey, ImageFormat, VehicleClass};

/// Depth of an image below the output root: `Make/Model/Year/file`
const IMAGE_DEPTH: usize = 4;

/// A class that still needs images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub class: VehicleClass,

    /// Images already on disk for this class
    pub existing: usize,

    /// Images still needed to reach the target
    pub wanted: usize,
}

/// Read the reference table of make/model/year combinations
pub fn load_reference_table(path: &Path) -> Result<Vec<VehicleClass>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

    let mut classes = Vec::new();
    for (row, record) in reader.deserialize::<VehicleClass>().enumerate() {
        match record {
            Ok(class) => classes.push(class),
            Err(e) => {
                // Row 1 is the header
                warn!("Skipping reference table row {}: {}", row + 2, e);
            }
        }
    }

    info!(
        "Loaded {} vehicle classes from {}",
        classes.len(),
        path.display()
    );
    Ok(classes)
}

/// Count images already saved under the output root, per class
pub fn count_existing_images(root: &Path) -> Result<HashMap<ClassKey, usize>> {
    let mut counts = HashMap::new();

    // Nothing downloaded yet
    if !root.exists() {
        return Ok(counts);
    }

    for entry in WalkDir::new(root)
        .min_depth(IMAGE_DEPTH)
        .max_depth(IMAGE_DEPTH)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();

        if !ImageFormat::from_path(path).is_some_and(|format| format.is_counted()) {
            continue;
        }

        match class_key_for(root, path) {
            Some(key) => *counts.entry(key).or_insert(0) += 1,
            None => debug!("Ignoring file outside Make/Model/Year layout: {}", path.display()),
        }
    }

    Ok(counts)
}

/// Recover the class an image belongs to from its location
fn class_key_for(root: &Path, path: &Path) -> Option<ClassKey> {
    let relative = path.strip_prefix(root).ok()?;
    let mut components = relative.components().map(|c| c.as_os_str().to_str());

    let make = components.next()??;
    let model = components.next()??;
    let year = components.next()??.parse::<u16>().ok()?;

    Some(ClassKey {
        make: restore_component(make).ok()?,
        model: restore_component(model).ok()?,
        year,
    })
}

/// Drop satisfied classes and order the rest by (make, model, year)
pub fn build_worklist(
    classes: Vec<VehicleClass>,
    counts: &HashMap<ClassKey, usize>,
    target: usize,
    order: SortOrder,
) -> Vec<WorkItem> {
    let mut items: Vec<WorkItem> = classes
        .into_iter()
        .filter_map(|class| {
            let existing = counts.get(&class.key()).copied().unwrap_or(0);
            if existing >= target {
                debug!("Skipping complete class {} ({} images)", class.key(), existing);
                return None;
            }
            Some(WorkItem {
                class,
                existing,
                wanted: target - existing,
            })
        })
        .collect();

    match order {
        SortOrder::Ascending => items.sort_by(|a, b| a.class.key().cmp(&b.class.key())),
        SortOrder::Descending => items.sort_by(|a, b| b.class.key().cmp(&a.class.key())),
    }

    items
}

// -- Tests --
