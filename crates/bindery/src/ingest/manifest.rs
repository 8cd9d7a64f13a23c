//! Archive layout interpretation: manifest, banner, episode groups.
//!
//! The naming convention: one `manifest.json`, one banner raster outside
//! `episodes/`, and page images under `episodes/<prefix> <N>/` where the
//! directory name ends in the episode number. The prefix is localized
//! ("episode", "bölüm", "chapitre") and carries no meaning; only the
//! trailing number does. Unrecognized files are ignored.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;

use crate::archive::UnpackedEntry;
use crate::document::PageImage;
use crate::error::{BinderyError, ValidationError};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Raster formats accepted for banners and episode pages.
pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

static EPISODE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^episodes/([^/]*?)(\d+)/(.+)$").expect("episode path pattern is valid")
});

/// Catalog metadata parsed from `manifest.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDescriptor {
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_country: Option<String>,
    #[serde(default)]
    pub publish_date: Option<NaiveDate>,
}

/// The images belonging to one episode number. Unordered here; the
/// document builder owns the page-order rule.
#[derive(Debug, Clone)]
pub struct EpisodeImageGroup {
    pub episode_number: u32,
    pub images: Vec<PageImage>,
}

/// Fully interpreted archive contents.
#[derive(Debug)]
pub struct ArchiveLayout {
    pub manifest: ManifestDescriptor,
    pub banner: UnpackedEntry,
    pub groups: Vec<EpisodeImageGroup>,
}

fn raster_extension(file_name: &str) -> bool {
    file_name
        .rsplit('.')
        .next()
        .map(|ext| RASTER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Interprets unpacked entries. Fails pre-write: no repository row or
/// final blob object exists when this returns an error.
pub fn scan_entries(entries: Vec<UnpackedEntry>) -> Result<ArchiveLayout, BinderyError> {
    let mut manifests: Vec<UnpackedEntry> = Vec::new();
    let mut banners: Vec<UnpackedEntry> = Vec::new();
    let mut grouped: BTreeMap<u32, Vec<PageImage>> = BTreeMap::new();

    for entry in entries {
        let file_name = entry
            .relative_path
            .rsplit('/')
            .next()
            .unwrap_or(entry.relative_path.as_str());

        if file_name == MANIFEST_FILE_NAME {
            manifests.push(entry);
            continue;
        }

        if let Some(caps) = EPISODE_PATH.captures(&entry.relative_path) {
            if !raster_extension(file_name) {
                continue;
            }
            let directory = format!("{}{}", &caps[1], &caps[2]);
            let number: u32 = caps[2].parse().map_err(|_| {
                ValidationError::InvalidEpisodeNumber {
                    directory: directory.clone(),
                }
            })?;
            if number == 0 {
                return Err(ValidationError::InvalidEpisodeNumber { directory }.into());
            }
            grouped.entry(number).or_default().push(PageImage {
                filename: caps[3].to_string(),
                bytes: entry.bytes,
            });
            continue;
        }

        if !entry.relative_path.starts_with("episodes/") && raster_extension(file_name) {
            banners.push(entry);
        }
        // Anything else is ignored.
    }

    let manifest_entry = match manifests.len() {
        0 => return Err(ValidationError::MissingManifest.into()),
        1 => manifests.remove(0),
        n => return Err(ValidationError::MultipleManifests(n).into()),
    };

    let banner = match banners.len() {
        0 => return Err(ValidationError::MissingBanner.into()),
        1 => banners.remove(0),
        n => return Err(ValidationError::MultipleBanners(n).into()),
    };

    let manifest: ManifestDescriptor =
        serde_json::from_slice(&manifest_entry.bytes).map_err(ValidationError::ManifestParse)?;

    let groups = grouped
        .into_iter()
        .map(|(episode_number, images)| EpisodeImageGroup {
            episode_number,
            images,
        })
        .collect();

    Ok(ArchiveLayout {
        manifest,
        banner,
        groups,
    })
}
