//! Report requests read from a JSON manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::config::Config;
use crate::error::Error;
use crate::fields::{ANNEXURE_PLACEHOLDERS, ReportForm};
use crate::model::{FieldValues, MediaItem};

#[derive(Clone, Debug, Deserialize)]
pub struct MediaEntry {
    pub image: PathBuf,
    #[serde(default)]
    pub caption: String,
}

/// ```json
/// {
///   "training_type": "type_a",
///   "template_id": "1",
///   "event_date": "2023-05-29",
///   "gallery": [{"image": "photos/1.jpg", "caption": "Opening"}],
///   "annexures": {"annexure1": [{"image": "scan.png"}]}
/// }
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_template_id")]
    pub template_id: String,
    #[serde(flatten)]
    pub form: ReportForm,
    #[serde(default)]
    pub gallery: Vec<MediaEntry>,
    #[serde(default)]
    pub annexures: BTreeMap<String, Vec<MediaEntry>>,
}

fn default_template_id() -> String {
    "1".to_string()
}

/// Everything one assembly run needs besides the template.
#[derive(Clone, Debug, Default)]
pub struct ReportRequest {
    pub training_type: String,
    pub template_id: String,
    pub fields: FieldValues,
    pub gallery: Vec<MediaItem>,
    /// Media for `{{ANNEXURE1_TABLE}}` .. `{{ANNEXURE5_TABLE}}`, in that order.
    pub annexures: [Vec<MediaItem>; 5],
    pub filename: String,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Read the referenced images (relative to `base_dir`) and build the
    /// request. Media beyond the configured limits is dropped with a warning.
    pub fn into_request(self, base_dir: &Path, config: &Config) -> Result<ReportRequest, Error> {
        if self.form.training_type.is_empty() {
            return Err(Error::Config("training_type is required".into()));
        }

        let gallery = load_media(
            "gallery",
            &self.gallery,
            base_dir,
            Some(config.gallery.max_images),
        )?;

        let mut annexures: [Vec<MediaItem>; 5] = Default::default();
        for (key, entries) in &self.annexures {
            let Some(slot) = annexure_slot(key) else {
                log::warn!("Ignoring unknown annexure section {:?}", key);
                continue;
            };
            annexures[slot] = load_media(key, entries, base_dir, config.annexure.max_images)?;
        }

        let filename = output_filename(&self.form, Local::now().date_naive());
        Ok(ReportRequest {
            fields: self.form.field_values(),
            training_type: self.form.training_type,
            template_id: self.template_id,
            gallery,
            annexures,
            filename,
        })
    }
}

/// `annexure1` → 0 .. `annexure5` → 4.
fn annexure_slot(key: &str) -> Option<usize> {
    let n: usize = key.strip_prefix("annexure")?.parse().ok()?;
    (1..=ANNEXURE_PLACEHOLDERS.len()).contains(&n).then(|| n - 1)
}

fn load_media(
    section: &str,
    entries: &[MediaEntry],
    base_dir: &Path,
    max_images: Option<usize>,
) -> Result<Vec<MediaItem>, Error> {
    let max_images = max_images.unwrap_or(usize::MAX);
    if entries.len() > max_images {
        log::warn!(
            "{}: {} images supplied, only the first {} are used",
            section,
            entries.len(),
            max_images
        );
    }
    entries
        .iter()
        .take(max_images)
        .map(|entry| MediaItem::from_path(&base_dir.join(&entry.image), entry.caption.as_str()))
        .collect()
}

/// `{TRAINING_TYPE}_{YYYYMMDD}_{Cell_Name}_report.docx`. A missing event date
/// falls back to `today`, a missing cell name to `Training`.
pub fn output_filename(form: &ReportForm, today: NaiveDate) -> String {
    let date = if form.event_date.is_empty() {
        today.format("%Y%m%d").to_string()
    } else {
        form.event_date.replace('-', "")
    };
    let cell = if form.cell_name.is_empty() {
        "Training".to_string()
    } else {
        form.cell_name.replace(' ', "_")
    };
    format!(
        "{}_{}_{}_report.docx",
        form.training_type.to_uppercase(),
        date,
        cell
    )
}
