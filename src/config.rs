use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct GallerySettings {
    pub images_per_row: usize,
    pub rows_per_page: usize,
    pub image_width_cm: f64,
    pub image_height_cm: f64,
    /// Upper bound on gallery images taken from a request.
    pub max_images: usize,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            images_per_row: 2,
            rows_per_page: 3,
            image_width_cm: 8.13,
            image_height_cm: 5.81,
            max_images: 10,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct AnnexureSettings {
    pub image_width_cm: f64,
    pub image_height_cm: f64,
    /// Optional upper bound on images per annexure section taken from a
    /// request. Unbounded by default.
    pub max_images: Option<usize>,
}

impl Default for AnnexureSettings {
    fn default() -> Self {
        Self {
            image_width_cm: 15.0,
            image_height_cm: 20.0,
            max_images: None,
        }
    }
}

/// Training type → template id → template file name (relative to the template dir).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TemplateRegistry {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        for training_type in ["type_a", "type_b", "type_c", "type_d"] {
            let templates = (1..=5)
                .map(|n| {
                    (
                        n.to_string(),
                        format!("{}_template_{}.docx", training_type, n),
                    )
                })
                .collect();
            entries.insert(training_type.to_string(), templates);
        }
        Self { entries }
    }
}

/// One registry entry as reported by [`TemplateRegistry::list`].
#[derive(Clone, Debug, Serialize)]
pub struct TemplateInfo {
    pub training_type: String,
    pub template_id: String,
    pub path: PathBuf,
    pub exists: bool,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, training_type: &str, template_id: &str, file_name: &str) {
        self.entries
            .entry(training_type.to_string())
            .or_default()
            .insert(template_id.to_string(), file_name.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|t| t.is_empty())
    }

    /// Path of the template file for this pair. Fails if the pair is unknown or
    /// the file does not exist.
    pub fn resolve(
        &self,
        template_dir: &Path,
        training_type: &str,
        template_id: &str,
    ) -> Result<PathBuf, Error> {
        let file_name = self
            .entries
            .get(training_type)
            .and_then(|t| t.get(template_id))
            .ok_or_else(|| Error::UnknownTemplate {
                training_type: training_type.to_string(),
                template_id: template_id.to_string(),
            })?;
        let path = template_dir.join(file_name);
        if !path.is_file() {
            return Err(Error::TemplateNotFound(path));
        }
        Ok(path)
    }

    pub fn list(&self, template_dir: &Path) -> Vec<TemplateInfo> {
        self.entries
            .iter()
            .flat_map(|(training_type, templates)| {
                templates.iter().map(move |(template_id, file_name)| {
                    let path = template_dir.join(file_name);
                    TemplateInfo {
                        training_type: training_type.clone(),
                        template_id: template_id.clone(),
                        exists: path.is_file(),
                        path,
                    }
                })
            })
            .collect()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    pub templates: TemplateRegistry,
    pub gallery: GallerySettings,
    pub annexure: AnnexureSettings,
    pub cleanup_after_hours: u64,
    pub cleanup_on_startup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("word_templates"),
            output_dir: PathBuf::from("output"),
            templates: TemplateRegistry::default(),
            gallery: GallerySettings::default(),
            annexure: AnnexureSettings::default(),
            cleanup_after_hours: 24,
            cleanup_on_startup: true,
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            ))
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.gallery.images_per_row == 0 || self.gallery.rows_per_page == 0 {
            return Err(Error::Config(
                "gallery images_per_row and rows_per_page must be at least 1".into(),
            ));
        }
        let sizes = [
            ("gallery.image_width_cm", self.gallery.image_width_cm),
            ("gallery.image_height_cm", self.gallery.image_height_cm),
            ("annexure.image_width_cm", self.annexure.image_width_cm),
            ("annexure.image_height_cm", self.annexure.image_height_cm),
        ];
        for (name, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if self.templates.is_empty() {
            return Err(Error::Config("template registry is empty".into()));
        }
        Ok(())
    }
}
