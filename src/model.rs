use std::io::Cursor;
use std::path::Path;

use crate::error::Error;

pub const EMU_PER_CM: f64 = 360_000.0;
pub const TWIPS_PER_CM: f64 = 1440.0 / 2.54;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }
}

/// Display size of an inline picture, in EMU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub cx: i64,
    pub cy: i64,
}

impl Extent {
    pub fn from_cm(width_cm: f64, height_cm: f64) -> Self {
        Self {
            cx: (width_cm * EMU_PER_CM).round() as i64,
            cy: (height_cm * EMU_PER_CM).round() as i64,
        }
    }
}

pub fn cm_to_twips(cm: f64) -> u32 {
    (cm * TWIPS_PER_CM).round() as u32
}

/// Image bytes that have been recognised and measured, ready to be embedded.
#[derive(Clone)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl EmbeddedImage {
    /// Sniffs the format and reads the dimensions from the header only.
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        let reader = image::ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let format = match reader.format() {
            Some(image::ImageFormat::Png) => ImageFormat::Png,
            Some(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Some(image::ImageFormat::Gif) => ImageFormat::Gif,
            Some(image::ImageFormat::Bmp) => ImageFormat::Bmp,
            Some(image::ImageFormat::Tiff) => ImageFormat::Tiff,
            Some(other) => {
                return Err(Error::Image(format!("unsupported image format {:?}", other)));
            }
            None => return Err(Error::Image("unrecognised image data".into())),
        };
        let (pixel_width, pixel_height) = reader.into_dimensions()?;
        if pixel_width == 0 || pixel_height == 0 {
            return Err(Error::Image("image has zero size".into()));
        }
        Ok(Self {
            data: data.to_vec(),
            format,
            pixel_width,
            pixel_height,
        })
    }
}

/// One picture supplied by the caller, with its optional caption.
#[derive(Clone, Debug, Default)]
pub struct MediaItem {
    pub data: Vec<u8>,
    pub caption: Option<String>,
    /// Used only in log messages.
    pub label: String,
}

impl MediaItem {
    pub fn new(data: Vec<u8>, caption: impl Into<String>) -> Self {
        let caption = caption.into();
        Self {
            data,
            caption: if caption.is_empty() { None } else { Some(caption) },
            label: String::new(),
        }
    }

    pub fn from_path(path: &Path, caption: impl Into<String>) -> Result<Self, Error> {
        let data = std::fs::read(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            ))
        })?;
        let mut item = Self::new(data, caption);
        item.label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(item)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Caption text if present and non-empty.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref().filter(|c| !c.is_empty())
    }
}

/// Insertion-ordered placeholder token → value mapping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldValues {
    entries: Vec<(String, String)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value of an existing token in place, otherwise appends.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}
