use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// The file is not a usable DOCX package (bad zip, missing main part).
    InvalidDocx(String),
    Xml(String),
    /// Image bytes could not be recognised or measured.
    Image(String),
    /// The registry maps to a template file that does not exist.
    TemplateNotFound(PathBuf),
    /// No registry entry for this training type / template id pair.
    UnknownTemplate {
        training_type: String,
        template_id: String,
    },
    Config(String),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{}", e),
            Self::InvalidDocx(msg) => write!(f, "invalid docx: {}", msg),
            Self::Xml(msg) => write!(f, "xml error: {}", msg),
            Self::Image(msg) => write!(f, "image error: {}", msg),
            Self::TemplateNotFound(path) => {
                write!(f, "template file not found: {}", path.display())
            }
            Self::UnknownTemplate {
                training_type,
                template_id,
            } => write!(
                f,
                "no template {} registered for training type {}",
                template_id, training_type
            ),
            Self::Config(msg) => write!(f, "invalid configuration: {}", msg),
            Self::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io_err) => Self::Io(io_err),
            other => Self::InvalidDocx(other.to_string()),
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::InvalidDocx(e.to_string())
    }
}
