//! Error types for the docfill library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docfill operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading data, filling templates or saving output.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The spreadsheet file does not exist.
    #[error("Data file not found: {}", .0.display())]
    DataFileNotFound(PathBuf),

    /// The requested sheet is not part of the workbook.
    #[error("Sheet '{sheet}' not found (available: {})", .available.join(", "))]
    SheetNotFound {
        /// Requested sheet name
        sheet: String,
        /// Sheet names present in the workbook
        available: Vec<String>,
    },

    /// The file is not a readable workbook or document package.
    #[error("Unreadable format: {0}")]
    UnreadableFormat(String),

    /// The sheet has no header or no data rows.
    #[error("Sheet '{0}' is empty")]
    EmptySheet(String),

    /// A configured column is not present in the dataset.
    #[error("Column '{0}' not found in the spreadsheet")]
    ColumnNotFound(String),

    /// The operator's index list contains a token that is not an integer.
    #[error("Invalid selection '{0}': only comma-separated numbers are accepted")]
    InvalidSelection(String),

    /// The template document does not exist.
    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// A required package part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// Error reading or writing a ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// The configuration file could not be parsed or is inconsistent.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error stops the generation loop instead of skipping one record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::TemplateNotFound(_))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
