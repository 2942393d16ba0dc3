//! Format detection for Office Open XML packages.

use crate::container::decode_xml_bytes;
use crate::error::{Error, Result};
use std::io::{Read, Seek};

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Content type for the DOCX main document part.
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Content type for the DOCX main part of a macro-free template (.dotx).
const DOTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";

/// Content type for the XLSX workbook part.
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

/// Content type for the XLSM workbook part.
const XLSM_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";

/// Detected package format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// Word document or template
    Docx,
    /// Excel workbook
    Xlsx,
}

impl FormatType {
    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            FormatType::Docx => "Word Document",
            FormatType::Xlsx => "Excel Workbook",
        }
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the format type from a byte slice.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    if !is_zip_file(data) {
        return Err(Error::UnreadableFormat(
            "not an Office Open XML package".to_string(),
        ));
    }

    detect_format_from_reader(std::io::Cursor::new(data))
}

/// Detect the format type from a reader.
pub fn detect_format_from_reader<R: Read + Seek>(reader: R) -> Result<FormatType> {
    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|e| Error::UnreadableFormat(format!("corrupt package: {}", e)))?;

    let content_types = match archive.by_name("[Content_Types].xml") {
        Ok(mut file) => {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            decode_xml_bytes(&bytes)?
        }
        Err(_) => {
            return Err(Error::MissingComponent("[Content_Types].xml".to_string()));
        }
    };

    if content_types.contains(DOCX_CONTENT_TYPE) || content_types.contains(DOTX_CONTENT_TYPE) {
        Ok(FormatType::Docx)
    } else if content_types.contains(XLSX_CONTENT_TYPE)
        || content_types.contains(XLSM_CONTENT_TYPE)
    {
        Ok(FormatType::Xlsx)
    } else {
        detect_by_folder_structure(&mut archive)
    }
}

/// Fallback detection by checking folder structure.
fn detect_by_folder_structure<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<FormatType> {
    let has_word = archive.file_names().any(|n| n.starts_with("word/"));
    let has_xl = archive.file_names().any(|n| n.starts_with("xl/"));

    match (has_word, has_xl) {
        (true, false) => Ok(FormatType::Docx),
        (false, true) => Ok(FormatType::Xlsx),
        _ => Err(Error::UnreadableFormat(
            "unknown Office Open XML package".to_string(),
        )),
    }
}

/// Ensure `data` is a package of the expected format.
pub fn expect_format(data: &[u8], expected: FormatType) -> Result<()> {
    let found = detect_format_from_bytes(data)?;
    if found != expected {
        return Err(Error::UnreadableFormat(format!(
            "expected {}, found {}",
            expected, found
        )));
    }
    Ok(())
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}
