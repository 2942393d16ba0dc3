//! DOCX template: load, fill, save.

use crate::container::OoxmlContainer;
use crate::detect::{expect_format, FormatType};
use crate::error::{Error, Result};
use crate::model::{PlaceholderMap, TextBlock};
use regex::Regex;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

use super::fill::{fill_blocks, FillReport};
use super::part::XmlPart;

const DOCUMENT_PART: &str = "word/document.xml";

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\[\]\r\n]+\]").expect("Invalid placeholder regex"));

/// A `.docx` template held in memory.
///
/// The main document part and every header and footer part are parsed into
/// text blocks; all other package entries are kept as they are and copied
/// through on save.
pub struct Template {
    container: OoxmlContainer,
    parts: Vec<XmlPart>,
}

impl Template {
    /// Open a template file. A missing file is [`Error::TemplateNotFound`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::TemplateNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_bytes(data)
    }

    /// Load a template from the bytes of a `.docx` package.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        expect_format(&data, FormatType::Docx)?;
        let container = OoxmlContainer::from_bytes(data)?;

        let mut names = vec![DOCUMENT_PART.to_string()];
        names.extend(
            container
                .list_files_with_prefix("word/")
                .into_iter()
                .filter(|name| is_header_or_footer(name)),
        );

        let parts = names
            .into_iter()
            .map(|name| {
                let xml = container.read_xml(&name)?;
                XmlPart::parse(name, &xml)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(parts = parts.len(), "loaded template");
        Ok(Self { container, parts })
    }

    /// Substitute the mapping into every part.
    pub fn fill(&mut self, map: &PlaceholderMap) -> FillReport {
        let mut report = FillReport::default();
        for part in &mut self.parts {
            let part_report = fill_blocks(part.blocks_mut(), map);
            if part_report.replacements > 0 {
                tracing::debug!(
                    part = part.name(),
                    replacements = part_report.replacements,
                    "filled part"
                );
            }
            report.merge(part_report);
        }
        report
    }

    /// Text blocks of all parts: document body first, then headers and footers.
    pub fn blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.parts.iter().flat_map(|p| p.blocks().iter())
    }

    /// Visible text, one line per block.
    pub fn text(&self) -> String {
        self.blocks()
            .map(|b| b.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Distinct bracketed tokens in the visible text, in order of appearance.
    pub fn placeholders(&self) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for block in self.blocks() {
            let text = block.text();
            for m in PLACEHOLDER_REGEX.find_iter(&text) {
                if !found.iter().any(|t| t == m.as_str()) {
                    found.push(m.as_str().to_string());
                }
            }
        }
        found
    }

    /// Serialize the package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut replaced = HashMap::new();
        for part in self.parts.iter().filter(|p| p.is_modified()) {
            replaced.insert(part.name().to_string(), part.to_xml()?);
        }

        let cursor = self
            .container
            .write_with_parts(Cursor::new(Vec::new()), &replaced)?;
        Ok(cursor.into_inner())
    }

    /// Write the package to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("parts", &self.parts.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// `word/header1.xml`, `word/footer2.xml`, ... directly under `word/`.
fn is_header_or_footer(name: &str) -> bool {
    name.strip_prefix("word/").is_some_and(|rest| {
        !rest.contains('/')
            && rest.ends_with(".xml")
            && (rest.starts_with("header") || rest.starts_with("footer"))
    })
}
