//! XLSX workbook reader.

use crate::container::OoxmlContainer;
use crate::detect::{expect_format, FormatType};
use crate::error::{Error, Result};
use crate::model::Dataset;
use std::path::Path;

use super::shared_strings::SharedStrings;
use super::styles::{serial_to_text, Styles};

const WORKBOOK_PART: &str = "xl/workbook.xml";

/// Column count of a worksheet (`XFD`).
const MAX_COLUMNS: usize = 16_384;

/// Sheet info from workbook.xml.
#[derive(Debug, Clone)]
struct SheetInfo {
    name: String,
    rel_id: String,
}

/// Reader for the sheets of an XLSX workbook.
pub struct WorkbookReader {
    container: OoxmlContainer,
    shared_strings: SharedStrings,
    styles: Styles,
    sheets: Vec<SheetInfo>,
    date1904: bool,
}

impl WorkbookReader {
    /// Open a workbook file.
    ///
    /// Fails with [`Error::DataFileNotFound`] when the file does not exist and
    /// with [`Error::UnreadableFormat`] when it is not a readable workbook.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::DataFileNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), bytes = data.len(), "opening workbook");
        Self::from_bytes(data)
    }

    /// Create a reader from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        expect_format(&data, FormatType::Xlsx)?;
        let container = OoxmlContainer::from_bytes(data).map_err(unreadable)?;
        Self::from_container(container).map_err(unreadable)
    }

    fn from_container(container: OoxmlContainer) -> Result<Self> {
        let shared_strings = if let Ok(xml) = container.read_xml("xl/sharedStrings.xml") {
            SharedStrings::parse(&xml)?
        } else {
            SharedStrings::default()
        };

        let styles = if let Ok(xml) = container.read_xml("xl/styles.xml") {
            Styles::parse(&xml)
        } else {
            Styles::default()
        };

        let xml = container.read_xml(WORKBOOK_PART)?;
        let (sheets, date1904) = Self::parse_workbook(&xml)?;

        Ok(Self {
            container,
            shared_strings,
            styles,
            sheets,
            date1904,
        })
    }

    /// Parse workbook.xml for sheet info and the date system.
    fn parse_workbook(xml: &str) -> Result<(Vec<SheetInfo>, bool)> {
        let mut sheets = Vec::new();
        let mut date1904 = false;

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e))
                | Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                    b"sheet" => {
                        let mut name = String::new();
                        let mut rel_id = String::new();

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"name" => {
                                    name = attr
                                        .unescape_value()
                                        .map(|v| v.to_string())
                                        .unwrap_or_default();
                                }
                                b"r:id" => {
                                    rel_id = String::from_utf8_lossy(&attr.value).to_string();
                                }
                                _ => {}
                            }
                        }

                        if !name.is_empty() {
                            sheets.push(SheetInfo { name, rel_id });
                        }
                    }
                    b"workbookPr" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"date1904" {
                                let val = String::from_utf8_lossy(&attr.value);
                                date1904 = val == "1" || val == "true";
                            }
                        }
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok((sheets, date1904))
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Read a sheet into a dataset.
    ///
    /// The first non-empty row is the header; rows without any non-empty cell
    /// are skipped. Fails with [`Error::SheetNotFound`] or [`Error::EmptySheet`].
    pub fn read_sheet(&self, name: &str) -> Result<Dataset> {
        let sheet = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::SheetNotFound {
                sheet: name.to_string(),
                available: self.sheets.iter().map(|s| s.name.clone()).collect(),
            })?;

        let path = self.sheet_path(sheet).map_err(unreadable)?;
        let xml = self.container.read_xml(&path).map_err(unreadable)?;
        let mut rows = self.parse_sheet(&xml).map_err(unreadable)?.into_iter();

        let header = rows
            .next()
            .ok_or_else(|| Error::EmptySheet(name.to_string()))?;
        let data: Vec<Vec<String>> = rows.collect();
        if data.is_empty() {
            return Err(Error::EmptySheet(name.to_string()));
        }

        tracing::debug!(
            sheet = name,
            columns = header.len(),
            records = data.len(),
            "read sheet"
        );
        Ok(Dataset::from_rows(header, data))
    }

    /// Locate the worksheet part through the workbook relationships.
    fn sheet_path(&self, sheet: &SheetInfo) -> Result<String> {
        let rels = self.container.read_relationships(WORKBOOK_PART)?;
        let rel = rels
            .get(&sheet.rel_id)
            .ok_or_else(|| Error::MissingComponent(format!("relationship {}", sheet.rel_id)))?;
        Ok(OoxmlContainer::resolve_path(WORKBOOK_PART, &rel.target))
    }

    /// Parse a worksheet into rows of cell text, dropping blank rows.
    fn parse_sheet(&self, xml: &str) -> Result<Vec<Vec<String>>> {
        let mut rows = Vec::new();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut current_row: Option<Vec<String>> = None;
        let mut cell = CellState::default();
        let mut in_cell = false;
        let mut in_value = false;
        let mut phonetic_depth = 0u32;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(ref e)) => match e.name().as_ref() {
                    b"row" => current_row = Some(Vec::new()),
                    b"c" if current_row.is_some() => {
                        in_cell = true;
                        cell = CellState::from_start(e, current_row.as_ref().map_or(0, Vec::len));
                    }
                    b"rPh" if in_cell => phonetic_depth += 1,
                    b"v" | b"t" if in_cell && phonetic_depth == 0 => in_value = true,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Text(ref e)) => {
                    if in_value {
                        let text = e
                            .unescape()
                            .map_err(|err| Error::XmlParse(err.to_string()))?;
                        cell.raw.push_str(&text);
                    }
                }
                Ok(quick_xml::events::Event::End(ref e)) => match e.name().as_ref() {
                    b"row" => {
                        if let Some(row) = current_row.take() {
                            if row.iter().any(|c| !c.is_empty()) {
                                rows.push(row);
                            }
                        }
                    }
                    b"c" if in_cell => {
                        let value = self.resolve_cell_value(&cell);
                        if let Some(ref mut row) = current_row {
                            place(row, cell.column, value);
                        }
                        in_cell = false;
                    }
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"v" | b"t" => in_value = false,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(rows)
    }

    /// Normalize a cell to text based on its type and style.
    fn resolve_cell_value(&self, cell: &CellState) -> String {
        let value = cell.raw.as_str();
        match cell.cell_type.as_deref() {
            Some("s") => value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| self.shared_strings.get(idx))
                .unwrap_or_default()
                .to_string(),
            Some("b") => match value.trim() {
                "1" => "True".to_string(),
                "0" => "False".to_string(),
                other => other.to_string(),
            },
            Some("str") | Some("inlineStr") | Some("e") => value.to_string(),
            _ => {
                let number = value.trim();
                if number.is_empty() {
                    return String::new();
                }
                let is_date = cell.style.is_some_and(|s| self.styles.is_date_style(s));
                if is_date {
                    if let Some(text) = number
                        .parse::<f64>()
                        .ok()
                        .and_then(|serial| serial_to_text(serial, self.date1904))
                    {
                        return text;
                    }
                }
                number.to_string()
            }
        }
    }
}

/// Attributes and collected text of the cell being parsed.
#[derive(Debug, Default)]
struct CellState {
    column: usize,
    cell_type: Option<String>,
    style: Option<usize>,
    raw: String,
}

impl CellState {
    fn from_start(e: &quick_xml::events::BytesStart, next_column: usize) -> Self {
        let mut state = CellState {
            column: next_column,
            ..Default::default()
        };

        for attr in e.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value);
            match attr.key.as_ref() {
                b"r" => {
                    if let Some(col) = column_index(&value) {
                        state.column = col;
                    }
                }
                b"t" => state.cell_type = Some(value.to_string()),
                b"s" => state.style = value.parse().ok(),
                _ => {}
            }
        }

        state
    }
}

/// Put a value at its column, padding skipped columns with empty cells.
fn place(row: &mut Vec<String>, column: usize, value: String) {
    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = value;
}

/// Zero-based column index of a cell reference: `A1` -> 0, `AB12` -> 27.
fn column_index(reference: &str) -> Option<usize> {
    let letters: String = reference
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }

    let mut index = 0usize;
    for c in letters.chars() {
        let digit = c.to_ascii_uppercase() as usize - 'A' as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    (index <= MAX_COLUMNS).then(|| index - 1)
}

/// Container and XML failures while reading a workbook mean the file is not
/// a usable workbook.
fn unreadable(err: Error) -> Error {
    match err {
        Error::ZipArchive(msg) | Error::XmlParse(msg) => Error::UnreadableFormat(msg),
        Error::MissingComponent(part) => Error::UnreadableFormat(format!("missing {}", part)),
        other => other,
    }
}

impl Dataset {
    /// Load the records of `sheet` from the workbook at `path`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use docfill::Dataset;
    ///
    /// let dataset = Dataset::load("dados/banco_de_dados.xlsx", "termo")?;
    /// for entry in dataset.listing("Nome do Artista")? {
    ///     println!("{}: {}", entry.index, entry.label);
    /// }
    /// # Ok::<(), docfill::Error>(())
    /// ```
    pub fn load(path: impl AsRef<Path>, sheet: &str) -> Result<Self> {
        WorkbookReader::open(path)?.read_sheet(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#;

    const WORKBOOK: &str = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr/><sheets><sheet name="capa" sheetId="1" r:id="rId1"/><sheet name="termo" sheetId="2" r:id="rId2"/><sheet name="vazia" sheetId="3" r:id="rId3"/></sheets></workbook>"#;

    const RELS: &str = r#"<Relationships><Relationship Id="rId1" Type="ws" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="ws" Target="worksheets/sheet2.xml"/><Relationship Id="rId3" Type="ws" Target="/xl/worksheets/sheet3.xml"/></Relationships>"#;

    const SHARED: &str = r#"<sst><si><t>Nome do Artista</t></si><si><t>CPF</t></si><si><t>Ana Souza</t></si><si><t>Cachê</t></si></sst>"#;

    const STYLES: &str = r#"<styleSheet><cellXfs><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs></styleSheet>"#;

    const SHEET2: &str = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>3</v></c><c r="D1" t="inlineStr"><is><t>Data</t></is></c><c r="E1" t="inlineStr"><is><t>Ativo</t></is></c></row>
<row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>12345678901</v></c><c r="C2"><v>1500.5</v></c><c r="D2" s="1"><v>45296</v></c><c r="E2" t="b"><v>1</v></c></row>
<row r="3"><c r="A3" s="1"/></row>
<row r="4"><c r="A4" t="inlineStr"><is><t xml:space="preserve">Bruno  </t></is></c><c r="C4" t="str"><f>1+1</f><v>2</v></c><c r="D4" s="1"><v>100000000</v></c></row>
</sheetData></worksheet>"#;

    const SHEET3: &str = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row></sheetData></worksheet>"#;

    fn workbook_bytes() -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELS),
            ("xl/sharedStrings.xml", SHARED),
            ("xl/styles.xml", STYLES),
            ("xl/worksheets/sheet1.xml", "<worksheet><sheetData/></worksheet>"),
            ("xl/worksheets/sheet2.xml", SHEET2),
            ("xl/worksheets/sheet3.xml", SHEET3),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("z9"), Some(25));
        assert_eq!(column_index("AA3"), Some(26));
        assert_eq!(column_index("AB12"), Some(27));
        assert_eq!(column_index("12"), None);
        assert_eq!(column_index("XFD1"), Some(16_383));
        assert_eq!(column_index("XFE1"), None);
        assert_eq!(column_index("AAAAAAAAAAAAAAA1"), None);
    }

    #[test]
    fn test_sheet_names() {
        let reader = WorkbookReader::from_bytes(workbook_bytes()).unwrap();
        assert_eq!(reader.sheet_names(), vec!["capa", "termo", "vazia"]);
    }

    #[test]
    fn test_read_sheet_normalizes_cells_to_text() {
        let reader = WorkbookReader::from_bytes(workbook_bytes()).unwrap();
        let ds = reader.read_sheet("termo").unwrap();

        assert_eq!(ds.columns(), ["Nome do Artista", "CPF", "Cachê", "Data", "Ativo"]);
        assert_eq!(ds.len(), 2);

        let ana = ds.get(0).unwrap();
        assert_eq!(ana.get("Nome do Artista"), Some("Ana Souza"));
        assert_eq!(ana.get("CPF"), Some("12345678901"));
        assert_eq!(ana.get("Cachê"), Some("1500.5"));
        assert_eq!(ana.get("Data"), Some("2024-01-05"));
        assert_eq!(ana.get("Ativo"), Some("True"));

        let bruno = ds.get(1).unwrap();
        assert_eq!(bruno.get("Nome do Artista"), Some("Bruno  "));
        assert_eq!(bruno.get("CPF"), Some(""));
        assert_eq!(bruno.get("Cachê"), Some("2"));
        // an amount typed into a date-formatted cell keeps its number
        assert_eq!(bruno.get("Data"), Some("100000000"));
    }

    #[test]
    fn test_missing_sheet() {
        let reader = WorkbookReader::from_bytes(workbook_bytes()).unwrap();
        match reader.read_sheet("Termo") {
            Err(Error::SheetNotFound { sheet, available }) => {
                assert_eq!(sheet, "Termo");
                assert_eq!(available, vec!["capa", "termo", "vazia"]);
            }
            other => panic!("unexpected result: {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_empty_sheets() {
        let reader = WorkbookReader::from_bytes(workbook_bytes()).unwrap();
        assert!(matches!(reader.read_sheet("capa"), Err(Error::EmptySheet(_))));
        // header only
        assert!(matches!(reader.read_sheet("vazia"), Err(Error::EmptySheet(_))));
    }

    #[test]
    fn test_unreadable_and_missing_files() {
        assert!(matches!(
            WorkbookReader::from_bytes(b"nome;cpf\nAna;123".to_vec()),
            Err(Error::UnreadableFormat(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nao_existe.xlsx");
        assert!(matches!(
            Dataset::load(&missing, "termo"),
            Err(Error::DataFileNotFound(p)) if p == missing
        ));
    }
}
