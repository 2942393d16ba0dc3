//! Builders for small workbooks and templates used by the integration tests.

#![allow(dead_code)]

use docfill::{ColumnMapping, Config};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;

const XLSX_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const DOCX_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn zip_entries(entries: &[(&str, String)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn column_letter(idx: usize) -> char {
    (b'A' + idx as u8) as char
}

/// Bytes of a one-sheet workbook with inline-string cells.
pub fn workbook_bytes(sheet: &str, header: &[&str], rows: &[&[&str]]) -> Vec<u8> {
    let mut sheet_data = String::new();
    let all_rows = std::iter::once(header).chain(rows.iter().copied());
    for (r, cells) in all_rows.enumerate() {
        sheet_data.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, value) in cells.iter().enumerate() {
            sheet_data.push_str(&format!(
                r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_letter(c),
                r + 1,
                escape(value)
            ));
        }
        sheet_data.push_str("</row>");
    }

    zip_entries(&[
        ("[Content_Types].xml", XLSX_CONTENT_TYPES.to_string()),
        (
            "xl/workbook.xml",
            format!(
                r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
                escape(sheet)
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
        ),
        (
            "xl/worksheets/sheet1.xml",
            format!("<worksheet><sheetData>{}</sheetData></worksheet>", sheet_data),
        ),
    ])
}

/// A paragraph with one run per string.
pub fn paragraph(runs: &[&str]) -> String {
    let runs: String = runs
        .iter()
        .map(|text| format!(r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#, escape(text)))
        .collect();
    format!("<w:p>{}</w:p>", runs)
}

/// A table with one cell per paragraph.
pub fn table(cells: &[String]) -> String {
    let cells: String = cells
        .iter()
        .map(|p| format!("<w:tc>{}</w:tc>", p))
        .collect();
    format!("<w:tbl><w:tr>{}</w:tr></w:tbl>", cells)
}

/// Bytes of a `.docx` whose body is `body`.
pub fn template_bytes(body: &str) -> Vec<u8> {
    zip_entries(&[
        ("[Content_Types].xml", DOCX_CONTENT_TYPES.to_string()),
        (
            "word/document.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
                body
            ),
        ),
        ("word/styles.xml", "<w:styles/>".to_string()),
    ])
}

/// The standard fixture: three artists and a commitment-letter template.
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub config: Config,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_rows(&[
            &["Ana Souza", "111.222.333-44", "Rua A, 1"],
            &["Bruno Lima", "555.666.777-88", "Rua B, 2"],
            &["Carla Dias", "999.000.111-22", "Rua C, 3"],
        ])
    }

    pub fn with_rows(rows: &[&[&str]]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("dados.xlsx");
        let template = dir.path().join("modelo.docx");

        fs::write(
            &data,
            workbook_bytes("termo", &["Nome do Artista", "CPF", "Endereço Completo"], rows),
        )
        .unwrap();

        let body = [
            paragraph(&["TERMO DE COMPROMISSO"]),
            paragraph(&["Eu, ", "[nome_completo]", ", CPF ", "[cpf]", ", residente em ", "[endereco]", "."]),
            paragraph(&["Categoria: [categoria]. Valor: ", "[valor]"]),
            table(&[paragraph(&["Assinatura de [nome_completo]"])]),
            paragraph(&["São Paulo, ", "[data_atual]"]),
        ]
        .concat();
        fs::write(&template, template_bytes(&body)).unwrap();

        let config = Config::default()
            .with_data_path(&data)
            .with_sheet("termo")
            .with_id_column("Nome do Artista")
            .with_template(&template)
            .with_output_dir(dir.path().join("saida"))
            .with_prefix("Termo")
            .with_columns(vec![
                ColumnMapping::new("Nome do Artista", "[nome_completo]"),
                ColumnMapping::new("CPF", "[cpf]"),
                ColumnMapping::new("Endereço Completo", "[endereco]"),
            ])
            .with_fields(["categoria", "valor"]);

        Self { dir, config }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output.dir
    }

    /// Output files, sorted by name.
    pub fn outputs(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = match fs::read_dir(self.output_dir()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }
}

/// Visible text of a generated document.
pub fn document_text(path: &Path) -> String {
    docfill::Template::open(path).unwrap().text()
}

/// Run `f` and return it together with everything it logged at warn level
/// or above.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    let log = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (value, log)
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
