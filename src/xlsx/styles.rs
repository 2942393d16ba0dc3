//! XLSX cell styles: just enough to recognise date cells.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use std::collections::HashMap;

/// Number format information parsed from `xl/styles.xml`.
#[derive(Debug, Default)]
pub struct Styles {
    /// Custom number formats: numFmtId -> formatCode
    num_fmts: HashMap<u32, String>,
    /// Cell formats: style index (`s` attribute) -> numFmtId
    cell_xfs: Vec<u32>,
}

impl Styles {
    /// Parse styles from `xl/styles.xml` content. Malformed input yields
    /// whatever was read before the error.
    pub fn parse(xml: &str) -> Self {
        let mut styles = Self::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut in_num_fmts = false;
        let mut in_cell_xfs = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(ref e)) => match e.name().as_ref() {
                    b"numFmts" => in_num_fmts = true,
                    b"cellXfs" => in_cell_xfs = true,
                    b"xf" if in_cell_xfs => styles.cell_xfs.push(num_fmt_id_of(e)),
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(ref e)) => match e.name().as_ref() {
                    b"numFmt" if in_num_fmts => {
                        let mut format_code = String::new();
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"formatCode" {
                                format_code = attr
                                    .unescape_value()
                                    .map(|v| v.to_string())
                                    .unwrap_or_default();
                            }
                        }
                        styles.num_fmts.insert(num_fmt_id_of(e), format_code);
                    }
                    b"xf" if in_cell_xfs => styles.cell_xfs.push(num_fmt_id_of(e)),
                    _ => {}
                },
                Ok(quick_xml::events::Event::End(ref e)) => match e.name().as_ref() {
                    b"numFmts" => in_num_fmts = false,
                    b"cellXfs" => in_cell_xfs = false,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(_) => break,
                _ => {}
            }
            buf.clear();
        }

        styles
    }

    /// Whether the cell style at `style_index` displays numbers as dates.
    pub fn is_date_style(&self, style_index: usize) -> bool {
        self.cell_xfs
            .get(style_index)
            .is_some_and(|&id| self.is_date_format(id))
    }

    /// Check if a numFmtId represents a date or time format.
    fn is_date_format(&self, num_fmt_id: u32) -> bool {
        // built-in 14-22 are dates, 45-47 times
        if (14..=22).contains(&num_fmt_id) || (45..=47).contains(&num_fmt_id) {
            return true;
        }

        self.num_fmts
            .get(&num_fmt_id)
            .is_some_and(|code| is_date_format_code(code))
    }
}

fn num_fmt_id_of(e: &quick_xml::events::BytesStart) -> u32 {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"numFmtId")
        .and_then(|attr| String::from_utf8_lossy(&attr.value).parse().ok())
        .unwrap_or(0)
}

/// Check if a format code string represents a date format.
///
/// Looks for `d`, `y` or a month `m` outside of `[...]` sections and quoted
/// literals; a lone `m` next to `h`/`s` is minutes.
fn is_date_format_code(format_code: &str) -> bool {
    let mut in_bracket = false;
    let mut in_quote = false;
    let mut escaped = false;
    let mut has_month_or_minute = false;
    let mut has_time = false;

    for c in format_code.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_quote => in_bracket = true,
            ']' if !in_quote => in_bracket = false,
            '"' => in_quote = !in_quote,
            _ if in_bracket || in_quote => {}
            _ => match c.to_ascii_lowercase() {
                'd' | 'y' => return true,
                'm' => has_month_or_minute = true,
                'h' | 's' => has_time = true,
                _ => {}
            },
        }
    }

    has_month_or_minute && !has_time
}

/// First serial past 9999-12-31 23:59:59.
const MAX_SERIAL: f64 = 2_958_466.0;

/// Convert a serial date number to text.
///
/// Whole serials become `YYYY-MM-DD`; serials with a time part become
/// `YYYY-MM-DD HH:MM:SS`. `date1904` selects the 1904 date system.
/// Serials outside Excel's date range yield `None`.
pub fn serial_to_text(serial: f64, date1904: bool) -> Option<String> {
    if !serial.is_finite() || !(0.0..MAX_SERIAL).contains(&serial) {
        return None;
    }

    let base = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if serial >= 61.0 {
        // serial 60 is the nonexistent 1900-02-29 kept for Lotus 1-2-3
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    };

    let days = Duration::try_days(serial.trunc() as i64)?;
    let seconds = Duration::try_seconds((serial.fract() * 86_400.0).round() as i64)?;
    let datetime: NaiveDateTime = base
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(days)?
        .checked_add_signed(seconds)?;

    if datetime.num_seconds_from_midnight() == 0 {
        Some(datetime.format("%Y-%m-%d").to_string())
    } else {
        Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
