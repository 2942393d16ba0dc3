//! Editable WordprocessingML part.
//!
//! The part is kept as the exact list of XML events it was read from. Text
//! blocks are a view over the `<w:t>` elements inside `<w:p>`/`<w:r>`;
//! serializing writes every event back verbatim except the text of segments
//! that were changed.

use crate::error::Result;
use crate::model::{TextBlock, TextRun};
use quick_xml::events::{BytesStart, BytesText, Event};
use std::collections::{HashMap, HashSet};

/// Location of one `<w:t>` element in the event list.
#[derive(Debug, Clone)]
struct Slot {
    /// Index of the `<w:t>` start event
    open: usize,
    /// Indices of the text events inside it
    texts: Vec<usize>,
    /// Unescaped text as read
    original: String,
}

/// A paragraph still being read.
#[derive(Debug, Default)]
struct OpenBlock {
    runs: Vec<Vec<Slot>>,
    in_run: bool,
}

/// One XML part of a document package, with its text blocks.
#[derive(Debug, Clone)]
pub struct XmlPart {
    name: String,
    events: Vec<Event<'static>>,
    blocks: Vec<TextBlock>,
    layout: Vec<Vec<Vec<Slot>>>,
}

impl XmlPart {
    /// Parse a part. Every `<w:p>` at any depth (body, table cells, nested
    /// tables, text boxes) becomes a block, in the order it closes.
    pub fn parse(name: impl Into<String>, xml: &str) -> Result<Self> {
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut events: Vec<Event<'static>> = Vec::new();
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut blocks = Vec::new();
        let mut layout = Vec::new();
        let mut in_text = false;

        loop {
            let event = reader.read_event()?;
            let idx = events.len();

            match &event {
                Event::Start(e) => match e.name().as_ref() {
                    b"w:p" => stack.push(OpenBlock::default()),
                    b"w:r" => {
                        if let Some(block) = stack.last_mut() {
                            block.runs.push(Vec::new());
                            block.in_run = true;
                        }
                    }
                    b"w:t" => {
                        if let Some(block) = stack.last_mut().filter(|b| b.in_run) {
                            if let Some(run) = block.runs.last_mut() {
                                run.push(Slot {
                                    open: idx,
                                    texts: Vec::new(),
                                    original: String::new(),
                                });
                                in_text = true;
                            }
                        }
                    }
                    _ => {}
                },
                Event::Text(e) if in_text => {
                    let text = e.unescape()?;
                    let slot = stack
                        .last_mut()
                        .and_then(|b| b.runs.last_mut())
                        .and_then(|r| r.last_mut());
                    if let Some(slot) = slot {
                        slot.texts.push(idx);
                        slot.original.push_str(&text);
                    }
                }
                Event::End(e) => match e.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:r" => {
                        if let Some(block) = stack.last_mut() {
                            block.in_run = false;
                        }
                    }
                    b"w:p" => {
                        if let Some(block) = stack.pop() {
                            blocks.push(TextBlock::new(
                                block
                                    .runs
                                    .iter()
                                    .map(|slots| TextRun {
                                        segments: slots.iter().map(|s| s.original.clone()).collect(),
                                    })
                                    .collect(),
                            ));
                            layout.push(block.runs);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }

            events.push(event.into_owned());
        }

        let name = name.into();
        tracing::debug!(part = %name, events = events.len(), blocks = blocks.len(), "parsed part");

        Ok(Self {
            name,
            events,
            blocks,
            layout,
        })
    }

    /// Part name inside the package, e.g. `word/document.xml`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text blocks in closing order.
    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    /// Mutable text blocks. Only segment text edits are written back; adding
    /// or removing runs and segments has no effect on the output.
    pub fn blocks_mut(&mut self) -> &mut [TextBlock] {
        &mut self.blocks
    }

    /// Whether any segment differs from what was read.
    pub fn is_modified(&self) -> bool {
        self.changed_segments().next().is_some()
    }

    fn changed_segments(&self) -> impl Iterator<Item = (&Slot, &str)> {
        self.blocks
            .iter()
            .zip(&self.layout)
            .flat_map(|(block, runs)| block.runs.iter().zip(runs))
            .flat_map(|(run, slots)| run.segments.iter().zip(slots))
            .filter(|(text, slot)| **text != slot.original)
            .map(|(text, slot)| (slot, text.as_str()))
    }

    /// Serialize the part.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut replaced: HashMap<usize, &str> = HashMap::new();
        let mut dropped: HashSet<usize> = HashSet::new();
        for (slot, text) in self.changed_segments() {
            replaced.insert(slot.open, text);
            dropped.extend(slot.texts.iter().copied());
        }

        let mut writer = quick_xml::Writer::new(Vec::new());
        for (idx, event) in self.events.iter().enumerate() {
            if dropped.contains(&idx) {
                continue;
            }
            match (event, replaced.get(&idx)) {
                (Event::Start(start), Some(text)) => {
                    writer.write_event(Event::Start(preserve_space(start)))?;
                    if !text.is_empty() {
                        writer.write_event(Event::Text(BytesText::new(text)))?;
                    }
                }
                _ => writer.write_event(event.borrow())?,
            }
        }

        Ok(writer.into_inner())
    }
}

/// Copy a `<w:t>` start tag with `xml:space="preserve"`, so leading and
/// trailing spaces of the new text are kept by Word.
fn preserve_space(start: &BytesStart) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in start.attributes().flatten() {
        if attr.key.as_ref() != b"xml:space" {
            out.push_attribute(attr);
        }
    }
    out.push_attribute(("xml:space", "preserve"));
    out
}
