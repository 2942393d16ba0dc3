//! Text block and run models for template parts.

/// A run of text sharing one formatting style (`<w:r>`).
///
/// The run's text is split into segments, one per `<w:t>` element. Most runs
/// written by Word have exactly one segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRun {
    /// Text of each `<w:t>` element, in order
    pub segments: Vec<String>,
}

impl TextRun {
    /// Create a run with a single segment.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            segments: vec![text.into()],
        }
    }

    /// Visible text of the run.
    pub fn text(&self) -> String {
        self.segments.concat()
    }
}

/// A text-bearing block: one paragraph (`<w:p>`), wherever it sits in the
/// part (body, table cell, text box, header, footer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    /// Runs in document order
    pub runs: Vec<TextRun>,
}

impl TextBlock {
    /// Create a block from runs.
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self { runs }
    }

    /// Create a block with one single-segment run per string.
    pub fn from_runs<I, S>(runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            runs: runs.into_iter().map(TextRun::plain).collect(),
        }
    }

    /// Visible text of the block: the concatenation of its runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text()).collect()
    }

    /// Check if the block has no visible text.
    pub fn is_empty(&self) -> bool {
        self.runs
            .iter()
            .all(|r| r.segments.iter().all(|s| s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_text_concatenates_runs() {
        let block = TextBlock::new(vec![
            TextRun::plain("Eu, "),
            TextRun {
                segments: vec!["[nome".to_string(), "_completo]".to_string()],
            },
            TextRun::plain(", declaro"),
        ]);
        assert_eq!(block.text(), "Eu, [nome_completo], declaro");
        assert_eq!(block.runs[1].text(), "[nome_completo]");
    }

    #[test]
    fn test_empty_block() {
        assert!(TextBlock::default().is_empty());
        assert!(TextBlock::from_runs(["", ""]).is_empty());
        assert!(!TextBlock::from_runs(["", "x"]).is_empty());
    }
}
