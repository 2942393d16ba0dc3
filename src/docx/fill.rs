//! Run-level placeholder substitution.

use crate::model::{PlaceholderMap, TextBlock, TextRun};

/// What a fill pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Number of token occurrences replaced
    pub replacements: usize,
    /// Tokens found in a block's text that no single run contains
    pub split_placeholders: Vec<String>,
}

impl FillReport {
    /// Add another report's counts to this one.
    pub fn merge(&mut self, other: FillReport) {
        self.replacements += other.replacements;
        for token in other.split_placeholders {
            if !self.split_placeholders.contains(&token) {
                self.split_placeholders.push(token);
            }
        }
    }
}

/// Substitute every token of `map` into `blocks`.
///
/// For each block and each token, in mapping order: a token absent from the
/// block's current text is skipped; otherwise every run whose own text holds
/// the whole token has all its occurrences replaced. A token spread over
/// several runs is left as is and listed in the report.
pub fn fill_blocks(blocks: &mut [TextBlock], map: &PlaceholderMap) -> FillReport {
    let mut report = FillReport::default();

    for block in blocks.iter_mut() {
        for (token, value) in map.iter() {
            if token.is_empty() || !block.text().contains(token) {
                continue;
            }

            let mut matched = false;
            for run in block.runs.iter_mut() {
                let count = replace_in_run(run, token, value);
                if count > 0 {
                    matched = true;
                    report.replacements += count;
                }
            }

            if !matched && !report.split_placeholders.iter().any(|t| t == token) {
                tracing::warn!(placeholder = token, "placeholder is split across runs, left unreplaced");
                report.split_placeholders.push(token.to_string());
            }
        }
    }

    report
}

/// Replace `token` inside one run, returning the number of occurrences.
fn replace_in_run(run: &mut TextRun, token: &str, value: &str) -> usize {
    let text = run.text();
    let total = text.matches(token).count();
    if total == 0 {
        return 0;
    }

    let in_segments: usize = run.segments.iter().map(|s| s.matches(token).count()).sum();
    if in_segments == total {
        for segment in run.segments.iter_mut().filter(|s| s.contains(token)) {
            *segment = segment.replace(token, value);
        }
    } else {
        // occurrence straddles two <w:t> of the same run
        let replaced = text.replace(token, value);
        for (i, segment) in run.segments.iter_mut().enumerate() {
            if i == 0 {
                *segment = replaced.clone();
            } else {
                segment.clear();
            }
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> PlaceholderMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_placeholder_inside_one_run_is_replaced() {
        let mut blocks = vec![TextBlock::from_runs(["Eu, ", "[nome_completo]", ", CPF [cpf]."])];
        let report = fill_blocks(
            &mut blocks,
            &map(&[("[nome_completo]", "Ana Souza"), ("[cpf]", "123.456.789-00")]),
        );

        assert_eq!(blocks[0].text(), "Eu, Ana Souza, CPF 123.456.789-00.");
        assert_eq!(blocks[0].runs[0].segments, vec!["Eu, "]);
        assert_eq!(report.replacements, 2);
        assert!(report.split_placeholders.is_empty());
    }

    #[test]
    fn test_placeholder_split_across_runs_is_left_unreplaced() {
        let mut blocks = vec![TextBlock::from_runs(["Valor: [va", "lor] reais"])];
        let report = fill_blocks(&mut blocks, &map(&[("[valor]", "1500")]));

        assert_eq!(blocks[0].text(), "Valor: [valor] reais");
        assert_eq!(report.replacements, 0);
        assert_eq!(report.split_placeholders, vec!["[valor]"]);
    }

    #[test]
    fn test_every_occurrence_in_run_and_block() {
        let mut blocks = vec![
            TextBlock::from_runs(["[x] e [x]", "[x]"]),
            TextBlock::from_runs(["sem marcador"]),
        ];
        let report = fill_blocks(&mut blocks, &map(&[("[x]", "1")]));

        assert_eq!(blocks[0].text(), "1 e 11");
        assert_eq!(blocks[1].text(), "sem marcador");
        assert_eq!(report.replacements, 3);
    }

    #[test]
    fn test_value_containing_later_token_is_substituted_again() {
        let mut blocks = vec![TextBlock::from_runs(["[a]"])];
        fill_blocks(&mut blocks, &map(&[("[a]", "ver [b]"), ("[b]", "B")]));
        assert_eq!(blocks[0].text(), "ver B");
    }

    #[test]
    fn test_earlier_value_is_not_revisited() {
        let mut blocks = vec![TextBlock::from_runs(["[b] [a]"])];
        fill_blocks(&mut blocks, &map(&[("[b]", "B"), ("[a]", "[b]")]));
        assert_eq!(blocks[0].text(), "B [b]");
    }

    #[test]
    fn test_segments_are_edited_in_place() {
        let mut blocks = vec![TextBlock::new(vec![TextRun {
            segments: vec!["[cpf]".to_string(), "\t".to_string(), "fim".to_string()],
        }])];
        fill_blocks(&mut blocks, &map(&[("[cpf]", "000")]));
        assert_eq!(blocks[0].runs[0].segments, vec!["000", "\t", "fim"]);
    }

    #[test]
    fn test_token_across_segments_of_one_run_collapses() {
        let mut blocks = vec![TextBlock::new(vec![TextRun {
            segments: vec!["CPF [c".to_string(), "pf] ok".to_string()],
        }])];
        let report = fill_blocks(&mut blocks, &map(&[("[cpf]", "000")]));

        assert_eq!(blocks[0].runs[0].segments, vec!["CPF 000 ok", ""]);
        assert_eq!(report.replacements, 1);
    }

    #[test]
    fn test_report_merge_dedups_split_tokens() {
        let mut report = FillReport {
            replacements: 1,
            split_placeholders: vec!["[a]".to_string()],
        };
        report.merge(FillReport {
            replacements: 2,
            split_placeholders: vec!["[a]".to_string(), "[b]".to_string()],
        });
        assert_eq!(report.replacements, 3);
        assert_eq!(report.split_placeholders, vec!["[a]", "[b]"]);
    }
}
