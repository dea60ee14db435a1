use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use super::model::{DeltaNode, DiffResult};

/// Unchanged lines kept around each hunk.
const CONTEXT_LINES: usize = 2;

/// Unified line diff of one changed text value, coloured for terminals.
///
/// Only hunks are shown, each with its `@@ -a,b +c,d @@` header, so long
/// scripts with a one-line change stay short.
pub fn format_text_diff(label: &str, old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut unified = diff.unified_diff();
    unified.context_radius(CONTEXT_LINES);

    let mut output = format!("{}\n", format!("--- {} (left)\n+++ {} (right)", label, label).bold());

    for hunk in unified.iter_hunks() {
        output.push_str(&hunk.header().to_string().cyan().to_string());
        output.push('\n');

        for change in hunk.iter_changes() {
            let text = change.value().trim_end_matches(|c: char| c == '\n' || c == '\r');
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{}", text).red().to_string(),
                ChangeTag::Insert => format!("+{}", text).green().to_string(),
                ChangeTag::Equal => format!(" {}", text),
            };
            output.push_str(&line);
            output.push('\n');
        }
    }

    output
}

/// Changed string values where either side spans several lines,
/// e.g. script bodies, as `(path, old, new)`.
pub fn multiline_changes(result: &DiffResult) -> Vec<(&str, &str, &str)> {
    result
        .changes
        .iter()
        .filter_map(|change| match &change.delta {
            DeltaNode::Changed { old, new } => match (old.as_str(), new.as_str()) {
                (Some(o), Some(n)) if o.contains('\n') || n.contains('\n') => {
                    Some((change.path.as_str(), o, n))
                }
                _ => None,
            },
            _ => None,
        })
        .collect()
}
