//! Line handling shared by the rule and user list formats

/// Iterate over meaningful lines with their 1-based line numbers.
///
/// Lines are trimmed; blank lines and lines starting with `#`, `//` or `;`
/// are skipped.
pub(crate) fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !is_comment(line))
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("//") || line.starts_with(';')
}
