//! Line-oriented CSV cell splitting.

/// Split one CSV line into trimmed cells.
///
/// A `"` toggles quoted mode, `""` inside quotes yields a literal quote and a
/// comma outside quotes ends the cell. Unbalanced quotes are tolerated: the
/// rest of the line is read as part of the open cell.
#[must_use]
pub fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(current.trim().to_owned());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    cells.push(current.trim().to_owned());
    cells
}

/// Non-blank lines of a payload, with trailing `\r` removed.
pub fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
}
