//! Delimiter scanning over decoded character buffers.
//!
//! All positions are indexes into a `&[char]`, so multi-byte delimiters
//! such as `«` need no special casing.

/// Closing delimiter for an opening one
fn closing(open: char) -> Option<char> {
    match open {
        '{' => Some('}'),
        '[' => Some(']'),
        '(' => Some(')'),
        '«' => Some('»'),
        _ => None,
    }
}

/// Index of the delimiter matching the one at `index`.
///
/// Nested pairs of the same kind are counted; quoted sections are skipped
/// so that delimiters inside string values do not unbalance the scan.
pub fn pair(text: &[char], index: usize) -> Option<usize> {
    let open = *text.get(index)?;
    let close = closing(open)?;
    let mut depth = 0usize;
    let mut i = index + 1;
    while i < text.len() {
        let c = text[i];
        if c == '"' {
            i = next(text, i)? + 1;
            continue;
        }
        if c == close {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        } else if c == open {
            depth += 1;
        }
        i += 1;
    }
    None
}

/// Index of the quote closing the quoted section that starts at `index`.
///
/// A doubled quote inside the section is an escaped quote.
pub fn next(text: &[char], index: usize) -> Option<usize> {
    let quote = *text.get(index)?;
    let mut count = 1usize;
    for i in index + 1..text.len() {
        if text[i] != quote {
            continue;
        }
        count += 1;
        if count % 2 != 0 {
            continue;
        }
        if text.get(i + 1) == Some(&quote) {
            continue;
        }
        return Some(i);
    }
    None
}

/// Wrap in double quotes, doubling embedded quotes
pub fn add_quotes(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Strip the surrounding quotes and undo quote doubling; `None` when the
/// text is not quoted
pub fn remove_quotes(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    Some(inner.replace("\"\"", "\""))
}

fn is_punctuation(c: char) -> bool {
    matches!(
        c,
        '!' | '"' | '#' | '%' | '&' | '\'' | '(' | ')' | '*' | ',' | '-' | '.' | '/' | ':' | ';'
            | '?' | '@' | '[' | '\\' | ']' | '_' | '{' | '}' | '«' | '»' | '…' | '–' | '—'
    )
}

fn starts_with(text: &[char], index: usize, prefix: &str) -> bool {
    let mut i = index;
    for p in prefix.chars() {
        if text.get(i) != Some(&p) {
            return false;
        }
        i += 1;
    }
    true
}

/// Bare token starting at `index`.
///
/// The token ends at whitespace, at a comma, at a closing `}` or `]`, or at
/// any other punctuation unless it began as a number (a digit, or `-`
/// followed by a digit), in which case `.`, `-`, `:` and the like stay part
/// of it. Unquoted `#SET=` and `#REF=` forms keep their punctuation too.
pub fn text_for_value(text: &[char], index: usize) -> String {
    let keep_punctuation = match text.get(index) {
        Some(c) if c.is_numeric() => true,
        Some('-') => text.get(index + 1).is_some_and(|c| c.is_numeric()),
        Some('#') => starts_with(text, index, "#SET=") || starts_with(text, index, "#REF="),
        _ => false,
    };
    text[index.min(text.len())..]
        .iter()
        .take_while(|&&c| {
            !c.is_whitespace()
                && !matches!(c, ',' | '}' | ']')
                && (keep_punctuation || !is_punctuation(c))
        })
        .collect()
}
