//! # Line Codec
//!
//! Converts between the free-text form an operator edits and the ordered
//! list the store keeps.
//!
//! ## Rules
//! - Split on `'\n'` only. Every other character, including `'\r'`, is kept
//!   as part of its line.
//! - Empty lines survive as empty strings. Nothing is trimmed or filtered.
//! - `split_lines("")` is `[""]`, never `[]`.
//! - `join_lines(&split_lines(t)) == t` for every `t`.
//!
//! The empty list is the one value with no text form of its own: it joins to
//! `""`, which splits back to `[""]`. Callers that need to clear a field send
//! the list form directly.

/// Splits free text into an ordered list of lines.
///
/// ## Example
/// ```rust
/// use radar_core::lines::split_lines;
///
/// assert_eq!(split_lines("North\n\nSouth"), vec!["North", "", "South"]);
/// assert_eq!(split_lines(""), vec![""]);
/// ```
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

/// Joins an ordered list of lines back into free text.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.as_ref().len() + 1).sum());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.as_ref());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_empty_is_single_empty_line() {
        assert_eq!(split_lines(""), vec![String::new()]);
    }

    #[test]
    fn test_split_keeps_empty_entries() {
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b", ""]);
        assert_eq!(split_lines("\n"), vec!["", ""]);
    }

    #[test]
    fn test_split_keeps_carriage_returns() {
        assert_eq!(split_lines("a\r\nb"), vec!["a\r", "b"]);
    }

    #[test]
    fn test_round_trip() {
        for text in [
            "",
            "North",
            "North\nSouth\nEast",
            "North\n\nSouth",
            "  padded  \n\ttabbed",
            "\nleading blank",
            "ZTL 33 - HIGH\nZTL 34 - LOW",
        ] {
            assert_eq!(join_lines(&split_lines(text)), text);
        }
    }

    #[test]
    fn test_join_empty_list() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(join_lines(&empty), "");
    }
}
