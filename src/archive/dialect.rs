//! Delimiter inference for plain-text tabular members.
//!
//! `.txt` members carry no dialect metadata, so the delimiter is inferred from
//! the first line by presence-priority: comma, then semicolon, else runs of
//! whitespace. The same rule runs at inspection time and on every chunk read,
//! so both always agree for a given member.

/// Field delimiter for a delimited-text member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Comma,
    Semicolon,
    /// One or more whitespace characters separate fields.
    Whitespace,
}

impl Dialect {
    /// Single-byte delimiter for the `csv` reader, when one exists.
    pub fn delimiter(self) -> Option<u8> {
        match self {
            Dialect::Comma => Some(b','),
            Dialect::Semicolon => Some(b';'),
            Dialect::Whitespace => None,
        }
    }
}

/// Infer the dialect from the first line of a member.
///
/// Comma wins over semicolon when both are present.
pub fn infer_dialect(first_line: &str) -> Dialect {
    if first_line.contains(',') {
        Dialect::Comma
    } else if first_line.contains(';') {
        Dialect::Semicolon
    } else {
        Dialect::Whitespace
    }
}

/// Split one line into fields according to the dialect.
pub fn split_line(line: &str, dialect: Dialect) -> Vec<String> {
    match dialect {
        Dialect::Comma => line.split(',').map(|s| s.to_string()).collect(),
        Dialect::Semicolon => line.split(';').map(|s| s.to_string()).collect(),
        Dialect::Whitespace => line.split_whitespace().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_wins_over_semicolon() {
        assert_eq!(infer_dialect("a,b;c"), Dialect::Comma);
    }

    #[test]
    fn test_semicolon_when_no_comma() {
        assert_eq!(infer_dialect("a;b"), Dialect::Semicolon);
    }

    #[test]
    fn test_whitespace_fallback() {
        assert_eq!(infer_dialect("a b c"), Dialect::Whitespace);
    }

    #[test]
    fn test_split_line_whitespace_collapses_runs() {
        assert_eq!(
            split_line("a   b\tc", Dialect::Whitespace),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_split_line_preserves_empty_fields() {
        assert_eq!(
            split_line("a,,c", Dialect::Comma),
            vec!["a".to_string(), "".to_string(), "c".to_string()]
        );
    }
}
