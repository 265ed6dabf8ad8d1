//! Parses a filelist into an ordered sequence of (pattern, polarity) pairs
//! ready for [`glob::compile`].

use std::fs;
use std::path::Path as StdPath;

use core::error::SelectionError;
use path::Polarity;
use tracing::debug;

/// Reads and parses the filelist at `path`.
///
/// # Errors
///
/// Returns [`SelectionError::FilelistIo`] if the file cannot be read.
pub fn read_filelist(
    path: &StdPath,
    default_polarity: Polarity,
    null_separator: bool,
) -> Result<Vec<(String, Polarity)>, SelectionError> {
    debug!(path = %path.display(), null_separator, "reading filelist");
    let contents = fs::read(path).map_err(|source| SelectionError::FilelistIo {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_filelist(&contents, default_polarity, null_separator))
}

/// Parses filelist bytes already read into memory.
///
/// Newline mode strips leading/trailing whitespace per line, skips blank
/// and `#`-comment lines, and strips one matching pair of quotes around
/// the pattern. NUL-separator mode does none of that — the record
/// boundary is the only thing that matters — except the `+ `/`- ` sign
/// convention still applies.
#[must_use]
pub fn parse_filelist(
    contents: &[u8],
    default_polarity: Polarity,
    null_separator: bool,
) -> Vec<(String, Polarity)> {
    if null_separator {
        contents
            .split(|&byte| byte == 0)
            .filter(|record| !record.is_empty())
            .map(|record| parse_null_record(record, default_polarity))
            .collect()
    } else {
        String::from_utf8_lossy(contents)
            .lines()
            .filter_map(|line| parse_text_line(line, default_polarity))
            .collect()
    }
}

fn parse_null_record(record: &[u8], default_polarity: Polarity) -> (String, Polarity) {
    let text = String::from_utf8_lossy(record);
    if let Some(rest) = text.strip_prefix("+ ") {
        (rest.to_owned(), Polarity::Include)
    } else if let Some(rest) = text.strip_prefix("- ") {
        (rest.to_owned(), Polarity::Exclude)
    } else {
        (text.into_owned(), default_polarity)
    }
}

fn parse_text_line(line: &str, default_polarity: Polarity) -> Option<(String, Polarity)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let (polarity, remainder) = if let Some(rest) = trimmed.strip_prefix("+ ") {
        (Polarity::Include, rest)
    } else if let Some(rest) = trimmed.strip_prefix("- ") {
        (Polarity::Exclude, rest)
    } else {
        (default_polarity, trimmed)
    };

    Some((strip_matching_quotes(remainder).to_owned(), polarity))
}

fn strip_matching_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'\'' || first == b'"') && first == last {
            return &text[1..text.len() - 1];
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_comment_lines_are_ignored() {
        let entries = parse_filelist(b"\n  \n# a comment\nfoo\n", Polarity::Include, false);
        assert_eq!(entries, vec![("foo".to_owned(), Polarity::Include)]);
    }

    #[test]
    fn plus_and_minus_override_default_polarity() {
        let entries = parse_filelist(
            b"+ testfiles/select/1/2/1\n- testfiles/select/1/2\ntestfiles/select/1\n- **",
            Polarity::Include,
            false,
        );
        assert_eq!(
            entries,
            vec![
                ("testfiles/select/1/2/1".to_owned(), Polarity::Include),
                ("testfiles/select/1/2".to_owned(), Polarity::Exclude),
                ("testfiles/select/1".to_owned(), Polarity::Include),
                ("**".to_owned(), Polarity::Exclude),
            ]
        );
    }

    #[test]
    fn null_separator_mode_skips_whitespace_stripping() {
        let raw = b"\0- testfiles/select/1/1/1\0testfiles/select/1/1\0- testfiles/select/1\0- **\0";
        let entries = parse_filelist(raw, Polarity::Include, true);
        assert_eq!(
            entries,
            vec![
                ("testfiles/select/1/1/1".to_owned(), Polarity::Exclude),
                ("testfiles/select/1/1".to_owned(), Polarity::Include),
                ("testfiles/select/1".to_owned(), Polarity::Exclude),
                ("**".to_owned(), Polarity::Exclude),
            ]
        );
    }

    #[test]
    fn quoted_path_preserves_internal_whitespace() {
        let entries = parse_filelist(b"  \"has space/ here\"  \n", Polarity::Exclude, false);
        assert_eq!(
            entries,
            vec![("has space/ here".to_owned(), Polarity::Exclude)]
        );
    }

    #[test]
    fn missing_filelist_is_filelist_io_error() {
        let error = read_filelist(StdPath::new("/no/such/filelist"), Polarity::Include, false)
            .unwrap_err();
        assert!(matches!(error, SelectionError::FilelistIo { .. }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // An unprefixed, unquoted, whitespace-free line always carries the
        // default polarity through untouched (spec.md §8: "trailing/leading
        // whitespace... does not affect the rule it produces").
        #[test]
        fn plain_lines_keep_the_default_polarity(word in "[a-zA-Z0-9_/]{1,20}") {
            prop_assume!(!word.starts_with('+') && !word.starts_with('-') && !word.starts_with('#'));
            let entries = parse_filelist(word.as_bytes(), Polarity::Exclude, false);
            prop_assert_eq!(entries, vec![(word, Polarity::Exclude)]);
        }

        #[test]
        fn surrounding_whitespace_never_changes_the_parsed_pattern(
            word in "[a-zA-Z0-9_/]{1,20}",
            leading in " {0,4}",
            trailing in " {0,4}",
        ) {
            prop_assume!(!word.starts_with('+') && !word.starts_with('-') && !word.starts_with('#'));
            let line = format!("{leading}{word}{trailing}\n");
            let entries = parse_filelist(line.as_bytes(), Polarity::Include, false);
            prop_assert_eq!(entries, vec![(word, Polarity::Include)]);
        }
    }
}
