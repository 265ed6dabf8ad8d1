#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Compiles a single glob string into a [`SelectionFunction`].
//!
//! The dialect supports `?`, `*`, `**`, POSIX-style character classes, and
//! an `ignorecase:` prefix. Three shapes of matcher come out of
//! [`compile`]: a literal-prefix matcher for globs with no metacharacters
//! (fast path, index comparison instead of regex), a fixed-segment-count
//! regex matcher for ordinary wildcards, and a variable-depth regex
//! matcher for globs containing `**`.

use std::path::PathBuf;

use core::error::SelectionError;
use path::{Outcome, Path, Polarity, SelectionFunction};
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Configuration a [`compile`] call needs beyond the pattern text itself.
#[derive(Clone, Debug)]
pub struct GlobConfig {
    /// The backup root's own path segments, e.g. `["testfiles", "select"]`.
    /// Every compiled glob must share this as a literal prefix.
    pub root: Vec<String>,
    /// Default case sensitivity. Overridden per-pattern by an
    /// `ignorecase:` prefix.
    pub ignorecase: bool,
}

/// Translates a glob string into the source of an equivalent regular
/// expression, without anchoring or compiling it.
///
/// This is the standalone primitive `compile` builds on; it is exposed
/// directly so the glob-to-regex translation can be tested against literal
/// strings on its own.
pub fn glob_to_regex_source(glob: &str) -> Result<String, SelectionError> {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(chars.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '/' => {
                out.push_str("\\/");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    out.push_str(".*");
                    i += 2;
                } else {
                    out.push_str("[^/]*");
                    i += 1;
                }
            }
            '[' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(SelectionError::GlobbingError {
                        pattern: glob.to_owned(),
                        reason: "unterminated character class".to_owned(),
                    });
                }
                let inner: String = chars[i + 1..j].iter().collect();
                let inner = if let Some(rest) = inner.strip_prefix('!') {
                    format!("^{rest}")
                } else {
                    inner
                };
                out.push('[');
                out.push_str(&inner);
                out.push(']');
                i = j + 1;
            }
            c => {
                if is_regex_metachar(c) {
                    out.push('\\');
                }
                out.push(c);
                i += 1;
            }
        }
    }
    Ok(out)
}

const fn is_regex_metachar(c: char) -> bool {
    matches!(
        c,
        '.' | '^' | '$' | '+' | '(' | ')' | '|' | '{' | '}' | '\\'
    )
}

fn anchored_regex(segments: &[String], ignorecase: bool) -> Result<Regex, SelectionError> {
    let joined = segments.join("/");
    let source = glob_to_regex_source(&joined)?;
    let anchored = format!("^{source}$");
    RegexBuilder::new(&anchored)
        .case_insensitive(ignorecase)
        .build()
        .map_err(|error| SelectionError::GlobbingError {
            pattern: joined,
            reason: error.to_string(),
        })
}

fn is_wildcard_segment(segment: &str) -> bool {
    segment
        .chars()
        .any(|c| matches!(c, '?' | '*' | '['))
}

fn lower(segment: &str, ignorecase: bool) -> String {
    if ignorecase {
        segment.to_lowercase()
    } else {
        segment.to_owned()
    }
}

/// Compiles `pattern_text` against `config` into a boxed [`SelectionFunction`].
///
/// # Errors
///
/// Returns [`SelectionError::FilePrefixError`] if the pattern does not
/// share `config.root` as a literal prefix, or
/// [`SelectionError::GlobbingError`] if the pattern is syntactically
/// malformed (an empty segment, an unterminated character class).
pub fn compile(
    pattern_text: &str,
    polarity: Polarity,
    config: &GlobConfig,
) -> Result<Box<dyn SelectionFunction>, SelectionError> {
    debug!(pattern = pattern_text, ?polarity, "compiling glob");

    let (ignorecase, body) = match pattern_text.strip_prefix("ignorecase:") {
        Some(rest) => (true, rest),
        None => (config.ignorecase, pattern_text),
    };

    let root_only_shorthand = body == "/";
    let stripped = if root_only_shorthand {
        body
    } else {
        body.trim_end_matches('/')
    };

    let segments: Vec<String> = if stripped.is_empty() || root_only_shorthand {
        Vec::new()
    } else {
        stripped.split('/').map(str::to_owned).collect()
    };

    if !root_only_shorthand && segments.iter().any(|segment| segment.is_empty()) {
        return Err(SelectionError::GlobbingError {
            pattern: pattern_text.to_owned(),
            reason: "empty path segment".to_owned(),
        });
    }

    let mut absorbed_by_double_star = false;
    if !root_only_shorthand {
        for (index, root_segment) in config.root.iter().enumerate() {
            if absorbed_by_double_star {
                continue;
            }
            let matches_root = match segments.get(index) {
                Some(segment) if segment.contains("**") => {
                    absorbed_by_double_star = true;
                    true
                }
                Some(segment) if is_wildcard_segment(segment) => true,
                Some(segment) => lower(segment, ignorecase) == lower(root_segment, ignorecase),
                None => false,
            };
            if !matches_root {
                return Err(SelectionError::FilePrefixError {
                    argument: pattern_text.to_owned(),
                    root: PathBuf::from(config.root.join("/")),
                });
            }
        }
    }

    // A leading `**` absorbs the root-matching head entirely (it can match
    // zero or more components), so the whole pattern - not just the part
    // after the configured root - describes the relative matcher.
    let relative: Vec<String> = if root_only_shorthand {
        Vec::new()
    } else if absorbed_by_double_star {
        segments
    } else {
        segments[config.root.len().min(segments.len())..].to_vec()
    };

    if root_only_shorthand {
        return Ok(Box::new(LiteralSf {
            target: Vec::new(),
            polarity,
            root_only: true,
            ignorecase,
        }));
    }

    let is_literal = relative.iter().all(|segment| !is_wildcard_segment(segment));
    if is_literal {
        let target = relative
            .iter()
            .map(|segment| lower(segment, ignorecase).into_bytes())
            .collect();
        return Ok(Box::new(LiteralSf {
            target,
            polarity,
            root_only: false,
            ignorecase,
        }));
    }

    let double_star_index = relative.iter().position(|segment| segment.contains("**"));

    if let Some(boundary) = double_star_index {
        let full_regex = anchored_regex(&relative, ignorecase)?;
        let mut ancestor_regexes = Vec::with_capacity(boundary);
        for length in 0..boundary {
            ancestor_regexes.push(anchored_regex(&relative[..length], ignorecase)?);
        }
        let static_head_regex = anchored_regex(&relative[..boundary], ignorecase)?;
        Ok(Box::new(DoubleStarSf {
            full_regex,
            ancestor_regexes,
            static_head_regex,
            boundary,
            polarity,
        }))
    } else {
        let segment_count = relative.len();
        let full_regex = anchored_regex(&relative, ignorecase)?;
        let mut ancestor_regexes = Vec::with_capacity(segment_count);
        for length in 0..segment_count {
            ancestor_regexes.push(anchored_regex(&relative[..length], ignorecase)?);
        }
        Ok(Box::new(NormalGlobSf {
            full_regex,
            ancestor_regexes,
            segment_count,
            polarity,
        }))
    }
}

fn join_index(index: &[Vec<u8>]) -> String {
    index
        .iter()
        .map(|component| String::from_utf8_lossy(component))
        .collect::<Vec<_>>()
        .join("/")
}

/// Literal-prefix selection function: the fast path for globs without
/// metacharacters. Matches by index-prefix comparison rather than regex.
struct LiteralSf {
    target: Vec<Vec<u8>>,
    polarity: Polarity,
    root_only: bool,
    ignorecase: bool,
}

impl LiteralSf {
    fn folded_index(&self, candidate: &Path) -> Vec<Vec<u8>> {
        if self.ignorecase {
            candidate
                .index()
                .iter()
                .map(|component| String::from_utf8_lossy(component).to_lowercase().into_bytes())
                .collect()
        } else {
            candidate.index().to_vec()
        }
    }
}

impl SelectionFunction for LiteralSf {
    fn apply(&self, candidate: &Path) -> Outcome {
        if self.root_only {
            return if candidate.is_root() {
                self.polarity.matched_outcome()
            } else {
                Outcome::DontCare
            };
        }

        let folded = self.folded_index(candidate);
        let target_path = Path::with_index(candidate.base(), self.target.clone(), candidate.kind());
        let folded_path = Path::with_index(candidate.base(), folded.clone(), candidate.kind());

        if folded == self.target || target_path.is_ancestor_of(&folded_path) {
            return self.polarity.matched_outcome();
        }

        if folded_path.is_ancestor_of(&target_path) && self.polarity == Polarity::Include {
            return Outcome::PartialInclude;
        }

        Outcome::DontCare
    }
}

/// Regex-backed selection function for wildcards with a fixed segment
/// count (no `**`).
struct NormalGlobSf {
    full_regex: Regex,
    ancestor_regexes: Vec<Regex>,
    segment_count: usize,
    polarity: Polarity,
}

impl SelectionFunction for NormalGlobSf {
    fn apply(&self, candidate: &Path) -> Outcome {
        let index = candidate.index();

        if index.len() >= self.segment_count {
            let head = &index[..self.segment_count];
            if self.full_regex.is_match(&join_index(head)) {
                return self.polarity.matched_outcome();
            }
        } else if self.polarity == Polarity::Include {
            if let Some(regex) = self.ancestor_regexes.get(index.len()) {
                if regex.is_match(&join_index(index)) {
                    return Outcome::PartialInclude;
                }
            }
        }

        Outcome::DontCare
    }
}

/// Regex-backed selection function for globs containing `**`. The full
/// regex already accounts for arbitrary depth, so only the static head
/// (the segments before the first `**`-bearing segment) needs per-level
/// ancestor matchers.
struct DoubleStarSf {
    full_regex: Regex,
    ancestor_regexes: Vec<Regex>,
    static_head_regex: Regex,
    boundary: usize,
    polarity: Polarity,
}

impl SelectionFunction for DoubleStarSf {
    fn apply(&self, candidate: &Path) -> Outcome {
        let index = candidate.index();
        let joined = join_index(index);

        if self.full_regex.is_match(&joined) {
            return self.polarity.matched_outcome();
        }

        if self.polarity != Polarity::Include {
            return Outcome::DontCare;
        }

        // No static head at all: the leading `**` could match from any
        // depth, so every directory is a potential ancestor of a future
        // match. Fixes the historical behavior where a leading `*`/`**`
        // in an include rule failed to auto-include its ancestors.
        if self.boundary == 0 {
            return Outcome::PartialInclude;
        }

        if index.len() < self.boundary {
            if let Some(regex) = self.ancestor_regexes.get(index.len()) {
                if regex.is_match(&joined) {
                    return Outcome::PartialInclude;
                }
            }
            return Outcome::DontCare;
        }

        let head = &index[..self.boundary];
        if self.static_head_regex.is_match(&join_index(head)) {
            return Outcome::PartialInclude;
        }

        Outcome::DontCare
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use path::PathKind;

    fn config() -> GlobConfig {
        GlobConfig {
            root: vec!["testfiles".to_owned(), "select".to_owned()],
            ignorecase: false,
        }
    }

    fn candidate(root: &str, index: &[&str], kind: PathKind) -> Path {
        let components = index.iter().map(|s| s.as_bytes().to_vec()).collect();
        Path::with_index(root, components, kind)
    }

    #[test]
    fn glob_to_re_hello() {
        assert_eq!(glob_to_regex_source("hello").unwrap(), "hello");
    }

    #[test]
    fn glob_to_re_question_and_double_star() {
        assert_eq!(
            glob_to_regex_source(".e?ll**o").unwrap(),
            "\\.e[^/]ll.*o"
        );
    }

    #[test]
    fn glob_to_re_character_classes() {
        assert_eq!(
            glob_to_regex_source("[abc]el[^de][!fg]h").unwrap(),
            "[abc]el[^de][^fg]h"
        );
    }

    #[test]
    fn glob_to_re_slashes() {
        assert_eq!(
            glob_to_regex_source("/usr/*/bin/").unwrap(),
            "\\/usr\\/[^/]*\\/bin\\/"
        );
    }

    #[test]
    fn glob_to_re_unterminated_class_errors() {
        assert!(glob_to_regex_source("[abc").is_err());
    }

    #[test]
    fn literal_include_matches_self_and_descendants() {
        let sf = compile("testfiles/select/1/1", Polarity::Include, &config()).unwrap();
        let target = candidate("testfiles/select", &["1", "1"], PathKind::Directory);
        let child = candidate("testfiles/select", &["1", "1", "2"], PathKind::Regular);
        let sibling = candidate("testfiles/select", &["1", "2"], PathKind::Directory);
        let ancestor = candidate("testfiles/select", &["1"], PathKind::Directory);
        let root = candidate("testfiles/select", &[], PathKind::Directory);

        assert_eq!(sf.apply(&target), Outcome::Include);
        assert_eq!(sf.apply(&child), Outcome::Include);
        assert_eq!(sf.apply(&sibling), Outcome::DontCare);
        assert_eq!(sf.apply(&ancestor), Outcome::PartialInclude);
        assert_eq!(sf.apply(&root), Outcome::PartialInclude);
    }

    #[test]
    fn literal_exclude_does_not_partial_include_ancestors() {
        let sf = compile("testfiles/select/1/1", Polarity::Exclude, &config()).unwrap();
        let ancestor = candidate("testfiles/select", &["1"], PathKind::Directory);
        assert_eq!(sf.apply(&ancestor), Outcome::DontCare);
    }

    #[test]
    fn root_shorthand_matches_only_root() {
        let sf = compile("/", Polarity::Include, &config()).unwrap();
        let root = candidate("testfiles/select", &[], PathKind::Directory);
        let child = candidate("testfiles/select", &["1"], PathKind::Directory);
        assert_eq!(sf.apply(&root), Outcome::Include);
        assert_eq!(sf.apply(&child), Outcome::DontCare);
    }

    #[test]
    fn pattern_outside_root_is_file_prefix_error() {
        let error = compile("etc/passwd", Polarity::Include, &config()).unwrap_err();
        assert!(matches!(error, SelectionError::FilePrefixError { .. }));
    }

    #[test]
    fn double_slash_is_globbing_error() {
        let error = compile("testfiles/select//1", Polarity::Include, &config()).unwrap_err();
        assert!(matches!(error, SelectionError::GlobbingError { .. }));
    }

    #[test]
    fn double_star_excludes_trailing_digit() {
        // Launchpad-adjacent scenario from spec.md scenario 5: `**[3-5]`.
        let sf = compile("**[3-5]", Polarity::Exclude, &config()).unwrap();
        let three = candidate("testfiles/select", &["1", "1", "3"], PathKind::Regular);
        let two = candidate("testfiles/select", &["1", "1", "2"], PathKind::Regular);
        assert_eq!(sf.apply(&three), Outcome::Exclude);
        assert_eq!(sf.apply(&two), Outcome::DontCare);
    }

    #[test]
    fn leading_double_star_include_auto_includes_every_ancestor() {
        // Regression coverage for the Launchpad #884371 / #932482 class of
        // bug: an include rule whose pattern begins with a wildcard must
        // still cause every ancestor directory to be visited.
        let sf = compile("**/target.txt", Polarity::Include, &config()).unwrap();
        let deep_dir = candidate("testfiles/select", &["1", "2"], PathKind::Directory);
        assert_eq!(sf.apply(&deep_dir), Outcome::PartialInclude);
    }

    #[test]
    fn case_insensitive_prefix_folds_comparison() {
        let sf = compile("ignorecase:testfiles/select/FOO", Polarity::Include, &config()).unwrap();
        let candidate = candidate("testfiles/select", &["foo"], PathKind::Regular);
        assert_eq!(sf.apply(&candidate), Outcome::Include);
    }
}
