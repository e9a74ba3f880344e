//! Heading detection and depth normalization.
//!
//! Fragments are authored independently at arbitrary heading depth. Before a
//! fragment is embedded in a document its headings are renumbered relative to
//! the depth it is placed at, so the combined outline stays well-formed.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use adit_shared::MAX_HEADING_DEPTH;

/// A line beginning with 1–6 `#` followed by whitespace and text.
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})([ \t]+\S.*)$").expect("valid regex"));

/// A heading found in a markdown fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Number of leading `#` characters.
    pub level: usize,
    /// Heading text with surrounding whitespace trimmed.
    pub text: String,
}

/// One line of a fragment, split from its line terminator.
struct Line<'a> {
    content: &'a str,
    ending: &'a str,
    in_code: bool,
}

/// Fence marker at the start of `line`: the fence character and run length.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let marker = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = line.chars().take_while(|c| *c == marker).count();
    (run >= 3).then_some((marker, run))
}

/// Split `md` into lines, tracking fenced code blocks so `#` comments inside
/// code are never treated as headings.
///
/// A block closes only on a bare fence of the opening character at least as
/// long as the opening run.
fn lines(md: &str) -> Vec<Line<'_>> {
    let mut open: Option<(char, usize)> = None;
    md.split_inclusive('\n')
        .map(|raw| {
            let content = raw.trim_end_matches(['\n', '\r']);
            let ending = &raw[content.len()..];
            let trimmed = content.trim_start();
            let marker = fence_marker(trimmed);
            let in_code = match (open, marker) {
                (None, Some(opening)) => {
                    open = Some(opening);
                    true
                }
                (Some((ch, len)), Some((c, run)))
                    if c == ch && run >= len && trimmed[run..].trim().is_empty() =>
                {
                    open = None;
                    true
                }
                (Some(_), _) => true,
                (None, None) => false,
            };
            Line {
                content,
                ending,
                in_code,
            }
        })
        .collect()
}

/// Parse a single line as a heading, returning its hash count and the rest of
/// the line (leading whitespace included, so it can be re-emitted verbatim).
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let caps = HEADING_RE.captures(line)?;
    let level = caps.get(1)?.as_str().len();
    let rest = caps.get(2)?.as_str();
    Some((level, rest))
}

/// List the headings of `md` in encounter order.
pub fn extract_headings(md: &str) -> Vec<Heading> {
    lines(md)
        .iter()
        .filter(|line| !line.in_code)
        .filter_map(|line| parse_heading(line.content))
        .map(|(level, rest)| Heading {
            level,
            text: rest.trim().to_string(),
        })
        .collect()
}

/// Compute final heading levels for a fragment placed at `target`.
///
/// Levels are shifted so the first heading lands on `target`, clamped to the
/// markdown maximum, never shallower than `target`, and never deeper than one
/// level below the previous heading.
pub fn normalized_levels(original: &[usize], target: usize) -> Vec<usize> {
    let target = target.clamp(1, MAX_HEADING_DEPTH);
    let Some(&first) = original.first() else {
        return Vec::new();
    };

    let mut out: Vec<usize> = Vec::with_capacity(original.len());
    for &level in original {
        let shifted = level as i64 - first as i64 + target as i64;
        let mut level = shifted.clamp(target as i64, MAX_HEADING_DEPTH as i64) as usize;
        if let Some(&prev) = out.last() {
            level = level.min(prev + 1);
        }
        out.push(level);
    }
    out
}

/// Rewrite every heading in `md` so the fragment nests correctly at `depth`.
///
/// Fragments without headings are returned unchanged.
pub fn normalize_headings(md: &str, depth: usize) -> String {
    let lines = lines(md);
    let original: Vec<usize> = lines
        .iter()
        .filter(|line| !line.in_code)
        .filter_map(|line| parse_heading(line.content).map(|(level, _)| level))
        .collect();

    if original.is_empty() {
        trace!("fragment has no headings, passing through");
        return md.to_string();
    }

    let mut levels = normalized_levels(&original, depth).into_iter();
    let mut out = String::with_capacity(md.len() + original.len());
    for line in &lines {
        match (!line.in_code)
            .then(|| parse_heading(line.content))
            .flatten()
        {
            Some((_, rest)) => {
                let level = levels.next().unwrap_or(MAX_HEADING_DEPTH);
                out.push_str(&"#".repeat(level));
                out.push_str(rest);
            }
            None => out.push_str(line.content),
        }
        out.push_str(line.ending);
    }
    out
}

/// Remove heading markers, keeping the heading text.
pub fn strip_heading_markup(md: &str) -> String {
    let mut out = String::with_capacity(md.len());
    for line in lines(md) {
        match (!line.in_code)
            .then(|| parse_heading(line.content))
            .flatten()
        {
            Some((_, rest)) => out.push_str(rest.trim_start()),
            None => out.push_str(line.content),
        }
        out.push_str(line.ending);
    }
    out
}

/// Length in characters of `md` once heading markup and outer whitespace are removed.
pub fn content_len(md: &str) -> usize {
    strip_heading_markup(md).trim().chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn levels_of(md: &str) -> Vec<usize> {
        extract_headings(md).into_iter().map(|h| h.level).collect()
    }

    #[test]
    fn shifts_uniformly_to_target() {
        let out = normalize_headings("## Intro\ntext\n### Details\nmore", 3);
        assert_eq!(out, "### Intro\ntext\n#### Details\nmore");
    }

    #[test]
    fn no_headings_passes_through() {
        let md = "plain text\nwith #hashtag but no heading\n";
        assert_eq!(normalize_headings(md, 4), md);
    }

    #[test]
    fn clamps_to_max_depth() {
        let out = normalize_headings("# A\n## B\n### C", 5);
        assert_eq!(levels_of(&out), vec![5, 6, 6]);
    }

    #[test]
    fn raises_headings_shallower_than_target() {
        // Second heading is shallower than the first; it may not climb above the target.
        let out = normalize_headings("### Deep\n# Shallow", 2);
        assert_eq!(levels_of(&out), vec![2, 2]);
    }

    #[test]
    fn collapses_jumps_of_more_than_one_level() {
        let out = normalize_headings("## A\n#### B\n###### C\n## D", 1);
        assert_eq!(levels_of(&out), vec![1, 2, 3, 1]);
    }

    #[test]
    fn preserves_heading_text_and_line_endings() {
        let out = normalize_headings("#   Spaced   title  \r\nbody\r\n", 2);
        assert_eq!(out, "##   Spaced   title  \r\nbody\r\n");
    }

    #[test]
    fn ignores_headings_inside_code_fences() {
        let md = "# Title\n```sh\n# not a heading\n```\n## Sub";
        let out = normalize_headings(md, 2);
        assert_eq!(out, "## Title\n```sh\n# not a heading\n```\n### Sub");
    }

    #[test]
    fn fence_closes_only_on_its_own_marker() {
        let md = "~~~\n```\n# still code\n~~~\n# Title";
        assert_eq!(
            normalize_headings(md, 2),
            "~~~\n```\n# still code\n~~~\n## Title"
        );
        let headings: Vec<_> = extract_headings("````\n```\n# code\n````\n# Real")
            .into_iter()
            .map(|h| h.text)
            .collect();
        assert_eq!(headings, vec!["Real"]);
    }

    #[test]
    fn target_zero_is_treated_as_one() {
        assert_eq!(normalize_headings("### Root", 0), "# Root");
    }

    #[test]
    fn hash_without_space_is_not_a_heading() {
        assert!(extract_headings("#tag\n####### seven").is_empty());
    }

    #[test]
    fn strip_and_measure() {
        let md = "## Intro\nbody";
        assert_eq!(strip_heading_markup(md), "Intro\nbody");
        assert_eq!(content_len(md), 10);
        assert_eq!(content_len("  # Hi  \n"), 4);
        assert_eq!(content_len("# abcd"), 4);
    }

    proptest! {
        #[test]
        fn prop_normalized_levels_are_monotonic_and_bounded(
            original in prop::collection::vec(1usize..=6, 1..20),
            target in 0usize..10,
        ) {
            let effective = target.clamp(1, MAX_HEADING_DEPTH);
            let levels = normalized_levels(&original, target);
            prop_assert_eq!(levels.len(), original.len());
            prop_assert_eq!(levels[0], effective);
            for pair in levels.windows(2) {
                prop_assert!(pair[1] <= pair[0] + 1);
            }
            for &level in &levels {
                prop_assert!(level >= effective);
                prop_assert!(level <= MAX_HEADING_DEPTH);
            }
        }

        #[test]
        fn prop_rewrite_keeps_heading_count_and_text(
            original in prop::collection::vec(1usize..=6, 1..10),
            target in 1usize..=6,
        ) {
            let md: String = original
                .iter()
                .enumerate()
                .map(|(i, level)| format!("{} Heading {i}\nbody {i}\n", "#".repeat(*level)))
                .collect();
            let out = normalize_headings(&md, target);
            let before = extract_headings(&md);
            let after = extract_headings(&out);
            prop_assert_eq!(before.len(), after.len());
            for (b, a) in before.iter().zip(&after) {
                prop_assert_eq!(&b.text, &a.text);
            }
            prop_assert_eq!(
                after.iter().map(|h| h.level).collect::<Vec<_>>(),
                normalized_levels(&original, target)
            );
        }
    }
}
