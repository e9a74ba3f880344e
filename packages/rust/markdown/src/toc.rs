//! Table-of-contents rendering for linear documents.

use std::collections::HashMap;

use adit_shared::TocOptions;

use crate::headings::Heading;

/// GitHub-style anchor slug for a heading text.
pub fn heading_anchor(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Render a nested markdown list linking to `headings`.
///
/// Headings deeper than `max_depth` are omitted, as are level-1 headings when
/// `top_level` is off. Returns an empty string when nothing qualifies or the
/// TOC is disabled (`max_depth == 0`).
pub fn render_toc(headings: &[Heading], opts: &TocOptions) -> String {
    if opts.max_depth == 0 {
        return String::new();
    }

    // Anchors are assigned over every heading so duplicate numbering matches
    // what renderers generate for the full document.
    let mut seen: HashMap<String, usize> = HashMap::new();
    let anchored: Vec<(&Heading, String)> = headings
        .iter()
        .map(|h| {
            let base = heading_anchor(&h.text);
            let count = seen.entry(base.clone()).or_insert(0);
            let anchor = if *count == 0 {
                base
            } else {
                format!("{base}-{count}")
            };
            *count += 1;
            (h, anchor)
        })
        .collect();

    let listed: Vec<&(&Heading, String)> = anchored
        .iter()
        .filter(|(h, _)| h.level <= opts.max_depth && (opts.top_level || h.level > 1))
        .collect();

    let Some(base_level) = listed.iter().map(|(h, _)| h.level).min() else {
        return String::new();
    };

    let mut out = String::new();
    for (heading, anchor) in listed {
        let indent = "  ".repeat(heading.level - base_level);
        out.push_str(&format!("{indent}- [{}](#{anchor})\n", heading.text));
    }
    out
}
