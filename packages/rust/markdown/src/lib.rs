//! Markdown passes used when flattening content graphs into documents.
//!
//! Heading renumbering so embedded fragments nest at their placement depth,
//! heading stripping for content-length checks, TOC rendering for linear
//! documents, and YAML frontmatter for generated pages.

mod headings;
mod toc;

pub use headings::{
    Heading, content_len, extract_headings, normalize_headings, normalized_levels,
    strip_heading_markup,
};
pub use toc::{heading_anchor, render_toc};

/// A heading-only fragment standing in for a node without its own body.
pub fn label_heading(label: &str) -> String {
    format!("# {}", label.trim())
}

// ---------------------------------------------------------------------------
// Frontmatter
// ---------------------------------------------------------------------------

/// Builder for a YAML frontmatter block.
#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    lines: Vec<String>,
}

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quoted string field.
    pub fn string(mut self, key: &str, value: &str) -> Self {
        self.lines
            .push(format!("{key}: \"{}\"", escape_yaml_string(value)));
        self
    }

    /// Add a numeric field.
    pub fn number(mut self, key: &str, value: f64) -> Self {
        self.lines.push(format!("{key}: {value}"));
        self
    }

    /// Add a list of quoted strings.
    pub fn list<I, S>(mut self, key: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<String> = items
            .into_iter()
            .map(|s| format!("  - \"{}\"", escape_yaml_string(s.as_ref())))
            .collect();
        if items.is_empty() {
            self.lines.push(format!("{key}: []"));
        } else {
            self.lines.push(format!("{key}:"));
            self.lines.extend(items);
        }
        self
    }

    /// Render the block, delimited by `---` lines.
    pub fn render(&self) -> String {
        let mut fm = String::from("---\n");
        for line in &self.lines {
            fm.push_str(line);
            fm.push('\n');
        }
        fm.push_str("---\n");
        fm
    }
}

/// Escape special characters in a YAML string value.
///
/// Control characters use YAML double-quoted escapes so a value always stays
/// on one line.
fn escape_yaml_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
