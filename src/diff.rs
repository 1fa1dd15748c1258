// src/diff.rs
use similar::TextDiff;

/// Default cap on rendered diff lines. Downstream consumers (issue
/// trackers) impose payload limits.
pub const DEFAULT_MAX_LINES: usize = 120;

/// Render a unified diff of `old` against `new`, bounded to `max_lines`.
///
/// Output longer than `max_lines` keeps the first `max_lines` lines plus a
/// single trailer stating the true total, so consumers can tell truncation
/// occurred and by how much.
///
/// Callers gate on fingerprint inequality first; this is not a no-op guard
/// for identical inputs.
pub fn render_unified(old: &str, new: &str, max_lines: usize) -> String {
    let rendered = TextDiff::from_lines(old, new)
        .unified_diff()
        .header("previous", "current")
        .context_radius(3)
        .to_string();

    let lines: Vec<&str> = rendered.lines().collect();
    if lines.len() <= max_lines {
        return lines.join("\n");
    }

    let mut out = lines[..max_lines].join("\n");
    out.push('\n');
    out.push_str(&format!("...(diff truncated, total {} lines)", lines.len()));
    out
}
