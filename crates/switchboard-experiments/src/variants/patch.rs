//! Location-hint patching: place a fix's change content into baseline
//! content.
//!
//! Hint priority: named section > anchor line > explicit line number >
//! function boundary. A hint that does not resolve falls through to the
//! next; with no usable hint the change is appended at end of file.

use switchboard_core::models::fix::FixLocation;

/// Apply `change` to `baseline` using the location hints.
pub fn apply_change(baseline: &str, change: &str, location: Option<&FixLocation>) -> String {
    let Some(location) = location.filter(|l| !l.is_empty()) else {
        return append(baseline, change);
    };

    let lines: Vec<&str> = baseline.lines().collect();

    if let Some(section) = location.section.as_deref() {
        if let Some(idx) = find_line_containing(&lines, section) {
            return insert_after(&lines, idx, change);
        }
    }

    if let Some(anchor) = location.anchor_line.as_deref() {
        if let Some(idx) = lines.iter().position(|l| l.trim() == anchor.trim()) {
            return insert_after(&lines, idx, change);
        }
    }

    if let Some(line_number) = location.line_number {
        // 1-based; clamp past-the-end to append.
        let idx = (line_number.max(1) as usize - 1).min(lines.len());
        return insert_at(&lines, idx, change);
    }

    if let Some(function) = location.function.as_deref() {
        if let Some(idx) = find_line_containing(&lines, function) {
            return insert_after(&lines, idx, change);
        }
    }

    append(baseline, change)
}

fn find_line_containing(lines: &[&str], needle: &str) -> Option<usize> {
    let needle = needle.to_lowercase();
    lines
        .iter()
        .position(|l| l.to_lowercase().contains(&needle))
}

fn insert_after(lines: &[&str], idx: usize, change: &str) -> String {
    insert_at(lines, idx + 1, change)
}

fn insert_at(lines: &[&str], idx: usize, change: &str) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 1);
    out.extend_from_slice(&lines[..idx]);
    out.push(change);
    out.extend_from_slice(&lines[idx..]);
    let mut joined = out.join("\n");
    if !joined.ends_with('\n') {
        joined.push('\n');
    }
    joined
}

fn append(baseline: &str, change: &str) -> String {
    let mut out = baseline.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(change);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
