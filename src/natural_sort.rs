//! Human-friendly ordering of file names

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// One run of a file name: either digits or everything between digits
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Digit run with leading zeros stripped (empty for "0", "000", ...)
    Number(String),
    /// Non-digit run, lowercased
    Text(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Shorter digit strings are smaller numbers; equal lengths compare digit by digit.
            (Segment::Number(a), Segment::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Number(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key produced by [`natural_sort_key`]
///
/// Ties on the segment list ("img01" vs "img1") fall back to the raw name so
/// the ordering stays total.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey {
    segments: Vec<Segment>,
    raw: String,
}

/// Build the natural sort key for a name
///
/// The name is split into alternating non-digit and digit runs. Digit runs
/// compare numerically, other runs compare case-insensitively, so
/// `"img2.png"` sorts before `"img10.png"`.
pub fn natural_sort_key(name: &str) -> NaturalKey {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for ch in name.chars() {
        let is_digit = ch.is_ascii_digit();
        if is_digit != in_digits && !current.is_empty() {
            segments.push(finish_segment(&current, in_digits));
            current.clear();
        }
        in_digits = is_digit;
        current.push(ch);
    }
    if !current.is_empty() {
        segments.push(finish_segment(&current, in_digits));
    }

    NaturalKey {
        segments,
        raw: name.to_string(),
    }
}

fn finish_segment(run: &str, digits: bool) -> Segment {
    if digits {
        Segment::Number(run.trim_start_matches('0').to_string())
    } else {
        Segment::Text(run.to_lowercase())
    }
}

/// Key for a path, taken from its file name (falls back to the whole path)
pub fn path_sort_key(path: &Path) -> NaturalKey {
    match path.file_name() {
        Some(name) => natural_sort_key(&name.to_string_lossy()),
        None => natural_sort_key(&path.to_string_lossy()),
    }
}

/// Sort paths in place by the natural order of their file names
pub fn sort_naturally(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|p| path_sort_key(p));
}
