//! Version string comparison.
//!
//! Versions are split into segments on `.`, `-`, `_`, `+` and at every
//! digit/letter boundary, so `1.0rc1` becomes `1`, `0`, `rc`, `1`. Numeric
//! segments compare numerically. Word segments rank as
//! `dev < alpha < beta < rc < <number> < pl`, with unrecognized words below
//! `dev`. A leading `v` is ignored.

use std::cmp::Ordering;

/// Rank of a numeric segment when compared against a word.
const NUMBER_RANK: i32 = 4;
const UNKNOWN_RANK: i32 = -6;

/// Recognized words, matched by prefix in this order.
const SPECIAL_FORMS: &[(&str, i32)] = &[
    ("dev", 0),
    ("alpha", 1),
    ("a", 1),
    ("beta", 2),
    ("b", 2),
    ("rc", 3),
    ("pl", 5),
    ("p", 5),
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Number(&'a str),
    Word(&'a str),
}

fn strip_v_prefix(version: &str) -> &str {
    match version.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => version,
    }
}

fn segments(version: &str) -> Vec<Segment<'_>> {
    let version = strip_v_prefix(version.trim());
    let mut out = Vec::new();
    let mut start: Option<(usize, bool)> = None;

    for (idx, c) in version.char_indices() {
        let digit = c.is_ascii_digit();
        let word = c.is_alphabetic();

        if let Some((from, was_digit)) = start {
            if !(digit || word) || digit != was_digit {
                out.push(segment(&version[from..idx], was_digit));
                start = None;
            }
        }
        if start.is_none() && (digit || word) {
            start = Some((idx, digit));
        }
    }
    if let Some((from, was_digit)) = start {
        out.push(segment(&version[from..], was_digit));
    }
    out
}

fn segment(text: &str, numeric: bool) -> Segment<'_> {
    if numeric {
        Segment::Number(text)
    } else {
        Segment::Word(text)
    }
}

fn word_rank(word: &str) -> i32 {
    let lower = word.to_lowercase();
    SPECIAL_FORMS
        .iter()
        .find(|(form, _)| lower.starts_with(form))
        .map(|(_, rank)| *rank)
        .unwrap_or(UNKNOWN_RANK)
}

/// Numeric comparison on digit strings of any length.
fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_segments(a: &Segment<'_>, b: &Segment<'_>) -> Ordering {
    match (a, b) {
        (Segment::Number(a), Segment::Number(b)) => compare_numbers(a, b),
        (Segment::Number(_), Segment::Word(w)) => NUMBER_RANK.cmp(&word_rank(w)),
        (Segment::Word(w), Segment::Number(_)) => word_rank(w).cmp(&NUMBER_RANK),
        (Segment::Word(a), Segment::Word(b)) => {
            let (ra, rb) = (word_rank(a), word_rank(b));
            match ra.cmp(&rb) {
                Ordering::Equal if ra == UNKNOWN_RANK => a.cmp(b),
                other => other,
            }
        }
    }
}

// Ordering of the first surplus segment of the longer version.
fn compare_surplus(extra: &Segment<'_>) -> Ordering {
    match extra {
        Segment::Number(_) => Ordering::Greater,
        Segment::Word(w) => word_rank(w).cmp(&NUMBER_RANK),
    }
}

/// Compare two version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);

    for (l, r) in left.iter().zip(right.iter()) {
        match compare_segments(l, r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    match left.len().cmp(&right.len()) {
        Ordering::Greater => compare_surplus(&left[right.len()]),
        Ordering::Less => compare_surplus(&right[left.len()]).reverse(),
        Ordering::Equal => Ordering::Equal,
    }
}

/// Whether `candidate` is strictly newer than `installed`.
pub fn is_newer(candidate: &str, installed: &str) -> bool {
    compare_versions(candidate, installed) == Ordering::Greater
}
