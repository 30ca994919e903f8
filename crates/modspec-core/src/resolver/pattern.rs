//! Expansion key matching for `exports` and `imports` maps.
//!
//! An expansion key holds exactly one `*`. It matches a subject that starts
//! with the part before the `*` (without being equal to it) and, when a
//! trailer follows the `*`, ends with that trailer.

use std::cmp::Ordering;

/// Whether a map key is an expansion key (exactly one `*`).
#[must_use]
pub fn is_expansion_key(key: &str) -> bool {
    key.matches('*').count() == 1
}

/// Match `subject` against an expansion key.
///
/// Returns the substring captured by the `*`.
/// E.g., key `"./e/*.js"` with subject `"./e/g.js"` returns `Some("g")`.
#[must_use]
pub fn match_expansion_key<'a>(key: &str, subject: &'a str) -> Option<&'a str> {
    let (base, trailer) = key.split_once('*')?;

    if subject == base || !subject.starts_with(base) {
        return None;
    }

    if trailer.is_empty() {
        return Some(&subject[base.len()..]);
    }

    if subject.len() >= key.len() && subject.ends_with(trailer) {
        return Some(&subject[base.len()..subject.len() - trailer.len()]);
    }

    None
}

/// Order expansion keys from most to least specific.
///
/// Larger base length first (the base includes the `*` position), then
/// plain keys before wildcard keys, then longer keys first.
#[must_use]
pub fn pattern_key_compare(a: &str, b: &str) -> Ordering {
    let a_star = a.find('*');
    let b_star = b.find('*');

    let base_len_a = a_star.map_or(a.len(), |i| i + 1);
    let base_len_b = b_star.map_or(b.len(), |i| i + 1);

    base_len_b
        .cmp(&base_len_a)
        .then_with(|| match (a_star, b_star) {
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(_), Some(_)) => b.len().cmp(&a.len()),
            (None, None) => Ordering::Equal,
        })
}

/// Substitute every `*` in `target` with the captured match.
#[must_use]
pub fn substitute(target: &str, pattern_match: &str) -> String {
    target.replace('*', pattern_match)
}
