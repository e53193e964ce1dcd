//! Ordering for kernel version strings.
//!
//! Kernel artifacts are named by version ("5.10.12", "6.1.0-rc3"), and both
//! latest-kernel selection and oldest-first pruning depend on a total order
//! over those strings. Plain lexicographic comparison gets numeric runs wrong
//! ("9" would sort after "10"), so runs of digits are compared as numbers
//! while everything else compares lexicographically.

use std::cmp::Ordering;

/// Compare two version strings.
///
/// Both strings are split into maximal runs of ASCII digits and runs of
/// everything else. Token pairs are compared in order: digit run vs digit run
/// numerically, any other pair lexicographically. The first difference
/// decides; if one string runs out of tokens first, the shorter one orders
/// first.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = tokens(a);
    let mut right = tokens(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = if is_numeric(l) && is_numeric(r) {
                    compare_numeric(l, r)
                } else {
                    l.cmp(r)
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Split a version string into runs of digits and runs of non-digits.
fn tokens(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let digit = rest.as_bytes()[0].is_ascii_digit();
        let end = rest
            .bytes()
            .position(|b| b.is_ascii_digit() != digit)
            .unwrap_or(rest.len());
        let (tok, tail) = rest.split_at(end);
        rest = tail;
        Some(tok)
    })
}

fn is_numeric(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Compare two digit runs as numbers of arbitrary length.
///
/// Leading zeros are stripped rather than parsed, so runs longer than any
/// machine integer still compare correctly.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_runs_compare_as_numbers() {
        assert_eq!(compare("2.9", "2.10"), Ordering::Less);
        assert_eq!(compare("2.10", "2.9"), Ordering::Greater);
        assert_eq!(compare("kernel-9", "kernel-10"), Ordering::Less);
    }

    #[test]
    fn equal_strings_are_equal() {
        assert_eq!(compare("5.10.12", "5.10.12"), Ordering::Equal);
        assert_eq!(compare("", ""), Ordering::Equal);
    }

    #[test]
    fn shorter_prefix_sorts_first() {
        assert_eq!(compare("5.10", "5.10.1"), Ordering::Less);
        assert_eq!(compare("5.10.1", "5.10"), Ordering::Greater);
    }

    #[test]
    fn alpha_segments_compare_lexicographically() {
        assert_eq!(compare("6.1.0-rc1", "6.1.0-rc2"), Ordering::Less);
        // Digits sort before letters, as in plain byte order.
        assert_eq!(compare("5.10", "5.x"), Ordering::Less);
    }

    #[test]
    fn leading_zeros_do_not_inflate() {
        assert_eq!(compare("5.010", "5.10"), Ordering::Equal);
        assert_eq!(compare("5.09", "5.10"), Ordering::Less);
    }

    #[test]
    fn handles_numbers_beyond_u64() {
        assert_eq!(
            compare("1.18446744073709551616", "1.18446744073709551617"),
            Ordering::Less
        );
    }

    #[test]
    fn antisymmetry_on_sample_pairs() {
        let samples = ["5.4", "5.10", "5.10.1", "6.1.0-rc3", "6.1.0", "old"];
        for a in samples {
            for b in samples {
                assert_eq!(compare(a, b), compare(b, a).reverse(), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn transitivity_via_total_sort() {
        // Sorting with the comparator must agree with itself on every pair,
        // which fails if the order is not transitive.
        let mut versions = vec!["5.10", "5.4", "5.9", "6.0", "5.10.1", "4.19", "6.1.0-rc1"];
        versions.sort_by(|a, b| compare(a, b));
        assert_eq!(
            versions,
            vec!["4.19", "5.4", "5.9", "5.10", "5.10.1", "6.0", "6.1.0-rc1"]
        );
        for w in versions.windows(2) {
            assert_ne!(compare(w[0], w[1]), Ordering::Greater);
        }
    }
}
