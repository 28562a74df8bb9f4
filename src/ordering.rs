//! Display ordering for allele and haplotype names
//!
//! Names like `*1`, `*2A`, `*10` or `rs1065852` are compared by splitting
//! them into runs of digits and runs of everything else. Digit runs compare
//! by magnitude, so `*9` sorts before `*10`. Names that are still equal
//! after that (e.g. `*01` and `*1`) fall back to plain string order, which
//! keeps the ordering total.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(name: &str) -> Vec<Chunk<'_>> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut in_digits: Option<bool> = None;

    for (idx, ch) in name.char_indices() {
        let is_digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                result.push(make_chunk(&name[start..idx], prev));
                start = idx;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if let Some(prev) = in_digits {
        result.push(make_chunk(&name[start..], prev));
    }
    result
}

fn make_chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Digits(s)
    } else {
        Chunk::Text(s)
    }
}

/// Compare digit runs by magnitude without parsing, so arbitrarily long runs are fine
fn compare_magnitude(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_chunk(a: &Chunk<'_>, b: &Chunk<'_>) -> Ordering {
    match (a, b) {
        (Chunk::Digits(x), Chunk::Digits(y)) => compare_magnitude(x, y),
        (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
        (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
        (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
    }
}

/// Total order over haplotype display names
pub fn compare_haplotype_names(a: &str, b: &str) -> Ordering {
    let left = chunks(a);
    let right = chunks(b);

    for (x, y) in left.iter().zip(right.iter()) {
        let ord = compare_chunk(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

/// Sort items in place by a haplotype name key
pub fn sort_by_haplotype_name<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| compare_haplotype_names(key(a), key(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        sort_by_haplotype_name(&mut v, |s| s.as_str());
        v
    }

    #[test]
    fn test_numeral_magnitude_beats_string_length() {
        assert_eq!(compare_haplotype_names("*9", "*10"), Ordering::Less);
        assert_eq!(compare_haplotype_names("*10", "*9"), Ordering::Greater);
        assert_eq!(compare_haplotype_names("*2", "*100"), Ordering::Less);
    }

    #[test]
    fn test_suffix_tie_break() {
        assert_eq!(compare_haplotype_names("*2A", "*2B"), Ordering::Less);
        assert_eq!(compare_haplotype_names("*2", "*2A"), Ordering::Less);
        // case-sensitive: uppercase sorts first
        assert_eq!(compare_haplotype_names("*4K", "*4a"), Ordering::Less);
    }

    #[test]
    fn test_leading_zeros_still_total() {
        assert_eq!(compare_haplotype_names("*01", "*1"), Ordering::Less);
        assert_eq!(compare_haplotype_names("*1", "*01"), Ordering::Greater);
        assert_eq!(compare_haplotype_names("*1", "*1"), Ordering::Equal);
    }

    #[test]
    fn test_sort_mixed_names() {
        assert_eq!(
            sorted(&["*10", "*1", "*2", "*1xN", "*4", "*3A", "*17", "*2A"]),
            vec!["*1", "*1xN", "*2", "*2A", "*3A", "*4", "*10", "*17"]
        );
    }

    #[test]
    fn test_huge_numerals_do_not_overflow() {
        assert_eq!(
            compare_haplotype_names("rs99999999999999999999999", "rs100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(compare_haplotype_names("", "*1"), Ordering::Less);
        assert_eq!(compare_haplotype_names("", ""), Ordering::Equal);
    }
}
