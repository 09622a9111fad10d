//! Shared utility functions

// ============================================================================
// Levenshtein Distance: Typo Suggestions
// ============================================================================

/// Calculate Levenshtein edit distance between two strings.
/// Uses O(min(m,n)) space with two-row optimization.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Find the most similar name from a list of candidates.
/// Ties go to the candidate listed first.
pub fn find_similar_name<'a>(
    name: &str,
    candidates: &[&'a str],
    threshold: usize,
) -> Option<&'a str> {
    let mut best_match: Option<&str> = None;
    let mut best_distance = usize::MAX;

    for &candidate in candidates {
        let distance = levenshtein_distance(name, candidate);
        if distance < best_distance && distance <= threshold {
            best_distance = distance;
            best_match = Some(candidate);
        }
    }

    best_match
}

/// "did you mean" hint for an unknown name, if any candidate is close enough.
pub fn suggestion_hint(name: &str, candidates: &[&str]) -> Option<String> {
    find_similar_name(name, candidates, 2).map(|s| format!("did you mean `{s}`?"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein_distance("count", "count"), 0);
    }

    #[test]
    fn test_levenshtein_edits() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("cnt", "count"), 2);
    }

    #[test]
    fn test_find_similar_name() {
        let candidates = ["count", "total", "matrix"];
        assert_eq!(find_similar_name("cout", &candidates, 2), Some("count"));
        assert_eq!(find_similar_name("matrx", &candidates, 2), Some("matrix"));
        assert_eq!(find_similar_name("zzz", &candidates, 2), None);
    }

    #[test]
    fn test_suggestion_hint() {
        assert_eq!(
            suggestion_hint("totl", &["total"]),
            Some("did you mean `total`?".to_string())
        );
        assert_eq!(suggestion_hint("q", &[]), None);
    }
}
