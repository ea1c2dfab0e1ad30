use lexipic_corpus::Vocabulary;
use tracing::debug;

/// Largest edit distance at which a token is replaced by a vocabulary entry.
pub const MAX_EDIT_DISTANCE: usize = 2;

/// Map a normalized token to its nearest vocabulary entry.
///
/// Known tokens come back unchanged. Otherwise the closest entry within
/// [`MAX_EDIT_DISTANCE`] wins; among equally close entries the
/// lexicographically smallest one is chosen. Tokens with no entry in range
/// are returned as they are.
pub fn correct_token(token: &str, vocabulary: &Vocabulary) -> String {
    if token.is_empty() || vocabulary.contains(token) {
        return token.to_string();
    }

    let token_len = token.chars().count();
    let mut best: Option<(&str, usize)> = None;
    for candidate in vocabulary.iter() {
        // Entries whose length differs by more than the threshold can never qualify.
        if candidate.chars().count().abs_diff(token_len) > MAX_EDIT_DISTANCE {
            continue;
        }
        let distance = levenshtein(token, candidate);
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((candidate, distance));
        }
        if distance == 0 {
            break;
        }
    }

    match best {
        Some((candidate, distance)) if distance <= MAX_EDIT_DISTANCE => {
            debug!("corrected token {token:?} -> {candidate:?} (distance {distance})");
            candidate.to_string()
        }
        _ => token.to_string(),
    }
}

/// Character-level Levenshtein distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
