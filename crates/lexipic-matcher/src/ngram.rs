use std::borrow::Borrow;

/// Sliding windows of `size` tokens joined by a single space.
///
/// Yields `tokens.len() - size + 1` grams, or nothing when there are fewer
/// tokens than `size`. A `size` of zero yields empty grams.
pub fn generate_ngrams<S: Borrow<str>>(tokens: &[S], size: usize) -> Vec<String> {
    if tokens.len() < size {
        return Vec::new();
    }
    if size == 0 {
        return vec![String::new(); tokens.len() + 1];
    }
    tokens.windows(size).map(|window| window.join(" ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_windows_in_order() {
        let tokens = ["quiero", "ir", "al", "baño"];
        assert_eq!(
            generate_ngrams(&tokens, 2),
            vec!["quiero ir", "ir al", "al baño"]
        );
        assert_eq!(generate_ngrams(&tokens, 3), vec!["quiero ir al", "ir al baño"]);
        assert_eq!(generate_ngrams(&tokens, 4), vec!["quiero ir al baño"]);
    }

    #[test]
    fn too_few_tokens_is_empty() {
        assert!(generate_ngrams(&["hola"], 2).is_empty());
        assert!(generate_ngrams::<&str>(&[], 1).is_empty());
    }

    #[test]
    fn length_matches_window_count() {
        let tokens: Vec<String> = (0..7).map(|i| format!("t{i}")).collect();
        for size in 0..=9 {
            let grams = generate_ngrams(&tokens, size);
            let expected = (tokens.len() + 1).saturating_sub(size);
            let expected = if size > tokens.len() { 0 } else { expected };
            assert_eq!(grams.len(), expected, "size {size}");
        }
    }
}
