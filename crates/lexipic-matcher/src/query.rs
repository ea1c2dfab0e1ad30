use std::collections::HashSet;

use lexipic_types::InferenceResult;

const SEARCH_TEXT_TOKENS: usize = 3;
const QUERY_TOKENS_PER_MATCH: usize = 3;

/// Up to three input tokens followed by up to three sample tokens, without
/// repeats, joined by spaces.
pub fn build_search_text(input_tokens: &[String], sample_tokens: &[String]) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for token in input_tokens
        .iter()
        .take(SEARCH_TEXT_TOKENS)
        .chain(sample_tokens.iter().take(SEARCH_TEXT_TOKENS))
    {
        if !token.is_empty() && !seen.contains(&token.as_str()) {
            seen.push(token);
        }
    }
    seen.join(" ").trim().to_string()
}

/// Ordered, duplicate-free catalog queries for a set of matches.
///
/// Each match contributes its search text and then up to three of its matched
/// tokens, or of the sample's own tokens when none matched.
pub fn build_search_queries(matches: &[InferenceResult]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();

    for result in matches {
        push_unique(&mut out, &mut seen, result.search_text.trim());

        let tokens = if result.matched_tokens.is_empty() {
            &result.sample.tokens
        } else {
            &result.matched_tokens
        };
        tokens
            .iter()
            .map(|token| token.trim())
            .filter(|token| !token.is_empty())
            .take(QUERY_TOKENS_PER_MATCH)
            .for_each(|token| push_unique(&mut out, &mut seen, token));
    }

    out
}

fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<String>, query: &str) {
    if !query.is_empty() && seen.insert(query.to_string()) {
        out.push(query.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexipic_types::PictogramSample;

    fn owned(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|x| x.to_string()).collect()
    }

    fn result(search_text: &str, matched: &[&str], sample_tokens: &[&str]) -> InferenceResult {
        InferenceResult {
            search_text: search_text.into(),
            sample: PictogramSample {
                phrase: sample_tokens.join(" "),
                tokens: owned(sample_tokens),
                ..PictogramSample::default()
            },
            matched_tokens: owned(matched),
            score: 1,
        }
    }

    #[test]
    fn search_text_merges_without_repeats() {
        let text = build_search_text(
            &owned(&["yo", "tengo", "mucha", "sed"]),
            &owned(&["tengo", "sed"]),
        );
        assert_eq!(text, "yo tengo mucha sed");
        assert_eq!(build_search_text(&[], &[]), "");
    }

    #[test]
    fn queries_keep_first_seen_order() {
        let matches = vec![
            result("tengo sed", &["tengo", "sed"], &["tengo", "sed"]),
            result("tengo hambre", &["tengo"], &["tengo", "hambre"]),
        ];
        assert_eq!(
            build_search_queries(&matches),
            vec!["tengo sed", "tengo", "sed", "tengo hambre"]
        );
    }

    #[test]
    fn unmatched_results_use_sample_tokens() {
        let matches = vec![result(
            "  ",
            &[],
            &["quiero", " ", "ir", "al", "baño"],
        )];
        assert_eq!(build_search_queries(&matches), vec!["quiero", "ir", "al"]);
    }

    #[test]
    fn no_matches_no_queries() {
        assert!(build_search_queries(&[]).is_empty());
    }
}
