use std::collections::HashSet;

use lexipic_types::{PictogramSample, SampleScore};

use crate::ngram::generate_ngrams;
use crate::normalize::{NormalizeOptions, normalize_with};

pub const TOKEN_WEIGHT: u32 = 1;
pub const BIGRAM_WEIGHT: u32 = 2;
pub const TRIGRAM_WEIGHT: u32 = 3;
pub const EXACT_PHRASE_BONUS: u32 = 10;

/// Corrected input tokens with their n-grams, ready to score.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MatchInput {
    pub tokens: Vec<String>,
    pub bigrams: Vec<String>,
    pub trigrams: Vec<String>,
    /// Tokens joined by single spaces.
    pub joined: String,
}

impl MatchInput {
    pub fn new(tokens: Vec<String>) -> Self {
        let bigrams = generate_ngrams(&tokens, 2);
        let trigrams = generate_ngrams(&tokens, 3);
        let joined = tokens.join(" ");
        Self {
            tokens,
            bigrams,
            trigrams,
            joined,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Score one sample against the input, or `None` if it does not match.
///
/// `score = tokens + 2 * bigrams + 3 * trigrams + 10 * exact_phrase`, where each
/// input token or gram counts once per occurrence in the input. Samples with
/// no tokens are never scored.
pub fn score_sample<'a>(
    input: &MatchInput,
    sample: &'a PictogramSample,
    options: NormalizeOptions,
) -> Option<SampleScore<'a>> {
    if sample.tokens.is_empty() {
        return None;
    }

    let sample_tokens: HashSet<&str> = sample.tokens.iter().map(String::as_str).collect();
    let sample_bigrams: HashSet<&str> = sample.bigrams.iter().map(String::as_str).collect();
    let sample_trigrams: HashSet<&str> = sample.trigrams.iter().map(String::as_str).collect();

    let matched_tokens: Vec<String> = input
        .tokens
        .iter()
        .filter(|token| sample_tokens.contains(token.as_str()))
        .cloned()
        .collect();
    let bigram_hits = count_hits(&input.bigrams, &sample_bigrams);
    let trigram_hits = count_hits(&input.trigrams, &sample_trigrams);
    let exact = !input.joined.is_empty()
        && normalize_with(&sample.normalized_phrase, options) == input.joined;

    let score = matched_tokens.len() as u32 * TOKEN_WEIGHT
        + bigram_hits * BIGRAM_WEIGHT
        + trigram_hits * TRIGRAM_WEIGHT
        + if exact { EXACT_PHRASE_BONUS } else { 0 };

    (score > 0).then_some(SampleScore {
        sample,
        score,
        matched_tokens,
    })
}

fn count_hits(grams: &[String], set: &HashSet<&str>) -> u32 {
    grams.iter().filter(|gram| set.contains(gram.as_str())).count() as u32
}
