//! Turn a free-form utterance into ranked pictogram search queries.
//!
//! The pipeline is deterministic and reads only the immutable corpus:
//! 1. [`normalize`] the text (lowercase, leet digits, accent folding that keeps
//!    `ñ`, punctuation to spaces, whitespace collapse).
//! 2. Split on spaces and [`correct_token`] each token against the corpus
//!    vocabulary.
//! 3. Build bigrams and trigrams with [`generate_ngrams`].
//! 4. [`score_sample`] every corpus sample and [`rank`] the positive ones,
//!    falling back to the first samples when nothing scores.
//! 5. Wrap each pick as an [`InferenceResult`] and derive catalog queries with
//!    [`build_search_queries`].
//!
//! Catalog results for those queries are merged with [`dedupe_pictograms`].
//!
//! # Example
//! ```rust
//! use lexipic_corpus::Corpus;
//! use lexipic_matcher::{PhraseMatcher, build_search_queries};
//!
//! let matcher = PhraseMatcher::new(Corpus::embedded());
//! let matches = matcher.infer("t3ng0 s3d", 3);
//! assert_eq!(matches[0].sample.phrase, "Tengo sed");
//! let queries = build_search_queries(&matches);
//! assert_eq!(queries[0], "tengo sed");
//! ```

use std::sync::Arc;

use lexipic_corpus::{Corpus, Vocabulary};
use lexipic_types::{InferenceResult, SampleScore};

mod correct;
mod dedupe;
mod ngram;
mod normalize;
mod query;
mod rank;
mod score;

pub use correct::{MAX_EDIT_DISTANCE, correct_token, levenshtein};
pub use dedupe::dedupe_pictograms;
pub use ngram::generate_ngrams;
pub use normalize::{NormalizeOptions, PROTECTED, normalize, normalize_with};
pub use query::{build_search_queries, build_search_text};
pub use rank::{fallback, rank};
pub use score::{
    BIGRAM_WEIGHT, EXACT_PHRASE_BONUS, MatchInput, TOKEN_WEIGHT, TRIGRAM_WEIGHT, score_sample,
};

/// Number of matches kept per utterance unless the caller asks otherwise.
pub const DEFAULT_LIMIT: usize = 3;

/// Normalize, split and correct `text` against `vocabulary`.
pub fn tokenize(text: &str, vocabulary: &Vocabulary, options: NormalizeOptions) -> Vec<String> {
    normalize_with(text, options)
        .split(' ')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| correct_token(token, vocabulary))
        .collect()
}

/// Matcher bound to one shared corpus.
#[derive(Clone, Debug)]
pub struct PhraseMatcher {
    corpus: Arc<Corpus>,
    options: NormalizeOptions,
}

impl PhraseMatcher {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self::with_options(corpus, NormalizeOptions::default())
    }

    pub fn with_options(corpus: Arc<Corpus>, options: NormalizeOptions) -> Self {
        Self { corpus, options }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        tokenize(text, self.corpus.vocabulary(), self.options)
    }

    /// Ranked samples for `message`, including the fallback when nothing scores.
    pub fn rank(&self, message: &str, limit: usize) -> (MatchInput, Vec<SampleScore<'_>>) {
        let input = MatchInput::new(self.tokenize(message));
        let ranked = rank(self.corpus.samples(), &input, limit, self.options);
        (input, ranked)
    }

    /// Up to `limit` matches for `message`; empty when it has no tokens.
    pub fn infer(&self, message: &str, limit: usize) -> Vec<InferenceResult> {
        let (input, ranked) = self.rank(message, limit);
        ranked
            .into_iter()
            .map(|scored| InferenceResult {
                search_text: build_search_text(&input.tokens, &scored.sample.tokens),
                sample: scored.sample.clone(),
                matched_tokens: scored.matched_tokens,
                score: scored.score,
            })
            .collect()
    }
}
