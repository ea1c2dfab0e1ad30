use lexipic_types::{PictogramSample, SampleScore};
use tracing::debug;

use crate::normalize::NormalizeOptions;
use crate::score::{MatchInput, score_sample};

/// Best `limit` samples by descending score, ties kept in corpus order.
///
/// When nothing scores, the first `limit` samples are returned as a fallback.
/// An input without tokens yields nothing, never the fallback.
pub fn rank<'a>(
    samples: &'a [PictogramSample],
    input: &MatchInput,
    limit: usize,
    options: NormalizeOptions,
) -> Vec<SampleScore<'a>> {
    if input.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<SampleScore<'a>> = samples
        .iter()
        .filter_map(|sample| score_sample(input, sample, options))
        .collect();

    if scored.is_empty() {
        debug!("no sample matched {:?}; using fallback", input.joined);
        return fallback(samples, limit);
    }

    // `sort_by` is stable, so equal scores stay in corpus order.
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);
    scored
}

/// The first `limit` samples with score 1 and their first two tokens.
pub fn fallback(samples: &[PictogramSample], limit: usize) -> Vec<SampleScore<'_>> {
    samples
        .iter()
        .take(limit)
        .map(|sample| SampleScore {
            sample,
            score: 1,
            matched_tokens: sample.tokens.iter().take(2).cloned().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(phrase: &str, tokens: &[&str]) -> PictogramSample {
        PictogramSample {
            phrase: phrase.into(),
            normalized_phrase: phrase.to_lowercase(),
            category: "test".into(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            bigrams: Vec::new(),
            trigrams: Vec::new(),
        }
    }

    fn corpus() -> Vec<PictogramSample> {
        vec![
            sample("Estoy feliz", &["estoy", "feliz"]),
            sample("Tengo sed", &["tengo", "sed"]),
            sample("Tengo hambre", &["tengo", "hambre"]),
            sample("Tengo miedo", &["tengo", "miedo"]),
            sample("Tengo", &["tengo"]),
        ]
    }

    fn input(tokens: &[&str]) -> MatchInput {
        MatchInput::new(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn orders_by_score_then_corpus_order() {
        let samples = corpus();
        let ranked = rank(&samples, &input(&["tengo"]), 3, NormalizeOptions::default());
        let phrases: Vec<&str> = ranked.iter().map(|s| s.sample.phrase.as_str()).collect();
        // "Tengo" is an exact phrase match; the rest tie at 1 in corpus order
        assert_eq!(phrases, vec!["Tengo", "Tengo sed", "Tengo hambre"]);
        assert_eq!(ranked[0].score, 11);
        assert!(ranked.iter().all(|s| s.score > 0));
    }

    #[test]
    fn falls_back_when_nothing_scores() {
        let samples = corpus();
        let ranked = rank(&samples, &input(&["xyz"]), 2, NormalizeOptions::default());
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].sample.phrase, "Estoy feliz");
        assert_eq!(ranked[0].score, 1);
        assert_eq!(ranked[0].matched_tokens, vec!["estoy", "feliz"]);
        assert_eq!(ranked[1].sample.phrase, "Tengo sed");
    }

    #[test]
    fn fallback_is_capped_by_corpus_size() {
        let samples = corpus();
        assert_eq!(rank(&samples, &input(&["xyz"]), 10, NormalizeOptions::default()).len(), 5);
        assert!(rank(&[], &input(&["xyz"]), 3, NormalizeOptions::default()).is_empty());
    }

    #[test]
    fn empty_input_skips_fallback() {
        let samples = corpus();
        assert!(rank(&samples, &input(&[]), 3, NormalizeOptions::default()).is_empty());
    }

    #[test]
    fn zero_limit_is_empty() {
        let samples = corpus();
        assert!(rank(&samples, &input(&["tengo"]), 0, NormalizeOptions::default()).is_empty());
    }
}
