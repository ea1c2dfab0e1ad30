use lexipic_matcher::{DEFAULT_LIMIT, PhraseMatcher, build_search_queries, dedupe_pictograms};
use lexipic_types::{InferenceResult, Language, PictogramResult};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::lookup::{LookupError, PictogramLookup};

/// Most pictograms returned for one message.
pub const MAX_PICTOGRAMS: usize = 6;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslateStatus {
    Ok,
    NoMatches,
    NoQueries,
    NoPictograms,
    Cancelled,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FailedQuery {
    pub query: String,
    pub error: String,
}

/// Everything one translate pass produced.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Translation {
    pub status: TranslateStatus,
    pub language: Language,
    /// Direct hit for the raw message, at most one.
    pub user_pictograms: Vec<PictogramResult>,
    pub matches: Vec<InferenceResult>,
    pub queries: Vec<String>,
    /// Queries that returned pictograms, or every query if none did.
    pub reported_queries: Vec<String>,
    pub failed_queries: Vec<FailedQuery>,
    pub pictograms: Vec<PictogramResult>,
}

impl Translation {
    fn empty(status: TranslateStatus, language: Language) -> Self {
        Self {
            status,
            language,
            user_pictograms: Vec::new(),
            matches: Vec::new(),
            queries: Vec::new(),
            reported_queries: Vec::new(),
            failed_queries: Vec::new(),
            pictograms: Vec::new(),
        }
    }
}

struct Interrupted;

/// Message -> matches -> queries -> sequential lookups -> merged pictograms.
pub struct Translator<L> {
    matcher: PhraseMatcher,
    lookup: L,
    match_limit: usize,
    max_pictograms: usize,
}

impl<L: PictogramLookup> Translator<L> {
    pub fn new(matcher: PhraseMatcher, lookup: L) -> Self {
        Self {
            matcher,
            lookup,
            match_limit: DEFAULT_LIMIT,
            max_pictograms: MAX_PICTOGRAMS,
        }
    }

    pub fn matcher(&self) -> &PhraseMatcher {
        &self.matcher
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Run one pass. Cancellation yields an empty `Cancelled` translation,
    /// never an error; failed lookups are recorded and skipped.
    pub async fn translate(
        &self,
        language: Language,
        message: &str,
        cancel: &CancelToken,
    ) -> Translation {
        match self.run(language, message.trim(), cancel).await {
            Ok(translation) => translation,
            Err(Interrupted) => {
                debug!("translate pass for {message:?} cancelled");
                Translation::empty(TranslateStatus::Cancelled, language)
            }
        }
    }

    async fn run(
        &self,
        language: Language,
        prompt: &str,
        cancel: &CancelToken,
    ) -> Result<Translation, Interrupted> {
        let mut out = Translation::empty(TranslateStatus::Ok, language);
        out.user_pictograms = self
            .direct_pictogram(language, prompt, cancel)
            .await?
            .into_iter()
            .collect();

        out.matches = self.matcher.infer(prompt, self.match_limit);
        if out.matches.is_empty() {
            out.status = TranslateStatus::NoMatches;
            return Ok(out);
        }

        out.queries = build_search_queries(&out.matches);
        if out.queries.is_empty() {
            out.status = TranslateStatus::NoQueries;
            return Ok(out);
        }

        let mut aggregated: Vec<PictogramResult> = Vec::new();
        let mut successful: Vec<String> = Vec::new();
        for query in &out.queries {
            match self.checked_lookup(language, query, cancel).await {
                Ok(results) => {
                    if !results.is_empty() {
                        aggregated.extend(results);
                        successful.push(query.clone());
                    }
                }
                Err(err) if err.is_cancelled() => return Err(Interrupted),
                Err(err) => {
                    warn!("pictogram lookup for {query:?} failed: {err}");
                    out.failed_queries.push(FailedQuery {
                        query: query.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        out.reported_queries = if successful.is_empty() {
            out.queries.clone()
        } else {
            successful
        };

        if aggregated.is_empty() {
            out.status = TranslateStatus::NoPictograms;
            return Ok(out);
        }
        out.pictograms = dedupe_pictograms(aggregated, self.max_pictograms);
        info!(
            "translated {prompt:?} into {} pictograms from {} queries",
            out.pictograms.len(),
            out.queries.len()
        );
        Ok(out)
    }

    /// The first catalog hit for the whole message, else for its first word
    /// that has any. A failed lookup gives up on the direct pictogram.
    async fn direct_pictogram(
        &self,
        language: Language,
        prompt: &str,
        cancel: &CancelToken,
    ) -> Result<Option<PictogramResult>, Interrupted> {
        let candidates = std::iter::once(prompt).chain(prompt.split_whitespace());
        for query in candidates {
            match self.checked_lookup(language, query, cancel).await {
                Ok(results) => {
                    if let Some(first) = results.into_iter().next() {
                        return Ok(Some(first));
                    }
                }
                Err(err) if err.is_cancelled() => return Err(Interrupted),
                Err(err) => {
                    warn!("direct pictogram lookup for {query:?} failed: {err}");
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }

    async fn checked_lookup(
        &self,
        language: Language,
        query: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<PictogramResult>, LookupError> {
        if cancel.is_cancelled() {
            return Err(LookupError::Cancelled);
        }
        let results = self.lookup.lookup(language, query, cancel).await?;
        if cancel.is_cancelled() {
            return Err(LookupError::Cancelled);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    use lexipic_corpus::Corpus;

    use super::*;
    use crate::cancel::{CancelHandle, cancel_pair};

    #[derive(Default)]
    struct FakeLookup {
        responses: HashMap<String, Result<Vec<u64>, u16>>,
        calls: Mutex<Vec<String>>,
        cancel_on_call: Option<(usize, CancelHandle)>,
    }

    impl FakeLookup {
        fn with(responses: &[(&str, Result<Vec<u64>, u16>)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(q, r)| (q.to_string(), r.clone()))
                    .collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PictogramLookup for FakeLookup {
        fn lookup(
            &self,
            _language: Language,
            query: &str,
            _cancel: &CancelToken,
        ) -> impl Future<Output = Result<Vec<PictogramResult>, LookupError>> + Send {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(query.to_string());
                calls.len()
            };
            if let Some((at, handle)) = &self.cancel_on_call {
                if *at == call {
                    handle.cancel();
                }
            }
            let planned = self.responses.get(query).cloned();
            let query = query.to_string();
            async move {
                match planned {
                    Some(Ok(ids)) => Ok(ids
                        .into_iter()
                        .map(|id| PictogramResult {
                            id,
                            image_url: format!("http://img.test/{id}.png"),
                            search_text: query.clone(),
                            keywords: vec![query.clone()],
                            description: None,
                        })
                        .collect()),
                    Some(Err(UNREACHABLE)) => {
                        Err(LookupError::Transport(transport_error().await))
                    }
                    Some(Err(status)) => Err(LookupError::Status {
                        status,
                        body: "boom".into(),
                    }),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    /// Scripted status standing for a connection failure.
    const UNREACHABLE: u16 = 0;

    async fn transport_error() -> reqwest::Error {
        reqwest::Client::new()
            .get("http://")
            .send()
            .await
            .unwrap_err()
    }

    fn translator(lookup: FakeLookup) -> Translator<FakeLookup> {
        Translator::new(PhraseMatcher::new(Corpus::embedded()), lookup)
    }

    fn ids(results: &[PictogramResult]) -> Vec<u64> {
        results.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn merges_sequential_lookups_and_survives_failures() {
        let t = translator(FakeLookup::with(&[
            ("tengo sed", Ok(vec![1, 2])),
            ("tengo", Ok(vec![2, 3, 4, 5])),
            ("sed", Ok(vec![6, 7])),
            ("tengo sed hambre", Err(500)),
            ("tengo sed sueño", Ok(vec![8])),
        ]));
        let out = t
            .translate(Language::Es, "  tengo s3d ", &CancelToken::never())
            .await;

        assert_eq!(out.status, TranslateStatus::Ok);
        assert_eq!(ids(&out.user_pictograms), vec![2]);
        assert_eq!(out.matches[0].sample.phrase, "Tengo sed");
        assert_eq!(
            out.queries,
            vec!["tengo sed", "tengo", "sed", "tengo sed hambre", "tengo sed sueño"]
        );
        assert_eq!(ids(&out.pictograms), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(
            out.reported_queries,
            vec!["tengo sed", "tengo", "sed", "tengo sed sueño"]
        );
        assert_eq!(out.failed_queries.len(), 1);
        assert_eq!(out.failed_queries[0].query, "tengo sed hambre");
        // one direct lookup for the raw message, then every query in order
        let calls = t.lookup().calls();
        assert_eq!(calls[..3], ["tengo s3d", "tengo", "tengo sed"]);
        assert_eq!(&calls[2..], out.queries.as_slice());
    }

    #[tokio::test]
    async fn transport_failure_is_recorded_and_later_queries_still_run() {
        let t = translator(FakeLookup::with(&[
            ("tengo", Err(UNREACHABLE)),
            ("sed", Ok(vec![3])),
        ]));
        let out = t
            .translate(Language::Es, "tengo sed", &CancelToken::never())
            .await;

        // the direct lookup gives up on "tengo" without failing the pass
        assert!(out.user_pictograms.is_empty());
        assert_eq!(out.status, TranslateStatus::Ok);
        assert_eq!(ids(&out.pictograms), vec![3]);
        assert_eq!(out.reported_queries, vec!["sed"]);
        assert_eq!(out.failed_queries.len(), 1);
        assert_eq!(out.failed_queries[0].query, "tengo");
        assert!(
            out.failed_queries[0]
                .error
                .starts_with("pictogram service unreachable")
        );
        let calls = t.lookup().calls();
        assert_eq!(calls.last().map(String::as_str), Some("tengo sed sueño"));
    }

    #[tokio::test]
    async fn direct_pictogram_falls_back_to_single_words() {
        let t = translator(FakeLookup::with(&[("xyz", Ok(vec![42, 43]))]));
        let out = t
            .translate(Language::En, "quiero xyz", &CancelToken::never())
            .await;
        assert_eq!(ids(&out.user_pictograms), vec![42]);
        assert_eq!(&t.lookup().calls()[..3], ["quiero xyz", "quiero", "xyz"]);
        assert_eq!(out.language, Language::En);
    }

    #[tokio::test]
    async fn direct_pictogram_failure_is_not_fatal() {
        let t = translator(FakeLookup::with(&[
            ("tengo hambre", Err(503)),
            ("hambre", Ok(vec![9])),
        ]));
        let out = t
            .translate(Language::Es, "tengo hambre", &CancelToken::never())
            .await;
        assert!(out.user_pictograms.is_empty());
        assert_eq!(out.status, TranslateStatus::Ok);
        assert_eq!(ids(&out.pictograms), vec![9]);
        assert_eq!(out.failed_queries[0].query, "tengo hambre");
    }

    #[tokio::test]
    async fn cancelled_before_start_issues_no_lookups() {
        let t = translator(FakeLookup::default());
        let (handle, token) = cancel_pair();
        handle.cancel();
        let out = t.translate(Language::Es, "tengo sed", &token).await;
        assert_eq!(out, Translation::empty(TranslateStatus::Cancelled, Language::Es));
        assert!(t.lookup().calls().is_empty());
    }

    #[tokio::test]
    async fn cancellation_mid_batch_discards_partial_results() {
        let (handle, token) = cancel_pair();
        let lookup = FakeLookup {
            cancel_on_call: Some((3, handle)),
            ..FakeLookup::with(&[("tengo sed", Ok(vec![1])), ("tengo", Ok(vec![2]))])
        };
        let t = translator(lookup);
        let out = t.translate(Language::Es, "tengo sed", &token).await;
        assert_eq!(out.status, TranslateStatus::Cancelled);
        assert!(out.pictograms.is_empty());
        assert_eq!(t.lookup().calls().len(), 3);
    }

    #[tokio::test]
    async fn blank_tokens_report_no_matches() {
        let t = translator(FakeLookup::default());
        let out = t.translate(Language::Es, "¿?", &CancelToken::never()).await;
        assert_eq!(out.status, TranslateStatus::NoMatches);
        assert!(out.queries.is_empty());
    }

    #[tokio::test]
    async fn empty_catalog_reports_all_queries() {
        let t = translator(FakeLookup::default());
        let out = t
            .translate(Language::Es, "quiero jugar", &CancelToken::never())
            .await;
        assert_eq!(out.status, TranslateStatus::NoPictograms);
        assert!(!out.queries.is_empty());
        assert_eq!(out.reported_queries, out.queries);
        assert!(out.pictograms.is_empty());
    }

    #[tokio::test]
    async fn shared_translator_runs_concurrently() {
        let t = Arc::new(translator(FakeLookup::with(&[("sed", Ok(vec![1]))])));
        let a = tokio::spawn({
            let t = Arc::clone(&t);
            async move { t.translate(Language::Es, "tengo sed", &CancelToken::never()).await }
        });
        let b = tokio::spawn({
            let t = Arc::clone(&t);
            async move { t.translate(Language::Es, "sed", &CancelToken::never()).await }
        });
        assert_eq!(a.await.unwrap().status, TranslateStatus::Ok);
        assert_eq!(b.await.unwrap().status, TranslateStatus::Ok);
    }
}
