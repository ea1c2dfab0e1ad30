use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use lexipic_corpus::{Corpus, LoadMode};
use lexipic_matcher::{DEFAULT_LIMIT, PhraseMatcher, build_search_queries};

fn main() -> Result<()> {
    let mut corpus_path: Option<PathBuf> = None;
    let mut words: Vec<String> = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--corpus" {
            corpus_path = args.next().map(PathBuf::from);
        } else {
            words.push(arg);
        }
    }
    if words.is_empty() {
        bail!("usage: cargo run -p lexipic-matcher --example infer -- [--corpus <csv>] <message...>");
    }

    let corpus = match corpus_path {
        Some(path) => Arc::new(
            Corpus::load_with_mode(&path, LoadMode::Mmap)
                .with_context(|| format!("loading corpus from {}", path.display()))?,
        ),
        None => Corpus::embedded(),
    };
    let matcher = PhraseMatcher::new(corpus);
    let message = words.join(" ");

    println!("Message: {}", message);
    println!("Tokens : {:?}", matcher.tokenize(&message));
    let matches = matcher.infer(&message, DEFAULT_LIMIT);
    for m in &matches {
        println!(
            "  {:>3}  {:<28} [{}] matched {:?}",
            m.score, m.sample.phrase, m.search_text, m.matched_tokens
        );
    }
    println!("Queries: {:?}", build_search_queries(&matches));

    Ok(())
}
