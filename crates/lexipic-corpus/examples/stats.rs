use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use lexipic_corpus::{Corpus, LoadMode};

fn main() -> Result<()> {
    let corpus = match env::args().nth(1).map(PathBuf::from) {
        Some(path) => std::sync::Arc::new(
            Corpus::load_with_mode(&path, LoadMode::Mmap)
                .with_context(|| format!("loading corpus from {}", path.display()))?,
        ),
        None => Corpus::embedded(),
    };

    println!("Samples      : {}", corpus.len());
    println!("Vocabulary   : {}", corpus.vocabulary().len());
    let unscorable = corpus
        .samples()
        .iter()
        .filter(|s| s.tokens.is_empty())
        .count();
    println!("No tokens    : {}", unscorable);

    for category in corpus.categories() {
        println!(
            "  {:<14} {}",
            category,
            corpus.samples_in_category(category).count()
        );
    }

    Ok(())
}
