//! Load the Lexipic reference corpus into immutable samples.
//!
//! The dataset is a CSV table with one row per reference phrase:
//! `frase`, `frase_norm`, `categoria` and three list-valued columns
//! (`tokens`, `bigrams`, `trigrams`) written as array literals such as
//! `['tengo', 'sed']`. Each list field is decoded with
//! [`parse_array_field`]: a strict JSON decode first, then a permissive
//! bracket-strip-and-split when that fails. A malformed row degrades to empty
//! lists instead of failing the load; rows without a phrase are dropped.
//!
//! The loaded [`Corpus`] also owns the [`Vocabulary`], the ordered set of every
//! token seen across all samples. Neither changes after load, so a corpus is
//! shared behind an `Arc` and read concurrently without locking.
//!
//! # Example
//! ```no_run
//! use lexipic_corpus::{Corpus, LoadMode};
//!
//! # fn main() -> anyhow::Result<()> {
//! let corpus = Corpus::load_with_mode("data/frases_procesadas.csv", LoadMode::Mmap)?;
//! println!("{} samples, {} tokens", corpus.len(), corpus.vocabulary().len());
//!
//! let builtin = Corpus::embedded();
//! assert!(!builtin.is_empty());
//! # Ok(()) }
//! ```

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use csv::{ByteRecord, ReaderBuilder};
use lexipic_types::PictogramSample;
use memmap2::Mmap;
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

const EMBEDDED_CSV: &[u8] = include_bytes!("../data/frases_procesadas.csv");

static EMBEDDED: Lazy<Arc<Corpus>> = Lazy::new(|| {
    let corpus = Corpus::from_csv_bytes(EMBEDDED_CSV).expect("embedded corpus is valid csv");
    info!(
        "embedded corpus ready: {} samples, {} vocabulary tokens",
        corpus.len(),
        corpus.vocabulary().len()
    );
    Arc::new(corpus)
});

/// Strategy for reading a dataset file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file and parse straight from the mapping.
    Mmap,
    /// Read the file into an owned buffer.
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

/// Ordered set of distinct tokens across the corpus.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Vocabulary {
    tokens: BTreeSet<String>,
}

impl Vocabulary {
    fn from_samples(samples: &[PictogramSample]) -> Self {
        let tokens = samples
            .iter()
            .flat_map(|sample| sample.tokens.iter())
            .filter(|token| !token.is_empty())
            .cloned()
            .collect();
        Self { tokens }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.iter().map(String::as_str)
    }
}

/// Immutable reference corpus plus its vocabulary.
#[derive(Clone, Debug, Default)]
pub struct Corpus {
    samples: Vec<PictogramSample>,
    vocabulary: Vocabulary,
}

impl Corpus {
    /// Load a dataset file by reading it into memory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_mode(path, LoadMode::Owned)
    }

    /// Load a dataset file choosing between mmap and owned buffers at runtime.
    pub fn load_with_mode(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let buffer = load_file(path, mode)?;
        let corpus = Self::from_csv_bytes(buffer.as_slice())
            .with_context(|| format!("parse corpus {}", path.display()))?;
        info!(
            "loaded {} samples ({} vocabulary tokens) from {}",
            corpus.len(),
            corpus.vocabulary.len(),
            path.display()
        );
        Ok(corpus)
    }

    /// Parse an in-memory CSV dataset.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);
        let columns = Columns::resolve(reader.byte_headers().context("read csv header")?)?;

        let mut samples = Vec::new();
        let mut record = ByteRecord::new();
        let mut line = 1usize;
        while reader
            .read_byte_record(&mut record)
            .with_context(|| format!("read csv record after line {line}"))?
        {
            line += 1;
            match columns.sample(&record) {
                Some(sample) => samples.push(sample),
                None => debug!("dropping corpus row {line} without a phrase"),
            }
        }

        Ok(Self::from_samples(samples))
    }

    /// Build a corpus from already-parsed samples, dropping empty phrases.
    pub fn from_samples(samples: Vec<PictogramSample>) -> Self {
        let samples: Vec<PictogramSample> = samples
            .into_iter()
            .filter(|sample| !sample.phrase.is_empty())
            .collect();
        let vocabulary = Vocabulary::from_samples(&samples);
        Self {
            samples,
            vocabulary,
        }
    }

    /// The dataset compiled into this crate, parsed once per process.
    pub fn embedded() -> Arc<Corpus> {
        Arc::clone(&EMBEDDED)
    }

    pub fn samples(&self) -> &[PictogramSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for sample in &self.samples {
            if !out.contains(&sample.category.as_str()) {
                out.push(&sample.category);
            }
        }
        out
    }

    pub fn samples_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a PictogramSample> + 'a {
        self.samples
            .iter()
            .filter(move |sample| sample.category == category)
    }
}

/// Decode one array-literal field.
///
/// Single quotes are rewritten to double quotes and the result is decoded as
/// JSON. If that fails the brackets are stripped and the text is split on
/// commas, trimming and discarding empty items. Valid JSON that is not an
/// array yields an empty list.
pub fn parse_array_field(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    let normalized = trimmed.replace('\'', "\"");

    match serde_json::from_str::<serde_json::Value>(&normalized) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Ok(_) => Vec::new(),
        Err(_) => normalized
            .replace(['[', ']'], "")
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

struct Columns {
    phrase: usize,
    normalized: Option<usize>,
    category: Option<usize>,
    tokens: Option<usize>,
    bigrams: Option<usize>,
    trigrams: Option<usize>,
}

impl Columns {
    fn resolve(headers: &ByteRecord) -> Result<Self> {
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (idx, raw) in headers.iter().enumerate() {
            let name = String::from_utf8_lossy(raw)
                .trim_start_matches('\u{feff}')
                .trim()
                .to_lowercase();
            by_name.entry(name).or_insert(idx);
        }
        let find = |names: &[&str]| names.iter().find_map(|name| by_name.get(*name).copied());

        let Some(phrase) = find(&["frase", "phrase"]) else {
            bail!("corpus header has no `frase` column");
        };
        let columns = Self {
            phrase,
            normalized: find(&["frase_norm", "normalized_phrase"]),
            category: find(&["categoria", "category"]),
            tokens: find(&["tokens"]),
            bigrams: find(&["bigrams"]),
            trigrams: find(&["trigrams"]),
        };
        if columns.tokens.is_none() {
            warn!("corpus header has no `tokens` column; every sample will be unscorable");
        }
        Ok(columns)
    }

    fn sample(&self, record: &ByteRecord) -> Option<PictogramSample> {
        let phrase = field(record, Some(self.phrase));
        if phrase.is_empty() {
            return None;
        }
        Some(PictogramSample {
            phrase: phrase.into_owned(),
            normalized_phrase: field(record, self.normalized).into_owned(),
            category: field(record, self.category).into_owned(),
            tokens: parse_array_field(&field(record, self.tokens)),
            bigrams: parse_array_field(&field(record, self.bigrams)),
            trigrams: parse_array_field(&field(record, self.trigrams)),
        })
    }
}

fn field(record: &ByteRecord, idx: Option<usize>) -> Cow<'_, str> {
    idx.and_then(|i| record.get(i))
        .map(String::from_utf8_lossy)
        .unwrap_or(Cow::Borrowed(""))
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    match mode {
        LoadMode::Mmap => {
            let len = file
                .metadata()
                .with_context(|| format!("stat {}", path.display()))?
                .len();
            if len == 0 {
                return Ok(Buffer::Owned(Vec::new()));
            }
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}
