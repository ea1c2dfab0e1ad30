//! Shared record types for the Lexipic phrase-to-pictogram pipeline.
//!
//! The corpus crate produces [`PictogramSample`]s, the matcher scores them
//! into [`SampleScore`]s and [`InferenceResult`]s, and the service turns
//! lookups against the pictogram catalog into [`PictogramResult`]s. Image
//! locations are pure string templates, see [`image_url`].
//!
//! ```rust
//! use lexipic_types::{ImageOptions, Resolution, image_url};
//!
//! let url = image_url(2340, Resolution::R500, &ImageOptions::default());
//! assert_eq!(url, "https://static.arasaac.org/pictograms/2340/2340_500.png");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Base path of the hosted pictogram images.
pub const STATIC_BASE: &str = "https://static.arasaac.org/pictograms";

/// One reference phrase from the corpus with its precomputed n-grams.
///
/// Built once at load time and never mutated afterwards.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PictogramSample {
    pub phrase: String,
    pub normalized_phrase: String,
    pub category: String,
    pub tokens: Vec<String>,
    pub bigrams: Vec<String>,
    pub trigrams: Vec<String>,
}

/// Positive score of one corpus sample against one input.
///
/// Borrowed from the corpus; never persisted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SampleScore<'a> {
    pub sample: &'a PictogramSample,
    pub score: u32,
    pub matched_tokens: Vec<String>,
}

/// Output of one matching pass for a single selected sample.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub search_text: String,
    pub sample: PictogramSample,
    pub matched_tokens: Vec<String>,
    pub score: u32,
}

/// A pictogram returned by the catalog, keyed by `id`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PictogramResult {
    pub id: u64,
    pub image_url: String,
    pub search_text: String,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Catalog language accepted by the lookup service.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    /// Parse a two-letter language code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "es" => Some(Language::Es),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered image size in pixels.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Resolution {
    R300,
    #[default]
    R500,
    R2500,
}

impl Resolution {
    pub fn from_pixels(px: u32) -> Option<Self> {
        match px {
            300 => Some(Resolution::R300),
            500 => Some(Resolution::R500),
            2500 => Some(Resolution::R2500),
            _ => None,
        }
    }

    pub fn pixels(self) -> u32 {
        match self {
            Resolution::R300 => 300,
            Resolution::R500 => 500,
            Resolution::R2500 => 2500,
        }
    }
}

/// Verb tense marker drawn onto action pictograms.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Past,
    Future,
}

impl Action {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "past" => Some(Action::Past),
            "future" => Some(Action::Future),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Past => "past",
            Action::Future => "future",
        }
    }
}

/// Rendering modifiers appended to the image file name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImageOptions {
    pub action: Option<Action>,
    pub hair_color: Option<String>,
    pub skin_color: Option<String>,
    pub plural: bool,
    pub no_color: bool,
}

impl ImageOptions {
    /// Underscore-prefixed modifier suffix, or an empty string.
    ///
    /// Order is fixed: plural, nocolor, action, hair, skin. Empty colors are
    /// treated as absent.
    pub fn suffix(&self) -> String {
        let mut modifiers: Vec<String> = Vec::new();
        if self.plural {
            modifiers.push("plural".into());
        }
        if self.no_color {
            modifiers.push("nocolor".into());
        }
        if let Some(action) = self.action {
            modifiers.push(format!("action-{}", action.as_str()));
        }
        if let Some(hair) = self.hair_color.as_deref().filter(|h| !h.is_empty()) {
            modifiers.push(format!("hair-{hair}"));
        }
        if let Some(skin) = self.skin_color.as_deref().filter(|s| !s.is_empty()) {
            modifiers.push(format!("skin-{skin}"));
        }
        if modifiers.is_empty() {
            String::new()
        } else {
            format!("_{}", modifiers.join("_"))
        }
    }
}

/// Image URL for a pictogram under [`STATIC_BASE`].
pub fn image_url(id: u64, resolution: Resolution, options: &ImageOptions) -> String {
    image_url_with_base(STATIC_BASE, id, resolution, options)
}

/// Image URL for a pictogram under an arbitrary base path.
pub fn image_url_with_base(
    base: &str,
    id: u64,
    resolution: Resolution,
    options: &ImageOptions,
) -> String {
    format!(
        "{}/{id}/{id}{}_{}.png",
        base.trim_end_matches('/'),
        options.suffix(),
        resolution.pixels()
    )
}
