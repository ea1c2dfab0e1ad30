use unicode_normalization::UnicodeNormalization;

/// Accented consonant that survives diacritic stripping.
pub const PROTECTED: char = 'ñ';

const LEET: [(char, char); 6] = [
    ('0', 'o'),
    ('1', 'i'),
    ('3', 'e'),
    ('4', 'a'),
    ('5', 's'),
    ('7', 't'),
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NormalizeOptions {
    /// Rewrite digits that look like letters (`t3ng0` -> `tengo`).
    pub leet: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self { leet: true }
    }
}

/// Canonical form with the default options.
pub fn normalize(text: &str) -> String {
    normalize_with(text, NormalizeOptions::default())
}

/// Lowercase, undo leet digits, fold diacritics except [`PROTECTED`], turn
/// anything outside `[a-z0-9ñ]` and whitespace into a space, then collapse
/// whitespace. Idempotent on its own output.
pub fn normalize_with(text: &str, options: NormalizeOptions) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lowered: String = text.to_lowercase().nfc().collect();
    let mut folded = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        let ch = if options.leet { unleet(ch) } else { ch };
        if ch == PROTECTED {
            folded.push(ch);
            continue;
        }
        folded.extend(
            std::iter::once(ch)
                .nfd()
                .filter(|c| !is_combining_diacritic(*c))
                .map(|c| if is_allowed(c) { c } else { ' ' }),
        );
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unleet(ch: char) -> char {
    LEET.iter()
        .find(|(digit, _)| *digit == ch)
        .map_or(ch, |(_, letter)| *letter)
}

fn is_combining_diacritic(ch: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&ch)
}

fn is_allowed(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == PROTECTED || ch.is_whitespace()
}
