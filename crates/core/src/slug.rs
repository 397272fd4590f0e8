use std::collections::HashSet;

/// Returns true if the character is a Unicode combining mark. Combining marks
/// must stay attached to their base letter (Devanagari virama, Arabic harakat, ...).
fn is_combining_mark(ch: char) -> bool {
    use std::ops::RangeInclusive;

    const RANGES: &[RangeInclusive<u32>] = &[
        0x0300..=0x036F, // Combining Diacritical Marks
        0x0591..=0x05C7, // Hebrew points
        0x0610..=0x061A, // Arabic signs
        0x064B..=0x065F, // Arabic harakat
        0x0670..=0x0670,
        0x0900..=0x0903, // Devanagari
        0x093A..=0x094F,
        0x0951..=0x0957,
        0x0962..=0x0963,
        0x0980..=0x0983, // Bengali
        0x09BC..=0x09CD,
        0x0E31..=0x0E3A, // Thai
        0x0E47..=0x0E4E,
        0x1AB0..=0x1AFF, // Extended
        0x1DC0..=0x1DFF, // Supplement
        0x3099..=0x309A, // Kana voicing
        0xFE20..=0xFE2F, // Half marks
    ];

    let cp = ch as u32;
    RANGES.iter().any(|r| r.contains(&cp))
}

/// Turns text into a URL/ID-safe slug.
///
/// Letters and digits are lowercased and kept (including non-ASCII letters and
/// combining marks); every other run of characters becomes a single `-`, and
/// leading/trailing dashes are trimmed.
///
/// ```
/// use quillmark_core::slug::webalize;
///
/// assert_eq!(webalize("Hello, World!"), "hello-world");
/// assert_eq!(webalize("  --  "), "");
/// ```
pub fn webalize(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() || (is_combining_mark(ch) && !slug.is_empty()) {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Per-document registry of used element ids.
#[derive(Debug, Default)]
pub struct IdRegistry {
    used: HashSet<String>,
}

impl IdRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an explicit id as taken. Returns false if it was already used.
    pub fn reserve(&mut self, id: &str) -> bool {
        self.used.insert(id.to_string())
    }

    /// Is the id taken?
    pub fn contains(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    /// Returns `base` if free, otherwise `base-2`, `base-3`, ... and reserves it.
    pub fn unique(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{base}-{counter}");
            counter += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
