//! Conversion vocabulary used to gate visible answers.

use std::collections::BTreeSet;
use std::sync::Arc;

/// Built-in conversion terms. Matching is case-insensitive, so casing here is cosmetic.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "convert",
    "conversion",
    // Length
    "kilometers",
    "miles",
    "meters",
    "centimeters",
    "millimeters",
    "inches",
    "feet",
    "yards",
    "nautical miles",
    // Weight & mass
    "grams",
    "pounds",
    "kilograms",
    "ounces",
    "stones",
    "tons",
    "milligrams",
    "micrograms",
    // Temperature & energy
    "Celsius",
    "Fahrenheit",
    "Kelvin",
    "joules",
    "calories",
    "kilocalories",
    "kilojoules",
    // Time
    "seconds",
    "minutes",
    "hours",
    "days",
    "weeks",
    "months",
    "years",
    "milliseconds",
    "microseconds",
    // Power
    "watts",
    "kilowatts",
    "megawatts",
    "gigawatts",
    "horsepower",
    // Angle
    "degrees",
    "radians",
    "gradians",
    // Volume
    "liters",
    "milliliters",
    "gallons",
    "quarts",
    "pints",
    "cups",
    "fluid ounces",
    "tablespoons",
    "teaspoons",
    // Digital storage
    "bits",
    "bytes",
    "kilobytes",
    "megabytes",
    "gigabytes",
    "terabytes",
    "petabytes",
    // Pressure
    "pascals",
    "atmospheres",
    "bars",
    "psi",
    "mmHg",
    "torr",
    // Force
    "newtons",
    "dynes",
    "pound-force",
    "kilonewtons",
    // Frequency
    "hertz",
    "kilohertz",
    "megahertz",
    "gigahertz",
    // Speed
    "meters per second",
    "kilometers per hour",
    "miles per hour",
    "knots",
];

/// Immutable set of lowercase domain terms, fixed at startup.
///
/// Cloning is cheap: clones share the same term list.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    terms: Arc<BTreeSet<String>>,
}

impl KeywordSet {
    /// Builds a set from arbitrary terms. Terms are trimmed and lower-cased; blanks are dropped.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            terms: Arc::new(terms),
        }
    }

    /// The built-in conversion vocabulary.
    pub fn builtin() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }

    /// The built-in vocabulary plus `extra` terms (e.g. from configuration).
    pub fn with_extra<S: AsRef<str>>(extra: &[S]) -> Self {
        Self::new(
            DEFAULT_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .chain(extra.iter().map(|s| s.as_ref().to_string())),
        )
    }

    /// True when the lower-cased `text` contains at least one term as a substring.
    pub fn matches(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    /// First term (in sorted order) found in `text`, if any.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| lowered.contains(term.as_str()))
            .map(String::as_str)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(&term.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::builtin()
    }
}
