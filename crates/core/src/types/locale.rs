//! Locale handling for the bilingual catalog.
//!
//! The shop serves French and English content. French is the canonical
//! language: every localized field requires a French value, English is
//! optional and falls back to French when missing.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported storefront locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// French (default).
    #[default]
    Fr,
    /// English.
    En,
}

impl Locale {
    /// Get the locale as its lowercase ISO 639-1 code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown locale code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown locale: {0}")]
pub struct ParseLocaleError(String);

impl FromStr for Locale {
    type Err = ParseLocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fr" => Ok(Self::Fr),
            "en" => Ok(Self::En),
            other => Err(ParseLocaleError(other.to_owned())),
        }
    }
}

/// A localized text field.
///
/// French is required, English is optional. [`Localized::resolve`] falls
/// back to the French value when the requested translation is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized {
    /// French value (canonical).
    pub fr: String,
    /// English value, if translated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

impl Localized {
    /// Create a localized value with only the French text.
    #[must_use]
    pub const fn fr_only(fr: String) -> Self {
        Self { fr, en: None }
    }

    /// Resolve the value for a locale, falling back to French.
    #[must_use]
    pub fn resolve(&self, locale: Locale) -> &str {
        match locale {
            Locale::Fr => &self.fr,
            Locale::En => self.en.as_deref().unwrap_or(&self.fr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_french() {
        assert_eq!(Locale::default(), Locale::Fr);
    }

    #[test]
    fn test_parse() {
        assert_eq!("fr".parse::<Locale>().expect("fr"), Locale::Fr);
        assert_eq!("en".parse::<Locale>().expect("en"), Locale::En);
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn test_resolve_with_translation() {
        let title = Localized {
            fr: "Planche de surf".to_owned(),
            en: Some("Surfboard".to_owned()),
        };
        assert_eq!(title.resolve(Locale::Fr), "Planche de surf");
        assert_eq!(title.resolve(Locale::En), "Surfboard");
    }

    #[test]
    fn test_resolve_falls_back_to_french() {
        let title = Localized::fr_only("Combinaison".to_owned());
        assert_eq!(title.resolve(Locale::En), "Combinaison");
    }
}
