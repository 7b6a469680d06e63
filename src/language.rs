// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Output languages supported by the classification service

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Language code for generated summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageCode {
    #[default]
    En,
    Hi,
    Es,
    Fr,
    De,
    Zh,
    Ar,
    Ja,
    Ko,
    Pt,
    Ru,
    It,
}

impl LanguageCode {
    /// All supported codes, in selector order
    pub const ALL: [LanguageCode; 12] = [
        Self::En, Self::Hi, Self::Es, Self::Fr, Self::De, Self::Zh,
        Self::Ar, Self::Ja, Self::Ko, Self::Pt, Self::Ru, Self::It,
    ];

    /// Canonical lowercase code, as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::De => "de",
            Self::Zh => "zh",
            Self::Ar => "ar",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Pt => "pt",
            Self::Ru => "ru",
            Self::It => "it",
        }
    }

    /// English display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "Hindi",
            Self::Es => "Spanish",
            Self::Fr => "French",
            Self::De => "German",
            Self::Zh => "Chinese",
            Self::Ar => "Arabic",
            Self::Ja => "Japanese",
            Self::Ko => "Korean",
            Self::Pt => "Portuguese",
            Self::Ru => "Russian",
            Self::It => "Italian",
        }
    }
}

impl FromStr for LanguageCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnsupportedLanguage(s.to_string()))
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LanguageCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LanguageCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The user's chosen output language. Pure value holder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguageSelection {
    current: LanguageCode,
}

impl LanguageSelection {
    pub fn new(current: LanguageCode) -> Self {
        Self { current }
    }

    pub fn current(&self) -> LanguageCode {
        self.current
    }

    pub fn set(&mut self, code: LanguageCode) {
        self.current = code;
    }

    /// Parse and select a code; the selection is unchanged on error
    pub fn select(&mut self, raw: &str) -> Result<LanguageCode, ValidationError> {
        let code = raw.parse()?;
        self.current = code;
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_twelve_codes() {
        let codes: Vec<&str> = LanguageCode::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            codes,
            vec!["en", "hi", "es", "fr", "de", "zh", "ar", "ja", "ko", "pt", "ru", "it"]
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("FR".parse::<LanguageCode>().unwrap(), LanguageCode::Fr);
        assert_eq!(" Zh ".parse::<LanguageCode>().unwrap(), LanguageCode::Zh);
        assert_eq!(LanguageCode::Fr.to_string(), "fr");
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(
            "nl".parse::<LanguageCode>(),
            Err(ValidationError::UnsupportedLanguage("nl".to_string()))
        );
        assert!("".parse::<LanguageCode>().is_err());
    }

    #[test]
    fn test_selection_keeps_previous_on_error() {
        let mut selection = LanguageSelection::default();
        assert_eq!(selection.current(), LanguageCode::En);
        assert_eq!(selection.select("De").unwrap(), LanguageCode::De);
        assert!(selection.select("klingon").is_err());
        assert_eq!(selection.current(), LanguageCode::De);
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&LanguageCode::Ja).unwrap();
        assert_eq!(json, "\"ja\"");
        let parsed: LanguageCode = serde_json::from_str("\"KO\"").unwrap();
        assert_eq!(parsed, LanguageCode::Ko);
    }
}
