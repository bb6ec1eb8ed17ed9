//! Mapping from Discord locales to the game data API's language codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the game data API can serve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
  #[default]
  #[serde(rename = "en")]
  English,
  #[serde(rename = "de")]
  German,
  #[serde(rename = "es")]
  Spanish,
  #[serde(rename = "es-MX")]
  SpanishLatinAmerica,
  #[serde(rename = "fr")]
  French,
  #[serde(rename = "it")]
  Italian,
  #[serde(rename = "ja")]
  Japanese,
  #[serde(rename = "ko")]
  Korean,
  #[serde(rename = "pl")]
  Polish,
  #[serde(rename = "pt-BR")]
  PortugueseBrazil,
  #[serde(rename = "ru")]
  Russian,
  #[serde(rename = "th")]
  Thai,
  #[serde(rename = "tr")]
  Turkish,
  #[serde(rename = "zh-Hans")]
  ChineseSimplified,
  #[serde(rename = "zh-Hant")]
  ChineseTraditional,
}

impl Language {
  /// Code sent to the API and used in cache keys.
  pub fn code(self) -> &'static str {
    match self {
      Self::English => "en",
      Self::German => "de",
      Self::Spanish => "es",
      Self::SpanishLatinAmerica => "es-MX",
      Self::French => "fr",
      Self::Italian => "it",
      Self::Japanese => "ja",
      Self::Korean => "ko",
      Self::Polish => "pl",
      Self::PortugueseBrazil => "pt-BR",
      Self::Russian => "ru",
      Self::Thai => "th",
      Self::Turkish => "tr",
      Self::ChineseSimplified => "zh-Hans",
      Self::ChineseTraditional => "zh-Hant",
    }
  }

  /// Map a Discord locale (`en-US`, `es-419`, `zh-TW`, ...) to an API language.
  ///
  /// Locales the API does not translate fall back to English.
  pub fn from_discord_locale(locale: &str) -> Self {
    match locale.trim() {
      "de" => Self::German,
      "es-ES" => Self::Spanish,
      "es-419" => Self::SpanishLatinAmerica,
      "fr" => Self::French,
      "it" => Self::Italian,
      "ja" => Self::Japanese,
      "ko" => Self::Korean,
      "pl" => Self::Polish,
      "pt-BR" => Self::PortugueseBrazil,
      "ru" => Self::Russian,
      "th" => Self::Thai,
      "tr" => Self::Turkish,
      "zh-CN" => Self::ChineseSimplified,
      "zh-TW" => Self::ChineseTraditional,
      _ => Self::English,
    }
  }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_discord_locales_map_to_api_codes() {
    assert_eq!(Language::from_discord_locale("de").code(), "de");
    assert_eq!(Language::from_discord_locale("es-419").code(), "es-MX");
    assert_eq!(Language::from_discord_locale("zh-CN").code(), "zh-Hans");
    assert_eq!(Language::from_discord_locale("zh-TW").code(), "zh-Hant");
    assert_eq!(Language::from_discord_locale("pt-BR").code(), "pt-BR");
  }

  #[test]
  fn test_english_variants_and_unknown_fall_back() {
    assert_eq!(Language::from_discord_locale("en-US"), Language::English);
    assert_eq!(Language::from_discord_locale("en-GB"), Language::English);
    assert_eq!(Language::from_discord_locale("uk"), Language::English);
    assert_eq!(Language::from_discord_locale(""), Language::English);
  }

  #[test]
  fn test_serde_uses_api_codes() {
    let json = serde_json::to_string(&Language::SpanishLatinAmerica).unwrap();
    assert_eq!(json, "\"es-MX\"");
    let parsed: Language = serde_json::from_str("\"zh-Hant\"").unwrap();
    assert_eq!(parsed, Language::ChineseTraditional);
  }
}
