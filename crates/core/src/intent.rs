use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Symbolic category of a requested edit, used to route to a suggestion
/// strategy. Closed set: unrecognized wire strings are rejected at the
/// boundary rather than silently defaulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditIntent {
    TextEdit,
    CreativeRewrite,
    LayoutSuggestion,
    StyleSuggestion,
    CtaOptimization,
    Localization,
    AbGeneration,
}

impl EditIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextEdit => "text_edit",
            Self::CreativeRewrite => "creative_rewrite",
            Self::LayoutSuggestion => "layout_suggestion",
            Self::StyleSuggestion => "style_suggestion",
            Self::CtaOptimization => "cta_optimization",
            Self::Localization => "localization",
            Self::AbGeneration => "ab_generation",
        }
    }
}

impl std::fmt::Display for EditIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EditIntent {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text_edit" => Ok(Self::TextEdit),
            "creative_rewrite" => Ok(Self::CreativeRewrite),
            "layout_suggestion" => Ok(Self::LayoutSuggestion),
            "style_suggestion" => Ok(Self::StyleSuggestion),
            "cta_optimization" => Ok(Self::CtaOptimization),
            "localization" => Ok(Self::Localization),
            "ab_generation" => Ok(Self::AbGeneration),
            other => Err(DomainError::UnknownIntent(other.to_string())),
        }
    }
}

/// Target locale for suggestion output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "te")]
    Telugu,
    #[serde(rename = "hi-en")]
    Hinglish,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Telugu => "te",
            Self::Hinglish => "hi-en",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Locale {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::English),
            "hi" => Ok(Self::Hindi),
            "te" => Ok(Self::Telugu),
            "hi-en" => Ok(Self::Hinglish),
            other => Err(DomainError::UnknownLocale(other.to_string())),
        }
    }
}
