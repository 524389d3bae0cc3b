//! Static prompt and lookup tables for the suggestion builders.
//!
//! System prompts pin the output contract (strict JSON, field names) so the
//! orchestrator can parse responses without per-call schema negotiation.

use serde_json::{json, Value};

pub const CREATIVE_EDITOR: &str = r#"You are a creative marketing editor for Indian e-commerce banners.
Constraints:
- Max headline 10 words
- Use ₹ for currency (Indian Rupees)
- Respect the occasion if specified (Diwali, Holi, etc.)
- Provide 3 variants and 1 recommended final variant
- Return JSON format with: variants, recommended_index, reason, patch

Output JSON structure:
{
    "variants": [{"text": "...", "lang": "en", "tone": "..."}],
    "recommended_index": 0,
    "reason": "Brief explanation",
    "patch": {"operations": [...]}
}"#;

pub const LAYOUT_SUGGESTER: &str = r#"You are an expert UI/UX designer for advertising layouts.
Generate layout suggestions with exact positioning for ad creatives.
Consider: visual hierarchy, balance, whitespace, platform guidelines.

Output JSON with positions as percentages (0-100):
{
    "layout_name": "text-left-product-right",
    "elements": [
        {"id": "headline", "x": 5, "y": 20, "width": 45, "height": 15},
        {"id": "cta", "x": 5, "y": 75, "width": 30, "height": 12}
    ],
    "reason": "Better visual flow",
    "confidence": 0.85
}"#;

pub const STYLE_SUGGESTER: &str = r##"You are a color theory and typography expert for advertising.
Suggest color palettes and fonts that align with brand identity.
Consider: contrast, accessibility (WCAG), emotional impact.

Output JSON:
{
    "color_palette": {
        "primary": "#hex",
        "secondary": "#hex",
        "accent": "#hex",
        "background": "#hex"
    },
    "fonts": {
        "headline": {"family": "...", "weight": "bold", "size": 48},
        "body": {"family": "...", "weight": "normal", "size": 16}
    },
    "accessibility_score": 0.95,
    "reason": "High contrast, festive mood"
}"##;

pub const LOCALIZER: &str = r#"You are a localization expert for Indian languages.
Translate and adapt content for Hindi, Telugu, and Hinglish.
Preserve brand voice and marketing impact.
Use proper currency format: ₹1,999 (Indian Rupee)
Use proper date format for India: DD/MM/YYYY

Output JSON:
{
    "translations": {
        "en": "Original English",
        "hi": "हिंदी अनुवाद",
        "te": "తెలుగు అనువాదం",
        "hi-en": "Hinglish Mix"
    },
    "cultural_notes": "...",
    "confidence": 0.9
}"#;

pub const CTA_OPTIMIZER: &str = r#"You are a conversion optimization expert.
Suggest CTA copy based on campaign objective.
Consider: urgency, clarity, action orientation.

Objectives: buy, learn, subscribe, explore, save

Output JSON:
{
    "ctas": [
        {"text": "Shop Now", "objective": "buy", "urgency": "high"},
        {"text": "Explore Deals", "objective": "explore", "urgency": "medium"}
    ],
    "recommended": 0,
    "reason": "Clear action, creates urgency"
}"#;

/// A four-color scheme keyed by festival name (lowercase).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FestivalPalette {
    pub name: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub background: &'static str,
}

impl FestivalPalette {
    pub fn to_value(&self) -> Value {
        json!({
            "primary": self.primary,
            "secondary": self.secondary,
            "accent": self.accent,
            "background": self.background,
        })
    }
}

pub const FESTIVAL_PALETTES: &[FestivalPalette] = &[
    FestivalPalette {
        name: "diwali",
        primary: "#FF6B00",
        secondary: "#FFD700",
        accent: "#8B0000",
        background: "#1A0A00",
    },
    FestivalPalette {
        name: "holi",
        primary: "#FF1493",
        secondary: "#00CED1",
        accent: "#FFD700",
        background: "#4B0082",
    },
    FestivalPalette {
        name: "independence_day",
        primary: "#FF9933",
        secondary: "#138808",
        accent: "#000080",
        background: "#FFFFFF",
    },
    FestivalPalette {
        name: "christmas",
        primary: "#C41E3A",
        secondary: "#228B22",
        accent: "#FFD700",
        background: "#FFFAFA",
    },
    FestivalPalette {
        name: "eid",
        primary: "#006400",
        secondary: "#FFD700",
        accent: "#FFFFFF",
        background: "#1A3A1A",
    },
];

pub fn festival_palette(name: &str) -> Option<&'static FestivalPalette> {
    let name = name.to_lowercase();
    FESTIVAL_PALETTES.iter().find(|palette| palette.name == name)
}

/// Marketing phrases with well-established Hinglish renderings, used as a
/// deterministic backstop when the localizer omits a `hi-en` translation.
pub const HINGLISH_PHRASES: &[(&str, &str)] = &[
    ("big sale", "Badi Sale"),
    ("mega offer", "Mega Offer"),
    ("hurry up", "Jaldi Karo"),
    ("buy now", "Abhi Kharido"),
    ("shop now", "Abhi Shop Karo"),
    ("limited time", "Limited Time Only"),
    ("don't miss", "Miss Mat Karo"),
    ("super deal", "Super Deal"),
    ("best price", "Best Price Ever"),
    ("free delivery", "Free Delivery"),
];
