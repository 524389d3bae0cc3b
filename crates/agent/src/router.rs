use bannerkit_core::intent::{EditIntent, Locale};

use crate::prompts::FESTIVAL_PALETTES;

/// Extracted context for a routed command. Only the fields relevant to the
/// resolved intent are populated; callers may fill the rest before asking
/// for suggestions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandContext {
    pub tone: Option<String>,
    pub target_locale: Option<Locale>,
    pub festival: Option<String>,
    pub instruction: Option<String>,
    pub occasion: Option<String>,
    pub retailer: Option<String>,
    pub platform: Option<String>,
    pub objective: Option<String>,
    pub product: Option<String>,
    pub brand_color: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoutedCommand {
    pub intent: EditIntent,
    pub context: CommandContext,
}

/// Deterministic keyword router: free-text command in, symbolic intent plus
/// extracted context out. No AI call, no network, no suspension.
///
/// Matching is substring-based and first-match-wins across fixed priority
/// buckets (urgency, localization, layout, style, CTA, A/B, fallback
/// rewrite). Commands mixing words from several buckets resolve by bucket
/// order, not semantic analysis; that ordering is load-bearing for
/// compatibility with existing callers, so change it deliberately or not at
/// all.
#[derive(Clone, Debug, Default)]
pub struct IntentRouter;

const URGENCY_WORDS: &[&str] = &["urgent", "urgency", "hurry", "fomo", "limited"];
const LOCALIZATION_WORDS: &[&str] =
    &["translate", "hindi", "telugu", "hinglish", "local", "localize"];
const LAYOUT_WORDS: &[&str] =
    &["layout", "position", "move", "arrange", "left", "right", "center"];
const STYLE_WORDS: &[&str] = &["color", "palette", "style", "font", "diwali", "holi", "festive"];
const CTA_WORDS: &[&str] = &["cta", "button", "call to action", "shop now", "buy"];
const AB_WORDS: &[&str] = &["a/b", "variant", "test", "experiment"];

impl IntentRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn route(&self, command: &str) -> RoutedCommand {
        let normalized = command.to_lowercase();
        let mut context = CommandContext::default();

        if contains_any(&normalized, URGENCY_WORDS) {
            context.tone = Some("urgent".to_string());
            return RoutedCommand { intent: EditIntent::CreativeRewrite, context };
        }

        if contains_any(&normalized, LOCALIZATION_WORDS) {
            context.target_locale = if normalized.contains("hindi") {
                Some(Locale::Hindi)
            } else if normalized.contains("telugu") {
                Some(Locale::Telugu)
            } else if normalized.contains("hinglish") {
                Some(Locale::Hinglish)
            } else {
                None
            };
            return RoutedCommand { intent: EditIntent::Localization, context };
        }

        if contains_any(&normalized, LAYOUT_WORDS) {
            return RoutedCommand { intent: EditIntent::LayoutSuggestion, context };
        }

        if contains_any(&normalized, STYLE_WORDS) {
            context.festival = FESTIVAL_PALETTES
                .iter()
                .map(|palette| palette.name)
                .find(|festival| normalized.contains(festival))
                .map(str::to_string);
            return RoutedCommand { intent: EditIntent::StyleSuggestion, context };
        }

        if contains_any(&normalized, CTA_WORDS) {
            return RoutedCommand { intent: EditIntent::CtaOptimization, context };
        }

        if contains_any(&normalized, AB_WORDS) {
            return RoutedCommand { intent: EditIntent::AbGeneration, context };
        }

        context.instruction = Some(command.to_string());
        RoutedCommand { intent: EditIntent::CreativeRewrite, context }
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|word| text.contains(word))
}
