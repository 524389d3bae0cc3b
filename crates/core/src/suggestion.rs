use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::intent::{EditIntent, Locale};
use crate::patch::Patch;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestionId(pub String);

/// A structured set of AI-proposed variants plus a recommended choice and
/// rationale. Ephemeral: constructed per request and cached by id only until
/// accepted or rejected. Variant payloads are opaque; their shape is defined
/// by the intent that produced them.
#[derive(Clone, Debug, PartialEq)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub intent: EditIntent,
    pub variants: Vec<Value>,
    pub recommended_index: usize,
    pub reason: String,
    pub patch: Option<Patch>,
    pub confidence: f64,
    pub locale: Locale,
}

impl Suggestion {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        intent: EditIntent,
        variants: Vec<Value>,
        recommended_index: usize,
        reason: impl Into<String>,
        patch: Option<Patch>,
        confidence: f64,
        locale: Locale,
    ) -> Self {
        let recommended_index = if variants.is_empty() {
            0
        } else {
            recommended_index.min(variants.len() - 1)
        };

        Self {
            id: SuggestionId(Uuid::new_v4().to_string()),
            intent,
            variants,
            recommended_index,
            reason: reason.into(),
            patch,
            confidence: confidence.clamp(0.0, 1.0),
            locale,
        }
    }

    /// Deterministic stand-in returned whenever the AI collaborator is
    /// unreachable or produced unusable output.
    pub fn fallback(intent: EditIntent, locale: Locale) -> Self {
        Self::new(
            intent,
            vec![json!({ "text": "AI suggestion unavailable", "fallback": true })],
            0,
            "Fallback suggestion - AI service temporarily unavailable",
            None,
            0.5,
            locale,
        )
    }

    pub fn is_fallback(&self) -> bool {
        self.variants.len() == 1
            && self.variants[0].get("fallback").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn recommended(&self) -> Option<&Value> {
        self.variants.get(self.recommended_index)
    }

    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id.0,
            "intent": self.intent.as_str(),
            "variants": self.variants,
            "recommended_index": self.recommended_index,
            "reason": self.reason,
            "patch": self.patch.as_ref().map(Patch::to_value),
            "confidence": self.confidence,
            "locale": self.locale.as_str(),
        })
    }
}
