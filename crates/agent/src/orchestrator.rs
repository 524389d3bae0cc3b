use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{json, Value};
use tracing::{debug, warn};

use bannerkit_core::document::Document;
use bannerkit_core::engine::EditEngine;
use bannerkit_core::intent::{EditIntent, Locale};
use bannerkit_core::patch::{Operation, Patch, PatchOp};
use bannerkit_core::suggestion::{Suggestion, SuggestionId};
use bannerkit_core::telemetry::{SuggestionTelemetry, TelemetryReport};

use crate::llm::{GenerateRequest, LlmClient};
use crate::prompts;
use crate::router::{CommandContext, IntentRouter};

/// Result of a routed natural-language command.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandOutcome {
    pub suggestion: Suggestion,
    pub auto_applied: bool,
    pub updated_document: Option<Document>,
}

/// Orchestrates AI suggestion generation over a document.
///
/// Every builder follows the same shape: embed the relevant blocks and
/// context in a prompt, ask the model for strict JSON under an
/// intent-specific system instruction, salvage what the reply contains, and
/// degrade to `Suggestion::fallback` when nothing is salvageable. The public
/// surface never returns an error for an AI failure; the caller always gets
/// a suggestion it can render.
pub struct SuggestionAgent {
    llm: Arc<dyn LlmClient>,
    engine: EditEngine,
    router: IntentRouter,
    telemetry: SuggestionTelemetry,
    pending: Mutex<HashMap<SuggestionId, Suggestion>>,
}

impl SuggestionAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self::with_engine(llm, EditEngine::new())
    }

    pub fn with_engine(llm: Arc<dyn LlmClient>, engine: EditEngine) -> Self {
        Self {
            llm,
            engine,
            router: IntentRouter::new(),
            telemetry: SuggestionTelemetry::new(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &EditEngine {
        &self.engine
    }

    pub fn telemetry(&self) -> TelemetryReport {
        self.telemetry.snapshot()
    }

    /// Generates a suggestion for `intent`. The only suspension point is the
    /// model call; everything around it is deterministic.
    pub async fn get_suggestions(
        &self,
        document: &Document,
        intent: EditIntent,
        locale: Locale,
        context: &CommandContext,
    ) -> Suggestion {
        let suggestion = match intent {
            EditIntent::CreativeRewrite => {
                self.suggest_creative_rewrite(document, locale, context).await
            }
            EditIntent::LayoutSuggestion => self.suggest_layout(document, context).await,
            EditIntent::StyleSuggestion => self.suggest_style(document, context).await,
            EditIntent::CtaOptimization => self.suggest_cta(document, context).await,
            EditIntent::Localization => {
                let target = context.target_locale.unwrap_or(locale);
                self.suggest_localization(document, target).await
            }
            EditIntent::AbGeneration => self.generate_ab_variants(document).await,
            EditIntent::TextEdit => self.suggest_text_edit(document, locale, context).await,
        };

        self.telemetry.record_issued(intent);
        self.pending_lock().insert(suggestion.id.clone(), suggestion.clone());
        suggestion
    }

    /// Routes a free-text command, generates the suggestion, and optionally
    /// applies its patch through the engine in one step.
    pub async fn process_command(
        &self,
        command: &str,
        document: &Document,
        locale: Locale,
        auto_apply: bool,
    ) -> CommandOutcome {
        let routed = self.router.route(command);
        let suggestion =
            self.get_suggestions(document, routed.intent, locale, &routed.context).await;

        let updated_document = if auto_apply {
            suggestion.patch.as_ref().map(|patch| self.engine.apply(document, patch))
        } else {
            None
        };

        CommandOutcome {
            auto_applied: updated_document.is_some(),
            updated_document,
            suggestion,
        }
    }

    /// Marks a pending suggestion as accepted and removes it from the cache.
    pub fn accept_suggestion(&self, id: &SuggestionId) -> Option<Suggestion> {
        let suggestion = self.pending_lock().remove(id)?;
        self.telemetry.record_accepted();
        Some(suggestion)
    }

    /// Marks a pending suggestion as rejected and removes it from the cache.
    pub fn reject_suggestion(&self, id: &SuggestionId) -> Option<Suggestion> {
        let suggestion = self.pending_lock().remove(id)?;
        self.telemetry.record_rejected();
        Some(suggestion)
    }

    async fn generate(&self, prompt: String, system: &str, temperature: f32) -> Option<Value> {
        match self.llm.generate(GenerateRequest::json(prompt, system, temperature)).await {
            Ok(reply) => {
                let parsed = extract_json(&reply);
                if parsed.is_none() {
                    warn!("model reply carried no parseable JSON object");
                }
                parsed
            }
            Err(error) => {
                warn!(%error, "suggestion model call failed");
                None
            }
        }
    }

    async fn suggest_creative_rewrite(
        &self,
        document: &Document,
        locale: Locale,
        context: &CommandContext,
    ) -> Suggestion {
        let headline = headline_block(document);
        let current_text = headline
            .and_then(|block| block.text.as_deref())
            .unwrap_or("Your Headline")
            .to_string();
        let occasion = context
            .occasion
            .clone()
            .or_else(|| meta_string(document, "occasion"))
            .unwrap_or_default();
        let retailer = context
            .retailer
            .clone()
            .or_else(|| meta_string(document, "retailer"))
            .unwrap_or_else(|| "general".to_string());

        let prompt = format!(
            "Current headline: \"{current_text}\"\n\
             Retailer: {retailer}\n\
             Occasion: {occasion}\n\
             Target locale: {locale}\n\n\
             Generate 3 headline variants with different tones:\n\
             1. Urgent - Creates urgency and FOMO\n\
             2. Value-focused - Highlights savings and value (use ₹ for prices)\n\
             3. Premium - Sophisticated and aspirational\n\n\
             Requirements:\n\
             - Max 10 words each\n\
             - Use ₹ for currency if mentioning price\n\
             - For Hindi/Telugu, provide both original script and transliteration",
            occasion = if occasion.is_empty() { "General sale" } else { occasion.as_str() },
        );

        let Some(data) = self.generate(prompt, prompts::CREATIVE_EDITOR, 0.8).await else {
            return Suggestion::fallback(EditIntent::CreativeRewrite, locale);
        };

        let mut variants = array_field(&data, "variants");
        if variants.is_empty() {
            variants = vec![
                json!({ "text": format!("Flash Sale - {current_text}!"), "tone": "urgent", "lang": "en" }),
                json!({ "text": format!("Save Big on {current_text}"), "tone": "value", "lang": "en" }),
                json!({ "text": format!("Premium {current_text} Collection"), "tone": "premium", "lang": "en" }),
            ];
        }
        let recommended_index =
            data["recommended_index"].as_u64().unwrap_or(0) as usize % variants.len().max(1);
        let reason = string_field(&data, "reason", "AI-generated variants for better engagement");
        let confidence = data["confidence"].as_f64().unwrap_or(0.85);

        let mut ops = Vec::new();
        if let (Some(block), Some(variant)) = (headline, variants.get(recommended_index)) {
            let new_text =
                variant["text"].as_str().unwrap_or(&current_text).to_string();
            ops.push(PatchOp::new(
                Operation::ReplaceText { block_id: block.id.clone(), new_text },
                string_field(&data, "reason", "AI recommended variant"),
            ));
        }
        let tone = variants
            .get(recommended_index)
            .and_then(|variant| variant["tone"].as_str())
            .unwrap_or("updated")
            .to_string();
        let patch = build_patch(ops, format!("Creative rewrite: {tone} tone"), confidence);

        Suggestion::new(
            EditIntent::CreativeRewrite,
            variants,
            recommended_index,
            reason,
            patch,
            confidence,
            locale,
        )
    }

    async fn suggest_layout(&self, document: &Document, context: &CommandContext) -> Suggestion {
        let blocks_info: Vec<Value> = document
            .blocks
            .iter()
            .map(|block| {
                json!({ "id": block.id.0, "type": block.kind, "current_position": block.position })
            })
            .collect();

        let prompt = format!(
            "Current layout elements: {elements}\n\
             Canvas size: {width}x{height}\n\
             Platform: {platform}\n\n\
             Suggest 3 layout alternatives:\n\
             1. Product-left, text-right\n\
             2. Text-centered, product-bottom\n\
             3. Diagonal/dynamic arrangement\n\n\
             Provide exact positions as percentages (0-100) for each element.",
            elements = Value::Array(blocks_info),
            width = document.dimensions.width,
            height = document.dimensions.height,
            platform = context.platform.as_deref().unwrap_or("general"),
        );

        let Some(data) = self.generate(prompt, prompts::LAYOUT_SUGGESTER, 0.7).await else {
            return Suggestion::fallback(EditIntent::LayoutSuggestion, Locale::English);
        };

        let mut layouts = array_field(&data, "layouts");
        if layouts.is_empty() {
            layouts = default_layouts(document);
        }

        let recommended = &layouts[0];
        let mut ops = Vec::new();
        if let Some(elements) = recommended["elements"].as_object() {
            let layout_name = recommended["name"].as_str().unwrap_or("new");
            for block in &document.blocks {
                if let Some(target) = elements.get(&block.id.0) {
                    let position = [
                        ("x".to_string(), target["x"].as_f64().unwrap_or(0.0)),
                        ("y".to_string(), target["y"].as_f64().unwrap_or(0.0)),
                    ]
                    .into_iter()
                    .collect();
                    ops.push(PatchOp::new(
                        Operation::MoveBlock { block_id: block.id.clone(), position },
                        format!("Move to {layout_name} layout position"),
                    ));
                }
            }
        }

        let description = format!(
            "Layout change: {}",
            recommended["name"].as_str().unwrap_or("optimized")
        );
        let patch = build_patch(ops, description, 0.8);

        Suggestion::new(
            EditIntent::LayoutSuggestion,
            layouts,
            0,
            string_field(&data, "reason", "Improved visual hierarchy"),
            patch,
            0.8,
            Locale::English,
        )
    }

    async fn suggest_style(&self, document: &Document, context: &CommandContext) -> Suggestion {
        let festival = context.festival.clone().or_else(|| meta_string(document, "occasion"));
        let preset = festival.as_deref().and_then(prompts::festival_palette);

        let styles: Vec<Value> = document
            .blocks
            .iter()
            .map(|block| json!({ &block.id.0: block.style }))
            .collect();
        let prompt = format!(
            "Current styles: {styles}\n\
             Festival/Occasion: {festival}\n\
             Brand color: {brand_color}\n\n\
             Suggest color palette and typography that:\n\
             1. Has WCAG AA accessibility (contrast ratio > 4.5:1)\n\
             2. Matches the occasion mood\n\
             3. Works well together\n\n\
             Include: primary, secondary, accent, background colors\n\
             Font recommendations with sizes",
            styles = Value::Array(styles),
            festival = festival.as_deref().unwrap_or("General"),
            brand_color = context.brand_color.as_deref().unwrap_or("Not specified"),
        );

        let Some(data) = self.generate(prompt, prompts::STYLE_SUGGESTER, 0.6).await else {
            return Suggestion::fallback(EditIntent::StyleSuggestion, Locale::English);
        };

        // A recognized festival palette wins over whatever the model proposed.
        let palette = match preset {
            Some(preset) => preset.to_value(),
            None if data["color_palette"].is_object() => data["color_palette"].clone(),
            None => json!({
                "primary": "#6366f1",
                "secondary": "#1a1a2e",
                "accent": "#f59e0b",
                "background": "#0f0f0f",
            }),
        };
        let fonts = if data["fonts"].is_object() {
            data["fonts"].clone()
        } else {
            json!({
                "headline": { "family": "Inter", "weight": "bold", "size": 48 },
                "body": { "family": "Inter", "weight": "normal", "size": 16 },
            })
        };
        let accessibility = data["accessibility_score"].as_f64().unwrap_or(0.9);

        let variants = vec![
            json!({
                "name": "Recommended Style",
                "palette": palette,
                "fonts": fonts,
                "accessibility_score": accessibility,
            }),
            json!({
                "name": "High Contrast",
                "palette": merged(&palette, &[("primary", "#ffffff"), ("background", "#000000")]),
                "fonts": fonts,
                "accessibility_score": 1.0,
            }),
            json!({
                "name": "Soft & Elegant",
                "palette": merged(&palette, &[("primary", "#8b5cf6"), ("background", "#1e1b4b")]),
                "fonts": fonts,
                "accessibility_score": 0.85,
            }),
        ];

        let mut ops = Vec::new();
        for block in &document.blocks {
            if block.kind == "text" && block.id.0.to_lowercase().contains("headline") {
                let style = [
                    ("color".to_string(), palette["primary"].clone()),
                    (
                        "font".to_string(),
                        json!(fonts["headline"]["family"].as_str().unwrap_or("Inter")),
                    ),
                    ("size".to_string(), json!(fonts["headline"]["size"].as_f64().unwrap_or(48.0))),
                ]
                .into_iter()
                .collect();
                ops.push(PatchOp::new(
                    Operation::UpdateStyle { block_id: block.id.clone(), style },
                    "Apply recommended headline style",
                ));
            } else if block.kind == "button" {
                let style = [
                    ("backgroundColor".to_string(), palette["accent"].clone()),
                    ("color".to_string(), json!("#ffffff")),
                ]
                .into_iter()
                .collect();
                ops.push(PatchOp::new(
                    Operation::UpdateStyle { block_id: block.id.clone(), style },
                    "Apply CTA button style",
                ));
            }
        }
        let patch = build_patch(ops, "Style update with recommended palette".to_string(), 0.85);

        let default_reason = format!(
            "Optimized for {} with high accessibility",
            festival.as_deref().unwrap_or("brand")
        );
        Suggestion::new(
            EditIntent::StyleSuggestion,
            variants,
            0,
            string_field(&data, "reason", &default_reason),
            patch,
            0.85,
            Locale::English,
        )
    }

    async fn suggest_cta(&self, document: &Document, context: &CommandContext) -> Suggestion {
        let objective = context.objective.as_deref().unwrap_or("buy").to_string();
        let cta_block = document
            .blocks
            .iter()
            .find(|block| block.kind == "button" || block.id.0.to_lowercase().contains("cta"));
        let current_cta = cta_block
            .and_then(|block| block.text.as_deref())
            .unwrap_or("Shop Now")
            .to_string();

        let prompt = format!(
            "Current CTA: \"{current_cta}\"\n\
             Objective: {objective}\n\
             Product: {product}\n\n\
             Generate CTAs for different objectives:\n\
             - buy: Direct purchase action\n\
             - learn: Information seeking\n\
             - subscribe: Newsletter/membership\n\
             - save: Deal-focused\n\n\
             Provide urgency level (high/medium/low) for each.",
            product = context.product.as_deref().unwrap_or("General"),
        );

        let Some(data) = self.generate(prompt, prompts::CTA_OPTIMIZER, 0.7).await else {
            return Suggestion::fallback(EditIntent::CtaOptimization, Locale::English);
        };

        let mut ctas = array_field(&data, "ctas");
        if ctas.is_empty() {
            ctas = vec![
                json!({ "text": "Shop Now", "objective": "buy", "urgency": "high" }),
                json!({ "text": "Explore Deals", "objective": "explore", "urgency": "medium" }),
                json!({ "text": "Learn More", "objective": "learn", "urgency": "low" }),
                json!({ "text": "Subscribe & Save", "objective": "subscribe", "urgency": "medium" }),
            ];
        }
        let recommended_index = ctas
            .iter()
            .position(|cta| cta["objective"].as_str() == Some(&objective))
            .unwrap_or(0);

        let mut ops = Vec::new();
        if let (Some(block), Some(cta)) = (cta_block, ctas.get(recommended_index)) {
            let new_text = cta["text"].as_str().unwrap_or(&current_cta).to_string();
            ops.push(PatchOp::new(
                Operation::ReplaceText { block_id: block.id.clone(), new_text },
                format!("Optimized for {objective} objective"),
            ));
        }
        let patch = build_patch(ops, format!("CTA optimized for {objective}"), 0.9);

        let default_reason = format!("Optimized for {objective} conversion");
        Suggestion::new(
            EditIntent::CtaOptimization,
            ctas,
            recommended_index,
            string_field(&data, "reason", &default_reason),
            patch,
            0.9,
            Locale::English,
        )
    }

    async fn suggest_localization(&self, document: &Document, target: Locale) -> Suggestion {
        let texts: Vec<(String, String)> = document
            .blocks
            .iter()
            .filter_map(|block| {
                block.text.as_ref().map(|text| (block.id.0.clone(), text.clone()))
            })
            .collect();
        let texts_json: Vec<Value> = texts
            .iter()
            .map(|(id, text)| json!({ "id": id, "text": text }))
            .collect();

        let prompt = format!(
            "Translate/localize for {target}:\n{payload}\n\n\
             For Hindi (hi): Use Devanagari script\n\
             For Telugu (te): Use Telugu script\n\
             For Hinglish (hi-en): Mix Hindi words in Roman with English\n\n\
             Requirements:\n\
             - Keep brand names in English\n\
             - Use ₹ for currency\n\
             - Adapt idioms culturally\n\
             - Provide transliteration for non-English scripts",
            payload = Value::Array(texts_json),
        );

        let Some(data) = self.generate(prompt, prompts::LOCALIZER, 0.5).await else {
            return Suggestion::fallback(EditIntent::Localization, target);
        };

        let translations = &data["translations"];
        let all_locales = [Locale::English, Locale::Hindi, Locale::Telugu, Locale::Hinglish];
        let variants: Vec<Value> = all_locales
            .iter()
            .map(|locale| {
                let mut locale_translations = serde_json::Map::new();
                for (id, original) in &texts {
                    let translated = match locale {
                        Locale::English => original.clone(),
                        Locale::Hinglish => translations[locale.as_str()][id]
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| hinglish_backstop(original)),
                        _ => translations[locale.as_str()][id]
                            .as_str()
                            .unwrap_or(original)
                            .to_string(),
                    };
                    locale_translations.insert(id.clone(), json!(translated));
                }
                json!({
                    "language": locale.as_str(),
                    "translations": locale_translations,
                    "transliterations": data["transliterations"][locale.as_str()]
                        .as_object()
                        .cloned()
                        .unwrap_or_default(),
                })
            })
            .collect();

        let recommended_index = all_locales
            .iter()
            .position(|locale| *locale == target)
            .unwrap_or(0);
        let confidence = data["confidence"].as_f64().unwrap_or(0.85);

        let mut ops = Vec::new();
        if let Some(recommended) = variants[recommended_index]["translations"].as_object() {
            for block in &document.blocks {
                let Some(new_text) = recommended.get(&block.id.0).and_then(Value::as_str) else {
                    continue;
                };
                if block.text.as_deref() != Some(new_text) {
                    ops.push(PatchOp::new(
                        Operation::ReplaceText {
                            block_id: block.id.clone(),
                            new_text: new_text.to_string(),
                        },
                        format!("Localized to {target}"),
                    ));
                }
            }
        }
        let patch = build_patch(ops, format!("Localization to {target}"), confidence);

        let default_reason = format!("Localized for {target} audience");
        Suggestion::new(
            EditIntent::Localization,
            variants,
            recommended_index,
            string_field(&data, "cultural_notes", &default_reason),
            patch,
            confidence,
            target,
        )
    }

    async fn generate_ab_variants(&self, document: &Document) -> Suggestion {
        let prompt = format!(
            "Create A/B test variants for this creative:\n{document}\n\n\
             Generate:\n\
             - Variant A: Original with minor optimizations\n\
             - Variant B: Significant change (different headline approach, CTA, or layout)\n\n\
             For each variant, explain the hypothesis being tested.",
            document = document.to_value(),
        );

        let Some(data) = self.generate(prompt, prompts::CREATIVE_EDITOR, 0.8).await else {
            return Suggestion::fallback(EditIntent::AbGeneration, Locale::English);
        };

        let mut variants = array_field(&data, "variants");
        if variants.len() < 2 {
            variants = vec![
                json!({
                    "name": "Variant A (Control)",
                    "changes": [],
                    "hypothesis": "Baseline performance",
                }),
                json!({
                    "name": "Variant B (Urgency)",
                    "changes": [{ "type": "headline", "text": "Limited Time Offer!" }],
                    "hypothesis": "Urgency increases CTR",
                }),
            ];
        }

        // A/B variants are handed to an experiment, never auto-applied.
        Suggestion::new(
            EditIntent::AbGeneration,
            variants,
            0,
            "A/B variants ready for testing",
            None,
            0.9,
            Locale::English,
        )
    }

    async fn suggest_text_edit(
        &self,
        document: &Document,
        locale: Locale,
        context: &CommandContext,
    ) -> Suggestion {
        let prompt = format!(
            "Edit request: {instruction}\n\
             Current document: {document}\n\
             Locale: {locale}\n\n\
             Apply the edit and return the updated text.",
            instruction = context.instruction.as_deref().unwrap_or("improve text"),
            document = document.to_value(),
        );

        let Some(data) = self.generate(prompt, prompts::CREATIVE_EDITOR, 0.7).await else {
            return Suggestion::fallback(EditIntent::TextEdit, locale);
        };

        Suggestion::new(
            EditIntent::TextEdit,
            array_field(&data, "variants"),
            0,
            string_field(&data, "reason", "Applied edit"),
            None,
            0.8,
            locale,
        )
    }

    fn pending_lock(&self) -> MutexGuard<'_, HashMap<SuggestionId, Suggestion>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Salvages a JSON object from a possibly noisy model reply: a direct parse
/// first, then the outermost `{...}` span (models love markdown fences).
pub fn extract_json(reply: &str) -> Option<Value> {
    let trimmed = reply.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(value) if value.is_object() => Some(value),
        _ => {
            debug!("no JSON object span found in model reply");
            None
        }
    }
}

fn build_patch(ops: Vec<PatchOp>, description: String, confidence: f64) -> Option<Patch> {
    if ops.is_empty() {
        return None;
    }
    Patch::new(ops, description, confidence.clamp(0.0, 1.0)).ok()
}

fn headline_block(document: &Document) -> Option<&bannerkit_core::document::Block> {
    document
        .blocks
        .iter()
        .find(|block| {
            block.kind == "text"
                && (block.id.0.to_lowercase().contains("headline")
                    || block.style.get("size").and_then(Value::as_f64).unwrap_or(0.0) > 30.0)
        })
        .or_else(|| document.blocks.first())
}

fn meta_string(document: &Document, key: &str) -> Option<String> {
    document.meta.get(key).and_then(Value::as_str).map(str::to_string)
}

fn array_field(data: &Value, key: &str) -> Vec<Value> {
    data[key].as_array().cloned().unwrap_or_default()
}

fn string_field(data: &Value, key: &str, default: &str) -> String {
    data[key].as_str().unwrap_or(default).to_string()
}

fn merged(palette: &Value, overrides: &[(&str, &str)]) -> Value {
    let mut out = palette.as_object().cloned().unwrap_or_default();
    for (key, value) in overrides {
        out.insert((*key).to_string(), json!(value));
    }
    Value::Object(out)
}

fn default_layouts(document: &Document) -> Vec<Value> {
    let elements_at = |x: f64, y: f64| -> Value {
        let mut elements = serde_json::Map::new();
        for block in &document.blocks {
            elements.insert(block.id.0.clone(), json!({ "x": x, "y": y }));
        }
        Value::Object(elements)
    };

    vec![
        json!({
            "name": "text-left-product-right",
            "description": "Classic layout with text on left",
            "elements": elements_at(5.0, 20.0),
        }),
        json!({
            "name": "center-aligned",
            "description": "Centered layout for impact",
            "elements": elements_at(50.0, 50.0),
        }),
        json!({
            "name": "product-focus",
            "description": "Product dominant layout",
            "elements": elements_at(60.0, 30.0),
        }),
    ]
}

fn hinglish_backstop(original: &str) -> String {
    let lowered = original.to_lowercase();
    for (english, hinglish) in prompts::HINGLISH_PHRASES {
        if lowered.contains(english) {
            return title_case(&lowered.replace(english, hinglish));
        }
    }
    title_case(original)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;

    use bannerkit_core::document::{Block, BlockId, Document, DocumentId};
    use bannerkit_core::intent::{EditIntent, Locale};
    use bannerkit_core::patch::Operation;

    use crate::llm::{GenerateRequest, LlmClient};
    use crate::router::CommandContext;

    use super::{extract_json, hinglish_backstop, SuggestionAgent};

    struct StubLlm {
        reply: Option<String>,
    }

    impl StubLlm {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: Some(reply.to_string()) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { reply: None })
        }
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<String> {
            self.reply.clone().ok_or_else(|| anyhow!("service unreachable"))
        }
    }

    fn banner() -> Document {
        let mut document = Document::new(DocumentId("banner-1".to_string()));

        let mut headline = Block::new(BlockId("headline-1".to_string()), "text");
        headline.text = Some("Big Sale".to_string());

        let mut cta = Block::new(BlockId("cta-1".to_string()), "button");
        cta.text = Some("Shop Now".to_string());

        document.blocks.push(headline);
        document.blocks.push(cta);
        document
    }

    #[tokio::test]
    async fn transport_failure_yields_the_fallback_suggestion() {
        let agent = SuggestionAgent::new(StubLlm::failing());
        let suggestion = agent
            .get_suggestions(
                &banner(),
                EditIntent::CreativeRewrite,
                Locale::English,
                &CommandContext::default(),
            )
            .await;

        assert!(suggestion.is_fallback());
        assert_eq!(suggestion.confidence, 0.5);
        assert!(suggestion.patch.is_none());
    }

    #[tokio::test]
    async fn unparseable_reply_yields_the_fallback_suggestion() {
        let agent = SuggestionAgent::new(StubLlm::replying("sorry, I cannot help with that"));
        let suggestion = agent
            .get_suggestions(
                &banner(),
                EditIntent::StyleSuggestion,
                Locale::English,
                &CommandContext::default(),
            )
            .await;

        assert!(suggestion.is_fallback());
    }

    #[tokio::test]
    async fn creative_rewrite_derives_a_replace_text_patch() {
        let reply = json!({
            "variants": [
                { "text": "Hurry! Sale Ends Tonight", "tone": "urgent", "lang": "en" },
                { "text": "Save ₹500 Today", "tone": "value", "lang": "en" },
            ],
            "recommended_index": 1,
            "reason": "Value framing converts best",
            "confidence": 0.92,
        });
        let agent = SuggestionAgent::new(StubLlm::replying(&reply.to_string()));

        let suggestion = agent
            .get_suggestions(
                &banner(),
                EditIntent::CreativeRewrite,
                Locale::English,
                &CommandContext::default(),
            )
            .await;

        assert_eq!(suggestion.recommended_index, 1);
        assert_eq!(suggestion.reason, "Value framing converts best");
        let patch = suggestion.patch.expect("patch for recommended variant");
        assert_eq!(patch.ops.len(), 1);
        assert!(matches!(
            &patch.ops[0].op,
            Operation::ReplaceText { block_id, new_text }
                if block_id.0 == "headline-1" && new_text == "Save ₹500 Today"
        ));
    }

    #[tokio::test]
    async fn layout_suggestion_moves_the_listed_blocks() {
        let reply = json!({
            "layouts": [{
                "name": "text-left-product-right",
                "elements": { "headline-1": { "x": 5, "y": 20 } },
            }],
            "reason": "Better visual flow",
        });
        let agent = SuggestionAgent::new(StubLlm::replying(&reply.to_string()));

        let suggestion = agent
            .get_suggestions(
                &banner(),
                EditIntent::LayoutSuggestion,
                Locale::English,
                &CommandContext::default(),
            )
            .await;

        let patch = suggestion.patch.expect("move patch");
        assert_eq!(patch.ops.len(), 1);
        assert!(matches!(
            &patch.ops[0].op,
            Operation::MoveBlock { block_id, position }
                if block_id.0 == "headline-1" && position.get("x") == Some(&5.0)
        ));
    }

    #[tokio::test]
    async fn style_suggestion_prefers_the_festival_preset_palette() {
        let reply = json!({
            "color_palette": { "primary": "#123456" },
            "reason": "model palette",
        });
        let agent = SuggestionAgent::new(StubLlm::replying(&reply.to_string()));
        let context = CommandContext { festival: Some("diwali".to_string()), ..Default::default() };

        let suggestion = agent
            .get_suggestions(&banner(), EditIntent::StyleSuggestion, Locale::English, &context)
            .await;

        // Diwali primary, not the model's.
        assert_eq!(suggestion.variants[0]["palette"]["primary"], json!("#FF6B00"));
        let patch = suggestion.patch.expect("style patch");
        assert_eq!(patch.ops.len(), 2);
    }

    #[tokio::test]
    async fn localization_backfills_hinglish_from_the_phrase_table() {
        let reply = json!({
            "translations": { "hi": { "headline-1": "बड़ी सेल" } },
            "confidence": 0.9,
        });
        let agent = SuggestionAgent::new(StubLlm::replying(&reply.to_string()));

        let suggestion = agent
            .get_suggestions(
                &banner(),
                EditIntent::Localization,
                Locale::Hinglish,
                &CommandContext::default(),
            )
            .await;

        assert_eq!(suggestion.locale, Locale::Hinglish);
        let recommended = suggestion.recommended().expect("hinglish variant");
        assert_eq!(recommended["language"], json!("hi-en"));
        assert_eq!(recommended["translations"]["headline-1"], json!("Badi Sale"));
    }

    #[tokio::test]
    async fn ab_generation_never_carries_a_patch() {
        let reply = json!({ "variants": [{ "name": "A" }, { "name": "B" }] });
        let agent = SuggestionAgent::new(StubLlm::replying(&reply.to_string()));

        let suggestion = agent
            .get_suggestions(
                &banner(),
                EditIntent::AbGeneration,
                Locale::English,
                &CommandContext::default(),
            )
            .await;

        assert_eq!(suggestion.variants.len(), 2);
        assert!(suggestion.patch.is_none());
    }

    #[tokio::test]
    async fn process_command_with_auto_apply_mutates_the_document() {
        let reply = json!({
            "variants": [{ "text": "Act Fast! Big Sale Ends Soon", "tone": "urgent" }],
            "recommended_index": 0,
            "reason": "urgency",
        });
        let agent = SuggestionAgent::new(StubLlm::replying(&reply.to_string()));
        let document = banner();

        let outcome = agent
            .process_command("make headline more urgent", &document, Locale::English, true)
            .await;

        assert!(outcome.auto_applied);
        let updated = outcome.updated_document.expect("auto-applied document");
        assert_eq!(
            updated.block(&BlockId("headline-1".to_string())).and_then(|b| b.text.as_deref()),
            Some("Act Fast! Big Sale Ends Soon")
        );
        // The engine recorded initial + post-patch snapshots.
        assert_eq!(agent.engine().history(&document.id).len(), 2);
    }

    #[tokio::test]
    async fn accept_and_reject_feed_the_telemetry_counters() {
        let agent = SuggestionAgent::new(StubLlm::failing());
        let document = banner();
        let context = CommandContext::default();

        let first = agent
            .get_suggestions(&document, EditIntent::CreativeRewrite, Locale::English, &context)
            .await;
        let second = agent
            .get_suggestions(&document, EditIntent::CtaOptimization, Locale::English, &context)
            .await;

        assert!(agent.accept_suggestion(&first.id).is_some());
        assert!(agent.reject_suggestion(&second.id).is_some());
        // Already resolved; the cache no longer knows it.
        assert!(agent.accept_suggestion(&first.id).is_none());

        let report = agent.telemetry();
        assert_eq!(report.total_suggestions, 2);
        assert_eq!(report.accepted_suggestions, 1);
        assert_eq!(report.rejected_suggestions, 1);
        assert!((report.acceptance_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn json_is_extracted_from_fenced_and_noisy_replies() {
        let fenced = "```json\n{\"reason\": \"ok\"}\n```";
        assert_eq!(extract_json(fenced).expect("fenced")["reason"], json!("ok"));

        let noisy = "Here you go: {\"variants\": []} hope that helps!";
        assert!(extract_json(noisy).is_some());

        assert!(extract_json("no json here").is_none());
        assert!(extract_json("[1, 2, 3]").is_none());
    }

    #[test]
    fn hinglish_backstop_substitutes_known_phrases() {
        assert_eq!(hinglish_backstop("Big Sale this week"), "Badi Sale This Week");
        assert_eq!(hinglish_backstop("Nothing matches"), "Nothing Matches");
    }
}
