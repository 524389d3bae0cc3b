use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::errors::DomainError;

pub const DEFAULT_LAYOUT: &str = "center";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self { width: 1200, height: 628 }
    }
}

/// One positioned visual element of a creative.
///
/// `kind` is an open string set (text/button/image/shape today) because
/// retailer templates keep inventing block types; the capability surface
/// (text, style, position, size) is what the patch applier dispatches on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
    pub style: BTreeMap<String, Value>,
    pub position: BTreeMap<String, f64>,
    pub size: BTreeMap<String, f64>,
}

impl Block {
    pub fn new(id: BlockId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            text: None,
            style: BTreeMap::new(),
            position: BTreeMap::new(),
            size: BTreeMap::new(),
        }
    }
}

/// Versioned creative document: an ordered block sequence (z/reading order)
/// plus canvas metadata. Callers mutate it only through the patch applier so
/// the version store stays consistent with what is on screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub blocks: Vec<Block>,
    pub layout: String,
    pub meta: BTreeMap<String, Value>,
    pub background: BTreeMap<String, Value>,
    pub dimensions: Dimensions,
}

impl Document {
    pub fn new(id: DocumentId) -> Self {
        Self {
            id,
            blocks: Vec::new(),
            layout: DEFAULT_LAYOUT.to_string(),
            meta: BTreeMap::new(),
            background: BTreeMap::new(),
            dimensions: Dimensions::default(),
        }
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| &block.id == id)
    }

    pub fn block_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| &block.id == id)
    }

    pub fn has_block(&self, id: &BlockId) -> bool {
        self.block(id).is_some()
    }

    /// Builds a document from its external wire form.
    ///
    /// Shape defaulting only: `layout`, `dimensions`, and every collection
    /// fall back to defaults when absent. `dimensions` also accepts the
    /// legacy `canvas` key (first present wins). Structural malformation —
    /// non-object root, missing `id`, non-array `blocks` — fails fast;
    /// semantic validation is a collaborator's job.
    pub fn from_value(raw: &Value) -> Result<Self, DomainError> {
        let root = raw.as_object().ok_or(DomainError::NotAnObject)?;

        let id = root
            .get("id")
            .ok_or(DomainError::MissingKey("id"))?
            .as_str()
            .ok_or_else(|| DomainError::MalformedKey {
                key: "id",
                detail: "expected a string".to_string(),
            })?;

        let blocks = match root.get("blocks") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(block_from_value)
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(DomainError::MalformedKey {
                    key: "blocks",
                    detail: "expected an array".to_string(),
                })
            }
        };

        let dimensions = root
            .get("dimensions")
            .or_else(|| root.get("canvas"))
            .map(dimensions_from_value)
            .unwrap_or_default();

        Ok(Self {
            id: DocumentId(id.to_string()),
            blocks,
            layout: root
                .get("layout")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_LAYOUT)
                .to_string(),
            meta: object_map(root.get("meta")),
            background: object_map(root.get("background")),
            dimensions,
        })
    }

    /// Exact structural inverse of [`Document::from_value`].
    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id.0,
            "blocks": self.blocks.iter().map(block_to_value).collect::<Vec<_>>(),
            "layout": self.layout,
            "meta": self.meta,
            "background": self.background,
            "dimensions": { "width": self.dimensions.width, "height": self.dimensions.height },
        })
    }

    /// Builds a document from flat canvas-editor elements (the shape the
    /// front-end canvas emits: `fontFamily`, `fontSize`, `x`, `y`, ...).
    pub fn from_canvas_elements(elements: &[Value], meta: BTreeMap<String, Value>) -> Self {
        let blocks = elements
            .iter()
            .filter_map(Value::as_object)
            .map(canvas_element_to_block)
            .collect();

        Self {
            id: DocumentId(Uuid::new_v4().to_string()),
            blocks,
            layout: "custom".to_string(),
            meta,
            background: BTreeMap::new(),
            dimensions: Dimensions::default(),
        }
    }
}

fn block_from_value(raw: &Value) -> Result<Block, DomainError> {
    let entry = raw.as_object().ok_or_else(|| DomainError::MalformedKey {
        key: "blocks",
        detail: "expected every block to be an object".to_string(),
    })?;

    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .map(|value| BlockId(value.to_string()))
        .unwrap_or_else(BlockId::fresh);

    // Legacy canvas exports omitted `size`; their `position` carried both.
    let size = entry.get("size").or_else(|| entry.get("position"));

    Ok(Block {
        id,
        kind: entry.get("type").and_then(Value::as_str).unwrap_or("text").to_string(),
        text: entry.get("text").and_then(Value::as_str).map(str::to_string),
        style: object_map(entry.get("style")),
        position: numeric_map(entry.get("position")),
        size: numeric_map(size),
    })
}

fn block_to_value(block: &Block) -> Value {
    json!({
        "id": block.id.0,
        "type": block.kind,
        "text": block.text,
        "style": block.style,
        "position": block.position,
        "size": block.size,
    })
}

fn dimensions_from_value(raw: &Value) -> Dimensions {
    let fallback = Dimensions::default();
    let Some(entry) = raw.as_object() else { return fallback };

    let side = |key: &str, default: u32| {
        entry.get(key).and_then(Value::as_u64).map(|value| value as u32).unwrap_or(default)
    };

    Dimensions { width: side("width", fallback.width), height: side("height", fallback.height) }
}

fn canvas_element_to_block(element: &Map<String, Value>) -> Block {
    let id = element
        .get("id")
        .and_then(Value::as_str)
        .map(|value| BlockId(value.to_string()))
        .unwrap_or_else(BlockId::fresh);

    let text = element
        .get("text")
        .or_else(|| element.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut style = BTreeMap::new();
    style.insert(
        "font".to_string(),
        element.get("fontFamily").cloned().unwrap_or_else(|| json!("Inter")),
    );
    style.insert("size".to_string(), element.get("fontSize").cloned().unwrap_or_else(|| json!(24)));
    style.insert(
        "color".to_string(),
        element.get("color").cloned().unwrap_or_else(|| json!("#ffffff")),
    );
    style.insert(
        "weight".to_string(),
        element.get("fontWeight").cloned().unwrap_or_else(|| json!("normal")),
    );
    style.insert(
        "align".to_string(),
        element.get("textAlign").cloned().unwrap_or_else(|| json!("left")),
    );
    if let Some(background) = element.get("backgroundColor") {
        style.insert("backgroundColor".to_string(), background.clone());
    }

    let coordinate = |key: &str, default: f64| {
        element.get(key).and_then(Value::as_f64).unwrap_or(default)
    };

    Block {
        id,
        kind: element.get("type").and_then(Value::as_str).unwrap_or("text").to_string(),
        text,
        style,
        position: BTreeMap::from([
            ("x".to_string(), coordinate("x", 0.0)),
            ("y".to_string(), coordinate("y", 0.0)),
        ]),
        size: BTreeMap::from([
            ("width".to_string(), coordinate("width", 100.0)),
            ("height".to_string(), coordinate("height", 50.0)),
        ]),
    }
}

fn object_map(raw: Option<&Value>) -> BTreeMap<String, Value> {
    raw.and_then(Value::as_object)
        .map(|entries| entries.iter().map(|(key, value)| (key.clone(), value.clone())).collect())
        .unwrap_or_default()
}

fn numeric_map(raw: Option<&Value>) -> BTreeMap<String, f64> {
    raw.and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(key, value)| value.as_f64().map(|number| (key.clone(), number)))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Block, BlockId, Document, DomainError};

    #[test]
    fn from_value_defaults_missing_fields() {
        let document = Document::from_value(&json!({ "id": "doc-1" })).expect("minimal doc");

        assert_eq!(document.id.0, "doc-1");
        assert!(document.blocks.is_empty());
        assert_eq!(document.layout, "center");
        assert_eq!(document.dimensions.width, 1200);
        assert_eq!(document.dimensions.height, 628);
    }

    #[test]
    fn from_value_accepts_legacy_canvas_key_with_dimensions_winning() {
        let legacy = Document::from_value(&json!({
            "id": "doc-legacy",
            "canvas": { "width": 800, "height": 400 },
        }))
        .expect("canvas key");
        assert_eq!(legacy.dimensions.width, 800);

        let both = Document::from_value(&json!({
            "id": "doc-both",
            "dimensions": { "width": 1080, "height": 1080 },
            "canvas": { "width": 800, "height": 400 },
        }))
        .expect("both keys");
        assert_eq!(both.dimensions.width, 1080);
    }

    #[test]
    fn from_value_fails_fast_on_structural_malformation() {
        assert_eq!(Document::from_value(&json!([])), Err(DomainError::NotAnObject));
        assert_eq!(
            Document::from_value(&json!({ "layout": "center" })),
            Err(DomainError::MissingKey("id"))
        );
        assert!(matches!(
            Document::from_value(&json!({ "id": "doc-1", "blocks": "oops" })),
            Err(DomainError::MalformedKey { key: "blocks", .. })
        ));
    }

    #[test]
    fn wire_round_trip_is_lossless() {
        let raw = json!({
            "id": "doc-rt",
            "blocks": [{
                "id": "headline",
                "type": "text",
                "text": "Mega Sale",
                "style": { "color": "#ff0000", "size": 48 },
                "position": { "x": 10.0, "y": 20.0 },
                "size": { "width": 400.0, "height": 80.0 },
            }],
            "layout": "left",
            "meta": { "occasion": "diwali" },
            "background": { "color": "#1a1a2e" },
            "dimensions": { "width": 1200, "height": 628 },
        });

        let document = Document::from_value(&raw).expect("well-formed doc");
        let round_tripped = Document::from_value(&document.to_value()).expect("round trip");
        assert_eq!(document, round_tripped);
    }

    #[test]
    fn block_without_id_gets_a_fresh_one() {
        let document = Document::from_value(&json!({
            "id": "doc-2",
            "blocks": [{ "type": "text", "text": "hello" }],
        }))
        .expect("doc with anonymous block");

        assert_eq!(document.blocks.len(), 1);
        assert!(!document.blocks[0].id.0.is_empty());
    }

    #[test]
    fn block_size_falls_back_to_legacy_position_payload() {
        let document = Document::from_value(&json!({
            "id": "doc-3",
            "blocks": [{ "id": "b1", "position": { "x": 5.0, "y": 6.0 } }],
        }))
        .expect("legacy block");

        assert_eq!(document.blocks[0].size.get("x"), Some(&5.0));
    }

    #[test]
    fn canvas_elements_map_editor_fields_into_style() {
        let elements = [json!({
            "id": "headline",
            "type": "text",
            "content": "Fresh Arrivals",
            "fontFamily": "Poppins",
            "fontSize": 42,
            "color": "#222222",
            "x": 60, "y": 80, "width": 500, "height": 90,
        })];

        let document = Document::from_canvas_elements(&elements, Default::default());
        assert_eq!(document.layout, "custom");

        let block = document.block(&BlockId("headline".to_string())).expect("headline block");
        assert_eq!(block.text.as_deref(), Some("Fresh Arrivals"));
        assert_eq!(block.style.get("font"), Some(&json!("Poppins")));
        assert_eq!(block.position.get("x"), Some(&60.0));
        assert_eq!(block.size.get("height"), Some(&90.0));
    }

    #[test]
    fn block_lookup_finds_first_match() {
        let mut document = Document::new(super::DocumentId("doc-4".to_string()));
        document.blocks.push(Block::new(BlockId("cta".to_string()), "button"));
        assert!(document.has_block(&BlockId("cta".to_string())));
        assert!(!document.has_block(&BlockId("missing".to_string())));
    }
}
