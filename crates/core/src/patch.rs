use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::document::{Block, BlockId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchId(pub String);

/// Payload of an `add_block` operation. The id is optional on the wire; the
/// applier mints a fresh one when it is absent (or when it would collide).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockSpec {
    pub id: Option<BlockId>,
    pub kind: String,
    pub text: Option<String>,
    pub style: BTreeMap<String, Value>,
    pub position: BTreeMap<String, f64>,
    pub size: BTreeMap<String, f64>,
}

impl BlockSpec {
    pub fn into_block(self, id: BlockId) -> Block {
        Block {
            id,
            kind: if self.kind.is_empty() { "text".to_string() } else { self.kind },
            text: self.text,
            style: self.style,
            position: self.position,
            size: self.size,
        }
    }
}

/// One atomic change, keyed by operation so the applier's dispatch is
/// exhaustive at compile time.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    ReplaceText { block_id: BlockId, new_text: String },
    UpdateStyle { block_id: BlockId, style: BTreeMap<String, Value> },
    MoveBlock { block_id: BlockId, position: BTreeMap<String, f64> },
    AddBlock { block: BlockSpec },
    DeleteBlock { block_id: BlockId },
    ChangeLayout { layout: String },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReplaceText { .. } => "replace_text",
            Self::UpdateStyle { .. } => "update_style",
            Self::MoveBlock { .. } => "move_block",
            Self::AddBlock { .. } => "add_block",
            Self::DeleteBlock { .. } => "delete_block",
            Self::ChangeLayout { .. } => "change_layout",
        }
    }

    pub fn target(&self) -> Option<&BlockId> {
        match self {
            Self::ReplaceText { block_id, .. }
            | Self::UpdateStyle { block_id, .. }
            | Self::MoveBlock { block_id, .. }
            | Self::DeleteBlock { block_id } => Some(block_id),
            Self::AddBlock { .. } | Self::ChangeLayout { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PatchOp {
    pub op: Operation,
    /// Human-readable provenance, may be empty.
    pub reason: String,
}

impl PatchOp {
    pub fn new(op: Operation, reason: impl Into<String>) -> Self {
        Self { op, reason: reason.into() }
    }
}

/// An ordered, atomic batch of block mutations with provenance metadata.
/// Operations apply strictly in order, so later ops may target blocks created
/// by earlier ops in the same patch. Immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
    pub id: PatchId,
    pub ops: Vec<PatchOp>,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub confidence: f64,
}

impl Patch {
    pub fn new(
        ops: Vec<PatchOp>,
        description: impl Into<String>,
        confidence: f64,
    ) -> Result<Self, DomainError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(DomainError::ConfidenceOutOfRange(confidence));
        }

        Ok(Self {
            id: PatchId(Uuid::new_v4().to_string()),
            ops,
            timestamp: Utc::now(),
            description: description.into(),
            confidence,
        })
    }

    /// Builds a patch from its external wire form. `operations` must be
    /// present with recognized operation names; the remaining envelope keys
    /// default (fresh id, now, empty description, confidence 1.0) to favor
    /// idempotent replay of caller-supplied patches.
    pub fn from_value(raw: &Value) -> Result<Self, DomainError> {
        let root = raw.as_object().ok_or(DomainError::NotAnObject)?;

        let entries = root
            .get("operations")
            .ok_or(DomainError::MissingKey("operations"))?
            .as_array()
            .ok_or_else(|| DomainError::MalformedKey {
                key: "operations",
                detail: "expected an array".to_string(),
            })?;
        let ops = entries.iter().map(op_from_value).collect::<Result<Vec<_>, _>>()?;

        let confidence = root.get("confidence").and_then(Value::as_f64).unwrap_or(1.0);
        if !(0.0..=1.0).contains(&confidence) {
            return Err(DomainError::ConfidenceOutOfRange(confidence));
        }

        let timestamp = match root.get("timestamp").and_then(Value::as_str) {
            Some(text) => {
                text.parse::<DateTime<Utc>>().map_err(|error| DomainError::MalformedKey {
                    key: "timestamp",
                    detail: format!("expected ISO-8601: {error}"),
                })?
            }
            None => Utc::now(),
        };

        Ok(Self {
            id: root
                .get("id")
                .and_then(Value::as_str)
                .map(|value| PatchId(value.to_string()))
                .unwrap_or_else(|| PatchId(Uuid::new_v4().to_string())),
            ops,
            timestamp,
            description: root
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            confidence,
        })
    }

    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id.0,
            "operations": self.ops.iter().map(op_to_value).collect::<Vec<_>>(),
            "timestamp": self.timestamp.to_rfc3339(),
            "description": self.description,
            "confidence": self.confidence,
        })
    }
}

fn op_from_value(raw: &Value) -> Result<PatchOp, DomainError> {
    let entry = raw.as_object().ok_or_else(|| DomainError::MalformedKey {
        key: "operations",
        detail: "expected every operation to be an object".to_string(),
    })?;

    let name = entry
        .get("operation")
        .and_then(Value::as_str)
        .ok_or(DomainError::MissingKey("operation"))?;
    let block_id =
        || BlockId(entry.get("block_id").and_then(Value::as_str).unwrap_or_default().to_string());
    let data = entry.get("data").and_then(Value::as_object);

    let op = match name {
        "replace_text" => Operation::ReplaceText {
            block_id: block_id(),
            new_text: data
                .and_then(|payload| payload.get("new_text"))
                .and_then(Value::as_str)
                .ok_or(DomainError::MissingKey("data.new_text"))?
                .to_string(),
        },
        "update_style" => Operation::UpdateStyle {
            block_id: block_id(),
            style: data
                .map(|payload| {
                    payload.iter().map(|(key, value)| (key.clone(), value.clone())).collect()
                })
                .unwrap_or_default(),
        },
        "move_block" => Operation::MoveBlock {
            block_id: block_id(),
            position: data
                .map(|payload| {
                    payload
                        .iter()
                        .filter_map(|(key, value)| value.as_f64().map(|n| (key.clone(), n)))
                        .collect()
                })
                .unwrap_or_default(),
        },
        "add_block" => Operation::AddBlock {
            block: data.map(block_spec_from_data).unwrap_or_default(),
        },
        "delete_block" => Operation::DeleteBlock { block_id: block_id() },
        "change_layout" => Operation::ChangeLayout {
            layout: data
                .and_then(|payload| payload.get("layout"))
                .and_then(Value::as_str)
                .ok_or(DomainError::MissingKey("data.layout"))?
                .to_string(),
        },
        other => return Err(DomainError::UnknownOperation(other.to_string())),
    };

    Ok(PatchOp {
        op,
        reason: entry.get("reason").and_then(Value::as_str).unwrap_or_default().to_string(),
    })
}

fn op_to_value(patch_op: &PatchOp) -> Value {
    let (block_id, data) = match &patch_op.op {
        Operation::ReplaceText { block_id, new_text } => {
            (block_id.0.clone(), json!({ "new_text": new_text }))
        }
        Operation::UpdateStyle { block_id, style } => (block_id.0.clone(), json!(style)),
        Operation::MoveBlock { block_id, position } => (block_id.0.clone(), json!(position)),
        Operation::AddBlock { block } => (String::new(), block_spec_to_data(block)),
        Operation::DeleteBlock { block_id } => (block_id.0.clone(), json!({})),
        Operation::ChangeLayout { layout } => (String::new(), json!({ "layout": layout })),
    };

    json!({
        "operation": patch_op.op.name(),
        "block_id": block_id,
        "data": data,
        "reason": patch_op.reason,
    })
}

fn block_spec_from_data(data: &Map<String, Value>) -> BlockSpec {
    BlockSpec {
        id: data.get("id").and_then(Value::as_str).map(|value| BlockId(value.to_string())),
        kind: data.get("type").and_then(Value::as_str).unwrap_or("text").to_string(),
        text: data.get("text").and_then(Value::as_str).map(str::to_string),
        style: data
            .get("style")
            .and_then(Value::as_object)
            .map(|style| style.iter().map(|(key, value)| (key.clone(), value.clone())).collect())
            .unwrap_or_default(),
        position: numeric_payload(data.get("position")),
        size: numeric_payload(data.get("size")),
    }
}

fn block_spec_to_data(spec: &BlockSpec) -> Value {
    let mut data = Map::new();
    if let Some(id) = &spec.id {
        data.insert("id".to_string(), json!(id.0));
    }
    data.insert("type".to_string(), json!(spec.kind));
    if let Some(text) = &spec.text {
        data.insert("text".to_string(), json!(text));
    }
    data.insert("style".to_string(), json!(spec.style));
    data.insert("position".to_string(), json!(spec.position));
    data.insert("size".to_string(), json!(spec.size));
    Value::Object(data)
}

fn numeric_payload(raw: Option<&Value>) -> BTreeMap<String, f64> {
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

    use super::{BlockId, DomainError, Operation, Patch, PatchOp};

    fn style_patch() -> Patch {
        Patch::new(
            vec![PatchOp::new(
                Operation::UpdateStyle {
                    block_id: BlockId("headline".to_string()),
                    style: [("color".to_string(), json!("#ff0000"))].into_iter().collect(),
                },
                "brand palette",
            )],
            "restyle headline",
            0.9,
        )
        .expect("valid confidence")
    }

    #[test]
    fn wire_round_trip_preserves_operations() {
        let patch = style_patch();
        let round_tripped = Patch::from_value(&patch.to_value()).expect("round trip");

        assert_eq!(round_tripped.id, patch.id);
        assert_eq!(round_tripped.ops, patch.ops);
        assert_eq!(round_tripped.description, patch.description);
        assert!((round_tripped.confidence - patch.confidence).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_operation_name_is_rejected() {
        let raw = json!({
            "operations": [{ "operation": "rotate_block", "block_id": "b1", "data": {}, "reason": "" }],
        });

        assert_eq!(
            Patch::from_value(&raw),
            Err(DomainError::UnknownOperation("rotate_block".to_string()))
        );
    }

    #[test]
    fn replace_text_requires_new_text_payload() {
        let raw = json!({
            "operations": [{ "operation": "replace_text", "block_id": "b1", "data": {}, "reason": "" }],
        });

        assert_eq!(Patch::from_value(&raw), Err(DomainError::MissingKey("data.new_text")));
    }

    #[test]
    fn confidence_outside_unit_interval_is_rejected() {
        assert_eq!(
            Patch::new(Vec::new(), "", 1.2),
            Err(DomainError::ConfidenceOutOfRange(1.2))
        );

        let raw = json!({ "operations": [], "confidence": -0.1 });
        assert_eq!(Patch::from_value(&raw), Err(DomainError::ConfidenceOutOfRange(-0.1)));
    }

    #[test]
    fn missing_envelope_keys_default_for_replay() {
        let raw = json!({
            "operations": [{ "operation": "change_layout", "data": { "layout": "left" } }],
        });

        let patch = Patch::from_value(&raw).expect("defaulted envelope");
        assert!(!patch.id.0.is_empty());
        assert!(patch.description.is_empty());
        assert!((patch.confidence - 1.0).abs() < f64::EPSILON);
        assert!(matches!(&patch.ops[0].op, Operation::ChangeLayout { layout } if layout == "left"));
    }

    #[test]
    fn add_block_payload_round_trips_block_fields() {
        let raw = json!({
            "operations": [{
                "operation": "add_block",
                "block_id": "",
                "data": {
                    "type": "button",
                    "text": "Shop Now",
                    "style": { "backgroundColor": "#f59e0b" },
                    "position": { "x": 40.0, "y": 80.0 },
                },
                "reason": "add cta",
            }],
        });

        let patch = Patch::from_value(&raw).expect("add_block patch");
        let Operation::AddBlock { block } = &patch.ops[0].op else {
            panic!("expected add_block");
        };
        assert_eq!(block.kind, "button");
        assert_eq!(block.text.as_deref(), Some("Shop Now"));
        assert!(block.id.is_none());

        let round_tripped = Patch::from_value(&patch.to_value()).expect("round trip");
        assert_eq!(round_tripped.ops, patch.ops);
    }
}
