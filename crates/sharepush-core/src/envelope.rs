use serde::{Deserialize, Serialize};

pub const NORMALIZED_DATA_TYPE: &str = "NormalizedData";

// --- JSON:API submission envelope ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedDataEnvelope {
    pub data: NormalizedDataResource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedDataResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: NormalizedDataAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedDataAttributes {
    #[serde(default)]
    pub tasks: Vec<String>,
    pub raw: Option<serde_json::Value>,
    pub data: GraphPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphPayload {
    #[serde(rename = "@graph")]
    pub graph: Vec<serde_json::Value>,
}

impl NormalizedDataEnvelope {
    pub fn new(graph: Vec<serde_json::Value>) -> Self {
        Self {
            data: NormalizedDataResource {
                resource_type: NORMALIZED_DATA_TYPE.to_string(),
                attributes: NormalizedDataAttributes {
                    tasks: Vec::new(),
                    raw: None,
                    data: GraphPayload { graph },
                },
            },
        }
    }
}
