//! Wire types shared by the Afina client and its frontends.
//!
//! Shapes mirror the chat/RAG backend endpoints: `POST /chat`, `POST /upload`,
//! `GET /databases`, `POST /selected_databases` and `GET /parameters`.

use serde::{Deserialize, Serialize};

/// Generation and retrieval knobs sent with every chat request.
///
/// A `None` field is a value that failed numeric parsing. It serialises as
/// JSON `null`, which is what the backend has always received for `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagParameters {
    pub n_predict: Option<i64>,
    pub temperature: Option<f64>,
    pub top_k: Option<i64>,
    pub rag_k: Option<i64>,
    pub rag_sim_threshold: Option<f64>,
}

impl Default for RagParameters {
    fn default() -> Self {
        Self {
            n_predict: Some(512),
            temperature: Some(0.7),
            top_k: Some(40),
            rag_k: Some(3),
            rag_sim_threshold: Some(0.3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub selected_databases: Vec<i64>,
    pub rag_parameters: RagParameters,
}

/// `response` carries rendered HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub id: i64,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionUpdate {
    pub selected: Vec<i64>,
}

/// 2xx body of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub message: String,
}

/// Non-2xx body of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRejection {
    #[serde(default)]
    pub error: String,
}

/// How the backend splits uploaded documents before indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorType {
    #[default]
    Chunk,
    Paragraphs,
}

impl GeneratorType {
    pub fn as_str(self) -> &'static str {
        match self {
            GeneratorType::Chunk => "chunk",
            GeneratorType::Paragraphs => "paragraphs",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            GeneratorType::Chunk => GeneratorType::Paragraphs,
            GeneratorType::Paragraphs => GeneratorType::Chunk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_matches_backend_shape() {
        let req = ChatRequest {
            message: "hi".into(),
            selected_databases: vec![0, 2],
            rag_parameters: RagParameters::default(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["message"], "hi");
        assert_eq!(v["selected_databases"], serde_json::json!([0, 2]));
        assert_eq!(v["rag_parameters"]["n_predict"], 512);
        assert_eq!(v["rag_parameters"]["top_k"], 40);
        assert_eq!(v["rag_parameters"]["rag_sim_threshold"], 0.3);
    }

    #[test]
    fn unparsed_parameter_goes_out_as_null() {
        let p = RagParameters { temperature: None, ..RagParameters::default() };
        let v = serde_json::to_value(p).unwrap();
        assert!(v["temperature"].is_null());
        let back: RagParameters = serde_json::from_value(v).unwrap();
        assert_eq!(back.temperature, None);
    }

    #[test]
    fn missing_parameters_fall_back_to_defaults() {
        let p: RagParameters = serde_json::from_str(r#"{"top_k": 7}"#).unwrap();
        assert_eq!(p.top_k, Some(7));
        assert_eq!(p.n_predict, Some(512));
    }

    #[test]
    fn generator_type_wire_names() {
        assert_eq!(GeneratorType::default().as_str(), "chunk");
        assert_eq!(GeneratorType::Chunk.toggled(), GeneratorType::Paragraphs);
        assert_eq!(serde_json::to_string(&GeneratorType::Paragraphs).unwrap(), "\"paragraphs\"");
    }
}
