use crate::config::GenerationParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl InlineImage {
    /// Approximate decoded size, used for the inline upload limit.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }
}

/// One request fragment. Serializes to the wire shape directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineImage {
        #[serde(rename = "inlineData")]
        inline_data: InlineImage,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }
}

/// Ordered request parts plus generation parameters.
///
/// The first part is always the instruction text; an image, when present,
/// follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    parts: Vec<Part>,
    pub generation: GenerationParams,
}

impl RequestEnvelope {
    pub fn new(
        instruction: impl Into<String>,
        image: Option<InlineImage>,
        generation: GenerationParams,
    ) -> Self {
        let mut parts = vec![Part::text(instruction)];
        // An image without bytes is treated as absent.
        if let Some(inline_data) = image.filter(|img| !img.data.is_empty()) {
            parts.push(Part::InlineImage { inline_data });
        }
        Self { parts, generation }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Part::InlineImage { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    #[serde(other)]
    Other,
}

/// One output fragment of a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputPart {
    Text { text: String },
    // Function calls, executable code, or anything else without text.
    Other(serde_json::Value),
}

impl OutputPart {
    pub fn text(&self) -> Option<&str> {
        match self {
            OutputPart::Text { text } => Some(text),
            OutputPart::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<OutputPart>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

impl Candidate {
    pub fn from_texts<I, S>(texts: I, finish_reason: Option<FinishReason>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            content: Some(CandidateContent {
                parts: texts
                    .into_iter()
                    .map(|t| OutputPart::Text { text: t.into() })
                    .collect(),
            }),
            finish_reason,
        }
    }

    pub fn parts(&self) -> &[OutputPart] {
        self.content.as_ref().map(|c| c.parts.as_slice()).unwrap_or(&[])
    }

    pub fn is_truncated(&self) -> bool {
        self.finish_reason == Some(FinishReason::MaxTokens)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}
