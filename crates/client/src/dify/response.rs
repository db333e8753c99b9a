//! Chat message response parsing.

use serde::Deserialize;

/// The parts of a blocking chat response that can carry the answer.
#[derive(Debug, Default, Deserialize)]
pub struct ChatResponse {
    pub answer: Option<String>,
    pub text: Option<String>,
    pub outputs: Option<ChatOutputs>,
    pub message_id: Option<String>,
}

/// Workflow-style outputs object.
#[derive(Debug, Default, Deserialize)]
pub struct ChatOutputs {
    pub answer: Option<String>,
    pub text: Option<String>,
    pub result: Option<String>,
}

impl ChatResponse {
    /// First non-blank answer: `answer`, `text`, then the `outputs` fields.
    pub fn into_answer(self) -> Option<String> {
        let outputs = self.outputs.unwrap_or_default();
        [self.answer, self.text, outputs.answer, outputs.text, outputs.result]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }
}

/// Extract the answer from a raw response body.
///
/// Some app types answer with a bare JSON string instead of an object.
pub fn extract_answer(body: &[u8]) -> Result<Option<String>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    match value {
        serde_json::Value::String(s) => Ok(Some(s).filter(|s| !s.trim().is_empty())),
        other => Ok(serde_json::from_value::<ChatResponse>(other)?.into_answer()),
    }
}
