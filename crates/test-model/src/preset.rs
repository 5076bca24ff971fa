use ensemble_model::{ChatMessage, Completion, ToolCallRequest, Usage};
use serde::{Deserialize, Serialize};

/// The preset for one scripted assistant response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetResponse {
    /// The assistant text of this response.
    pub text: String,
    /// Tool calls requested by this response.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The usage reported with this response.
    pub usage: Usage,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a preset that responds with plain assistant text.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Creates a preset that responds with the given tool calls.
    #[inline]
    pub fn tool_calls(
        tool_calls: impl Into<Vec<ToolCallRequest>>,
    ) -> Self {
        Self {
            tool_calls: tool_calls.into(),
            ..Default::default()
        }
    }

    /// Sets the assistant text of this response.
    #[inline]
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the usage reported with this response.
    #[inline]
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    pub(crate) fn into_completion(self) -> Completion {
        let message =
            ChatMessage::assistant(self.text).with_tool_calls(self.tool_calls);
        Completion::new(message, self.usage)
    }
}
