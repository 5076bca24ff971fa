use ensemble_model::{
    ChatMessage, Completion, CompletionRequest, Role, ToolCallRequest,
    ToolChoice, ToolSchema, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OpenAIConfig;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionToolCall {
    pub name: String,
    /// JSON-encoded argument payload, as the wire format requires.
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub r#type: String,
    pub function: FunctionToolCall,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parallel_tool_calls: Option<bool>,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
    pub usage: Option<UsageBody>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct UsageBody {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &CompletionRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    let model = if req.model.is_empty() {
        config.model.clone()
    } else {
        req.model.clone()
    };
    ChatCompletionRequest {
        model,
        messages: req.messages.iter().map(create_message).collect(),
        tools: req.tools.iter().map(create_tool).collect(),
        tool_choice: req.tool_choice.map(tool_choice_value),
        parallel_tool_calls: req.parallel_tool_calls,
    }
}

fn create_message(msg: &ChatMessage) -> Message {
    match msg.role {
        Role::System => Message::System {
            content: msg.content.clone(),
        },
        Role::User => Message::User {
            content: msg.content.clone(),
        },
        Role::Assistant => Message::Assistant {
            content: (!msg.content.is_empty())
                .then(|| msg.content.clone()),
            tool_calls: (!msg.tool_calls.is_empty()).then(|| {
                msg.tool_calls.iter().map(create_tool_call).collect()
            }),
        },
        Role::Tool => Message::Tool {
            tool_call_id: msg
                .tool_call_id
                .clone()
                .unwrap_or_default(),
            content: msg.content.clone(),
        },
    }
}

fn create_tool_call(req: &ToolCallRequest) -> ToolCall {
    ToolCall {
        id: req.id.clone(),
        r#type: "function".to_owned(),
        function: FunctionToolCall {
            name: req.name.clone(),
            arguments: req.arguments.to_string(),
        },
    }
}

fn create_tool(schema: &ToolSchema) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: schema.name.clone(),
            description: schema.description.clone(),
            parameters: schema.parameters.clone(),
        },
    }
}

fn tool_choice_value(tool_choice: ToolChoice) -> &'static str {
    match tool_choice {
        ToolChoice::Auto => "auto",
        ToolChoice::None => "none",
        ToolChoice::Required => "required",
    }
}

pub fn parse_tool_call(call: ToolCall) -> ToolCallRequest {
    // The wire format carries arguments as a JSON-encoded string; a
    // payload that fails to parse is kept as a raw string so that the
    // executor can still report it.
    let arguments = serde_json::from_str(&call.function.arguments)
        .unwrap_or(Value::String(call.function.arguments));
    ToolCallRequest {
        id: call.id,
        name: call.function.name,
        arguments,
    }
}

pub fn parse_completion(body: ChatCompletion) -> Option<Completion> {
    let choice = body.choices.into_iter().next()?;
    let tool_calls: Vec<_> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(parse_tool_call)
        .collect();
    let message =
        ChatMessage::assistant(choice.message.content.unwrap_or_default())
            .with_tool_calls(tool_calls);
    let usage = body
        .usage
        .map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();
    Some(Completion::new(message, usage))
}
