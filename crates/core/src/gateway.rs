use std::pin::Pin;
use std::sync::Arc;

use ensemble_model::{
    ChatMessage, Completion, CompletionProvider, CompletionRequest,
    ProviderError, ToolChoice,
};
use tracing::Instrument;

use crate::agent::Agent;
use crate::context::Context;
use crate::tool::object::schema_of;

type FetchResult = Result<Completion, Box<dyn ProviderError>>;
type BoxedFetchFuture = Pin<Box<dyn Future<Output = FetchResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(CompletionRequest) -> BoxedFetchFuture + Send + Sync>;

/// A wrapper around a completion provider that maintains an execution
/// environment for the provider and provides a type-erased interface
/// for the other modules.
///
/// This layer does not retry: transport and engine errors propagate to
/// the caller boxed, and the run they belong to is over.
#[derive(Clone)]
pub struct CompletionClient {
    handler_fn: HandlerFn,
}

impl CompletionClient {
    /// Creates a client wrapping the given provider.
    #[inline]
    pub fn new<P: CompletionProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `CompletionClient`
        // doesn't have a generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.complete(&req);
            Box::pin(
                async move {
                    trace!("sending a request: {req:?}");
                    match fut.await {
                        Ok(completion) => Ok(completion),
                        Err(err) => {
                            error!("completion request failed: {err:?}");
                            Err(Box::new(err) as Box<dyn ProviderError>)
                        }
                    }
                }
                .instrument(trace_span!("completion request")),
            )
        });
        Self { handler_fn }
    }

    /// Submits the agent's instructions plus the full prior history to
    /// the completion engine, returning one assistant message annotated
    /// with the agent's name, plus its usage.
    pub async fn fetch_response(
        &self,
        agent: &Agent,
        history: &[ChatMessage],
        ctx: &Context,
    ) -> FetchResult {
        let request = build_request(agent, history, ctx);
        let completion = (self.handler_fn)(request).await?;
        let message = completion.message.with_sender(agent.name());
        Ok(Completion {
            message,
            usage: completion.usage,
        })
    }
}

fn build_request(
    agent: &Agent,
    history: &[ChatMessage],
    ctx: &Context,
) -> CompletionRequest {
    let instructions = agent.instructions().effective(ctx);
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(instructions.into_owned()));
    messages.extend_from_slice(history);

    let tools: Vec<_> = agent
        .tools()
        .iter()
        .map(|tool| schema_of(tool.as_ref()))
        .collect();
    // Without tools there is nothing to constrain, so no tool-choice
    // directive and no parallel flag are sent.
    let (tool_choice, parallel_tool_calls) = if tools.is_empty() {
        (None, None)
    } else {
        (
            Some(agent.tool_choice().unwrap_or(ToolChoice::Auto)),
            (!agent.parallel_tool_calls()).then_some(false),
        )
    };

    CompletionRequest {
        model: agent.model().to_owned(),
        messages,
        tools,
        tool_choice,
        parallel_tool_calls,
    }
}

#[cfg(test)]
mod tests {
    use ensemble_model::Role;
    use serde_json::{Value, json};

    use super::*;
    use crate::agent::AgentBuilder;
    use crate::tool::{FunctionTool, ParamKind, Parameter, ToolOutcome};
    use ensemble_test_model::{PresetResponse, TestProvider};

    fn lookup_tool() -> FunctionTool {
        FunctionTool::new(
            "lookup",
            "Looks up a record",
            &[Parameter::new("key", ParamKind::String)],
            |_args, _ctx| Ok(ToolOutcome::text("found")),
        )
    }

    #[test]
    fn test_build_request_without_tools() {
        let agent = AgentBuilder::new("Plain")
            .with_model("test-model")
            .with_instructions("Be brief.")
            .build();
        let history = [ChatMessage::user("Hi")];

        let request = build_request(&agent, &history, &Context::new());

        assert_eq!(request.model, "test-model");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, "Be brief.");
        assert!(request.tools.is_empty());
        assert_eq!(request.tool_choice, None);
        assert_eq!(request.parallel_tool_calls, None);
    }

    #[test]
    fn test_build_request_with_tools() {
        let agent = AgentBuilder::new("Tooled")
            .with_function(lookup_tool())
            .with_parallel_tool_calls(false)
            .build();

        let request = build_request(&agent, &[], &Context::new());

        assert_eq!(request.tools.len(), 1);
        assert_eq!(request.tools[0].name, "lookup");
        assert_eq!(
            request.tools[0].parameters["properties"]["key"],
            json!({ "type": "string" })
        );
        assert_eq!(request.tool_choice, Some(ToolChoice::Auto));
        assert_eq!(request.parallel_tool_calls, Some(false));
    }

    #[test]
    fn test_dynamic_instructions_are_recomputed() {
        let agent = AgentBuilder::new("Dyn")
            .with_dynamic_instructions(|ctx| {
                format!(
                    "Stage: {}",
                    ctx.get("stage").cloned().unwrap_or(Value::Null)
                )
            })
            .build();

        let mut ctx = Context::new();
        ctx.insert("stage", "intake");
        let request = build_request(&agent, &[], &ctx);
        assert_eq!(request.messages[0].content, "Stage: \"intake\"");
    }

    #[tokio::test]
    async fn test_fetch_response_annotates_sender() {
        let mut provider = TestProvider::default();
        provider.add_response(PresetResponse::text("Hello!"));

        let client = CompletionClient::new(provider);
        let agent = AgentBuilder::new("Greeter").build();
        let completion = client
            .fetch_response(&agent, &[ChatMessage::user("Hi")], &Context::new())
            .await
            .unwrap();

        assert_eq!(completion.message.sender.as_deref(), Some("Greeter"));
        assert_eq!(completion.message.content, "Hello!");
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        // An empty script fails every request.
        let provider = TestProvider::default();
        let client = CompletionClient::new(provider);
        let agent = AgentBuilder::new("Greeter").build();

        let result = client
            .fetch_response(&agent, &[], &Context::new())
            .await;
        assert!(result.is_err());
    }
}
