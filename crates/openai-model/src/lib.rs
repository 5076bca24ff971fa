//! A completion provider for OpenAI-compatible APIs.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use ensemble_model::{
    Completion, CompletionProvider, CompletionRequest, ErrorKind,
    ProviderError,
};
use reqwest::{Client, StatusCode, header};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

fn kind_for_failure(status: StatusCode, body: &str) -> ErrorKind {
    // Content-filter rejections arrive as plain client errors; the
    // error body carries the code.
    if body.contains("content_filter") || body.contains("content_policy") {
        return ErrorKind::Moderated;
    }
    match status {
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::Other,
    }
}

/// OpenAI-compatible completion provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl CompletionProvider for OpenAIProvider {
    type Error = Error;

    fn complete(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<Completion, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}{}", self.config.base_url, "/chat/completions"))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .json(&openai_req)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::new(
                    format!("transport error: {err}"),
                    ErrorKind::Other,
                )
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                error!("server returned {status}: {body}");
                return Err(Error::new(
                    format!("server returned {status}"),
                    kind_for_failure(status, &body),
                ));
            }

            let body: proto::ChatCompletion =
                resp.json().await.map_err(|err| {
                    Error::new(
                        format!("malformed response body: {err}"),
                        ErrorKind::Other,
                    )
                })?;
            trace!("received a completion: {body:?}");

            proto::parse_completion(body).ok_or_else(|| {
                Error::new(
                    "response contained no choices",
                    ErrorKind::Other,
                )
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_failure() {
        assert_eq!(
            kind_for_failure(StatusCode::TOO_MANY_REQUESTS, ""),
            ErrorKind::RateLimitExceeded
        );
        assert_eq!(
            kind_for_failure(
                StatusCode::BAD_REQUEST,
                r#"{"error":{"code":"content_filter","message":"blocked"}}"#,
            ),
            ErrorKind::Moderated
        );
        assert_eq!(
            kind_for_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ErrorKind::Other
        );
    }
}
