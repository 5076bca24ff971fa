//! A local fake completion engine for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ensemble_model::{
    Completion, CompletionProvider, CompletionRequest, ErrorKind,
    ProviderError,
};
use tokio::time::sleep;

pub use preset::*;

/// Error type for [`TestProvider`].
#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
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

/// A local fake completion engine for testing purpose.
///
/// Before sending requests, you need to setup the response script,
/// which is how the engine should respond to each request. Scripted
/// responses are consumed in order, one per request. If the script
/// runs out of responses, an error will be returned.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy
/// memory copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestProvider {
    script: Arc<Mutex<VecDeque<PresetResponse>>>,
    delay: Option<Duration>,
}

impl TestProvider {
    /// Appends a scripted response to the script.
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.script
            .lock()
            .expect("script lock is poisoned")
            .push_back(preset);
    }

    /// Sets an artificial latency for every request.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }
}

impl CompletionProvider for TestProvider {
    type Error = Error;

    fn complete(
        &self,
        _req: &CompletionRequest,
    ) -> impl Future<Output = Result<Completion, Self::Error>> + Send + 'static
    {
        let script = Arc::clone(&self.script);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }

            let mut script = script.lock().expect("script lock is poisoned");
            let Some(preset) = script.pop_front() else {
                return Err(Error {
                    message: "no more scripted responses",
                    kind: ErrorKind::RateLimitExceeded,
                });
            };
            match preset.failures {
                Some(0) => {
                    // Failing infinitely, keep the preset in place.
                    script.push_front(preset);
                    Err(Error {
                        message: "scripted failure",
                        kind: ErrorKind::Other,
                    })
                }
                Some(remaining) => {
                    let mut preset = preset;
                    preset.failures =
                        (remaining > 1).then_some(remaining - 1);
                    script.push_front(preset);
                    Err(Error {
                        message: "scripted failure",
                        kind: ErrorKind::Other,
                    })
                }
                None => Ok(preset.into_completion()),
            }
        }
    }
}
