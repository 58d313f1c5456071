//! Model stream port for generative-model output.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

/// Boxed future type alias used by [`ModelStream`] to keep the trait dyn-compatible.
pub type StreamFuture<'a> = Pin<
    Box<dyn Future<Output = Result<FragmentReceiver, Box<dyn Error + Send + Sync>>> + Send + 'a>,
>;

/// Receiving end of one model call's fragment sequence.
pub type FragmentReceiver = mpsc::UnboundedReceiver<Fragment>;

/// One chunk of model output, delivered in arrival order.
///
/// Fragment granularity is provider-defined — a token, a line, or an
/// arbitrary chunk. Consumers must not assume fragment boundaries align with
/// semantic boundaries: a fenced block's opening delimiter can span two
/// fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Generated text.
    Text(String),
    /// Terminal error marker: the stream failed and yields nothing more.
    ///
    /// Always the last item on a receiver. Callers must treat it as
    /// end-of-stream, never as generated content.
    Failed(String),
}

impl Fragment {
    /// Returns the text content, or `None` for the error marker.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Fragment::Text(text) => Some(text),
            Fragment::Failed(_) => None,
        }
    }
}

/// A request for one streamed model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    /// The model identifier (e.g. `"gemini-2.0-flash"`).
    pub model: String,
    /// The rendered prompt to send.
    pub prompt: String,
}

/// Streams text fragments from a generative model.
///
/// Cancellation is cooperative: dropping the receiver stops consumption and
/// no explicit cancel token exists downstream.
pub trait ModelStream: Send + Sync {
    /// Starts one model call and returns its fragment receiver.
    ///
    /// # Errors
    ///
    /// Returns an error when the call cannot be started at all (network,
    /// auth, rejected request). A call that starts and then dies mid-stream
    /// surfaces a [`Fragment::Failed`] marker on the receiver instead of an
    /// error.
    fn stream(&self, request: &StreamRequest) -> StreamFuture<'_>;
}
