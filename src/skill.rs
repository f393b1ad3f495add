//! Intent routing for the tuner skill
//!
//! A [`Skill`] holds an ordered chain of [`RequestHandler`]s and a single
//! [`ErrorHandler`]. The first handler whose predicate accepts the request
//! runs; unmatched requests and failed actions go to the error handler.

mod error_handler;
mod handlers;
#[cfg(test)]
mod proptests;
mod tuner;

pub use error_handler::ApologyErrorHandler;
pub use handlers::{
    CancelAndStopHandler, FallbackHandler, IntentReflectorHandler, LaunchHandler,
    SessionEndedHandler,
};
pub use tuner::{
    CheckTuneHandler, ChooseStringHandler, HelpHandler, PlayReferenceHandler, TrackUsageHandler,
};

use crate::envelope::RequestEnvelope;
use crate::response::Response;
use crate::session::SessionAttributes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Failures routed to the error handler
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("Unable to find a suitable request handler for {request_type}{}", intent_suffix(.intent))]
    NoHandlerMatched {
        request_type: &'static str,
        intent: Option<String>,
    },
    #[error("Session attribute `{key}` is not {expected}")]
    AttributeType {
        key: &'static str,
        expected: &'static str,
    },
    #[error("Cannot build audio URL for `{token}`: {source}")]
    AudioUrl {
        token: String,
        #[source]
        source: url::ParseError,
    },
}

fn intent_suffix(intent: &Option<String>) -> String {
    intent.as_deref().map(|i| format!(" ({i})")).unwrap_or_default()
}

/// One link of the dispatch chain
pub trait RequestHandler: Send + Sync {
    /// Handler name for logs
    fn name(&self) -> &'static str;

    /// Whether this handler accepts the request
    fn can_handle(&self, envelope: &RequestEnvelope) -> bool;

    /// Produce the response, reading and writing session attributes
    fn handle(
        &self,
        envelope: &RequestEnvelope,
        attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError>;
}

/// Catch-all invoked when dispatch cannot produce a response
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, envelope: &RequestEnvelope, error: &SkillError) -> Response;
}

/// Ordered request dispatcher
pub struct Skill {
    handlers: Vec<Arc<dyn RequestHandler>>,
    error_handler: Arc<dyn ErrorHandler>,
}

impl Skill {
    pub fn builder() -> SkillBuilder {
        SkillBuilder::default()
    }

    /// The tuner skill with its standard handler order
    ///
    /// Specific intents come before the fallback, and the reflector is last
    /// so it cannot shadow them.
    pub fn tuner(audio_base_url: Url) -> Self {
        Self::builder()
            .add_request_handlers([
                Arc::new(LaunchHandler) as Arc<dyn RequestHandler>,
                Arc::new(HelpHandler),
                Arc::new(CancelAndStopHandler),
                Arc::new(ChooseStringHandler),
                Arc::new(PlayReferenceHandler::new(audio_base_url)),
                Arc::new(CheckTuneHandler),
                Arc::new(TrackUsageHandler),
                Arc::new(FallbackHandler),
                Arc::new(SessionEndedHandler),
                Arc::new(IntentReflectorHandler),
            ])
            .with_error_handler(ApologyErrorHandler)
            .build()
    }

    /// Handler names in registration order
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Route one request to exactly one handler (or the error handler)
    ///
    /// Attribute changes are committed only when the action succeeds.
    #[instrument(
        skip_all,
        fields(
            request_type = envelope.request.kind(),
            intent = envelope.intent_name(),
        )
    )]
    pub fn dispatch(&self, envelope: &RequestEnvelope, attributes: &mut SessionAttributes) -> Response {
        match self.route(envelope, attributes) {
            Ok(response) => response,
            Err(e) => self.error_handler.handle(envelope, &e),
        }
    }

    fn route(
        &self,
        envelope: &RequestEnvelope,
        attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        let handler = self
            .handlers
            .iter()
            .find(|h| h.can_handle(envelope))
            .ok_or_else(|| SkillError::NoHandlerMatched {
                request_type: envelope.request.kind(),
                intent: envelope.intent_name().map(str::to_string),
            })?;

        debug!(handler = handler.name(), "Routing request");

        let mut scratch = attributes.clone();
        let response = handler.handle(envelope, &mut scratch)?;
        *attributes = scratch;
        Ok(response)
    }
}

/// Assembles a [`Skill`]; registration order is dispatch order
#[derive(Default)]
#[must_use]
pub struct SkillBuilder {
    handlers: Vec<Arc<dyn RequestHandler>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl SkillBuilder {
    #[allow(dead_code)] // Used by tests and custom handler chains
    pub fn add_request_handler(mut self, handler: impl RequestHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn add_request_handlers(
        mut self,
        handlers: impl IntoIterator<Item = Arc<dyn RequestHandler>>,
    ) -> Self {
        self.handlers.extend(handlers);
        self
    }

    pub fn with_error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Falls back to [`ApologyErrorHandler`] when none was given
    pub fn build(self) -> Skill {
        Skill {
            handlers: self.handlers,
            error_handler: self
                .error_handler
                .unwrap_or_else(|| Arc::new(ApologyErrorHandler)),
        }
    }
}
