//! Catch-all error handler

use super::{ErrorHandler, SkillError};
use crate::envelope::RequestEnvelope;
use crate::response::Response;
use tracing::warn;

const APOLOGY: &str = "Sorry, I had trouble doing what you asked. Please try again.";

/// Apologizes and keeps the session open so the user can retry
pub struct ApologyErrorHandler;

impl ErrorHandler for ApologyErrorHandler {
    fn handle(&self, envelope: &RequestEnvelope, error: &SkillError) -> Response {
        warn!(
            error = %error,
            request_type = envelope.request.kind(),
            request_id = envelope.request.request_id(),
            session_id = envelope.session_id(),
            "Error handled"
        );

        Response::builder().speak(APOLOGY).reprompt(APOLOGY).build()
    }
}
