//! Session lifecycle and built-in intent handlers

use super::{RequestHandler, SkillError};
use crate::envelope::{Request, RequestEnvelope};
use crate::response::Response;
use crate::session::SessionAttributes;
use tracing::info;

pub const HELP_INTENT: &str = "AMAZON.HelpIntent";
pub const CANCEL_INTENT: &str = "AMAZON.CancelIntent";
pub const STOP_INTENT: &str = "AMAZON.StopIntent";
pub const FALLBACK_INTENT: &str = "AMAZON.FallbackIntent";

/// Greets the user when the skill is opened
pub struct LaunchHandler;

impl RequestHandler for LaunchHandler {
    fn name(&self) -> &'static str {
        "Launch"
    }

    fn can_handle(&self, envelope: &RequestEnvelope) -> bool {
        matches!(envelope.request, Request::Launch { .. })
    }

    fn handle(
        &self,
        _envelope: &RequestEnvelope,
        _attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        let speech =
            "Welcome to My Guitar Tuner. Please tell me which string you would like to tune.";
        Ok(Response::builder().speak(speech).reprompt(speech).build())
    }
}

pub struct CancelAndStopHandler;

impl RequestHandler for CancelAndStopHandler {
    fn name(&self) -> &'static str {
        "CancelAndStop"
    }

    fn can_handle(&self, envelope: &RequestEnvelope) -> bool {
        envelope.is_intent(CANCEL_INTENT) || envelope.is_intent(STOP_INTENT)
    }

    fn handle(
        &self,
        _envelope: &RequestEnvelope,
        _attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        Ok(Response::builder().speak("Goodbye!").end_session().build())
    }
}

/// Utterances the language model could not map to any intent
pub struct FallbackHandler;

impl RequestHandler for FallbackHandler {
    fn name(&self) -> &'static str {
        "Fallback"
    }

    fn can_handle(&self, envelope: &RequestEnvelope) -> bool {
        envelope.is_intent(FALLBACK_INTENT)
    }

    fn handle(
        &self,
        _envelope: &RequestEnvelope,
        _attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        let speech = "Sorry, I don't know about that. Please try again.";
        Ok(Response::builder().speak(speech).reprompt(speech).build())
    }
}

/// Session termination notice; the platform expects no output
pub struct SessionEndedHandler;

impl RequestHandler for SessionEndedHandler {
    fn name(&self) -> &'static str {
        "SessionEnded"
    }

    fn can_handle(&self, envelope: &RequestEnvelope) -> bool {
        matches!(envelope.request, Request::SessionEnded { .. })
    }

    fn handle(
        &self,
        envelope: &RequestEnvelope,
        _attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        if let Request::SessionEnded { reason, error, .. } = &envelope.request {
            info!(
                session_id = envelope.session_id(),
                reason = reason.as_deref(),
                error_type = error.as_ref().map(|e| e.error_type.as_str()),
                error_message = error.as_ref().map(|e| e.message.as_str()),
                "Session ended"
            );
        }
        Ok(Response::empty())
    }
}

/// Echoes back any intent nothing else claimed
///
/// Matches every intent request, so it has to be registered last.
pub struct IntentReflectorHandler;

impl RequestHandler for IntentReflectorHandler {
    fn name(&self) -> &'static str {
        "IntentReflector"
    }

    fn can_handle(&self, envelope: &RequestEnvelope) -> bool {
        matches!(envelope.request, Request::Intent { .. })
    }

    fn handle(
        &self,
        envelope: &RequestEnvelope,
        _attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        let intent = envelope.intent_name().unwrap_or_default();
        Ok(Response::builder()
            .speak(format!("You just triggered {intent}"))
            .build())
    }
}
