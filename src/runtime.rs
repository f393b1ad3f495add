//! Session-scoped request execution
//!
//! Loads a session's attributes, runs the dispatcher and commits or discards
//! the attributes depending on how the session continues.

use crate::envelope::{Request, RequestEnvelope, ResponseEnvelope};
use crate::session::{SessionAttributes, SessionStore};
use crate::skill::Skill;
use std::sync::Arc;
use tracing::{debug, info};

/// Binds the dispatcher to session persistence
pub struct SkillRuntime {
    skill: Arc<Skill>,
    sessions: Arc<dyn SessionStore>,
}

impl SkillRuntime {
    pub fn new(skill: Arc<Skill>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { skill, sessions }
    }

    /// Handle one envelope end to end
    pub fn handle(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        let mut attributes = self.load_attributes(envelope);
        let response = self.skill.dispatch(envelope, &mut attributes);

        if let Some(session_id) = envelope.session_id() {
            let ended = matches!(envelope.request, Request::SessionEnded { .. });
            if ended || response.ends_session() {
                debug!(session_id, "Discarding session attributes");
                self.sessions.remove(session_id);
            } else {
                self.sessions.set(session_id, attributes.clone());
            }
        }

        info!(
            request_type = envelope.request.kind(),
            intent = envelope.intent_name(),
            session_id = envelope.session_id(),
            end_session = ?response.should_end_session,
            "Request handled"
        );

        ResponseEnvelope::new(&response, attributes)
    }

    fn load_attributes(&self, envelope: &RequestEnvelope) -> SessionAttributes {
        let Some(session) = &envelope.session else {
            return SessionAttributes::new();
        };

        if session.new {
            return SessionAttributes::new();
        }

        self.sessions
            .get(&session.session_id)
            .unwrap_or_else(|| session.attributes.clone())
    }
}
