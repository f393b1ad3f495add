//! Voice platform wire envelopes
//!
//! Inbound JSON decodes into [`RequestEnvelope`]; outbound responses are
//! encoded through [`ResponseEnvelope`]. Only the fields the skill reads are
//! modelled; everything else in the platform payload is ignored.

use crate::response::{AudioDirective, Response};
use crate::session::SessionAttributes;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Request envelope delivered by the voice platform
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[allow(dead_code)] // Deserialized for completeness
    #[serde(default)]
    pub version: String,
    /// Absent for out-of-session requests such as audio player events
    #[serde(default)]
    pub session: Option<Session>,
    pub request: Request,
}

/// Conversational session carried by the envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub new: bool,
    /// Attributes echoed back from the previous response
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: SessionAttributes,
}

/// Request kinds the skill distinguishes
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "LaunchRequest", rename_all = "camelCase")]
    Launch {
        #[serde(default)]
        request_id: String,
    },
    #[serde(rename = "IntentRequest", rename_all = "camelCase")]
    Intent {
        #[serde(default)]
        request_id: String,
        intent: Intent,
    },
    #[serde(rename = "SessionEndedRequest", rename_all = "camelCase")]
    SessionEnded {
        #[serde(default)]
        request_id: String,
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        error: Option<SessionEndedError>,
    },
    /// Any request type the skill has no model for
    #[serde(other)]
    Unsupported,
}

impl Request {
    /// Platform name of the request type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Launch { .. } => "LaunchRequest",
            Self::Intent { .. } => "IntentRequest",
            Self::SessionEnded { .. } => "SessionEndedRequest",
            Self::Unsupported => "Unsupported",
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Launch { request_id }
            | Self::Intent { request_id, .. }
            | Self::SessionEnded { request_id, .. } => Some(request_id.as_str()),
            Self::Unsupported => None,
        }
    }
}

/// Named user goal with its slots
#[derive(Debug, Clone, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slots: HashMap<String, Slot>,
}

impl Intent {
    /// Value of the named slot; empty values count as absent
    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.slots
            .get(name)
            .and_then(|slot| slot.value.as_deref())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Slot {
    #[allow(dead_code)] // Deserialized for completeness
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Error details attached to a session that ended abnormally
#[derive(Debug, Clone, Deserialize)]
pub struct SessionEndedError {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}

/// The platform sends `null` where it means "nothing here"
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RequestEnvelope {
    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.session_id.as_str())
    }

    pub fn intent(&self) -> Option<&Intent> {
        match &self.request {
            Request::Intent { intent, .. } => Some(intent),
            _ => None,
        }
    }

    pub fn intent_name(&self) -> Option<&str> {
        self.intent().map(|i| i.name.as_str())
    }

    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.intent().and_then(|i| i.slot_value(name))
    }

    /// True for an intent request naming exactly `name`
    pub fn is_intent(&self, name: &str) -> bool {
        self.intent_name() == Some(name)
    }
}

// ============================================================================
// Outbound
// ============================================================================

const RESPONSE_VERSION: &str = "1.0";

/// Response envelope returned to the voice platform
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: &'static str,
    #[serde(skip_serializing_if = "SessionAttributes::is_empty")]
    pub session_attributes: SessionAttributes,
    pub response: ResponseBody,
}

impl ResponseEnvelope {
    pub fn new(response: &Response, session_attributes: SessionAttributes) -> Self {
        Self {
            version: RESPONSE_VERSION,
            session_attributes,
            response: ResponseBody::from(response),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<Directive>,
    /// Omitted unless the skill decided whether the session continues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_end_session: Option<bool>,
}

impl From<&Response> for ResponseBody {
    fn from(response: &Response) -> Self {
        Self {
            output_speech: response.speech.as_deref().map(OutputSpeech::ssml),
            reprompt: response.reprompt.as_deref().map(|text| Reprompt {
                output_speech: OutputSpeech::ssml(text),
            }),
            directives: response
                .audio_directive
                .iter()
                .map(Directive::from)
                .collect(),
            should_end_session: response.should_end_session,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub speech_type: &'static str,
    pub ssml: String,
}

impl OutputSpeech {
    pub fn ssml(text: &str) -> Self {
        Self {
            speech_type: "SSML",
            ssml: format!("<speak>{}</speak>", escape_ssml(text)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Directive {
    #[serde(rename = "AudioPlayer.Play", rename_all = "camelCase")]
    AudioPlayerPlay {
        play_behavior: &'static str,
        audio_item: AudioItem,
    },
}

impl From<&AudioDirective> for Directive {
    fn from(directive: &AudioDirective) -> Self {
        Self::AudioPlayerPlay {
            play_behavior: directive.play_behavior.as_str(),
            audio_item: AudioItem {
                stream: AudioStream {
                    url: directive.url.to_string(),
                    token: directive.token.clone(),
                    offset_in_milliseconds: directive.offset_ms,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AudioItem {
    pub stream: AudioStream,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioStream {
    pub url: String,
    pub token: String,
    pub offset_in_milliseconds: u64,
}

fn escape_ssml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
