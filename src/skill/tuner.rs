//! Guitar tuner intents
//!
//! The selected string lives in the `guitar_string` session attribute and is
//! shared by Help, ChooseString and PlayReference.

use super::handlers::HELP_INTENT;
use super::{RequestHandler, SkillError};
use crate::envelope::RequestEnvelope;
use crate::response::{PlayBehavior, Response};
use crate::session::{AttributeValue, SessionAttributes};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use url::Url;

pub const SELECTED_STRING_KEY: &str = "guitar_string";
pub const USAGE_COUNT_KEY: &str = "usageCount";

const STRING_SLOT: &str = "guitar_string";
const CHOOSE_STRING_INTENT: &str = "ChooseString";
const PLAY_REFERENCE_INTENT: &str = "PlayReference";
const CHECK_TUNE_INTENT: &str = "CheckTune";
const TRACK_USAGE_INTENT: &str = "TrackUsage";

/// Strings the skill has reference audio for
///
/// Parsing is an exact match on the spoken form: no case folding or
/// whitespace trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuitarString {
    E,
    A,
    D,
    G,
    B,
    HighE,
    LowE,
}

impl GuitarString {
    pub const ALL: [Self; 7] = [
        Self::E,
        Self::A,
        Self::D,
        Self::G,
        Self::B,
        Self::HighE,
        Self::LowE,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::E => "E",
            Self::A => "A",
            Self::D => "D",
            Self::G => "G",
            Self::B => "B",
            Self::HighE => "high E",
            Self::LowE => "low E",
        }
    }

    /// Token naming the reference recording (spaces become underscores)
    pub fn audio_token(self) -> String {
        self.as_str().replace(' ', "_")
    }
}

impl fmt::Display for GuitarString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot value outside the supported set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownString(pub String);

impl FromStr for GuitarString {
    type Err = UnknownString;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownString(s.to_string()))
    }
}

fn correction(value: &str) -> Response {
    Response::builder()
        .speak(format!(
            "Sorry, {value} is not a string I can tune. Please choose E, A, D, G, B, high E, or low E."
        ))
        .reprompt("Which string would you like to tune? You can say E, A, D, G, B, high E, or low E.")
        .build()
}

pub struct HelpHandler;

impl RequestHandler for HelpHandler {
    fn name(&self) -> &'static str {
        "Help"
    }

    fn can_handle(&self, envelope: &RequestEnvelope) -> bool {
        envelope.is_intent(HELP_INTENT)
    }

    fn handle(
        &self,
        _envelope: &RequestEnvelope,
        attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        let current = attributes.get_str(SELECTED_STRING_KEY).unwrap_or("none");
        Ok(Response::builder()
            .speak(format!(
                "This skill helps you tune your guitar. Currently, you have selected the {current} string. You can ask me to play a reference sound or choose a different string."
            ))
            .reprompt("What would you like to do?")
            .build())
    }
}

/// Validates the requested string and remembers it for the session
pub struct ChooseStringHandler;

impl RequestHandler for ChooseStringHandler {
    fn name(&self) -> &'static str {
        "ChooseString"
    }

    fn can_handle(&self, envelope: &RequestEnvelope) -> bool {
        envelope.is_intent(CHOOSE_STRING_INTENT)
    }

    fn handle(
        &self,
        envelope: &RequestEnvelope,
        attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        let Some(value) = envelope.slot_value(STRING_SLOT) else {
            return Ok(Response::builder()
                .speak("Please tell me which string you would like to tune.")
                .reprompt("Which string would you like to tune?")
                .build());
        };

        let string = match value.parse::<GuitarString>() {
            Ok(string) => string,
            Err(UnknownString(value)) => {
                debug!(value = %value, "Rejected string choice");
                return Ok(correction(&value));
            }
        };

        attributes.set(SELECTED_STRING_KEY, string.as_str());
        Ok(Response::builder()
            .speak(format!("The string you want to tune is {string}."))
            .build())
    }
}

/// Plays the reference recording for the requested or selected string
///
/// A string named in the request wins over the one stored in the session.
pub struct PlayReferenceHandler {
    audio_base_url: Url,
}

impl PlayReferenceHandler {
    /// `audio_base_url` is the directory holding `<token>.mp3` files
    pub fn new(audio_base_url: Url) -> Self {
        Self { audio_base_url }
    }

    fn audio_url(&self, token: &str) -> Result<Url, SkillError> {
        self.audio_base_url
            .join(&format!("{token}.mp3"))
            .map_err(|source| SkillError::AudioUrl {
                token: token.to_string(),
                source,
            })
    }
}

impl RequestHandler for PlayReferenceHandler {
    fn name(&self) -> &'static str {
        "PlayReference"
    }

    fn can_handle(&self, envelope: &RequestEnvelope) -> bool {
        envelope.is_intent(PLAY_REFERENCE_INTENT)
    }

    fn handle(
        &self,
        envelope: &RequestEnvelope,
        attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        let Some(value) = envelope
            .slot_value(STRING_SLOT)
            .or_else(|| attributes.get_str(SELECTED_STRING_KEY))
        else {
            return Ok(Response::builder()
                .speak("Which string would you like to hear?")
                .reprompt("Please tell me which string to play.")
                .build());
        };

        let string = match value.parse::<GuitarString>() {
            Ok(string) => string,
            Err(UnknownString(value)) => return Ok(correction(&value)),
        };

        let token = string.audio_token();
        let url = self.audio_url(&token)?;
        debug!(%url, token = %token, "Playing reference tone");

        Ok(Response::builder()
            .speak(format!("Here is the reference sound for the {string} string."))
            .play_audio(PlayBehavior::ReplaceAll, url, token, 0)
            .build())
    }
}

pub struct CheckTuneHandler;

impl RequestHandler for CheckTuneHandler {
    fn name(&self) -> &'static str {
        "CheckTune"
    }

    fn can_handle(&self, envelope: &RequestEnvelope) -> bool {
        envelope.is_intent(CHECK_TUNE_INTENT)
    }

    fn handle(
        &self,
        _envelope: &RequestEnvelope,
        _attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        Ok(Response::builder()
            .speak("It sounds like your tuning is getting better! Keep practicing.")
            .build())
    }
}

/// Counts how often the user asked for their usage within the session
pub struct TrackUsageHandler;

impl RequestHandler for TrackUsageHandler {
    fn name(&self) -> &'static str {
        "TrackUsage"
    }

    fn can_handle(&self, envelope: &RequestEnvelope) -> bool {
        envelope.is_intent(TRACK_USAGE_INTENT)
    }

    fn handle(
        &self,
        _envelope: &RequestEnvelope,
        attributes: &mut SessionAttributes,
    ) -> Result<Response, SkillError> {
        let previous = match attributes.get(USAGE_COUNT_KEY) {
            None => 0,
            Some(AttributeValue::Integer(n)) => *n,
            Some(_) => {
                return Err(SkillError::AttributeType {
                    key: USAGE_COUNT_KEY,
                    expected: "an integer",
                })
            }
        };
        let count = previous.saturating_add(1);

        attributes.set(USAGE_COUNT_KEY, count);
        Ok(Response::builder()
            .speak(format!("You have used Guitar Tuner {count} times. Keep it up!"))
            .build())
    }
}
