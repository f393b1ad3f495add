//! Skill responses and the builder handlers use to assemble them

use url::Url;

/// How a play directive interacts with the client's audio queue
#[allow(dead_code)] // Only REPLACE_ALL is issued today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayBehavior {
    /// Stop current playback and replace the whole queue
    ReplaceAll,
    /// Append to the end of the queue
    Enqueue,
    /// Replace everything queued after the current stream
    ReplaceEnqueued,
}

impl PlayBehavior {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReplaceAll => "REPLACE_ALL",
            Self::Enqueue => "ENQUEUE",
            Self::ReplaceEnqueued => "REPLACE_ENQUEUED",
        }
    }
}

/// Instruction for the client to start playing an audio stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDirective {
    pub play_behavior: PlayBehavior,
    pub url: Url,
    pub token: String,
    pub offset_ms: u64,
}

/// Outbound skill response
///
/// A response without speech is the empty response sent for notifications
/// that expect no user-visible output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub speech: Option<String>,
    pub reprompt: Option<String>,
    pub audio_directive: Option<AudioDirective>,
    /// `None` leaves the decision to the platform: it closes the session
    /// after speech-only output and hands control to the audio player
    pub should_end_session: Option<bool>,
}

impl Response {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.speech.is_none() && self.reprompt.is_none() && self.audio_directive.is_none()
    }

    /// True only when the skill explicitly closed the session
    pub fn ends_session(&self) -> bool {
        self.should_end_session == Some(true)
    }
}

/// Accumulates the parts of a [`Response`]
#[derive(Debug, Default)]
#[must_use]
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    pub fn speak(mut self, text: impl Into<String>) -> Self {
        self.response.speech = Some(text.into());
        self
    }

    /// A reprompt keeps the session open waiting for the user
    pub fn reprompt(mut self, text: impl Into<String>) -> Self {
        self.response.reprompt = Some(text.into());
        self.response.should_end_session = Some(false);
        self
    }

    pub fn play_audio(
        mut self,
        play_behavior: PlayBehavior,
        url: Url,
        token: impl Into<String>,
        offset_ms: u64,
    ) -> Self {
        self.response.audio_directive = Some(AudioDirective {
            play_behavior,
            url,
            token: token.into(),
            offset_ms,
        });
        self
    }

    pub fn end_session(mut self) -> Self {
        self.response.should_end_session = Some(true);
        self
    }

    pub fn build(self) -> Response {
        self.response
    }
}
