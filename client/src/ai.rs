//! # AI Proxy Parsing
//!
//! The campfire talks through a thin proxy in front of a language-model
//! API: `POST /api/chat {prompt}` for text and `POST /api/tts {text}` for
//! speech. This module owns the prompts, the extraction of the generated
//! text/audio out of the candidates envelope, and the fire command tags
//! the model may embed in a reply (`[STOKE]`, `[DIM]`, `[SNOW]`, `[RAIN]`,
//! `[CLEAR]`, `[COLOR: #rrggbb]`), which are stripped from the displayed
//! text and forwarded into room-state patches.
//!
//! The HTTP transport itself is an external collaborator behind
//! `FlameOracle`; everything here is pure parsing.

use serde_json::{json, Value};

use campfire_shared::error::{CampfireError, CampfireResult};
use campfire_shared::room::Weather;
use campfire_shared::types::Color;

/// Shown when a reply is empty after stripping command tags, or when the
/// proxy response is malformed.
pub const FALLBACK_LINE: &str = "*The fire crackles and changes color.*";

/// Fire intensity set by `[STOKE]`
pub const STOKED_INTENSITY: f32 = 1.5;

/// Fire intensity set by `[DIM]`
pub const DIMMED_INTENSITY: f32 = 0.5;

/// Transport to the AI proxy. Returns the raw response document.
pub trait FlameOracle: Send + Sync {
    fn generate(&self, prompt: &str) -> CampfireResult<Value>;
}

/// The persona prompt for talking to the fire
pub fn chat_prompt(user_text: &str) -> String {
    format!(
        "You are a magical campfire. User says: \"{user_text}\". Reply shortly.\n\
         Commands you can use:\n\
         [COLOR: #hex] - Change fire color\n\
         [STOKE] - Increase fire intensity\n\
         [DIM] - Decrease fire intensity\n\
         [SNOW] - Start snowing\n\
         [RAIN] - Start raining\n\
         [CLEAR] - Clear weather\n\n\
         Example reply: \"I shall summon the storm. [RAIN] [COLOR: #0000FF]\""
    )
}

/// The story request prompt; an empty topic falls back to the default mood
pub fn story_prompt(topic: &str) -> String {
    let topic = topic.trim();
    let topic = if topic.is_empty() { "a mysterious but cozy night" } else { topic };
    format!(
        "Write a very short, cozy campfire story about {topic}. \
         Under 100 words. Divide it into short sentences. No title."
    )
}

/// Extract the generated text from a chat response:
/// `candidates[0].content.parts[0].text`
pub fn extract_text(response: &Value) -> CampfireResult<String> {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or(CampfireError::MalformedResponse("candidates[0].content.parts[0].text"))
}

/// Extract the base64 PCM16 payload from a TTS response. The audio is
/// opaque to this subsystem; decoding and playback are the caller's.
pub fn extract_audio(response: &Value) -> CampfireResult<String> {
    response["candidates"][0]["content"]["parts"][0]["inlineData"]["data"]
        .as_str()
        .map(str::to_string)
        .ok_or(CampfireError::MalformedResponse(
            "candidates[0].content.parts[0].inlineData.data",
        ))
}

/// Commands carried by a reply, plus the reply text with tags stripped
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlameDirectives {
    pub color: Option<Color>,
    pub intensity: Option<f32>,
    pub weather: Option<Weather>,
    pub text: String,
}

impl FlameDirectives {
    /// The room-state merge patch these directives imply, if any.
    /// Intensity is a local effect and never leaves the client.
    pub fn to_patch(&self) -> Option<Value> {
        if self.color.is_none() && self.weather.is_none() {
            return None;
        }
        let mut patch = json!({});
        if let Some(color) = self.color {
            patch["fireColor"] = json!(color);
        }
        if let Some(weather) = self.weather {
            patch["weather"] = json!(weather);
        }
        Some(patch)
    }
}

/// Parse and strip the command tags out of a reply. Later duplicate tags
/// win, matching sequential replacement. If nothing but tags remained,
/// the text becomes the fallback line.
pub fn parse_directives(reply: &str) -> FlameDirectives {
    let mut directives = FlameDirectives::default();
    let mut text = reply.to_string();

    for (tag, intensity) in [("[STOKE]", STOKED_INTENSITY), ("[DIM]", DIMMED_INTENSITY)] {
        if text.contains(tag) {
            directives.intensity = Some(intensity);
            text = text.replace(tag, "");
        }
    }
    for (tag, weather) in [
        ("[SNOW]", Weather::Snow),
        ("[RAIN]", Weather::Rain),
        ("[CLEAR]", Weather::Clear),
    ] {
        if text.contains(tag) {
            directives.weather = Some(weather);
            text = text.replace(tag, "");
        }
    }
    if let Some((color, span)) = find_color_tag(&text) {
        directives.color = Some(color);
        text.replace_range(span, "");
    }

    let trimmed = text.trim();
    directives.text =
        if trimmed.is_empty() { FALLBACK_LINE.to_string() } else { trimmed.to_string() };
    directives
}

/// Locate a `[COLOR: #rrggbb]` tag; returns the color and the byte span of
/// the whole tag.
fn find_color_tag(text: &str) -> Option<(Color, std::ops::Range<usize>)> {
    let start = text.find("[COLOR:")?;
    let rest = &text[start..];
    let close = rest.find(']')?;
    let inner = rest["[COLOR:".len()..close].trim();
    let color = Color::from_hex(inner)?;
    Some((color, start..start + close + 1))
}
