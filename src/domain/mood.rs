/// Mood entity and the mood-only check-in payload
///
/// Moods are a fixed set seeded by the store. Check-ins from the home prompt
/// don't reference a mood row at all; they carry an emoji and the prompt
/// phrase packed into the log note.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use crate::domain::{DomainError, MoodId};

/// One of the five fixed emotional states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mood {
    pub id: MoodId,
    pub label: String,
    pub icon: String,
}

impl Mood {
    pub fn from_existing(id: MoodId, label: String, icon: String) -> Self {
        Self { id, label, icon }
    }
}

/// Seed rows for the moods table, ids 1 through 5
pub const SEED_MOODS: [(i64, &str, &str); 5] = [
    (1, "Great", "😄"),
    (2, "Good", "🙂"),
    (3, "Okay", "😐"),
    (4, "Low", "😔"),
    (5, "Bad", "😫"),
];

/// Emoji offered on the daily check-in prompt, saddest first
pub const CHECKIN_EMOJIS: [&str; 5] = ["😢", "😕", "😐", "🙂", "😊"];

/// Habit name snapshot that marks a mood-only check-in log
pub const MOOD_CHECKIN_NAME: &str = "Mood Check-in";

const NOTE_SEPARATOR: &str = " | ";

/// Questions shown above the check-in emoji row
pub const MOOD_PHRASES: [&str; 20] = [
    "How's your force feeling today?",
    "Are we in calm mode or survival mode today?",
    "Are you holding it together, or barely?",
    "What chapter are you in today?",
    "Are you winning today… internally?",
    "Are you at peace or powering up today?",
    "Is today a training arc or a breakdown arc?",
    "How heavy is your heart today?",
    "Are you fighting or healing today?",
    "What arc are you in right now?",
    "Are you okay… like really okay?",
    "Is today a fun episode or a filler one?",
    "How chaotic is your brain today?",
    "Are we calm SpongeBob or feral SpongeBob today?",
    "Is your brain being nice to you today?",
    "Are you surviving or thriving today?",
    "How close are you to your villain arc today?",
    "Is today a breakdown or a breakthrough?",
    "Are you holding the line today?",
    "How's the internal monologue today?",
];

/// A mood-only check-in: the emoji picked and the phrase it answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodCheckIn {
    pub emoji: String,
    pub phrase: String,
}

impl MoodCheckIn {
    /// Validate a check-in before it is written
    ///
    /// The emoji is the first field of the note encoding, so it may not
    /// contain the separator. The phrase may; decoding splits on the first
    /// separator only.
    pub fn new(emoji: String, phrase: String) -> Result<Self, DomainError> {
        let emoji = emoji.trim().to_string();
        if emoji.is_empty() {
            return Err(DomainError::InvalidValue {
                message: "Check-in emoji cannot be empty".to_string(),
            });
        }
        if emoji.contains('|') {
            return Err(DomainError::InvalidValue {
                message: "Check-in emoji cannot contain '|'".to_string(),
            });
        }
        if phrase.chars().count() > 500 {
            return Err(DomainError::InvalidValue {
                message: "Check-in phrase cannot be longer than 500 characters".to_string(),
            });
        }
        Ok(Self { emoji, phrase })
    }

    /// Note text stored on the log row: `"<emoji> | <phrase>"`
    pub fn to_note(&self) -> String {
        format!("{}{}{}", self.emoji, NOTE_SEPARATOR, self.phrase)
    }

    /// Read a check-in back out of a log note
    pub fn from_note(note: &str) -> Option<Self> {
        let (emoji, phrase) = note.split_once(NOTE_SEPARATOR)?;
        if emoji.is_empty() {
            return None;
        }
        Some(Self {
            emoji: emoji.to_string(),
            phrase: phrase.to_string(),
        })
    }
}

/// The phrase a check-in prompt asks
///
/// Drawn once when the prompt is created and kept for its whole lifetime, so
/// the phrase that gets logged is the one that was shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodPrompt {
    phrase: &'static str,
}

impl MoodPrompt {
    /// Pick a random phrase
    pub fn random() -> Self {
        let phrase = MOOD_PHRASES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(MOOD_PHRASES[0]);
        Self { phrase }
    }

    /// Use a fixed phrase from the set; out-of-range picks the first
    pub fn fixed(index: usize) -> Self {
        Self {
            phrase: MOOD_PHRASES.get(index).copied().unwrap_or(MOOD_PHRASES[0]),
        }
    }

    pub fn phrase(&self) -> &'static str {
        self.phrase
    }

    /// Answer the prompt with an emoji
    pub fn answer(&self, emoji: &str) -> Result<MoodCheckIn, DomainError> {
        MoodCheckIn::new(emoji.to_string(), self.phrase.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_encoding() {
        let checkin = MoodCheckIn::new("🙂".to_string(), "What arc are you in right now?".to_string()).unwrap();
        assert_eq!(checkin.to_note(), "🙂 | What arc are you in right now?");
        assert_eq!(MoodCheckIn::from_note(&checkin.to_note()), Some(checkin));
    }

    #[test]
    fn test_phrase_with_separator_survives() {
        let checkin = MoodCheckIn::new("😐".to_string(), "this | or that?".to_string()).unwrap();
        let decoded = MoodCheckIn::from_note(&checkin.to_note()).unwrap();
        assert_eq!(decoded.phrase, "this | or that?");
    }

    #[test]
    fn test_invalid_emoji() {
        assert!(MoodCheckIn::new(" ".to_string(), "x".to_string()).is_err());
        assert!(MoodCheckIn::new("a|b".to_string(), "x".to_string()).is_err());
        assert_eq!(MoodCheckIn::from_note("no separator here"), None);
    }

    #[test]
    fn test_prompt_is_stable() {
        let prompt = MoodPrompt::random();
        assert!(MOOD_PHRASES.contains(&prompt.phrase()));
        let first = prompt.answer("😊").unwrap();
        let second = prompt.answer("😢").unwrap();
        assert_eq!(first.phrase, second.phrase);
        assert_eq!(MoodPrompt::fixed(999).phrase(), MOOD_PHRASES[0]);
    }
}
