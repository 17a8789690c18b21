/// Tools for the daily mood check-in
///
/// This module implements mood_list, mood_prompt and mood_checkin.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::domain::{LogEntry, Mood, MoodPrompt, CHECKIN_EMOJIS};
use crate::state::HomeState;
use crate::storage::StorageError;

/// Parameters for answering the mood prompt
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoodCheckInParams {
    /// Emoji answering today's prompt, e.g. "🙂"
    pub emoji: String,
}

/// Response from listing moods
#[derive(Debug, Serialize)]
pub struct MoodListResponse {
    pub moods: Vec<Mood>,
    pub message: String,
}

/// Response describing today's prompt
#[derive(Debug, Serialize)]
pub struct MoodPromptResponse {
    pub phrase: String,
    pub answered: bool,
    pub message: String,
}

/// Response from a check-in
#[derive(Debug, Serialize)]
pub struct MoodCheckInResponse {
    pub log: LogEntry,
    pub message: String,
}

/// List the moods a log can be tagged with
pub fn list_moods(home: &HomeState) -> Result<MoodListResponse, StorageError> {
    let moods = home.moods().refresh()?;

    let message = if moods.is_empty() {
        "No moods available.".to_string()
    } else {
        let lines = moods
            .iter()
            .map(|m| format!("{} {} (ID: {})", m.icon, m.label, m.id))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Moods:\n{}", lines)
    };

    Ok(MoodListResponse { moods, message })
}

/// Show today's prompt, or say it has already been answered
pub fn mood_prompt(home: &HomeState, prompt: &MoodPrompt) -> Result<MoodPromptResponse, StorageError> {
    let answered = home.mood_logged_today().refresh()?;

    let message = if answered {
        "✅ You've already checked in today.".to_string()
    } else {
        format!(
            "💭 {}\nAnswer with one of: {}",
            prompt.phrase(),
            CHECKIN_EMOJIS.join(" ")
        )
    };

    Ok(MoodPromptResponse {
        phrase: prompt.phrase().to_string(),
        answered,
        message,
    })
}

/// Answer the prompt with an emoji
///
/// Checking in again on the same day adds another row.
pub fn mood_checkin(
    home: &HomeState,
    prompt: &MoodPrompt,
    params: MoodCheckInParams,
) -> Result<MoodCheckInResponse, StorageError> {
    let checkin = prompt.answer(&params.emoji)?;
    let log = home.log_mood(&checkin)?;

    Ok(MoodCheckInResponse {
        message: format!("{} Checked in: \"{}\"", checkin.emoji, checkin.phrase),
        log,
    })
}
