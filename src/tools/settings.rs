/// Tools for the theme preference
///
/// This module implements theme_get and theme_set.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::domain::{DomainError, ThemeMode};
use crate::state::SettingsState;
use crate::storage::StorageError;

/// Parameters for choosing a theme
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetThemeParams {
    /// Theme name (dark_mode_1, dark_mode_2, cherry_mocha, light, yellow) or its number 0-4
    pub theme: String,
}

/// Response from the theme tools
#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: ThemeMode,
    pub message: String,
}

fn parse_theme(input: &str) -> Result<ThemeMode, DomainError> {
    let key = input.trim().to_lowercase().replace(['-', ' '], "_");
    let theme = match key.as_str() {
        "dark_mode_1" | "darkmode1" | "dark1" => Some(ThemeMode::DarkMode1),
        "dark_mode_2" | "darkmode2" | "dark2" => Some(ThemeMode::DarkMode2),
        "cherry_mocha" | "cherrymocha" => Some(ThemeMode::CherryMocha),
        "light" => Some(ThemeMode::Light),
        "yellow" => Some(ThemeMode::Yellow),
        other => other.parse::<i64>().ok().and_then(ThemeMode::from_ordinal),
    };

    theme.ok_or_else(|| DomainError::InvalidValue {
        message: format!(
            "Unknown theme '{}'. Valid options: dark_mode_1, dark_mode_2, cherry_mocha, light, yellow",
            input
        ),
    })
}

fn theme_list(current: ThemeMode) -> String {
    ThemeMode::ALL
        .iter()
        .map(|t| {
            let mark = if *t == current { "●" } else { "○" };
            format!("{} {} ({})", mark, t.display_name(), t.ordinal())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn get_theme(settings: &SettingsState) -> ThemeResponse {
    let theme = settings.theme();
    ThemeResponse {
        theme,
        message: format!("🎨 Current theme: {}\n\n{}", theme.display_name(), theme_list(theme)),
    }
}

pub fn set_theme(settings: &SettingsState, params: SetThemeParams) -> Result<ThemeResponse, StorageError> {
    let theme = parse_theme(&params.theme)?;
    settings.set_theme(theme)?;

    Ok(ThemeResponse {
        theme,
        message: format!("🎨 Theme set to {}", theme.display_name()),
    })
}
