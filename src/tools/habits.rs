/// Tools for managing habits and ticking them off
///
/// This module implements habit_create, habit_update, habit_delete,
/// habit_list and habit_complete.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::domain::{Habit, HabitId, HabitStatus};
use crate::state::{HabitManager, HomeState};
use crate::storage::StorageError;

/// Parameters for creating a new habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateHabitParams {
    /// Name of the habit, 1 to 100 characters
    pub name: String,
    /// Track the habit with the session timer instead of a checkbox
    #[serde(default)]
    pub is_timed: bool,
    /// ARGB colour as an integer (optional)
    pub color: Option<u32>,
}

/// Parameters for editing a habit; omitted fields keep their value
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateHabitParams {
    /// ID of the habit to edit
    pub habit_id: i64,
    /// New name (optional)
    pub name: Option<String>,
    /// Switch between timed and checkbox (optional)
    pub is_timed: Option<bool>,
    /// New ARGB colour (optional)
    pub color: Option<u32>,
}

/// Parameters naming a single habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct HabitIdParams {
    /// ID of the habit
    pub habit_id: i64,
}

/// Parameters for listing habits
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListHabitsParams {
    /// Only list habits not yet done today (optional)
    #[serde(default)]
    pub pending_only: bool,
}

/// Response carrying one habit
#[derive(Debug, Serialize)]
pub struct HabitResponse {
    pub habit: Habit,
    pub message: String,
}

/// Response from listing habits
#[derive(Debug, Serialize)]
pub struct ListHabitsResponse {
    pub habits: Vec<HabitStatus>,
    pub completed: usize,
    pub message: String,
}

/// Create a new habit
pub fn create_habit(
    manager: &HabitManager,
    params: CreateHabitParams,
) -> Result<HabitResponse, StorageError> {
    let habit = manager.create(params.name, params.is_timed, params.color)?;

    Ok(HabitResponse {
        message: format!(
            "✅ Created {} habit '{}'\nHabit ID: {}",
            habit.kind_label().to_lowercase(),
            habit.name,
            habit.id
        ),
        habit,
    })
}

/// Edit a habit by replacing the whole record
pub fn update_habit(
    manager: &HabitManager,
    params: UpdateHabitParams,
) -> Result<HabitResponse, StorageError> {
    let habit = manager.update(HabitId(params.habit_id), params.name, params.is_timed, params.color)?;

    Ok(HabitResponse {
        message: format!("✏️ Updated habit '{}' ({})", habit.name, habit.kind_label()),
        habit,
    })
}

/// Delete a habit; its past logs stay under the old name
pub fn delete_habit(
    manager: &HabitManager,
    params: HabitIdParams,
) -> Result<HabitResponse, StorageError> {
    let habit = manager.delete(HabitId(params.habit_id))?;

    Ok(HabitResponse {
        message: format!("🗑️ Deleted habit '{}'. Its past logs are kept.", habit.name),
        habit,
    })
}

/// List habits with today's completion state
pub fn list_habits(
    home: &HomeState,
    params: ListHabitsParams,
) -> Result<ListHabitsResponse, StorageError> {
    let mut habits = home.habit_states().refresh()?;
    let completed = habits.iter().filter(|h| h.completed_today).count();
    let total = habits.len();

    if params.pending_only {
        habits.retain(|h| !h.completed_today);
    }

    let message = if total == 0 {
        "No habits yet. Create your first habit to get started!".to_string()
    } else if habits.is_empty() {
        format!("🎉 All {} habits are done for today!", total)
    } else {
        let lines = habits
            .iter()
            .map(|status| {
                let mark = if status.completed_today { "✅" } else { "⬜" };
                let kind = if status.habit.is_timed { " ⏱️" } else { "" };
                format!("{} {} (ID: {}){}", mark, status.habit.name, status.habit.id, kind)
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("📋 Today's habits ({}/{} done)\n\n{}", completed, total, lines)
    };

    Ok(ListHabitsResponse {
        habits,
        completed,
        message,
    })
}

/// Tick a habit off for today
///
/// Completing twice adds a second log, but the habit just shows as done.
pub fn complete_habit(
    manager: &HabitManager,
    home: &HomeState,
    params: HabitIdParams,
) -> Result<HabitResponse, StorageError> {
    let habit = manager.get(HabitId(params.habit_id))?;
    home.complete_habit(&habit)?;

    Ok(HabitResponse {
        message: format!("✅ Marked '{}' as done for today", habit.name),
        habit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::state::DEFAULT_GRACE_PERIOD;
    use crate::storage::SqliteStorage;

    fn setup() -> (HabitManager, HomeState) {
        let storage = Arc::new(SqliteStorage::in_memory().unwrap());
        (
            HabitManager::new(storage.clone(), DEFAULT_GRACE_PERIOD),
            HomeState::new(storage, DEFAULT_GRACE_PERIOD),
        )
    }

    fn create(manager: &HabitManager, name: &str) -> Habit {
        create_habit(
            manager,
            CreateHabitParams {
                name: name.to_string(),
                is_timed: false,
                color: None,
            },
        )
        .unwrap()
        .habit
    }

    #[tokio::test]
    async fn test_list_and_complete() {
        let (manager, home) = setup();
        let empty = list_habits(&home, ListHabitsParams::default()).unwrap();
        assert!(empty.message.contains("No habits yet"));

        let water = create(&manager, "Drink Water");
        create(&manager, "Stretch");

        complete_habit(&manager, &home, HabitIdParams { habit_id: water.id.0 }).unwrap();
        let listed = list_habits(&home, ListHabitsParams::default()).unwrap();
        assert_eq!(listed.completed, 1);
        assert!(listed.message.contains("1/2 done"));

        let pending = list_habits(&home, ListHabitsParams { pending_only: true }).unwrap();
        assert_eq!(pending.habits.len(), 1);
        assert_eq!(pending.habits[0].habit.name, "Stretch");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (manager, home) = setup();
        let habit = create(&manager, "Read");

        let updated = update_habit(
            &manager,
            UpdateHabitParams {
                habit_id: habit.id.0,
                name: None,
                is_timed: Some(true),
                color: None,
            },
        )
        .unwrap();
        assert!(updated.habit.is_timed);
        assert_eq!(updated.habit.name, "Read");

        delete_habit(&manager, HabitIdParams { habit_id: habit.id.0 }).unwrap();
        assert!(complete_habit(&manager, &home, HabitIdParams { habit_id: habit.id.0 }).is_err());
    }

    #[tokio::test]
    async fn test_invalid_name() {
        let (manager, _home) = setup();
        let result = create_habit(
            &manager,
            CreateHabitParams {
                name: "".to_string(),
                is_timed: false,
                color: None,
            },
        );
        assert!(matches!(result, Err(StorageError::Invalid(_))));
    }
}
