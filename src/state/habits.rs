/// Habit management surface: the habit list with create, edit and delete

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Habit, HabitId};
use crate::state::{logged, LiveQuery};
use crate::storage::{EchoStorage, StorageError, StoreChange};

pub struct HabitManager {
    storage: Arc<dyn EchoStorage>,
    habits: LiveQuery<Vec<Habit>>,
}

impl HabitManager {
    pub fn new(storage: Arc<dyn EchoStorage>, grace: Duration) -> Self {
        let habits = LiveQuery::new(
            "habits",
            storage.clone(),
            &[StoreChange::Habits],
            grace,
            Vec::new(),
            |s| s.list_habits(),
        );
        Self { storage, habits }
    }

    /// All habits, oldest first
    pub fn habits(&self) -> &LiveQuery<Vec<Habit>> {
        &self.habits
    }

    pub fn get(&self, habit_id: HabitId) -> Result<Habit, StorageError> {
        self.storage.get_habit(habit_id)
    }

    /// Create and store a new habit
    pub fn create(&self, name: String, is_timed: bool, color: Option<u32>) -> Result<Habit, StorageError> {
        let mut habit = Habit::new(name, is_timed, color)?;
        habit.id = logged("create habit", self.storage.upsert_habit(&habit))?;
        tracing::info!("Created habit '{}' ({})", habit.name, habit.id);
        Ok(habit)
    }

    /// Replace a habit's fields; unset fields keep their current value
    pub fn update(
        &self,
        habit_id: HabitId,
        name: Option<String>,
        is_timed: Option<bool>,
        color: Option<u32>,
    ) -> Result<Habit, StorageError> {
        let current = self.storage.get_habit(habit_id)?;
        let habit = current.edited(
            name.unwrap_or_else(|| current.name.clone()),
            is_timed.unwrap_or(current.is_timed),
            color,
        )?;
        logged("update habit", self.storage.upsert_habit(&habit))?;
        Ok(habit)
    }

    /// Delete a habit; its logs stay with the name they were logged under
    pub fn delete(&self, habit_id: HabitId) -> Result<Habit, StorageError> {
        let habit = self.storage.get_habit(habit_id)?;
        logged("delete habit", self.storage.delete_habit(habit_id))?;
        tracing::info!("Deleted habit '{}' ({})", habit.name, habit.id);
        Ok(habit)
    }
}
