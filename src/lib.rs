/// Public library interface for the Echo tracker MCP server
///
/// This module exports the server, its state holders and the public types
/// that can be used by other applications or tests.

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

// Internal modules
mod config;
mod domain;
mod mcp;
mod state;
mod storage;
mod timer;
mod tools;

// Re-export public modules and types
pub use config::{EchoConfig, DATABASE_FILE};
pub use domain::*;
pub use mcp::protocol::{JsonRpcResponse, ToolCallResult, MCP_VERSION};
pub use mcp::server::tool_definitions;
pub use mcp::McpServer;
pub use state::{HabitManager, HomeState, LiveQuery, SettingsState, StatsState, DEFAULT_GRACE_PERIOD};
pub use storage::{EchoStorage, SettingsStore, SqliteStorage, StorageError, StoreChange};
pub use timer::{
    format_elapsed, Indicator, Notification, RecordingIndicator, ServiceHost, SessionController,
    SessionState, Stopwatch, TracingIndicator,
};
pub use tools::TimerSession;

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The tracker: the store, one state holder per surface and the timer
///
/// Everything is wired from one explicitly opened store; nothing is global.
pub struct EchoServer {
    storage: Arc<SqliteStorage>,
    home: HomeState,
    stats: StatsState,
    habits: HabitManager,
    settings: SettingsState,
    timer_host: Arc<ServiceHost>,
    timer: SessionController,
    session: TimerSession,
    prompt: MoodPrompt,
}

/// Background tasks keeping surface state live; stopped on drop
pub struct StateObservers {
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for StateObservers {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl EchoServer {
    /// Open the store and preferences described by `config`
    ///
    /// This will initialize the SQLite database with the required schema
    /// if it doesn't already exist. Must be called within a tokio runtime.
    pub async fn new(config: EchoConfig) -> Result<Self, ServerError> {
        Self::with_indicator(config, Arc::new(TracingIndicator::new())).await
    }

    /// Like `new`, with a custom indicator for the timer
    pub async fn with_indicator(
        config: EchoConfig,
        indicator: Arc<dyn Indicator>,
    ) -> Result<Self, ServerError> {
        tracing::info!("Initializing Echo server with database: {:?}", config.database_path);

        let storage = Arc::new(SqliteStorage::new(&config.database_path)?);
        let settings = Arc::new(SettingsStore::open(&config.settings_path));
        Ok(Self::from_parts(storage, settings, indicator, &config))
    }

    /// Wire the server from an already opened store
    pub fn from_parts(
        storage: Arc<SqliteStorage>,
        settings: Arc<SettingsStore>,
        indicator: Arc<dyn Indicator>,
        config: &EchoConfig,
    ) -> Self {
        let grace = config.live_query_grace;
        let timer_host = Arc::new(ServiceHost::new(indicator));

        Self {
            home: HomeState::new(storage.clone(), grace),
            stats: StatsState::new(storage.clone(), grace),
            habits: HabitManager::new(storage.clone(), grace),
            settings: SettingsState::new(settings),
            timer: SessionController::attach(timer_host.clone()),
            timer_host,
            session: TimerSession::default(),
            prompt: MoodPrompt::random(),
            storage,
        }
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method will block until the input is closed or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        let habits = self.storage.list_habits()?;
        tracing::info!("Server started successfully, found {} existing habits", habits.len());

        self.timer.wait_connected().await;

        let mut mcp_server = McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    /// Subscribe to the surfaces' live state and log every update
    pub fn observe(&self) -> StateObservers {
        let mut tasks = Vec::new();

        let mut habit_states = self.home.habit_states().subscribe();
        tasks.push(tokio::spawn(async move {
            while habit_states.changed().await.is_ok() {
                let (done, total) = {
                    let states = habit_states.borrow_and_update();
                    (states.iter().filter(|s| s.completed_today).count(), states.len())
                };
                tracing::debug!(done, total, "Home habits updated");
            }
        }));

        let mut mood_logged = self.home.mood_logged_today().subscribe();
        tasks.push(tokio::spawn(async move {
            while mood_logged.changed().await.is_ok() {
                let logged = *mood_logged.borrow_and_update();
                tracing::debug!(logged, "Mood check-in state updated");
            }
        }));

        let mut weekly = self.stats.weekly_stats().subscribe();
        tasks.push(tokio::spawn(async move {
            while weekly.changed().await.is_ok() {
                let total: u32 = weekly.borrow_and_update().iter().map(|d| d.count).sum();
                tracing::debug!(total, "Weekly stats updated");
            }
        }));

        let mut theme = self.settings.subscribe_theme();
        tasks.push(tokio::spawn(async move {
            while theme.changed().await.is_ok() {
                let theme = *theme.borrow_and_update();
                tracing::info!("Theme changed to {}", theme.display_name());
            }
        }));

        StateObservers { tasks }
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn home(&self) -> &HomeState {
        &self.home
    }

    pub fn stats(&self) -> &StatsState {
        &self.stats
    }

    pub fn habits(&self) -> &HabitManager {
        &self.habits
    }

    pub fn settings(&self) -> &SettingsState {
        &self.settings
    }

    pub fn timer(&self) -> &SessionController {
        &self.timer
    }

    pub fn timer_host(&self) -> &Arc<ServiceHost> {
        &self.timer_host
    }

    /// The habit the current timer session is for
    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    /// Today's mood question, fixed for the server's lifetime
    pub fn prompt(&self) -> &MoodPrompt {
        &self.prompt
    }

    /// Replace the mood prompt, e.g. with a fixed one in tests
    pub fn set_prompt(&mut self, prompt: MoodPrompt) {
        self.prompt = prompt;
    }

    pub(crate) fn timer_parts(&mut self) -> (&SessionController, &HabitManager, &mut TimerSession) {
        (&self.timer, &self.habits, &mut self.session)
    }

    pub(crate) fn finish_parts(&mut self) -> (&SessionController, &HomeState, &mut TimerSession) {
        (&self.timer, &self.home, &mut self.session)
    }
}
