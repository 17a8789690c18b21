/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests line by line
/// 2. Routes tool calls to the tracker's state holders and timer
/// 3. Writes JSON-RPC responses back

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::storage::StorageError;
use crate::tools;
use crate::{EchoServer, ServerError};

/// MCP server that handles communication with the client
pub struct McpServer {
    /// The tracker the tools operate on
    echo: EchoServer,
    /// Whether the client has finished the handshake
    initialized: bool,
}

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// Input schema derived from a parameter struct
fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| no_params())
}

fn no_params() -> Value {
    json!({"type": "object", "properties": {}, "required": []})
}

/// Every tool the server offers
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool("habit_create", "Create a new habit, either a daily checkbox or a timed habit", schema_of::<tools::CreateHabitParams>()),
        tool("habit_update", "Edit a habit's name, colour or kind", schema_of::<tools::UpdateHabitParams>()),
        tool("habit_delete", "Delete a habit. Its past logs are kept under the old name", schema_of::<tools::HabitIdParams>()),
        tool("habit_list", "List habits with whether each is done today", schema_of::<tools::ListHabitsParams>()),
        tool("habit_complete", "Mark a habit as done for today", schema_of::<tools::HabitIdParams>()),
        tool("mood_list", "List the moods a log can be tagged with", no_params()),
        tool("mood_prompt", "Show today's mood check-in question", no_params()),
        tool("mood_checkin", "Answer today's mood check-in with an emoji", schema_of::<tools::MoodCheckInParams>()),
        tool("timer_start", "Start timing a session, or resume a paused one", schema_of::<tools::TimerStartParams>()),
        tool("timer_pause", "Pause the running session", no_params()),
        tool("timer_stop", "Stop the session, keeping its time until it is reset or finished", no_params()),
        tool("timer_reset", "Set the session time back to 00:00", no_params()),
        tool("timer_status", "Show the session's elapsed time and state", no_params()),
        tool("timer_finish", "End the session and log it with an optional mood and note", schema_of::<tools::TimerFinishParams>()),
        tool("log_create", "Log an entry with a habit, mood, duration or note", schema_of::<tools::CreateLogParams>()),
        tool("log_delete", "Delete a log entry", schema_of::<tools::DeleteLogParams>()),
        tool("stats_weekly", "Daily log counts for the last 7 days", no_params()),
        tool("logs_recent", "Detailed logs of the last 7 days, newest first", no_params()),
        tool("theme_get", "Show the current colour theme", no_params()),
        tool("theme_set", "Choose the colour theme", schema_of::<tools::SetThemeParams>()),
    ]
}

/// Decode a tool's arguments into its parameter struct
fn parse_args<P: DeserializeOwned>(args: Map<String, Value>) -> Result<P, ToolCallResult> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ToolCallResult::error(format!("Invalid arguments: {}", e)))
}

/// Turn a tool outcome into a tool result
fn respond(tool: &str, result: Result<String, StorageError>) -> ToolCallResult {
    match result {
        Ok(message) => ToolCallResult::success(message),
        Err(e) => {
            warn!(code = storage_error_to_json_rpc_code(&e), "Tool {} failed: {}", tool, e);
            ToolCallResult::error(e.to_string())
        }
    }
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(echo: EchoServer) -> Self {
        Self {
            echo,
            initialized: false,
        }
    }

    pub fn echo(&self) -> &EchoServer {
        &self.echo
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC until the input closes
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        // Keep the surfaces' state live while a client is connected
        let _observers = self.echo.observe();
        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (input closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        writer.write_all(response_str.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read request: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Returns `None` for blank lines and notifications.
    pub async fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                error_codes::INVALID_REQUEST,
                format!("Unsupported JSON-RPC version '{}'", request.jsonrpc),
                None,
            ));
        }

        self.handle_request(request).await
    }

    /// Handle a JSON-RPC request
    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            self.handle_notification(&request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(id, json!(null))
            }
            "tools/list" => JsonRpcResponse::success(id, json!({"tools": tool_definitions()})),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        };
        Some(response)
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => self.initialized = true,
            other => debug!("Ignoring notification '{}'", other),
        }
    }

    /// Handle MCP initialization request
    fn handle_initialize(&mut self, id: Value) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: "Echo Tracker MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None),
        }
    }

    /// Handle tools/call request
    async fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid parameters: {}", e),
                    None,
                );
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        debug!("Calling tool {}", tool_params.name);
        let result = self.call_tool(&tool_params.name, tool_params.arguments).await;

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None),
        }
    }

    /// Dispatch a tool call by name
    pub async fn call_tool(&mut self, name: &str, args: Map<String, Value>) -> ToolCallResult {
        match name {
            "habit_create" => self.call_with(name, args, |echo, p| {
                tools::create_habit(echo.habits(), p).map(|r| r.message)
            }),
            "habit_update" => self.call_with(name, args, |echo, p| {
                tools::update_habit(echo.habits(), p).map(|r| r.message)
            }),
            "habit_delete" => self.call_with(name, args, |echo, p| {
                tools::delete_habit(echo.habits(), p).map(|r| r.message)
            }),
            "habit_list" => self.call_with(name, args, |echo, p| {
                tools::list_habits(echo.home(), p).map(|r| r.message)
            }),
            "habit_complete" => self.call_with(name, args, |echo, p| {
                tools::complete_habit(echo.habits(), echo.home(), p).map(|r| r.message)
            }),
            "mood_list" => respond(name, tools::list_moods(self.echo.home()).map(|r| r.message)),
            "mood_prompt" => respond(
                name,
                tools::mood_prompt(self.echo.home(), self.echo.prompt()).map(|r| r.message),
            ),
            "mood_checkin" => self.call_with(name, args, |echo, p| {
                tools::mood_checkin(echo.home(), echo.prompt(), p).map(|r| r.message)
            }),
            "timer_start" => match parse_args::<tools::TimerStartParams>(args) {
                Ok(params) => {
                    let (controller, habits, session) = self.echo.timer_parts();
                    match tools::start_timer(controller, habits, session, params) {
                        Ok(response) => timer_result(response),
                        Err(e) => respond(name, Err(e)),
                    }
                }
                Err(result) => result,
            },
            "timer_pause" => timer_result(tools::pause_timer(self.echo.timer())),
            "timer_stop" => timer_result(tools::stop_timer(self.echo.timer())),
            "timer_reset" => timer_result(tools::reset_timer(self.echo.timer())),
            "timer_status" => {
                ToolCallResult::success(tools::timer_status(self.echo.timer(), self.echo.session()).message)
            }
            "timer_finish" => match parse_args::<tools::TimerFinishParams>(args) {
                Ok(params) => {
                    let (controller, home, session) = self.echo.finish_parts();
                    let finished = tools::finish_timer(controller, home, session, params).await;
                    respond(name, finished.map(|r| r.message))
                }
                Err(result) => result,
            },
            "log_create" => self.call_with(name, args, |echo, p| {
                tools::create_log(echo.habits(), echo.home(), p).map(|r| r.message)
            }),
            "log_delete" => self.call_with(name, args, |echo, p| {
                tools::delete_log(echo.stats(), p).map(|r| r.message)
            }),
            "stats_weekly" => respond(name, tools::weekly_stats(self.echo.stats()).map(|r| r.message)),
            "logs_recent" => respond(name, tools::recent_logs(self.echo.stats()).map(|r| r.message)),
            "theme_get" => ToolCallResult::success(tools::get_theme(self.echo.settings()).message),
            "theme_set" => self.call_with(name, args, |echo, p| {
                tools::set_theme(echo.settings(), p).map(|r| r.message)
            }),
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }

    /// Parse arguments, run a tool and render its outcome
    fn call_with<P, F>(&mut self, name: &str, args: Map<String, Value>, run: F) -> ToolCallResult
    where
        P: DeserializeOwned,
        F: FnOnce(&mut EchoServer, P) -> Result<String, StorageError>,
    {
        match parse_args::<P>(args) {
            Ok(params) => respond(name, run(&mut self.echo, params)),
            Err(result) => result,
        }
    }
}

/// Dropped timer commands are reported as errors the client may retry
fn timer_result(response: tools::TimerResponse) -> ToolCallResult {
    if response.accepted {
        ToolCallResult::success(response.message)
    } else {
        ToolCallResult::error(response.message)
    }
}
