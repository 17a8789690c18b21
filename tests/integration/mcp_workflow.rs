/// JSON-RPC round trips through the MCP server
use echo_tracker::*;
use serde_json::{json, Value};
use tempfile::TempDir;

async fn server(dir: &TempDir) -> McpServer {
    let mut echo = EchoServer::new(EchoConfig::in_dir(dir.path()))
        .await
        .expect("Failed to create server");
    echo.set_prompt(MoodPrompt::fixed(1));
    McpServer::new(echo)
}

async fn request(server: &mut McpServer, id: u64, method: &str, params: Value) -> Value {
    let line = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string();
    let response = server.process_line(&line).await.expect("Expected a response");
    serde_json::to_value(response).unwrap()
}

/// Call a tool and return (text, is_error)
async fn call(server: &mut McpServer, name: &str, arguments: Value) -> (String, bool) {
    let response = request(server, 7, "tools/call", json!({"name": name, "arguments": arguments})).await;
    let result = &response["result"];
    (
        result["content"][0]["text"].as_str().unwrap_or_default().to_string(),
        result["isError"].as_bool().unwrap_or(false),
    )
}

#[tokio::test]
async fn test_handshake_and_tool_list() {
    let dir = TempDir::new().unwrap();
    let mut server = server(&dir).await;

    let init = request(&mut server, 1, "initialize", json!({
        "protocolVersion": MCP_VERSION,
        "capabilities": {},
        "clientInfo": {"name": "test", "version": "1.0"}
    }))
    .await;
    assert_eq!(init["result"]["protocolVersion"], MCP_VERSION);
    assert_eq!(init["result"]["serverInfo"]["name"], "Echo Tracker MCP");

    let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
    assert!(server.process_line(&notification).await.is_none());
    assert!(server.is_initialized());

    let listed = request(&mut server, 2, "tools/list", json!({})).await;
    let names: Vec<_> = listed["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names.len(), 20);
    for expected in ["habit_create", "mood_checkin", "timer_finish", "stats_weekly", "theme_set"] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
    assert!(listed["result"]["tools"][0]["inputSchema"].is_object());
}

#[tokio::test]
async fn test_protocol_errors() {
    let dir = TempDir::new().unwrap();
    let mut server = server(&dir).await;

    let bad = server.process_line("{not json").await.unwrap();
    let bad = serde_json::to_value(bad).unwrap();
    assert_eq!(bad["error"]["code"], -32700);

    let unknown = request(&mut server, 3, "resources/list", json!({})).await;
    assert_eq!(unknown["error"]["code"], -32601);

    let (text, is_error) = call(&mut server, "habit_fly", json!({})).await;
    assert!(is_error);
    assert!(text.contains("Unknown tool"));

    let (text, is_error) = call(&mut server, "habit_complete", json!({"habit_id": 404})).await;
    assert!(is_error);
    assert!(text.contains("Habit not found"));

    assert!(server.process_line("   ").await.is_none());
}

#[tokio::test]
async fn test_checkbox_habit_flow() {
    let dir = TempDir::new().unwrap();
    let mut server = server(&dir).await;

    let (text, is_error) = call(&mut server, "habit_create", json!({"name": "Drink Water"})).await;
    assert!(!is_error, "{}", text);
    let habit_id = server.echo().storage().list_habits().unwrap()[0].id.0;

    let (text, _) = call(&mut server, "habit_list", json!({})).await;
    assert!(text.contains("0/1 done"));

    call(&mut server, "habit_complete", json!({"habit_id": habit_id})).await;
    call(&mut server, "habit_complete", json!({"habit_id": habit_id})).await;
    let (text, _) = call(&mut server, "habit_list", json!({})).await;
    assert!(text.contains("1/1 done"));

    let (text, _) = call(&mut server, "stats_weekly", json!({})).await;
    assert!(text.contains("Last 7 days (2 logs)"));

    let (text, is_error) = call(&mut server, "habit_update", json!({"habit_id": habit_id, "name": "Water"})).await;
    assert!(!is_error, "{}", text);
    let (text, _) = call(&mut server, "logs_recent", json!({})).await;
    assert!(text.contains("Water"));

    let (text, is_error) = call(&mut server, "habit_delete", json!({"habit_id": habit_id})).await;
    assert!(!is_error, "{}", text);
    let (text, _) = call(&mut server, "habit_list", json!({})).await;
    assert!(text.contains("No habits yet"));
}

#[tokio::test]
async fn test_mood_checkin_flow() {
    let dir = TempDir::new().unwrap();
    let mut server = server(&dir).await;
    let phrase = MoodPrompt::fixed(1).phrase();

    let (text, _) = call(&mut server, "mood_prompt", json!({})).await;
    assert!(text.contains(phrase));

    let (text, is_error) = call(&mut server, "mood_checkin", json!({"emoji": "😊"})).await;
    assert!(!is_error, "{}", text);

    let (text, _) = call(&mut server, "mood_prompt", json!({})).await;
    assert!(text.contains("already checked in"));

    let logs = server.echo().stats().recent_logs().refresh().unwrap();
    assert_eq!(logs[0].log.note, Some(format!("😊 | {}", phrase)));
    assert_eq!(logs[0].log.habit_id, None);
    assert_eq!(logs[0].log.mood_id, None);
}

#[tokio::test]
async fn test_log_sheet_and_theme() {
    let dir = TempDir::new().unwrap();
    let mut server = server(&dir).await;

    let (text, is_error) = call(&mut server, "log_create", json!({})).await;
    assert!(is_error);
    assert!(text.contains("habit, a mood or a note"));

    let (text, is_error) = call(&mut server, "log_create", json!({"mood_id": 3, "note": "quiet day"})).await;
    assert!(!is_error, "{}", text);
    let log_id = server.echo().stats().recent_logs().refresh().unwrap()[0].log.id.0;

    let (_, is_error) = call(&mut server, "log_delete", json!({"log_id": log_id})).await;
    assert!(!is_error);
    let (text, _) = call(&mut server, "logs_recent", json!({})).await;
    assert!(text.contains("No logs"));

    let (text, _) = call(&mut server, "theme_get", json!({})).await;
    assert!(text.contains("Dark (warm gold)"));
    let (_, is_error) = call(&mut server, "theme_set", json!({"theme": "cherry_mocha"})).await;
    assert!(!is_error);
    assert_eq!(server.echo().settings().theme(), ThemeMode::CherryMocha);
    let (_, is_error) = call(&mut server, "theme_set", json!({"theme": "neon"})).await;
    assert!(is_error);
}
