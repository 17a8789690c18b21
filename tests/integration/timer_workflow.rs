/// Timed sessions from start to logged entry
use echo_tracker::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn call(server: &mut McpServer, name: &str, arguments: Value) -> (String, bool) {
    let line = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
    .to_string();
    let response = serde_json::to_value(server.process_line(&line).await.unwrap()).unwrap();
    let result = &response["result"];
    (
        result["content"][0]["text"].as_str().unwrap_or_default().to_string(),
        result["isError"].as_bool().unwrap_or(false),
    )
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_read_session_is_logged() {
    let dir = TempDir::new().unwrap();
    let indicator = Arc::new(RecordingIndicator::new());
    let echo = EchoServer::with_indicator(EchoConfig::in_dir(dir.path()), indicator.clone())
        .await
        .unwrap();
    echo.timer().wait_connected().await;
    let mut server = McpServer::new(echo);

    call(&mut server, "habit_create", json!({"name": "Read", "is_timed": true})).await;
    let habit = server.echo().storage().list_habits().unwrap().remove(0);

    let (text, is_error) = call(&mut server, "timer_start", json!({"habit_id": habit.id.0})).await;
    assert!(!is_error, "{}", text);
    assert!(text.contains("'Read'"));

    tokio::time::sleep(Duration::from_millis(5_300)).await;
    let (text, _) = call(&mut server, "timer_status", json!({})).await;
    assert!(text.contains("Timing 'Read': 00:05"), "{}", text);
    assert!(indicator.current().unwrap().text.starts_with("Elapsed: 00:05"));

    let (text, is_error) = call(&mut server, "timer_finish", json!({"mood_id": 2})).await;
    assert!(!is_error, "{}", text);

    let logs = server.echo().stats().recent_logs().refresh().unwrap();
    assert_eq!(logs.len(), 1);
    let log = &logs[0].log;
    assert_eq!(log.habit_id, Some(habit.id));
    assert_eq!(log.habit_name.as_deref(), Some("Read"));
    assert!(log.duration_ms.unwrap() >= 5_000);
    assert_eq!(log.mood_id, Some(MoodId(2)));
    assert_eq!(log.note, None);

    settle().await;
    assert_eq!(server.echo().timer().elapsed_ms(), 0);
    assert!(!server.echo().timer().is_running());
    assert!(indicator.current().is_none());

    // The session habit counts as done today
    let states = server.echo().home().habit_states().refresh().unwrap();
    assert!(states[0].completed_today);
}

#[tokio::test(start_paused = true)]
async fn test_pause_stop_and_resume() {
    let dir = TempDir::new().unwrap();
    let echo = EchoServer::with_indicator(EchoConfig::in_dir(dir.path()), Arc::new(RecordingIndicator::new()))
        .await
        .unwrap();
    echo.timer().wait_connected().await;
    let mut server = McpServer::new(echo);

    call(&mut server, "timer_start", json!({})).await;
    tokio::time::sleep(Duration::from_millis(3_000)).await;
    call(&mut server, "timer_pause", json!({})).await;
    settle().await;
    let paused_at = server.echo().timer().elapsed_ms();
    assert!((2_900..=3_000).contains(&paused_at));

    tokio::time::sleep(Duration::from_millis(10_000)).await;
    assert_eq!(server.echo().timer().elapsed_ms(), paused_at);
    let (text, _) = call(&mut server, "timer_status", json!({})).await;
    assert!(text.contains("'Habit' on hold at"), "{}", text);

    // Stop keeps the time, start continues from it
    call(&mut server, "timer_stop", json!({})).await;
    call(&mut server, "timer_start", json!({})).await;
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert!(server.echo().timer().elapsed_ms() >= paused_at + 900);

    // With a reset in between it starts over
    call(&mut server, "timer_stop", json!({})).await;
    call(&mut server, "timer_reset", json!({})).await;
    settle().await;
    assert_eq!(server.echo().timer().elapsed_ms(), 0);
    let (text, _) = call(&mut server, "timer_finish", json!({})).await;
    assert!(text.contains("Nothing to log"));
}

#[tokio::test(start_paused = true)]
async fn test_session_survives_detached_client() {
    let host = Arc::new(ServiceHost::new(Arc::new(RecordingIndicator::new())));

    let first = SessionController::attach(host.clone());
    first.wait_connected().await;
    first.start("Meditate");
    drop(first);

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert!(host.is_alive());

    let second = SessionController::attach(host.clone());
    second.wait_connected().await;
    settle().await;
    assert!(second.is_running());
    assert!(second.elapsed_ms() >= 1_900);

    // Stopped with no other client bound: the service goes away once released
    second.stop();
    drop(second);
    settle().await;
    assert!(!host.is_alive());
}
