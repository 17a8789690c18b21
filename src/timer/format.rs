/// Render elapsed milliseconds as `MM:SS`
///
/// Minutes are not wrapped into hours, so an 85 minute session shows as
/// `85:00`.
pub fn format_elapsed(millis: u64) -> String {
    let seconds = millis / 1000;
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
