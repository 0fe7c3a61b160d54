//! Browser reload client.

const TEMPLATE: &str = include_str!("../../assets/reload.js");

/// Render the reload client for the given marker path and poll interval.
pub(crate) fn reload_script(marker_path: &str, interval_ms: u64) -> String {
    // A JSON string literal is a valid JS string literal.
    let marker_path = serde_json::Value::from(marker_path).to_string();
    TEMPLATE
        .replace("__MARKER_PATH__", &marker_path)
        .replace("__INTERVAL_MS__", &interval_ms.to_string())
}
