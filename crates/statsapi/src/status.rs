use logger::{now_iso, ApiStatusEvent, EventLogger};

/// JSONL `API_STATUS` záznam, pokud je logger zapnutý.
pub(crate) fn log_api_status(
    logger: Option<&EventLogger>,
    source: &str,
    scope: String,
    outcome: Result<usize, String>,
) {
    let Some(logger) = logger else { return };
    let (ok, message, items_logged) = match outcome {
        Ok(n) => (true, "ok".to_string(), n),
        Err(msg) => (false, msg, 0),
    };
    let _ = logger.log(&ApiStatusEvent {
        ts: now_iso(),
        event: "API_STATUS",
        source: source.to_string(),
        scope,
        ok,
        message,
        items_logged,
    });
}
