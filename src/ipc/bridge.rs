//! IPC bridge: stdin reader and stdout event emitter.
//!
//! A blocking stdin reader thread forwards deserialized commands through an
//! mpsc channel; events go out as JSON lines on stdout.

use std::io::{self, BufRead, Write};

use tokio::sync::mpsc;
use tracing::{debug, error};

use super::{CabinCommand, CabinEvent};

/// Emit a `CabinEvent` as a JSON line on stdout and flush.
pub fn emit_event(event: &CabinEvent) {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            error!("Failed to serialize event: {}", e);
            return;
        }
    };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // The display may already be gone.
    let _ = writeln!(handle, "{}", json);
    let _ = handle.flush();
}

pub fn emit_error(message: &str) {
    emit_event(&CabinEvent::Error {
        message: message.to_string(),
    });
}

/// Accept `{"type": ...}` as an alias for `{"command": ...}`.
fn normalize_command_json(input: &str) -> String {
    if let Ok(mut obj) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(input)
    {
        if !obj.contains_key("command") {
            if let Some(type_val) = obj.remove("type") {
                obj.insert("command".to_string(), type_val);
                if let Ok(json) = serde_json::to_string(&obj) {
                    return json;
                }
            }
        }
    }
    input.to_string()
}

/// Parse one stdin line. `Ok(None)` for blank lines.
pub(crate) fn parse_command_line(line: &str) -> Result<Option<CabinCommand>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&normalize_command_json(trimmed)).map(Some)
}

/// Spawn a blocking thread that reads JSON-line commands from stdin.
///
/// The thread exits when stdin is closed or the receiver is dropped.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<CabinCommand> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let text = match line {
                Ok(text) => text,
                Err(e) => {
                    error!("stdin read error: {}", e);
                    break;
                }
            };
            match parse_command_line(&text) {
                Ok(Some(cmd)) => {
                    debug!(?cmd, "Received command from display");
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!(input = %text.trim(), "Invalid JSON command: {}", e);
                    emit_error(&format!("Invalid JSON command: {}", e));
                }
            }
        }
        debug!("stdin reader thread exiting");
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_command_line("   ").unwrap(), None);
    }

    #[test]
    fn test_type_alias() {
        let cmd = parse_command_line(r#"{"type":"text","text":"stop"}"#).unwrap();
        assert_eq!(cmd, Some(CabinCommand::Text { text: "stop".into() }));
    }

    #[test]
    fn test_command_key_wins_over_type() {
        let cmd = parse_command_line(r#"{"command":"ping","type":"stop"}"#).unwrap();
        assert_eq!(cmd, Some(CabinCommand::Ping {}));
    }

    #[test]
    fn test_invalid_json() {
        assert!(parse_command_line("{oops").is_err());
    }
}
