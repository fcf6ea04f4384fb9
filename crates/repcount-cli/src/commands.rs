//! JSON-lines command replay
//!
//! Each input line is one command tagged by `op`; each produces exactly one
//! JSON line on the output. Failures are reported inline as `{"error": ...}`
//! and do not stop the replay.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::io::{self, BufRead, Write};

use repcount_core::engine::{DEFAULT_EXERCISE, DEFAULT_SESSION_ID};
use repcount_core::{EngineError, FrameRequest, RepEngine};

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

fn default_exercise() -> String {
    DEFAULT_EXERCISE.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Detect(FrameRequest),
    Reset {
        #[serde(default = "default_session_id")]
        session_id: String,
        #[serde(default = "default_exercise")]
        exercise_type: String,
    },
    /// Prefix cleanup; `session_id` is required
    Cleanup {
        #[serde(default)]
        session_id: String,
    },
    /// Exact-id removal
    Remove {
        #[serde(default)]
        session_id: String,
    },
    State,
    Exercises,
    EvictIdle,
}

/// Totals for one replay run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub lines: usize,
    pub errors: usize,
}

pub fn execute(engine: &RepEngine, command: Command) -> Result<Value, EngineError> {
    let value = match command {
        Command::Detect(request) => to_value(engine.process(&request)?),
        Command::Reset {
            session_id,
            exercise_type,
        } => {
            let state = engine.reset(&session_id, &exercise_type)?;
            json!({
                "message": "Counter reset",
                "exercise_type": exercise_type.to_ascii_lowercase(),
                "session_id": session_id,
                "state": to_value(state),
            })
        }
        Command::Cleanup { session_id } => {
            let removed = engine.cleanup(&session_id)?;
            json!({"message": "Session cleaned up", "removed": removed})
        }
        Command::Remove { session_id } => {
            let removed = engine.remove_session(&session_id)?;
            json!({"message": "Session removed", "removed": removed})
        }
        Command::State => to_value(engine.snapshot()),
        Command::Exercises => exercise_catalog(engine),
        Command::EvictIdle => json!({"removed": engine.evict_idle()}),
    };
    Ok(value)
}

/// `{"exercises": [...tags], "details": {tag: {name, calories_per_rep, description}}}`
pub fn exercise_catalog(engine: &RepEngine) -> Value {
    let catalog = engine.exercises();
    let tags: Vec<&str> = catalog.iter().map(|info| info.id.as_str()).collect();

    let mut details = Map::new();
    for info in &catalog {
        details.insert(
            info.id.as_str().to_string(),
            json!({
                "name": info.name,
                "calories_per_rep": info.calories_per_rep,
                "description": info.description,
            }),
        );
    }

    json!({"exercises": tags, "details": details})
}

/// Handle one raw input line.
pub fn handle_line(engine: &RepEngine, line: &str) -> Value {
    let command: Command = match serde_json::from_str(line) {
        Ok(command) => command,
        Err(e) => return json!({"error": format!("Invalid command: {}", e)}),
    };
    match execute(engine, command) {
        Ok(value) => value,
        Err(e) => json!({"error": e.to_string()}),
    }
}

/// Replay JSON lines from `input`. A line that is not valid UTF-8 gets an
/// error response like any other malformed command.
pub fn replay<R: BufRead, W: Write>(
    engine: &RepEngine,
    mut input: R,
    mut output: W,
) -> io::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(engine, line),
            Err(e) => json!({"error": format!("Invalid command: {}", e)}),
        };
        summary.lines += 1;
        if response.get("error").is_some() {
            summary.errors += 1;
            tracing::warn!(line = summary.lines, "command failed: {}", response["error"]);
        }

        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
    }

    output.flush()?;
    Ok(summary)
}

fn to_value<T: serde::Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({"error": e.to_string()}))
}
