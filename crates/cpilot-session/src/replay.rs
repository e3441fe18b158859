//! Recorded session traces.
//!
//! A trace is a JSON-lines file with one detector response per line:
//!
//! ```text
//! # comment lines and blank lines are ignored
//! {"landmarks": [...68 points...], "expressions": {"happy": 0.9}, "score": 0.97}
//! null
//! {"error": "model not loaded"}
//! ```
//!
//! An object with `landmarks` and `expressions` is a detected face, `null`
//! is a frame with no face, and `{"error": ...}` is a failed detector call.
//! Traces drive a `ScriptedDetector` so a session can be replayed offline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use cpilot_models::InferenceEvent;
use cpilot_vision::{FaceObservation, ScriptStep};

use crate::confidence::ConfidenceSource;
use crate::consumer::SessionConsumer;
use crate::error::{SessionError, SessionResult};
use crate::state::SessionUpdate;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraceLine {
    Failure { error: String },
    Face(FaceObservation),
}

impl From<TraceLine> for ScriptStep {
    fn from(line: TraceLine) -> Self {
        match line {
            TraceLine::Face(observation) => ScriptStep::Face(observation),
            TraceLine::Failure { error } => ScriptStep::Fail(error),
        }
    }
}

/// Parse trace text into detector steps.
pub fn parse_trace(text: &str) -> SessionResult<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed: Option<TraceLine> = serde_json::from_str(line)
            .map_err(|e| SessionError::trace_parse(index + 1, e.to_string()))?;
        steps.push(parsed.map_or(ScriptStep::NoFace, ScriptStep::from));
    }
    Ok(steps)
}

/// Load a trace file.
pub fn load_trace(path: impl AsRef<Path>) -> SessionResult<Vec<ScriptStep>> {
    let text = std::fs::read_to_string(path)?;
    parse_trace(&text)
}

/// Writes every session update as one JSON line.
pub struct JsonLinesConsumer<W> {
    out: Mutex<W>,
}

impl JsonLinesConsumer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesConsumer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_line(&self, value: &impl Serialize) -> SessionResult<()> {
        let line = serde_json::to_string(value)?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| SessionError::consumer_failed("output lock poisoned"))?;
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> SessionConsumer for JsonLinesConsumer<W> {
    async fn on_event(&self, event: &InferenceEvent, confidence: i32) -> SessionResult<()> {
        self.write_line(&SessionUpdate::Inference {
            event: *event,
            confidence,
        })
    }

    async fn on_confidence(
        &self,
        confidence: i32,
        delta: i32,
        source: ConfidenceSource,
    ) -> SessionResult<()> {
        self.write_line(&SessionUpdate::Confidence {
            confidence,
            delta,
            source,
        })
    }

    fn name(&self) -> &'static str {
        "json_lines"
    }
}
