//! Status event data model.
//!
//! A [`StatusEvent`] is one unit of progress emitted by a build or execution
//! client: a vertex changing state, a chunk of log output, or a warning.
//! The printer core treats events as opaque values; these types are what the
//! bundled plain renderer and the CLI speak.

use crate::TraceId;
use serde::{Deserialize, Serialize};

/// State of a vertex (a unit of work) as reported by the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VertexState {
    /// Work has begun.
    Started,
    /// Result was reused without running.
    Cached,
    /// Work finished successfully.
    Completed,
    /// Work finished with an error.
    Failed { error: String },
}

impl VertexState {
    /// Returns `true` for states that end a vertex.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started)
    }
}

/// Output stream a log chunk was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// Warning attached to a vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexWarning {
    /// Vertex the warning belongs to.
    pub vertex: TraceId,
    /// One-line summary.
    pub message: String,
    /// Additional detail lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detail: Vec<String>,
}

impl VertexWarning {
    #[must_use]
    pub fn new(vertex: TraceId, message: impl Into<String>) -> Self {
        Self {
            vertex,
            message: message.into(),
            detail: Vec::new(),
        }
    }

    /// Appends a detail line.
    #[must_use]
    pub fn with_detail(mut self, line: impl Into<String>) -> Self {
        self.detail.push(line.into());
        self
    }
}

/// One unit of progress.
///
/// # Example
///
/// ```
/// use pulse_types::{StatusEvent, TraceId, VertexState};
///
/// let id = TraceId::new("sha256:01");
/// let started = StatusEvent::vertex(id.clone(), "compile", VertexState::Started);
/// let line = StatusEvent::stdout(id.clone(), "ok\n");
///
/// assert_eq!(started.trace_id(), &id);
/// assert!(line.is_log());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusEvent {
    /// A vertex changed state.
    Vertex {
        id: TraceId,
        name: String,
        #[serde(flatten)]
        state: VertexState,
    },
    /// A chunk of log output attributed to a vertex.
    Log {
        id: TraceId,
        stream: LogStream,
        data: String,
    },
    /// A warning attached to a vertex.
    Warning(VertexWarning),
}

impl StatusEvent {
    #[must_use]
    pub fn vertex(id: TraceId, name: impl Into<String>, state: VertexState) -> Self {
        Self::Vertex {
            id,
            name: name.into(),
            state,
        }
    }

    #[must_use]
    pub fn stdout(id: TraceId, data: impl Into<String>) -> Self {
        Self::Log {
            id,
            stream: LogStream::Stdout,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn stderr(id: TraceId, data: impl Into<String>) -> Self {
        Self::Log {
            id,
            stream: LogStream::Stderr,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn warning(warning: VertexWarning) -> Self {
        Self::Warning(warning)
    }

    /// Returns the trace id the event is attributed to.
    #[must_use]
    pub fn trace_id(&self) -> &TraceId {
        match self {
            Self::Vertex { id, .. } | Self::Log { id, .. } => id,
            Self::Warning(warning) => &warning.vertex,
        }
    }

    /// Returns `true` for log chunks.
    #[must_use]
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }
}
