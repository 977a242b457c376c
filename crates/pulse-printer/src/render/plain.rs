//! Plain, line-oriented progress output.
//!
//! ```text
//! [+] building
//! #1 compile main.rs
//! #1 warning: unused variable
//! #2 link
//! #2 2> ld: cannot find -lfoo
//! #2 ERROR: exit status 1
//! #1 DONE 0.4s
//! WARNING: deprecated flag --foo
//! ```
//!
//! Vertices are numbered by first appearance within a cycle. Output is the
//! same whether or not a console was detected.

use super::{DisplayOptions, RenderContext, RenderOutcome, Renderer};
use crate::status::StatusReceiver;
use crate::RenderError;
use async_trait::async_trait;
use pulse_types::{LogStream, StatusEvent, TraceId, VertexState, VertexWarning};
use std::collections::HashMap;
use std::io::Write;
use std::time::Instant;
use tracing::debug;

/// Renders [`StatusEvent`]s as plain text lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl PlainRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Renderer for PlainRenderer {
    type Event = StatusEvent;
    type Warning = VertexWarning;

    async fn render(
        &self,
        ctx: RenderContext<'_>,
        mut events: StatusReceiver<StatusEvent>,
        options: &DisplayOptions,
    ) -> RenderOutcome<VertexWarning> {
        if ctx.shutdown.is_triggered() {
            let discarded = events.discard_all().await;
            debug!(cycle = ctx.cycle, discarded, "Shutdown requested before display started");
            return RenderOutcome::failed(Vec::new(), RenderError::Cancelled);
        }

        let mut display = PlainDisplay::new(ctx.sink);
        display.header(options);
        while let Some(event) = events.recv().await {
            display.event(event);
        }
        display.finish()
    }
}

struct Vertex {
    index: usize,
    started: Option<Instant>,
}

/// Per-cycle display state.
struct PlainDisplay<'a> {
    sink: &'a mut (dyn Write + Send),
    vertices: HashMap<TraceId, Vertex>,
    warnings: Vec<VertexWarning>,
    error: Option<std::io::Error>,
}

impl<'a> PlainDisplay<'a> {
    fn new(sink: &'a mut (dyn Write + Send)) -> Self {
        Self {
            sink,
            vertices: HashMap::new(),
            warnings: Vec::new(),
            error: None,
        }
    }

    fn header(&mut self, options: &DisplayOptions) {
        if let Some(ref phase) = options.phase {
            self.line(format_args!("[+] {phase}"));
        }
        if let Some(ref description) = options.description {
            self.line(format_args!("{}", description.text));
        }
    }

    fn event(&mut self, event: StatusEvent) {
        match event {
            StatusEvent::Vertex { id, name, state } => {
                let index = self.index_of(&id);
                match state {
                    VertexState::Started => {
                        if let Some(vertex) = self.vertices.get_mut(&id) {
                            vertex.started = Some(Instant::now());
                        }
                        self.line(format_args!("#{index} {name}"));
                    }
                    VertexState::Cached => self.line(format_args!("#{index} CACHED")),
                    VertexState::Completed => {
                        let secs = self
                            .vertices
                            .get(&id)
                            .and_then(|v| v.started)
                            .map_or(0.0, |t| t.elapsed().as_secs_f64());
                        self.line(format_args!("#{index} DONE {secs:.1}s"));
                    }
                    VertexState::Failed { error } => {
                        self.line(format_args!("#{index} ERROR: {error}"));
                    }
                }
            }
            StatusEvent::Log { id, stream, data } => {
                let index = self.index_of(&id);
                let tag = match stream {
                    LogStream::Stdout => "",
                    LogStream::Stderr => "2> ",
                };
                for text in data.lines() {
                    self.line(format_args!("#{index} {tag}{text}"));
                }
            }
            StatusEvent::Warning(warning) => {
                self.line(format_args!("WARNING: {}", warning.message));
                for detail in &warning.detail {
                    self.line(format_args!("  {detail}"));
                }
                self.warnings.push(warning);
            }
        }
    }

    fn index_of(&mut self, id: &TraceId) -> usize {
        let next = self.vertices.len() + 1;
        self.vertices
            .entry(id.clone())
            .or_insert(Vertex {
                index: next,
                started: None,
            })
            .index
    }

    /// Writes one line; after the first I/O error output stops.
    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.sink, "{args}") {
            self.error = Some(e);
        }
    }

    fn finish(mut self) -> RenderOutcome<VertexWarning> {
        if self.error.is_none() {
            if let Err(e) = self.sink.flush() {
                self.error = Some(e);
            }
        }
        match self.error {
            Some(e) => RenderOutcome::failed(self.warnings, RenderError::Io(e)),
            None => RenderOutcome::ok(self.warnings),
        }
    }
}
