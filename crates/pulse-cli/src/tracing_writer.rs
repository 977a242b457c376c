//! Tracing writer for the terminal log layer.
//!
//! [`GatedMakeWriter`] routes every formatted log event through a
//! [`LogGate`], so log lines emitted while progress renders are held and
//! printed after the cycle instead of tearing through the display. Without
//! a gate, events go straight to stderr.

use pulse_printer::LogGate;
use std::io::{self, Write};

/// [`MakeWriter`](tracing_subscriber::fmt::MakeWriter) for the terminal layer.
#[derive(Clone, Debug)]
pub struct GatedMakeWriter {
    gate: Option<LogGate>,
}

impl GatedMakeWriter {
    pub fn new(gate: Option<LogGate>) -> Self {
        Self { gate }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for GatedMakeWriter {
    type Writer = GatedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        GatedWriter {
            gate: self.gate.clone(),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Per-event writer.
///
/// Buffers bytes from the tracing formatter. On [`Drop`], submits the
/// buffer to the gate as one record.
pub struct GatedWriter {
    gate: Option<LogGate>,
    buf: Vec<u8>,
}

impl Write for GatedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for GatedWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }

        match self.gate {
            Some(ref gate) => {
                // A full hold buffer drops the record; the gate reports the count on release.
                let _ = gate.submit(std::mem::take(&mut self.buf));
            }
            None => {
                let mut stderr = io::stderr().lock();
                let _ = stderr.write_all(&self.buf);
                let _ = stderr.flush();
            }
        }
    }
}
