//! Destinations for rendered panels.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::sinks::SinkError;

/// Receives a titled block of text lines.
pub trait PanelOutput: Send + Sync {
    fn write_panel(&self, title: &str, lines: &[String]) -> Result<(), SinkError>;
}

/// A panel captured by [`MemoryOutput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPanel {
    pub title: String,
    pub lines: Vec<String>,
}

/// Keeps every panel in memory. Used by tests and `snapshot --json`.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    panels: Mutex<Vec<CapturedPanel>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panels(&self) -> Vec<CapturedPanel> {
        self.panels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Lines of the most recent panel with the given title.
    pub fn last(&self, title: &str) -> Option<Vec<String>> {
        self.panels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|p| p.title == title)
            .map(|p| p.lines.clone())
    }

    pub fn count(&self, title: &str) -> usize {
        self.panels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|p| p.title == title)
            .count()
    }
}

impl PanelOutput for MemoryOutput {
    fn write_panel(&self, title: &str, lines: &[String]) -> Result<(), SinkError> {
        self.panels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedPanel {
                title: title.to_string(),
                lines: lines.to_vec(),
            });
        Ok(())
    }
}

/// Writes panels as plain text blocks:
///
/// ```text
/// == Positions ==
///   No open positions
/// ```
#[derive(Debug)]
pub struct WriterOutput<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl WriterOutput<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> PanelOutput for WriterOutput<W> {
    fn write_panel(&self, title: &str, lines: &[String]) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "== {} ==", title)?;
        for line in lines {
            writeln!(writer, "  {}", line)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_output_format() {
        let output = WriterOutput::new(Vec::new());
        output
            .write_panel("Positions", &["No open positions".to_string()])
            .unwrap();

        let text = String::from_utf8(output.into_inner()).unwrap();
        assert_eq!(text, "== Positions ==\n  No open positions\n");
    }

    #[test]
    fn test_memory_output_keeps_latest_per_title() {
        let output = MemoryOutput::new();
        output.write_panel("Account", &["a".to_string()]).unwrap();
        output.write_panel("Market", &["m".to_string()]).unwrap();
        output.write_panel("Account", &["b".to_string()]).unwrap();

        assert_eq!(output.last("Account"), Some(vec!["b".to_string()]));
        assert_eq!(output.count("Account"), 2);
        assert_eq!(output.last("Trades"), None);
        assert_eq!(output.panels().len(), 3);
    }
}
