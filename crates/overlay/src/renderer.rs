use std::io::{self, Write};

use chatplus_routing::{ChatTab, ChatWindow, Message, Renderer};

/// Number of most recent lines drawn per tab.
pub const DEFAULT_VISIBLE_LINES: usize = 10;

/// Plain-text renderer used by the terminal host.
///
/// `Renderer` cannot fail, so the first write error is kept and reported by
/// `finish`.
pub struct TextRenderer<W: Write> {
    output: W,
    visible_lines: usize,
    error: Option<io::Error>,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            visible_lines: DEFAULT_VISIBLE_LINES,
            error: None,
        }
    }

    pub fn with_visible_lines(mut self, visible_lines: usize) -> Self {
        self.visible_lines = visible_lines;
        self
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.output.flush()?;
        Ok(self.output)
    }

    fn write_tab(&mut self, indent: &str, tab: &ChatTab) -> io::Result<()> {
        writeln!(
            self.output,
            "{indent}[{}] priority={} messages={}",
            tab.name(),
            tab.priority(),
            tab.message_count()
        )?;
        let skip = tab.message_count().saturating_sub(self.visible_lines);
        for message in tab.messages().skip(skip) {
            writeln!(self.output, "{indent}  {}", format_line(message))?;
        }
        Ok(())
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(error) = result {
            if self.error.is_none() {
                self.error = Some(error);
            }
        }
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn draw_window(&mut self, index: usize, window: &ChatWindow) {
        let header = writeln!(self.output, "== window {} ({})", index + 1, window.name());
        self.record(header);
        for tab in window.sorted_tabs() {
            let result = self.write_tab("  ", tab);
            self.record(result);
        }
    }

    fn draw_tab(&mut self, tab: &ChatTab) {
        let result = self.write_tab("", tab);
        self.record(result);
    }
}

pub(crate) fn format_line(message: &Message) -> String {
    let mut line = format!("#{}", message.sequence_id().0);
    if let Some(tag) = &message.tag {
        line.push_str(&format!(" ({})", tag.label));
    }
    match &message.sender {
        Some(sender) => line.push_str(&format!(" {sender}: {}", message.content)),
        None => line.push_str(&format!(" {}", message.content)),
    }
    line
}
