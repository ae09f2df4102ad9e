//! Terminal rendering of the status table.
//!
//! On a terminal the table is redrawn in place: the cursor moves back up over
//! the previous frame, clears it, and prints the new one. Anywhere else (pipes,
//! files, CI logs) each status change is printed as its own line instead.

use crossterm::cursor::MoveUp;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use stackmig_core::{StatusRow, TableSink};
use std::io::{self, IsTerminal, Stdout, Write};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "guid")]
    guid: String,
    #[tabled(rename = "state")]
    state: String,
}

impl From<&StatusRow> for Row {
    fn from(row: &StatusRow) -> Self {
        Self {
            name: row.name.clone(),
            guid: row.id.to_string(),
            state: row.status.clone(),
        }
    }
}

/// Format `rows` as the status table.
#[must_use]
pub fn format_table(rows: &[StatusRow]) -> String {
    let mut table = Table::new(rows.iter().map(Row::from));
    table.with(Style::blank());
    table.to_string()
}

/// Table sink writing to a terminal or plain stream.
pub struct TerminalSink<W: Write + Send> {
    out: W,
    interactive: bool,
    drawn_lines: usize,
    last: Vec<StatusRow>,
}

impl TerminalSink<Stdout> {
    /// Sink on stdout, redrawing in place when stdout is a terminal.
    #[must_use]
    pub fn stdout() -> Self {
        let out = io::stdout();
        let interactive = out.is_terminal();
        Self::new(out, interactive)
    }
}

impl<W: Write + Send> TerminalSink<W> {
    /// Sink on `out`.
    pub fn new(out: W, interactive: bool) -> Self {
        Self {
            out,
            interactive,
            drawn_lines: 0,
            last: Vec::new(),
        }
    }

    /// Underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, rows: &[StatusRow]) -> io::Result<()> {
        let table = format_table(rows);
        writeln!(self.out, "{table}")?;
        self.drawn_lines = table.lines().count();
        self.last = rows.to_vec();
        self.out.flush()
    }
}

impl<W: Write + Send> TableSink for TerminalSink<W> {
    fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        // The table is no longer the last thing on screen
        self.drawn_lines = 0;
        self.out.flush()
    }

    fn render_initial(&mut self, rows: &[StatusRow]) -> io::Result<()> {
        self.draw(rows)
    }

    fn redraw(&mut self, rows: &[StatusRow]) -> io::Result<()> {
        if !self.interactive {
            for row in rows.iter().filter(|row| !self.last.contains(row)) {
                writeln!(self.out, "{} ({}): {}", row.name, row.id, row.status)?;
            }
            self.last = rows.to_vec();
            return self.out.flush();
        }

        if self.drawn_lines > 0 {
            let up = u16::try_from(self.drawn_lines).unwrap_or(u16::MAX);
            queue!(self.out, MoveUp(up), Clear(ClearType::FromCursorDown))?;
        }
        self.draw(rows)
    }
}

impl<W: Write + Send> std::fmt::Debug for TerminalSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSink")
            .field("interactive", &self.interactive)
            .field("drawn_lines", &self.drawn_lines)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackmig_core::AppId;

    fn row(id: &str, status: &str) -> StatusRow {
        StatusRow {
            name: format!("app-{id}"),
            id: AppId::new(id),
            status: status.to_string(),
        }
    }

    fn output(sink: TerminalSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_table_has_header_and_rows() {
        let table = format_table(&[row("1", "STARTED"), row("2", "STOPPED")]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("name") && lines[0].contains("guid") && lines[0].contains("state"));
        assert!(lines[1].contains("app-1") && lines[1].contains("STARTED"));
        assert!(lines[2].contains("app-2") && lines[2].contains("STOPPED"));
    }

    #[test]
    fn test_interactive_redraw_moves_back_over_table() {
        let mut sink = TerminalSink::new(Vec::new(), true);
        sink.render_initial(&[row("1", "STARTED")]).unwrap();
        sink.redraw(&[row("1", "Updating")]).unwrap();

        let text = output(sink);
        // Cursor up over the two table lines, then clear below
        assert!(text.contains("\u{1b}[2A"));
        assert!(text.contains("\u{1b}[J"));
        assert!(text.ends_with(&format!("{}\n", format_table(&[row("1", "Updating")]))));
    }

    #[test]
    fn test_plain_redraw_prints_changes_only() {
        let mut sink = TerminalSink::new(Vec::new(), false);
        sink.render_initial(&[row("1", "STARTED"), row("2", "STOPPED")]).unwrap();
        sink.redraw(&[row("1", "STARTED"), row("2", "Updating")]).unwrap();

        let text = output(sink);
        assert!(!text.contains('\u{1b}'));
        assert!(text.ends_with("app-2 (2): Updating\n"));
        assert!(!text.contains("app-1 (1)"));
    }

    #[test]
    fn test_line_after_table_is_not_overwritten() {
        let mut sink = TerminalSink::new(Vec::new(), true);
        sink.render_initial(&[row("1", "STARTED")]).unwrap();
        sink.line("Total 1 found ...").unwrap();
        sink.redraw(&[row("1", "Updating")]).unwrap();

        assert!(!output(sink).contains("\u{1b}[2A"));
    }
}
