//! Live status table
//!
//! Every migration task reports its transitions here. The table is the only
//! mutable state shared between tasks, so all access goes through one lock
//! that is held for the length of a single redraw and never across I/O
//! against the control plane.

use crate::state_machine::MigrationState;
use crate::types::{AppId, Application};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::io;

/// One row of the status table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    /// Application name
    pub name: String,
    /// Application identifier
    pub id: AppId,
    /// Current status label
    pub status: String,
}

impl From<&Application> for StatusRow {
    fn from(app: &Application) -> Self {
        Self {
            name: app.name.clone(),
            id: app.id.clone(),
            status: app.display_status.clone(),
        }
    }
}

/// Output device for the status table
///
/// Implementations own the terminal mechanics (formatting, cursor movement).
pub trait TableSink: Send {
    /// Print a line of free text below the table
    fn line(&mut self, text: &str) -> io::Result<()>;

    /// Print the table for the first time
    fn render_initial(&mut self, rows: &[StatusRow]) -> io::Result<()>;

    /// Overwrite the previously printed table in place
    fn redraw(&mut self, rows: &[StatusRow]) -> io::Result<()>;
}

/// Receives per-application state transitions
pub trait TransitionSink: Send + Sync {
    /// Record that `app` entered `state`
    fn apply_transition(&self, app: &AppId, state: MigrationState);

    /// Tell the operator why `app` ended up in a failure state
    fn report_problem(&self, app: &AppId, message: &str);
}

struct Table {
    rows: IndexMap<AppId, StatusRow>,
    sink: Box<dyn TableSink>,
}

impl Table {
    fn rows(&self) -> Vec<StatusRow> {
        self.rows.values().cloned().collect()
    }
}

/// Single-writer view over the status table
pub struct StatusReporter {
    table: Mutex<Table>,
}

impl StatusReporter {
    /// Create reporter writing to `sink`
    #[must_use]
    pub fn new(sink: Box<dyn TableSink>) -> Self {
        Self {
            table: Mutex::new(Table {
                rows: IndexMap::new(),
                sink,
            }),
        }
    }

    /// Print free text (progress lines, batch headers)
    pub fn line(&self, text: &str) {
        let mut table = self.table.lock();
        if let Err(e) = table.sink.line(text) {
            tracing::warn!(error = %e, "failed to write status line");
        }
    }

    /// Replace the table with `apps` and print it
    pub fn render_initial(&self, apps: &[Application]) {
        let mut table = self.table.lock();
        table.rows = apps
            .iter()
            .map(|app| (app.id.clone(), StatusRow::from(app)))
            .collect();

        let rows = table.rows();
        if let Err(e) = table.sink.render_initial(&rows) {
            tracing::warn!(error = %e, "failed to render status table");
        }
    }

    /// Current rows, in table order
    #[must_use]
    pub fn snapshot(&self) -> Vec<StatusRow> {
        self.table.lock().rows()
    }

    /// Current status label of `app`
    #[must_use]
    pub fn status_of(&self, app: &AppId) -> Option<String> {
        self.table.lock().rows.get(app).map(|row| row.status.clone())
    }
}

impl TransitionSink for StatusReporter {
    fn apply_transition(&self, app: &AppId, state: MigrationState) {
        let mut table = self.table.lock();

        match table.rows.get_mut(app) {
            Some(row) => row.status = state.label().to_string(),
            None => {
                tracing::warn!(app = %app, state = %state, "transition for application not in table");
                return;
            }
        }

        let rows = table.rows();
        if let Err(e) = table.sink.redraw(&rows) {
            tracing::warn!(error = %e, "failed to redraw status table");
        }
    }

    fn report_problem(&self, app: &AppId, message: &str) {
        tracing::debug!(app = %app, "reporting problem");
        self.line(message);
    }
}

impl std::fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReporter")
            .field("rows", &self.table.lock().rows.len())
            .finish_non_exhaustive()
    }
}
