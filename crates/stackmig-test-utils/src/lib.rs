//! Testing utilities for stackmig workspace
//!
//! Shared test helpers, fixtures, and doubles.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use stackmig_core::{AppId, MigrationState, StatusRow, TableSink, TransitionSink};
use stackmig_platform::{endpoints, ControlPlane, PlatformError};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn app(guid: &str, name: &str, stack_guid: &str, state: &str) -> Value {
    json!({
        "metadata": {"guid": guid},
        "entity": {"name": name, "stack_guid": stack_guid, "state": state}
    })
}

pub fn stack(guid: &str, name: &str) -> Value {
    json!({"metadata": {"guid": guid}, "entity": {"name": name}})
}

pub fn organization(guid: &str, name: &str) -> Value {
    json!({"metadata": {"guid": guid}, "entity": {"name": name}})
}

pub fn space(guid: &str, name: &str, organization_guid: &str) -> Value {
    json!({
        "metadata": {"guid": guid},
        "entity": {"name": name, "organization_guid": organization_guid}
    })
}

pub fn page(resources: Vec<Value>, next_url: Option<&str>) -> Value {
    json!({"next_url": next_url, "resources": resources})
}

pub fn healthy_instances() -> Value {
    json!({"0": {"state": "RUNNING", "since": 1_700_000_000.0}})
}

pub fn staging_instances() -> Value {
    json!({
        "code": 170002,
        "description": "App has not finished staging",
        "error_code": "CF-NotStaged"
    })
}

/// Standard stacks: `lucid64` (`s-lucid`) and `cflinuxfs2` (`s-fs2`)
pub fn default_stacks() -> Vec<Value> {
    vec![stack("s-lucid", "lucid64"), stack("s-fs2", "cflinuxfs2")]
}

// ---------------------------------------------------------------------------
// Fake control plane
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Reply {
    Body(Vec<u8>),
    Fail(String),
    Hang,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Update(String, Value),
}

#[derive(Default)]
struct Script {
    gets: HashMap<String, VecDeque<Reply>>,
    updates: HashMap<String, VecDeque<Result<(), String>>>,
    calls: Vec<Call>,
}

/// Take the next scripted reply; the last one repeats forever
fn next_reply<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// Scripted in-memory control plane
///
/// Reads are answered from per-path scripts; unknown paths fail with a
/// transport error. Updates succeed unless scripted otherwise.
#[derive(Default)]
pub struct FakeControlPlane {
    script: Mutex<Script>,
    update_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake pre-loaded with the default stacks
    pub fn with_default_stacks() -> Self {
        Self::new().with_stacks(default_stacks())
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn on_get(self, path: &str, body: Value) -> Self {
        self.on_get_sequence(path, vec![body])
    }

    pub fn on_get_sequence(self, path: &str, bodies: Vec<Value>) -> Self {
        self.script.lock().gets.insert(
            path.to_string(),
            bodies
                .into_iter()
                .map(|b| Reply::Body(b.to_string().into_bytes()))
                .collect(),
        );
        self
    }

    pub fn on_get_raw(self, path: &str, body: &[u8]) -> Self {
        self.script
            .lock()
            .gets
            .insert(path.to_string(), VecDeque::from([Reply::Body(body.to_vec())]));
        self
    }

    pub fn fail_get(self, path: &str, message: &str) -> Self {
        self.script
            .lock()
            .gets
            .insert(path.to_string(), VecDeque::from([Reply::Fail(message.to_string())]));
        self
    }

    /// Reads of `path` never complete
    pub fn hang_get(self, path: &str) -> Self {
        self.script
            .lock()
            .gets
            .insert(path.to_string(), VecDeque::from([Reply::Hang]));
        self
    }

    pub fn with_stacks(self, stacks: Vec<Value>) -> Self {
        self.on_get(endpoints::STACKS, page(stacks, None))
    }

    pub fn with_organizations(self, orgs: Vec<Value>) -> Self {
        self.on_get(endpoints::ORGANIZATIONS, page(orgs, None))
    }

    pub fn with_spaces(self, spaces: Vec<Value>) -> Self {
        self.on_get(endpoints::SPACES, page(spaces, None))
    }

    /// Serve `apps` as a single page at `path`
    pub fn with_apps(self, path: &str, apps: Vec<Value>) -> Self {
        self.on_get(path, page(apps, None))
    }

    /// Serve `pages` chained by `next_url`, starting at `path`
    pub fn with_app_pages(mut self, path: &str, pages: Vec<Vec<Value>>) -> Self {
        let count = pages.len();
        for (index, apps) in pages.into_iter().enumerate() {
            let here = page_path(path, index);
            let next = (index + 1 < count).then(|| page_path(path, index + 1));
            self = self.on_get(&here, page(apps, next.as_deref()));
        }
        self
    }

    /// Instance reports for `app_guid`, answered in order (last repeats)
    pub fn with_instance_reports(self, app_guid: &str, reports: Vec<Value>) -> Self {
        self.on_get_sequence(&endpoints::app_instances(app_guid), reports)
    }

    /// Results of successive updates to `app_guid` (last repeats)
    pub fn on_app_updates(self, app_guid: &str, results: Vec<Result<(), &str>>) -> Self {
        self.script.lock().updates.insert(
            endpoints::app(app_guid),
            results
                .into_iter()
                .map(|r| r.map_err(str::to_string))
                .collect(),
        );
        self
    }

    /// Every update to `app_guid` fails
    pub fn fail_app_updates(self, app_guid: &str, message: &str) -> Self {
        self.on_app_updates(app_guid, vec![Err(message)])
    }

    /// Every update takes `delay` (virtual time under a paused clock)
    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Get(path) => Some(path),
                Call::Update(..) => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(path, payload) => Some((path, payload)),
                Call::Get(_) => None,
            })
            .collect()
    }

    pub fn updates_for(&self, app_guid: &str) -> Vec<Value> {
        let path = endpoints::app(app_guid);
        self.updates()
            .into_iter()
            .filter(|(p, _)| *p == path)
            .map(|(_, payload)| payload)
            .collect()
    }

    pub fn count_gets(&self, path: &str) -> usize {
        self.gets().iter().filter(|p| p.as_str() == path).count()
    }

    /// Highest number of updates observed in flight at once
    pub fn max_concurrent_updates(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn page_path(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{base}{sep}page={}", index + 1)
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn get(&self, path: &str) -> Result<Vec<u8>, PlatformError> {
        let reply = {
            let mut script = self.script.lock();
            script.calls.push(Call::Get(path.to_string()));
            script.gets.get_mut(path).and_then(next_reply)
        };

        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Fail(message)) => Err(PlatformError::transport(path, message)),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(PlatformError::transport(path, "no scripted response")),
        }
    }

    async fn update(&self, path: &str, payload: &Value) -> Result<(), PlatformError> {
        let result = {
            let mut script = self.script.lock();
            script
                .calls
                .push(Call::Update(path.to_string(), payload.clone()));
            script
                .updates
                .get_mut(path)
                .and_then(next_reply)
                .unwrap_or(Ok(()))
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.update_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result.map_err(|message| PlatformError::transport(path, message))
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    Initial(Vec<StatusRow>),
    Redraw(Vec<StatusRow>),
}

pub type FrameLog = Arc<Mutex<Vec<Frame>>>;

/// Table sink that records every frame
#[derive(Default, Clone)]
pub struct RecordingSink {
    frames: FrameLog,
}

impl RecordingSink {
    pub fn new() -> (Self, FrameLog) {
        let sink = Self::default();
        let frames = Arc::clone(&sink.frames);
        (sink, frames)
    }
}

impl TableSink for RecordingSink {
    fn line(&mut self, text: &str) -> io::Result<()> {
        self.frames.lock().push(Frame::Line(text.to_string()));
        Ok(())
    }

    fn render_initial(&mut self, rows: &[StatusRow]) -> io::Result<()> {
        self.frames.lock().push(Frame::Initial(rows.to_vec()));
        Ok(())
    }

    fn redraw(&mut self, rows: &[StatusRow]) -> io::Result<()> {
        self.frames.lock().push(Frame::Redraw(rows.to_vec()));
        Ok(())
    }
}

/// Transition sink that records every published transition and problem
#[derive(Default)]
pub struct RecordingTransitions {
    events: Mutex<Vec<(AppId, MigrationState)>>,
    problems: Mutex<Vec<(AppId, String)>>,
}

impl RecordingTransitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(AppId, MigrationState)> {
        self.events.lock().clone()
    }

    pub fn problems_of(&self, app: &str) -> Vec<String> {
        self.problems
            .lock()
            .iter()
            .filter(|(id, _)| id.as_str() == app)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// States entered by `app`, starting from `Selected`
    pub fn path_of(&self, app: &str) -> Vec<MigrationState> {
        std::iter::once(MigrationState::Selected)
            .chain(
                self.events
                    .lock()
                    .iter()
                    .filter(|(id, _)| id.as_str() == app)
                    .map(|(_, state)| *state),
            )
            .collect()
    }
}

impl TransitionSink for RecordingTransitions {
    fn apply_transition(&self, app: &AppId, state: MigrationState) {
        self.events.lock().push((app.clone(), state));
    }

    fn report_problem(&self, app: &AppId, message: &str) {
        self.problems.lock().push((app.clone(), message.to_string()));
    }
}

pub fn frame_lines(frames: &FrameLog) -> Vec<String> {
    frames
        .lock()
        .iter()
        .filter_map(|f| match f {
            Frame::Line(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// Rows of the last frame that rendered the table
pub fn last_table(frames: &FrameLog) -> Vec<StatusRow> {
    frames
        .lock()
        .iter()
        .rev()
        .find_map(|f| match f {
            Frame::Initial(rows) | Frame::Redraw(rows) => Some(rows.clone()),
            Frame::Line(_) => None,
        })
        .unwrap_or_default()
}
