use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

/// Oldest log lines are dropped once a task buffer reaches this size.
pub const MAX_LOG_LINES: usize = 3000;

/// Lifecycle state of a background screenshot run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Error,
}

#[derive(Debug)]
struct TaskState {
    status: TaskStatus,
    output: VecDeque<String>,
    error: Option<String>,
    screenshot_count: usize,
}

/// Point-in-time view of a task, for the status endpoint.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub output: Vec<String>,
    pub error: Option<String>,
    pub screenshot_count: usize,
}

/// Shared handle to one task's mutable state
#[derive(Debug)]
pub struct TaskHandle {
    state: Mutex<TaskState>,
}

impl TaskHandle {
    fn new() -> Self {
        Self {
            state: Mutex::new(TaskState {
                status: TaskStatus::Running,
                output: VecDeque::new(),
                error: None,
                screenshot_count: 0,
            }),
        }
    }

    /// Appends a log line, dropping the oldest line past the cap.
    pub async fn push_line(&self, line: String) {
        let mut state = self.state.lock().await;
        state.output.push_back(line);
        if state.output.len() > MAX_LOG_LINES {
            state.output.pop_front();
        }
    }

    pub async fn finish(&self, screenshot_count: usize) {
        let mut state = self.state.lock().await;
        state.status = TaskStatus::Completed;
        state.screenshot_count = screenshot_count;
    }

    pub async fn fail(&self, message: String, screenshot_count: usize) {
        let mut state = self.state.lock().await;
        state.status = TaskStatus::Error;
        state.error = Some(message);
        state.screenshot_count = screenshot_count;
    }

    /// Snapshot with at most the last `tail` log lines.
    pub async fn snapshot(&self, tail: usize) -> TaskSnapshot {
        let state = self.state.lock().await;
        let skip = state.output.len().saturating_sub(tail);
        TaskSnapshot {
            status: state.status,
            output: state.output.iter().skip(skip).cloned().collect(),
            error: state.error.clone(),
            screenshot_count: state.screenshot_count,
        }
    }

    /// Entire log as one newline-joined string, for the download endpoint.
    pub async fn log_text(&self) -> String {
        let state = self.state.lock().await;
        if state.output.is_empty() {
            "(no log output)".to_string()
        } else {
            state.output.iter().cloned().collect::<Vec<_>>().join("\n")
        }
    }

    pub async fn status(&self) -> TaskStatus {
        self.state.lock().await.status
    }
}

/// In-memory registry of background screenshot runs. Cheap to clone and
/// share; nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<Uuid, Arc<TaskHandle>>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new running task and returns its id and handle.
    pub async fn create(&self) -> (Uuid, Arc<TaskHandle>) {
        let id = Uuid::new_v4();
        let handle = Arc::new(TaskHandle::new());
        self.tasks.write().await.insert(id, handle.clone());
        (id, handle)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<TaskHandle>> {
        self.tasks.read().await.get(id).cloned()
    }

    pub async fn running_count(&self) -> usize {
        let tasks = self.tasks.read().await;
        let mut running = 0;
        for handle in tasks.values() {
            if handle.status().await == TaskStatus::Running {
                running += 1;
            }
        }
        running
    }

    pub async fn total_count(&self) -> usize {
        self.tasks.read().await.len()
    }
}

/// Log sink handed to a run: every line goes to tracing, optionally into a
/// task buffer, and optionally to stdout (for CLI runs).
#[derive(Clone)]
pub struct RunLog {
    task: Option<Arc<TaskHandle>>,
    echo: bool,
}

impl RunLog {
    /// Sink for a background task: lines land in the task buffer.
    pub fn for_task(task: Arc<TaskHandle>) -> Self {
        Self { task: Some(task), echo: false }
    }

    /// Sink for CLI runs: lines are printed to stdout.
    pub fn stdout() -> Self {
        Self { task: None, echo: true }
    }

    /// Sink that only feeds tracing.
    pub fn detached() -> Self {
        Self { task: None, echo: false }
    }

    pub async fn line(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        if self.echo {
            println!("{}", message);
        }
        if let Some(task) = &self.task {
            task.push_line(message).await;
        }
    }
}
