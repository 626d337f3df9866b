use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest task text kept, in characters
pub const MAX_TODO_TEXT: usize = 200;
/// Longest project name kept, in characters
pub const MAX_PROJECT_NAME: usize = 50;

/// Snapshot of the timer handed to the task store when a task is completed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerContext {
    /// Timer is counting down right now (running, not paused)
    pub is_active: bool,
    /// Current session number, 0 before the first session
    pub session_id: u64,
    /// When the current session began (epoch ms)
    pub session_start_time: Option<i64>,
}

impl TimerContext {
    /// Context with no session, used by surfaces that do not own a timer
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Whether a completion right now should be attributed to a session
    pub fn attributes_time(&self) -> bool {
        self.is_active && self.session_id > 0
    }
}

/// A task on the todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// Epoch ms
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Display order, higher first
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<u64>,
    /// Focus seconds attributed at completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl Todo {
    /// Build a new open task. Returns None when the text is blank.
    pub fn new(text: &str, project_id: Option<String>, now: i64) -> Option<Self> {
        let text = clean_text(text, MAX_TODO_TEXT)?;
        Some(Self {
            id: Uuid::new_v4().to_string(),
            text,
            completed: false,
            created_at: now,
            completed_at: None,
            order: now,
            session_id: None,
            time_spent: None,
            project_id,
        })
    }

    /// Mark complete at `now`, attributing the running session's time when there is one
    pub fn complete(&mut self, ctx: &TimerContext, now: i64) {
        self.completed = true;
        self.completed_at = Some(now);
        self.session_id = None;
        self.time_spent = None;

        if ctx.attributes_time() {
            let started = ctx.session_start_time.unwrap_or(now);
            self.session_id = Some(ctx.session_id);
            self.time_spent = Some(((now - started).max(0) / 1000) as u64);
        }
    }

    /// Move back to the open list, dropping completion data
    pub fn reopen(&mut self) {
        self.completed = false;
        self.completed_at = None;
        self.session_id = None;
        self.time_spent = None;
    }

    /// Enforce that open tasks carry no completion data
    pub fn normalize(&mut self) {
        if !self.completed {
            self.reopen();
        }
    }

    /// Attributed focus time, if any was recorded
    pub fn focus_seconds(&self) -> Option<u64> {
        self.time_spent.filter(|secs| *secs > 0)
    }

    pub fn group(&self) -> ListGroup {
        ListGroup {
            project_id: self.project_id.clone(),
            completed: self.completed,
        }
    }
}

/// A named bucket for tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub order: i64,
}

impl Project {
    /// Build a new project. Returns None when the name is blank.
    pub fn new(name: &str, now: i64) -> Option<Self> {
        let name = clean_text(name, MAX_PROJECT_NAME)?;
        Some(Self {
            id: format!("project-{}", Uuid::new_v4()),
            name,
            created_at: now,
            order: now,
        })
    }
}

/// Partition of the task list that reordering is scoped to: one project
/// (or the unfiled tasks) and one completion state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListGroup {
    pub project_id: Option<String>,
    pub completed: bool,
}

impl ListGroup {
    pub fn active(project_id: Option<String>) -> Self {
        Self { project_id, completed: false }
    }

    pub fn completed(project_id: Option<String>) -> Self {
        Self { project_id, completed: true }
    }

    pub fn contains(&self, todo: &Todo) -> bool {
        todo.completed == self.completed && todo.project_id == self.project_id
    }
}

/// Trim and truncate user text to `max` characters; None when nothing is left
fn clean_text(input: &str, max: usize) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max).collect())
}
