//! Linear undo/redo history over reversible task actions.
//!
//! An [`UndoableAction`] is a command object: a kind tag plus serializable
//! data. Reversal logic lives in an injected [`ActionHandler`] registry
//! keyed by kind, so history is not bound to closures and could later be
//! persisted across restarts.
//!
//! Stack invariant: an action lives in exactly one of {undo stack, redo
//! stack}, or neither once it has been evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{CoreError, Result, ValidationError};
use crate::reminder::Task;

/// Default bound on the undo stack.
pub const DEFAULT_MAX_STACK_SIZE: usize = 50;

/// Category of a reversible action; selects the registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    Bulk,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::Bulk => "bulk",
        };
        f.write_str(s)
    }
}

/// A reversible operation descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoableAction {
    pub id: String,
    pub kind: ActionKind,
    /// Human-readable, e.g. `Deleted task "Write report"`.
    pub description: String,
    pub timestamp: DateTime<Utc>,
    /// Opaque payload the handler interprets.
    pub data: serde_json::Value,
}

impl UndoableAction {
    pub fn new(kind: ActionKind, description: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            description: description.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

/// Reversal logic for one action kind.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn undo(&self, action: &UndoableAction) -> Result<()>;
    async fn redo(&self, action: &UndoableAction) -> Result<()>;
}

type Listener = Box<dyn Fn() + Send + Sync>;

/// Bounded linear undo/redo history.
///
/// Constructed once at the composition root; never a global. Listeners are
/// invoked synchronously once per mutating call.
pub struct UndoRedoManager {
    undo_stack: VecDeque<UndoableAction>,
    redo_stack: Vec<UndoableAction>,
    handlers: HashMap<ActionKind, Arc<dyn ActionHandler>>,
    listeners: Vec<Listener>,
    max_stack_size: usize,
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoRedoManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_STACK_SIZE)
    }

    pub fn with_capacity(max_stack_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            handlers: HashMap::new(),
            listeners: Vec::new(),
            max_stack_size,
        }
    }

    /// Register the reversal logic for one action kind.
    pub fn register_handler(&mut self, kind: ActionKind, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(kind, handler);
    }

    /// Record a completed action.
    ///
    /// Any new action invalidates the redo future; the oldest entry is
    /// evicted once the bound is exceeded.
    pub fn add_action(&mut self, action: UndoableAction) {
        self.undo_stack.push_back(action);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.max_stack_size {
            self.undo_stack.pop_front();
        }
        self.notify();
    }

    /// Reverse the most recent action.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. On handler
    /// failure the action is restored to the undo stack (it is not lost)
    /// and the error propagates -- the only error that escapes this core.
    pub async fn undo(&mut self) -> Result<bool> {
        let Some(action) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        let handler = match self.handler_for(action.kind) {
            Ok(h) => h,
            Err(e) => {
                self.undo_stack.push_back(action);
                return Err(e);
            }
        };
        match handler.undo(&action).await {
            Ok(()) => {
                self.redo_stack.push(action);
                self.notify();
                Ok(true)
            }
            Err(e) => {
                self.undo_stack.push_back(action);
                Err(e)
            }
        }
    }

    /// Re-apply the most recently undone action. Symmetric with
    /// [`undo`](Self::undo).
    pub async fn redo(&mut self) -> Result<bool> {
        let Some(action) = self.redo_stack.pop() else {
            return Ok(false);
        };
        let handler = match self.handler_for(action.kind) {
            Ok(h) => h,
            Err(e) => {
                self.redo_stack.push(action);
                return Err(e);
            }
        };
        match handler.redo(&action).await {
            Ok(()) => {
                self.undo_stack.push_back(action);
                self.notify();
                Ok(true)
            }
            Err(e) => {
                self.redo_stack.push(action);
                Err(e)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the action `undo` would reverse next.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|a| a.description.as_str())
    }

    /// Description of the action `redo` would re-apply next.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|a| a.description.as_str())
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.notify();
    }

    /// Subscribe to stack mutations.
    pub fn subscribe(&mut self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// The most recent `limit` undoable actions, most recent first.
    pub fn get_recent_actions(&self, limit: usize) -> Vec<&UndoableAction> {
        self.undo_stack.iter().rev().take(limit).collect()
    }

    fn handler_for(&self, kind: ActionKind) -> Result<Arc<dyn ActionHandler>> {
        self.handlers
            .get(&kind)
            .cloned()
            .ok_or_else(|| ValidationError::MissingHandler(kind.to_string()).into())
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener();
        }
    }
}

// ── Task action factories ────────────────────────────────────────────

/// Async task persistence seam the bundled handler reverses against. The
/// history core itself knows nothing about tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: &Task) -> Result<()>;
    async fn update(&self, task: &Task) -> Result<()>;
    async fn delete(&self, task_id: &str) -> Result<()>;
    async fn set_completed(&self, task_id: &str, completed: bool) -> Result<()>;
}

pub fn task_created_action(task: &Task) -> UndoableAction {
    UndoableAction::new(
        ActionKind::Create,
        format!("Created task \"{}\"", task.title),
        json!({ "task": task }),
    )
}

pub fn task_updated_action(before: &Task, after: &Task) -> UndoableAction {
    UndoableAction::new(
        ActionKind::Update,
        format!("Updated task \"{}\"", after.title),
        json!({ "before": before, "after": after }),
    )
}

pub fn task_deleted_action(task: &Task) -> UndoableAction {
    UndoableAction::new(
        ActionKind::Delete,
        format!("Deleted task \"{}\"", task.title),
        json!({ "task": task }),
    )
}

pub fn bulk_completed_action(task_ids: &[String]) -> UndoableAction {
    UndoableAction::new(
        ActionKind::Bulk,
        format!("Completed {} tasks", task_ids.len()),
        json!({ "op": "complete", "taskIds": task_ids }),
    )
}

pub fn bulk_deleted_action(tasks: &[Task]) -> UndoableAction {
    UndoableAction::new(
        ActionKind::Bulk,
        format!("Deleted {} tasks", tasks.len()),
        json!({ "op": "delete", "tasks": tasks }),
    )
}

/// Bundled [`ActionHandler`] reversing the factory actions above against
/// an injected [`TaskStore`].
pub struct TaskActionHandler {
    store: Arc<dyn TaskStore>,
}

impl TaskActionHandler {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    fn field<T: serde::de::DeserializeOwned>(action: &UndoableAction, key: &str) -> Result<T> {
        let value = action.data.get(key).cloned().ok_or_else(|| {
            CoreError::from(ValidationError::MalformedActionData {
                kind: action.kind.to_string(),
                message: format!("missing '{key}'"),
            })
        })?;
        serde_json::from_value(value).map_err(|e| {
            ValidationError::MalformedActionData {
                kind: action.kind.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    async fn apply_bulk(&self, action: &UndoableAction, forward: bool) -> Result<()> {
        let op: String = Self::field(action, "op")?;
        match op.as_str() {
            "complete" => {
                let ids: Vec<String> = Self::field(action, "taskIds")?;
                for id in &ids {
                    self.store.set_completed(id, forward).await?;
                }
                Ok(())
            }
            "delete" => {
                let tasks: Vec<Task> = Self::field(action, "tasks")?;
                for task in &tasks {
                    if forward {
                        self.store.delete(&task.id).await?;
                    } else {
                        self.store.create(task).await?;
                    }
                }
                Ok(())
            }
            other => Err(ValidationError::MalformedActionData {
                kind: action.kind.to_string(),
                message: format!("unknown bulk op '{other}'"),
            }
            .into()),
        }
    }
}

#[async_trait]
impl ActionHandler for TaskActionHandler {
    async fn undo(&self, action: &UndoableAction) -> Result<()> {
        match action.kind {
            ActionKind::Create => {
                let task: Task = Self::field(action, "task")?;
                self.store.delete(&task.id).await
            }
            ActionKind::Update => {
                let before: Task = Self::field(action, "before")?;
                self.store.update(&before).await
            }
            ActionKind::Delete => {
                let task: Task = Self::field(action, "task")?;
                self.store.create(&task).await
            }
            ActionKind::Bulk => self.apply_bulk(action, false).await,
        }
    }

    async fn redo(&self, action: &UndoableAction) -> Result<()> {
        match action.kind {
            ActionKind::Create => {
                let task: Task = Self::field(action, "task")?;
                self.store.create(&task).await
            }
            ActionKind::Update => {
                let after: Task = Self::field(action, "after")?;
                self.store.update(&after).await
            }
            ActionKind::Delete => {
                let task: Task = Self::field(action, "task")?;
                self.store.delete(&task.id).await
            }
            ActionKind::Bulk => self.apply_bulk(action, true).await,
        }
    }
}
