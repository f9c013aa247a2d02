//! # Herald Core Library
//!
//! Core logic for Herald, a reminder scheduling and notification delivery
//! service for a task-management backend. All operations are available
//! through the standalone CLI binary; any richer front end is a thin layer
//! over this same library.
//!
//! ## Architecture
//!
//! - **Scheduler**: in-process timers keyed by reminder id, persisted
//!   through the backend and rebuilt from it at startup
//! - **Notify**: delivery across local display, server-fanned push, and
//!   server-sent email, behind an injected platform surface
//! - **Undo**: bounded linear undo/redo history over command-object actions
//! - **Api**: plain-JSON HTTP client for the backend endpoints
//! - **Config**: TOML-based daemon configuration
//!
//! ## Key Components
//!
//! - [`ReminderScheduler`]: timer lifecycle and delivery orchestration
//! - [`NotificationManager`]: permission, display, and push subscription
//! - [`UndoRedoManager`]: reversible action history
//! - [`ApiClient`]: backend endpoint client

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod preferences;
pub mod reminder;
pub mod scheduler;
pub mod undo;

pub use api::{ApiClient, PushSubscription};
pub use config::HeraldConfig;
pub use error::{ApiError, ConfigError, CoreError, Result, ValidationError};
pub use notify::{ConsoleSurface, NotificationManager, NotificationOptions, NotificationSurface};
pub use preferences::{Channel, NotificationPreferences, QuietHours};
pub use reminder::{ReminderKind, ReminderStatus, ScheduledReminder, Task};
pub use scheduler::{ReminderScheduler, SchedulerConfig};
pub use undo::{ActionHandler, ActionKind, TaskStore, UndoRedoManager, UndoableAction};
