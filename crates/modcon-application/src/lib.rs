//! Application layer of the moderation console.
//!
//! Use cases coordinating the domain models from `modcon-core`: reason capture,
//! destructive-action confirmation, paced batch execution and dataset refresh,
//! tied together by [`ModerationConsole`].

pub mod confirmation;
pub mod console;
pub mod executor;
pub mod reason;
pub mod refresh;

pub use confirmation::{ConfirmationGate, ConfirmationPrompt};
pub use console::{ConsoleSnapshot, ModerationConsole, PendingView, TriggerOutcome};
pub use executor::{ActionBatch, ActionExecutor, BatchReport, ItemFailure};
pub use reason::{ReasonCapture, ReasonPrompt};
pub use refresh::DataRefreshCoordinator;
