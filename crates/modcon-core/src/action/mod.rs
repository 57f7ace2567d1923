//! Action domain models and the mutation effect interface.

mod backend;
mod model;
mod mutation;

pub use backend::ModerationBackend;
pub use model::{
    ActionDescriptor, ActionKind, ActionSummary, Effect, MutateFn, NavigateFn, ReasonPolicy,
    SelectionRule, TargetNoun, Visibility,
};
pub use mutation::{Mutation, Parent, ParentKind, Resource};
