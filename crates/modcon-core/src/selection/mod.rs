//! Selection state for the active collection.

mod store;

pub use store::SelectionStore;
