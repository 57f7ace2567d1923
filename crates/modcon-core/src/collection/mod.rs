//! Collection domain module.
//!
//! # Module Structure
//!
//! - `record`: Opaque record values (`Record`)
//! - `model`: Collection descriptors and dataset keys
//! - `registry`: The static catalog of collections and their actions
//! - `source`: Fetch interface (`DashboardSource`, `Refresher`)

mod model;
mod record;
pub mod registry;
mod source;

pub use model::{CollectionDescriptor, CollectionId, FetchKey, RecordFilter};
pub use record::Record;
pub use registry::{CollectionRegistry, default_registry};
pub use source::{DashboardData, DashboardSource, Refresher};
