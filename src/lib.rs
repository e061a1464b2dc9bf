pub mod api;
pub mod applications;
pub mod batcher;
pub mod config;
pub mod debounce;
pub mod error;
pub mod event;
pub mod grantees;
pub mod search;
pub mod transport;

pub use batcher::EventBatcher;
pub use error::{Error, Result};
pub use event::{Event, ObjectId, Properties, Screen};
