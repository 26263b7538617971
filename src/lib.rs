pub mod config;
pub mod logging;
pub mod mastery;
pub mod store;

pub use mastery::{MasteryEngine, MasteryError, MasteryResult};
pub use store::{ConfigStore, JsonFileStore, MemoryStore, StoreError};
