//! Topic proficiency engine: scoring, spaced review scheduling, weak-area ranking and
//! practice recommendations over caller-owned topic records.

pub mod config;
pub mod engine;
pub mod error;
pub mod processor;
pub mod recommendations;
pub mod scheduler;
pub mod scoring;
pub mod types;
pub mod weak_areas;

pub use config::{MasteryConfig, MasteryConfigPatch, CONFIG_KEY};
pub use engine::MasteryEngine;
pub use error::{MasteryError, MasteryResult};
pub use types::*;
