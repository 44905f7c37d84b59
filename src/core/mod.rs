pub mod adapter;
pub mod classifier;
pub mod command;
pub mod orchestrator;
pub mod session;

pub use crate::domain::model::{BackendRequest, HttpMethod, Operation, Payload, ProcessHandle};
pub use crate::domain::ports::{MaterialsBackend, ProcessRunner, ReadinessProbe, Transport};
pub use crate::utils::error::Result;
