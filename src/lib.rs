pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliArgs;

pub use crate::config::ConsoleConfig;
pub use crate::core::{
    adapter::{ReqwestTransport, RequestAdapter},
    classifier::{classify, Classifier, Precedence},
    orchestrator::{HttpProbe, ProcessOrchestrator, SystemRunner},
    session::{Session, SessionSummary},
};
pub use crate::utils::error::{ConsoleError, Result};
