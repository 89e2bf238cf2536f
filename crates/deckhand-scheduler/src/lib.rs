//! deckhand-scheduler: Prediction job orchestration
//!
//! This crate owns the lifecycle of batch prediction jobs:
//! - Resource request defaulting and job validation
//! - Job creation with asynchronous image build and submission
//! - Stopping jobs and listing their containers
//! - Outcome counting for submission attempts

pub mod clock;
pub mod defaults;
pub mod metrics;
pub mod orchestrator;

pub use clock::{Clock, SystemClock};
pub use metrics::{JobOutcomeMetrics, OutcomeCounter};
pub use orchestrator::{JobOrchestrator, StopOutcome};
