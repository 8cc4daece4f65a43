//! Execution seam between graph building and the engine that runs scripts.
//!
//! The engine itself lives outside this crate. Implement [`ScriptExecutor`]
//! to connect a [`Context`](crate::Context) to a real engine; the
//! [`RecordingExecutor`] captures submitted scripts for tests and dry runs.

mod recording;
mod traits;

pub use recording::RecordingExecutor;
pub use traits::{EngineValue, ScriptExecutor};
