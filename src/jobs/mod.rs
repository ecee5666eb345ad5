//! 长任务模块：语音合成与声音克隆任务的状态采样与轮询。
//!
//! Long-running jobs.
//!
//! Synthesis and cloning run on the server; the client only samples their
//! status. [`JobPoller`] drives the sampling until a terminal state, a
//! deadline, or cancellation.

mod poller;
mod types;

pub use poller::{JobPoller, PollConfig, PollState};
pub use types::{Job, JobKind, JobStatus};
pub(crate) use types::GENERIC_FAILURE;
