//! 核心编排层：错误与恢复、重试策略、阶段状态、主控编排器、优雅关闭

pub mod error;
pub mod orchestrator;
pub mod recovery;
pub mod retry;
pub mod shutdown;
pub mod state;

pub use error::{ActionKind, AgentError, RecoveryAction, RetryOutcome};
pub use orchestrator::{run_agent, run_orchestrator, RunSummary, TaskOrchestrator};
pub use recovery::RecoveryEngine;
pub use retry::{RetryPolicy, RetryStrategy};
pub use shutdown::{run_with_graceful_shutdown, ShutdownManager, ShutdownReason};
pub use state::{PhaseTracker, Program, TaskState};
