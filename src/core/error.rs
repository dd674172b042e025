//! Agent 错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：根据 AgentError、当前程序与阶段决定 Explore / RestartCycle / Abort 等。

use std::fmt;

use thiserror::Error;

use crate::world::BlockPos;

/// 非幂等动作的种类（用于失败分类与日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Dig,
    Place,
    Equip,
    Open,
    Withdraw,
    Deposit,
    Navigate,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Dig => "dig",
            ActionKind::Place => "place",
            ActionKind::Equip => "equip",
            ActionKind::Open => "open",
            ActionKind::Withdraw => "withdraw",
            ActionKind::Deposit => "deposit",
            ActionKind::Navigate => "navigate",
        };
        f.write_str(name)
    }
}

/// 世界交互过程中可能出现的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    /// 感知范围内没有目标（可恢复，触发探索 / 重试）
    #[error("Search miss: {0}")]
    SearchMiss(String),

    #[error("Action failed ({action}): {reason}")]
    ActionFailure { action: ActionKind, reason: String },

    #[error("Navigation failed: {0}")]
    NavigationFailure(String),

    #[error("Container unavailable: {0}")]
    ContainerUnavailable(String),

    /// 下挖时脚下没有实体方块，仅结束当前子阶段；harvested 为此前已挖掉的方块数
    #[error("No floor below {below} after {harvested} blocks")]
    VoidFloor { below: BlockPos, harvested: u32 },

    /// 世界层记录未通过边界校验
    #[error("Invalid world record: {0}")]
    InvalidRecord(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Unhandled: {0}")]
    Unhandled(String),
}

impl AgentError {
    pub fn action(action: ActionKind, reason: impl Into<String>) -> Self {
        AgentError::ActionFailure {
            action,
            reason: reason.into(),
        }
    }
}

/// 包装后的世界交互结果：成功值或已分类的失败原因
pub type RetryOutcome<T> = Result<T, AgentError>;

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 随机移动一段距离后重新搜索
    Explore,
    /// 等待若干 tick 后重试本阶段
    RetryAfterDelay(u32),
    /// 提前结束当前子阶段，进入下一阶段
    EndSubPhase,
    /// 记录后从头开始新一轮循环
    RestartCycle,
    /// 终止程序（进入 Failed）
    Abort,
}
