//! 状态定义：行为程序、阶段枚举与阶段追踪器
//!
//! 任意时刻只有一个活动阶段；迁移是唯一的变更方式，终止阶段（Failed / Completed）不可再迁出。

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::AgentError;

/// 启动时选择的行为程序
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Program {
    /// 有界：取工具 → 下挖 → 条带挖矿 → 采完一条矿脉后结束
    Mining,
    /// 无界：采集 → 存入容器 → 循环
    Gathering,
}

impl FromStr for Program {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mining" | "mine" => Ok(Program::Mining),
            "gathering" | "gather" => Ok(Program::Gathering),
            other => Err(AgentError::ConfigError(format!("unknown program '{other}'"))),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Program::Mining => f.write_str("mining"),
            Program::Gathering => f.write_str("gathering"),
        }
    }
}

/// 编排器阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TaskState {
    Searching,
    Exploring,
    Traveling,
    Acquiring,
    Descending,
    StripMining,
    Storing,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// 阶段追踪：当前阶段 + 迁移历史
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: TaskState,
    history: Vec<TaskState>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: TaskState::Searching,
            history: vec![TaskState::Searching],
        }
    }

    pub fn current(&self) -> TaskState {
        self.current
    }

    /// 迁移到下一阶段；重复进入同一阶段不记录
    pub fn transition(&mut self, next: TaskState) -> Result<(), AgentError> {
        if self.current.is_terminal() {
            return Err(AgentError::Unhandled(format!(
                "cannot leave terminal state {:?} for {:?}",
                self.current, next
            )));
        }
        if self.current == next {
            return Ok(());
        }
        tracing::info!(from = ?self.current, to = ?next, "phase transition");
        self.current = next;
        self.history.push(next);
        Ok(())
    }

    pub fn history(&self) -> &[TaskState] {
        &self.history
    }

    /// 某阶段是否曾经进入过
    pub fn visited(&self, state: TaskState) -> bool {
        self.history.contains(&state)
    }
}
