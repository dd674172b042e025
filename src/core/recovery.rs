//! 错误恢复引擎
//!
//! 根据 AgentError、行为程序与当前阶段返回 RecoveryAction：
//! 采矿程序只对定位类失败重新探索，其余失败终止；采集程序所有失败都视为可恢复
//! （搜索未命中同样先探索再回来搜索）。

use crate::core::{AgentError, Program, RecoveryAction, TaskState};

/// 语义化错误恢复：将错误映射为可执行动作
#[derive(Debug, Clone)]
pub struct RecoveryEngine {
    /// 容器打不开时的等待时长
    container_retry_ticks: u32,
}

impl Default for RecoveryEngine {
    fn default() -> Self {
        Self::new(40)
    }
}

impl RecoveryEngine {
    pub fn new(container_retry_ticks: u32) -> Self {
        Self {
            container_retry_ticks,
        }
    }

    pub fn handle(&self, err: &AgentError, program: Program, phase: TaskState) -> RecoveryAction {
        match program {
            Program::Mining => self.handle_mining(err, phase),
            Program::Gathering => self.handle_gathering(err),
        }
    }

    fn handle_mining(&self, err: &AgentError, phase: TaskState) -> RecoveryAction {
        match (err, phase) {
            (AgentError::SearchMiss(_), TaskState::Searching | TaskState::Exploring) => {
                RecoveryAction::Explore
            }
            (AgentError::NavigationFailure(_), TaskState::Traveling) => RecoveryAction::Explore,
            (AgentError::VoidFloor { .. }, _) => RecoveryAction::EndSubPhase,
            _ => RecoveryAction::Abort,
        }
    }

    fn handle_gathering(&self, err: &AgentError) -> RecoveryAction {
        match err {
            AgentError::SearchMiss(_) => RecoveryAction::Explore,
            AgentError::VoidFloor { .. } => RecoveryAction::EndSubPhase,
            AgentError::ContainerUnavailable(_) => {
                RecoveryAction::RetryAfterDelay(self.container_retry_ticks)
            }
            _ => RecoveryAction::RestartCycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ActionKind;
    use crate::world::BlockPos;

    #[test]
    fn test_mining_search_miss_explores() {
        let engine = RecoveryEngine::default();
        let err = AgentError::SearchMiss("chest".into());
        assert_eq!(
            engine.handle(&err, Program::Mining, TaskState::Searching),
            RecoveryAction::Explore
        );
        // 条带挖矿阶段找不到矿石不再探索
        assert_eq!(
            engine.handle(&err, Program::Mining, TaskState::StripMining),
            RecoveryAction::Abort
        );
    }

    #[test]
    fn test_mining_action_failures_abort() {
        let engine = RecoveryEngine::default();
        let dig = AgentError::action(ActionKind::Dig, "interrupted");
        assert_eq!(
            engine.handle(&dig, Program::Mining, TaskState::Descending),
            RecoveryAction::Abort
        );
        let open = AgentError::ContainerUnavailable("chest".into());
        assert_eq!(
            engine.handle(&open, Program::Mining, TaskState::Acquiring),
            RecoveryAction::Abort
        );
        let unhandled = AgentError::Unhandled("boom".into());
        assert_eq!(
            engine.handle(&unhandled, Program::Mining, TaskState::Storing),
            RecoveryAction::Abort
        );
    }

    #[test]
    fn test_mining_navigation_failure() {
        let engine = RecoveryEngine::default();
        let err = AgentError::NavigationFailure("no path".into());
        assert_eq!(
            engine.handle(&err, Program::Mining, TaskState::Traveling),
            RecoveryAction::Explore
        );
        assert_eq!(
            engine.handle(&err, Program::Mining, TaskState::StripMining),
            RecoveryAction::Abort
        );
    }

    #[test]
    fn test_void_floor_ends_sub_phase() {
        let engine = RecoveryEngine::default();
        let err = AgentError::VoidFloor {
            below: BlockPos::new(0, -60, 0),
            harvested: 3,
        };
        assert_eq!(
            engine.handle(&err, Program::Mining, TaskState::Descending),
            RecoveryAction::EndSubPhase
        );
    }

    #[test]
    fn test_gathering_always_recovers() {
        let engine = RecoveryEngine::new(25);
        let errors = [
            AgentError::action(ActionKind::Dig, "x"),
            AgentError::NavigationFailure("x".into()),
            AgentError::Unhandled("x".into()),
        ];
        for err in &errors {
            let action = engine.handle(err, Program::Gathering, TaskState::Acquiring);
            assert_eq!(action, RecoveryAction::RestartCycle, "{err}");
        }
        let open = AgentError::ContainerUnavailable("chest".into());
        assert_eq!(
            engine.handle(&open, Program::Gathering, TaskState::Storing),
            RecoveryAction::RetryAfterDelay(25)
        );
        let miss = AgentError::SearchMiss("oak_log".into());
        assert_eq!(
            engine.handle(&miss, Program::Gathering, TaskState::Searching),
            RecoveryAction::Explore
        );
    }
}
