//! 重试策略
//!
//! 两种具名策略，保持「查询可无限重试、动作只做一次」的不对称：
//! - UnboundedIdempotent：定位查询无副作用，未命中则等待固定时长后再查
//! - SingleAttemptNonIdempotent：改变世界 / 背包的动作只尝试一次，失败分类后交给调用阶段决定

use std::future::Future;

use crate::core::{ActionKind, AgentError, RetryOutcome};
use crate::world::World;

/// 策略名（日志用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    UnboundedIdempotent,
    SingleAttemptNonIdempotent,
}

/// 重试策略：持有定位未命中后的等待时长
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    miss_delay_ticks: u32,
}

impl RetryPolicy {
    pub fn new(miss_delay_ticks: u32) -> Self {
        Self { miss_delay_ticks }
    }

    pub fn miss_delay_ticks(&self) -> u32 {
        self.miss_delay_ticks
    }

    /// 定位查询（UnboundedIdempotent）
    ///
    /// `rounds` 为 None 时一直重试直到命中；为 Some(n) 时 n 次未命中后返回 SearchMiss，
    /// 由调用阶段决定是否先探索再回来继续搜索。
    pub async fn locate<T, Q>(
        &self,
        world: &dyn World,
        what: &str,
        rounds: Option<u32>,
        mut query: Q,
    ) -> RetryOutcome<T>
    where
        Q: FnMut(&dyn World) -> Option<T>,
    {
        let mut misses = 0u32;
        loop {
            if let Some(found) = query(world) {
                return Ok(found);
            }
            misses += 1;
            tracing::debug!(what, misses, strategy = ?RetryStrategy::UnboundedIdempotent, "locate miss");
            world.report(&format!("No {what} found nearby, searching again..."));
            world.wait(self.miss_delay_ticks).await;
            if rounds.is_some_and(|limit| misses >= limit) {
                return Err(AgentError::SearchMiss(what.to_string()));
            }
        }
    }

    /// 改变世界状态的动作（SingleAttemptNonIdempotent）：只尝试一次，失败分类并上报
    pub async fn act<T, F>(&self, world: &dyn World, action: ActionKind, attempt: F) -> RetryOutcome<T>
    where
        F: Future<Output = Result<T, String>>,
    {
        match attempt.await {
            Ok(value) => Ok(value),
            Err(reason) => {
                let err = classify(action, reason);
                tracing::warn!(
                    %action,
                    error = %err,
                    strategy = ?RetryStrategy::SingleAttemptNonIdempotent,
                    "action failed"
                );
                world.report(&format!("Failed to {action}: {err}"));
                Err(err)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(40)
    }
}

fn classify(action: ActionKind, reason: String) -> AgentError {
    match action {
        ActionKind::Navigate => AgentError::NavigationFailure(reason),
        ActionKind::Open => AgentError::ContainerUnavailable(reason),
        _ => AgentError::ActionFailure { action, reason },
    }
}
