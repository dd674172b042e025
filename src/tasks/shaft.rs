//! 竖井下挖：逐块挖掉脚下方块，等待下落
//!
//! 最多 N 次，或到达绝对深度阈值（floor(y) <= floor_y）即停止。
//! 脚下为空 / 非实体方块时以 VoidFloor 提前结束；采集失败立即停止并返回 ActionFailure。

use crate::core::{ActionKind, AgentError, RetryOutcome, RetryPolicy};
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescentStop {
    DepthReached,
    IterationsExhausted,
    /// 脚下没有可挖的实体方块
    VoidFloor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescentReport {
    pub harvested: u32,
    pub stop: DescentStop,
}

pub struct ShaftDescender<'a> {
    world: &'a dyn World,
    policy: &'a RetryPolicy,
    max_blocks: u32,
    floor_y: i32,
    settle_ticks: u32,
}

impl<'a> ShaftDescender<'a> {
    pub fn new(
        world: &'a dyn World,
        policy: &'a RetryPolicy,
        max_blocks: u32,
        floor_y: i32,
        settle_ticks: u32,
    ) -> Self {
        Self {
            world,
            policy,
            max_blocks,
            floor_y,
            settle_ticks,
        }
    }

    fn depth_reached(&self) -> bool {
        self.world.position().floored().y <= self.floor_y
    }

    pub async fn descend(&self) -> RetryOutcome<DescentReport> {
        let mut harvested = 0u32;
        while harvested < self.max_blocks {
            if self.depth_reached() {
                self.world.report(&format!("Reached level {}!", self.floor_y));
                return Ok(DescentReport {
                    harvested,
                    stop: DescentStop::DepthReached,
                });
            }

            let below = self.world.position().floored().below();
            let block = match self.world.block_at(below) {
                Some(block) if block.is_solid() => block,
                _ => {
                    self.world.report("No block below to mine!");
                    return Err(AgentError::VoidFloor { below, harvested });
                }
            };

            self.policy
                .act(self.world, ActionKind::Dig, self.world.harvest(&block))
                .await?;
            harvested += 1;
            self.world.wait(self.settle_ticks).await;
        }

        let stop = if self.depth_reached() {
            DescentStop::DepthReached
        } else {
            DescentStop::IterationsExhausted
        };
        tracing::info!(harvested, ?stop, "descent finished");
        Ok(DescentReport { harvested, stop })
    }
}
