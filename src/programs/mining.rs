//! 采矿程序（有界，到达终态即结束）

use std::sync::Arc;

use crate::core::{
    ActionKind, AgentError, RecoveryAction, RetryOutcome, TaskOrchestrator, TaskState,
};
use crate::tasks::{
    ContainerInteractor, DescentReport, DescentStop, PeriodicMarker, ShaftDescender, StripMiner,
    StripReport,
};
use crate::world::{BlockMatcher, BlockSample, HandSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningReport {
    pub descent: DescentReport,
    pub strip: StripReport,
}

impl MiningReport {
    pub fn harvested(&self) -> u64 {
        u64::from(self.descent.harvested)
            + u64::from(self.strip.tunnel_blocks)
            + self.strip.vein.harvested as u64
    }
}

impl TaskOrchestrator {
    /// 运行采矿程序；任何不可恢复的错误都会先转入 Failed 再返回
    pub async fn run_mining(&mut self) -> RetryOutcome<MiningReport> {
        match self.mine().await {
            Ok(report) => {
                self.enter(TaskState::Completed)?;
                self.world.report("Mining complete!");
                tracing::info!(harvested = report.harvested(), "mining finished");
                Ok(report)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    async fn mine(&mut self) -> RetryOutcome<MiningReport> {
        let world = Arc::clone(&self.world);
        let chest = self.reach_chest().await?;
        world.report("Arrived at chest.");
        world.wait(self.config.timing.arrival_settle).await;

        self.enter(TaskState::Acquiring)?;
        let wanted = self.config.mining.withdraw_items();
        let transfer = ContainerInteractor::new(world.as_ref(), &self.policy)
            .withdraw_all(&chest, &wanted)
            .await?;
        if !transfer.failed.is_empty() {
            tracing::warn!(failed = transfer.failed.len(), "some items could not be withdrawn");
        }
        world.report("Got the goods.");

        let distance = self.config.mining.relocate_distance;
        let moved = self
            .planner
            .relocate_from(world.as_ref(), &self.policy, chest.position.center(), distance)
            .await;
        if !moved.arrived {
            tracing::warn!(goal = %moved.destination.goal, "relocation failed, mining from here");
        }

        self.enter(TaskState::Descending)?;
        self.equip_tool().await?;
        let descent = {
            let mining = &self.config.mining;
            ShaftDescender::new(
                world.as_ref(),
                &self.policy,
                mining.descent_blocks,
                mining.floor_y,
                self.config.timing.fall_settle,
            )
            .descend()
            .await
        };
        let descent = match descent {
            Ok(report) => report,
            Err(err) => {
                let action = self.recovery.handle(&err, self.program, self.tracker.current());
                let dug = match &err {
                    AgentError::VoidFloor { harvested, .. } => Some(*harvested),
                    _ => None,
                };
                match (action, dug) {
                    (RecoveryAction::EndSubPhase, Some(harvested)) => {
                        tracing::warn!(error = %err, "descent ended early");
                        DescentReport {
                            harvested,
                            stop: DescentStop::VoidFloor,
                        }
                    }
                    _ => return Err(err),
                }
            }
        };
        world.wait(self.config.timing.post_descent).await;

        self.enter(TaskState::StripMining)?;
        self.equip_tool().await?;
        let mining = &self.config.mining;
        let ore = BlockMatcher::named(mining.ore.clone());
        let marker = PeriodicMarker::new(mining.marker.clone(), mining.marker_interval);
        let strip = StripMiner::new(world.as_ref(), &self.policy, &ore, &mining.tool, marker)
            .with_max_steps(mining.max_tunnel_length)
            .with_settle_ticks(self.config.timing.step_settle, self.config.timing.vein_settle)
            .run()
            .await?;

        Ok(MiningReport { descent, strip })
    }

    /// 找到箱子并走过去；导航失败时按恢复建议探索后重新搜索
    async fn reach_chest(&mut self) -> RetryOutcome<BlockSample> {
        let matcher = BlockMatcher::named(self.config.mining.container_block.clone());
        let radius = self.config.mining.container_radius;
        self.world.report(&format!("Looking for a {}...", matcher));
        loop {
            let chest = self.locate_or_explore("chest", &matcher, radius).await?;
            match self.travel_to(&chest).await {
                Ok(()) => return Ok(chest),
                Err(err) => match self.recovery.handle(&err, self.program, self.tracker.current()) {
                    RecoveryAction::Explore => {
                        self.explore().await?;
                    }
                    _ => return Err(err),
                },
            }
        }
    }

    /// 从背包中找到工具并拿在主手
    async fn equip_tool(&mut self) -> RetryOutcome<()> {
        let world = Arc::clone(&self.world);
        let tool = self
            .ledger
            .refresh(world.as_ref())
            .find(&self.config.mining.tool)
            .cloned();
        let Some(tool) = tool else {
            world.report(&format!("No {} found in inventory!", self.config.mining.tool));
            return Err(AgentError::action(
                ActionKind::Equip,
                format!("no {} in inventory", self.config.mining.tool),
            ));
        };
        self.policy
            .act(world.as_ref(), ActionKind::Equip, world.equip(&tool, HandSlot::Hand))
            .await
    }
}
