//! 采集程序（无界循环；设置 agent.max_cycles 时跑满轮数后进入 Completed）
//!
//! 每一轮：采集目标方块直到背包中数量达到要求 → 找容器 → 存入所有匹配物品 → 暂停。
//! 找不到目标方块时会探索；找不到容器时原地等待重查，不离开当前位置。
//! 任何错误只结束当前轮，上报后等待再开始下一轮。

use std::sync::Arc;

use serde::Serialize;

use crate::core::{ActionKind, RecoveryAction, RetryOutcome, TaskOrchestrator, TaskState};
use crate::tasks::ContainerInteractor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GatheringReport {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub harvested: u64,
    pub stored: u64,
}

impl TaskOrchestrator {
    pub async fn run_gathering(&mut self) -> RetryOutcome<GatheringReport> {
        let world = Arc::clone(&self.world);
        let max_cycles = self.config.agent.max_cycles;
        let pause = self.config.timing.cycle_pause;
        let mut report = GatheringReport::default();

        while max_cycles.map_or(true, |max| report.cycles < max) {
            report.cycles += 1;
            tracing::info!(cycle = report.cycles, "gathering cycle started");
            match self.gather_cycle(&mut report).await {
                Ok(()) => world.wait(pause).await,
                Err(err) => {
                    report.failed_cycles += 1;
                    let action = self.recovery.handle(&err, self.program, self.tracker.current());
                    let delay = match action {
                        RecoveryAction::RetryAfterDelay(ticks) => ticks,
                        RecoveryAction::RestartCycle | RecoveryAction::EndSubPhase => pause,
                        // 搜索未命中在搜索循环内部处理，不会走到这里
                        RecoveryAction::Explore => pause,
                        RecoveryAction::Abort => {
                            self.fail(&err);
                            return Err(err);
                        }
                    };
                    tracing::warn!(cycle = report.cycles, error = %err, ?action, delay, "gathering cycle failed");
                    world.report(&format!("Cycle error: {err}"));
                    world.wait(delay).await;
                }
            }
        }

        self.enter(TaskState::Completed)?;
        tracing::info!(
            cycles = report.cycles,
            failed = report.failed_cycles,
            stored = report.stored,
            "gathering finished"
        );
        Ok(report)
    }

    async fn gather_cycle(&mut self, report: &mut GatheringReport) -> RetryOutcome<()> {
        self.collect(report).await?;
        self.store(report).await
    }

    /// 一块一块地采集，直到背包中匹配物品数量达到要求
    async fn collect(&mut self, report: &mut GatheringReport) -> RetryOutcome<()> {
        let world = Arc::clone(&self.world);
        let targets = self.config.gathering.target_matcher();
        let what = targets.to_string();
        let required = self.config.gathering.required;
        let radius = self.config.gathering.target_radius;

        loop {
            let held = self.ledger.refresh(world.as_ref()).count_matching(&targets);
            if held >= required {
                world.report(&format!("Collected {held} {what}, heading to storage."));
                return Ok(());
            }

            let block = self.locate_or_explore(&what, &targets, radius).await?;
            self.travel_to(&block).await?;
            self.enter(TaskState::Acquiring)?;
            self.policy
                .act(world.as_ref(), ActionKind::Dig, world.harvest(&block))
                .await?;
            report.harvested += 1;
            world.report(&format!("Collected a {} ({}/{required}).", block.name, held + 1));
        }
    }

    /// 找到最近的容器，存入所有目标物品
    async fn store(&mut self, report: &mut GatheringReport) -> RetryOutcome<()> {
        let world = Arc::clone(&self.world);
        let containers = self.config.gathering.container_matcher();
        let targets = self.config.gathering.target_matcher();
        let radius = self.config.gathering.container_radius;

        let container = self
            .locate_in_place(&containers.to_string(), &containers, radius)
            .await?;
        self.travel_to(&container).await?;
        world.wait(self.config.timing.arrival_settle).await;

        self.enter(TaskState::Storing)?;
        let transfer = ContainerInteractor::new(world.as_ref(), &self.policy)
            .deposit_all(&container, &targets)
            .await?;
        let stored: u64 = transfer.moved.iter().map(|s| u64::from(s.count)).sum();
        report.stored += stored;
        if !transfer.failed.is_empty() {
            tracing::warn!(failed = transfer.failed.len(), "some items could not be deposited");
        }
        world.report(&format!("Stored {stored} items."));
        Ok(())
    }
}
