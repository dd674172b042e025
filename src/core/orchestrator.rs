//! 主控编排器：阶段状态机
//!
//! 持有世界上下文、重试策略、探索规划、恢复引擎、阶段追踪与背包账本；
//! 具体的行为程序见 `programs::mining` / `programs::gathering`。
//! 同一时刻只发出一个世界交互并等待其完成。

use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::core::{
    ActionKind, AgentError, PhaseTracker, Program, RecoveryAction, RecoveryEngine, RetryOutcome,
    RetryPolicy, TaskState,
};
use crate::tasks::{ExplorationPlanner, ExploreOutcome, InventoryLedger};
use crate::world::{BlockMatcher, BlockSample, World};

/// 一次运行的摘要（二进制以 JSON 输出）
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub program: Program,
    pub final_state: TaskState,
    pub transitions: Vec<TaskState>,
    /// 采集程序完成的轮数（采矿程序为 1）
    pub cycles: u64,
    pub failed_cycles: u64,
    /// 成功采集的方块数
    pub harvested: u64,
    /// 存入容器的物品数
    pub stored: u64,
}

pub struct TaskOrchestrator {
    pub(crate) world: Arc<dyn World>,
    pub(crate) config: AppConfig,
    pub(crate) program: Program,
    pub(crate) policy: RetryPolicy,
    pub(crate) planner: ExplorationPlanner,
    pub(crate) recovery: RecoveryEngine,
    pub(crate) tracker: PhaseTracker,
    pub(crate) ledger: InventoryLedger,
}

impl TaskOrchestrator {
    pub fn new(world: Arc<dyn World>, config: AppConfig, program: Program) -> Self {
        let tolerance = config.search.arrival_tolerance;
        Self {
            policy: RetryPolicy::new(config.timing.search_backoff),
            planner: ExplorationPlanner::new(tolerance),
            recovery: RecoveryEngine::new(config.timing.cycle_pause),
            tracker: PhaseTracker::new(),
            ledger: InventoryLedger::new(),
            world,
            config,
            program,
        }
    }

    /// 替换探索规划器（测试中注入固定种子）
    pub fn with_planner(mut self, planner: ExplorationPlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn tracker(&self) -> &PhaseTracker {
        &self.tracker
    }

    pub fn program(&self) -> Program {
        self.program
    }

    pub(crate) fn enter(&mut self, next: TaskState) -> RetryOutcome<()> {
        self.tracker.transition(next)
    }

    /// 搜索目标；未命中时按恢复引擎的建议先探索再回来搜索（整体无界）
    pub(crate) async fn locate_or_explore(
        &mut self,
        what: &str,
        matcher: &BlockMatcher,
        radius: u32,
    ) -> RetryOutcome<BlockSample> {
        let world = Arc::clone(&self.world);
        let rounds = self.config.search.rounds_before_explore;
        loop {
            self.enter(TaskState::Searching)?;
            let found = self
                .policy
                .locate(world.as_ref(), what, rounds, |w| w.find_nearest(matcher, radius))
                .await;
            match found {
                Ok(block) => {
                    tracing::info!(what, pos = %block.position, name = %block.name, "target located");
                    return Ok(block);
                }
                Err(err) => match self.recovery.handle(&err, self.program, self.tracker.current()) {
                    RecoveryAction::Explore => {
                        self.explore().await?;
                    }
                    _ => return Err(err),
                },
            }
        }
    }

    /// 原地搜索：未命中只等待后重查，不探索、不设轮数上限
    pub(crate) async fn locate_in_place(
        &mut self,
        what: &str,
        matcher: &BlockMatcher,
        radius: u32,
    ) -> RetryOutcome<BlockSample> {
        self.enter(TaskState::Searching)?;
        let world = Arc::clone(&self.world);
        let block = self
            .policy
            .locate(world.as_ref(), what, None, |w| w.find_nearest(matcher, radius))
            .await?;
        tracing::info!(what, pos = %block.position, name = %block.name, "target located");
        Ok(block)
    }

    pub(crate) async fn explore(&mut self) -> RetryOutcome<ExploreOutcome> {
        self.enter(TaskState::Exploring)?;
        let world = Arc::clone(&self.world);
        let (min, max) = (self.config.search.explore_min, self.config.search.explore_max);
        Ok(self.planner.explore(world.as_ref(), &self.policy, min, max).await)
    }

    /// 导航到方块附近
    pub(crate) async fn travel_to(&mut self, block: &BlockSample) -> RetryOutcome<()> {
        self.enter(TaskState::Traveling)?;
        let world = Arc::clone(&self.world);
        let tolerance = self.config.search.arrival_tolerance;
        self.policy
            .act(
                world.as_ref(),
                ActionKind::Navigate,
                world.navigate_to(block.position.center(), tolerance),
            )
            .await
    }

    /// 终止到 Failed，并经观测通道上报
    pub(crate) fn fail(&mut self, err: &AgentError) {
        let action = self.recovery.handle(err, self.program, self.tracker.current());
        tracing::error!(phase = ?self.tracker.current(), error = %err, ?action, "program failed");
        self.world.report(&format!("Error: {err}"));
        if let Err(e) = self.tracker.transition(TaskState::Failed) {
            tracing::warn!(error = %e, "failed to record terminal state");
        }
    }
}

/// 唯一入口：按选择运行采矿或采集程序
pub async fn run_agent(
    world: Arc<dyn World>,
    config: AppConfig,
    program: Program,
) -> RetryOutcome<RunSummary> {
    let orchestrator = TaskOrchestrator::new(world, config, program);
    run_orchestrator(orchestrator).await
}

/// 运行一个已构建好的编排器（测试可注入规划器）
pub async fn run_orchestrator(mut orchestrator: TaskOrchestrator) -> RetryOutcome<RunSummary> {
    let run_id = Uuid::new_v4().to_string();
    let program = orchestrator.program;
    let span = tracing::info_span!("agent", run = %run_id, %program);

    async move {
        tracing::info!("agent started");
        let mut summary = RunSummary {
            run_id: run_id.clone(),
            program,
            final_state: TaskState::Searching,
            transitions: Vec::new(),
            cycles: 0,
            failed_cycles: 0,
            harvested: 0,
            stored: 0,
        };

        let result = match program {
            Program::Mining => orchestrator.run_mining().await.map(|report| {
                summary.cycles = 1;
                summary.harvested = report.harvested();
            }),
            Program::Gathering => orchestrator.run_gathering().await.map(|report| {
                summary.cycles = report.cycles;
                summary.failed_cycles = report.failed_cycles;
                summary.harvested = report.harvested;
                summary.stored = report.stored;
            }),
        };

        result.map(|()| {
            summary.final_state = orchestrator.tracker.current();
            summary.transitions = orchestrator.tracker.history().to_vec();
            tracing::info!(final_state = ?summary.final_state, "agent finished");
            summary
        })
    }
    .instrument(span)
    .await
}
