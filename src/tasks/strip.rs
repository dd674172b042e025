//! 条带挖矿：沿 +x 方向挖隧道，每一步探测 5 个非后退方向寻找目标矿石
//!
//! 发现矿石即交给 VeinExtractor 采完整条矿脉并结束；否则挖掉前方方块、前进一格，
//! 每挖够 K 块放一次标记。

use crate::core::{ActionKind, AgentError, RetryOutcome, RetryPolicy};
use crate::tasks::marker::PeriodicMarker;
use crate::tasks::vein::{VeinExtractor, VeinReport, VisitedSet};
use crate::world::{BlockMatcher, BlockPos, HandSlot, World};

/// 前进方向
const FORWARD: (i32, i32, i32) = (1, 0, 0);

/// 探测顺序：前、左、右、上、下（不含后方）
pub const PROBE_OFFSETS: [(i32, i32, i32); 5] = [
    FORWARD,
    (0, 0, -1),
    (0, 0, 1),
    (0, 1, 0),
    (0, -1, 0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripReport {
    /// 隧道中挖掉的方块数（不含矿脉）
    pub tunnel_blocks: u32,
    pub marker_attempts: u32,
    pub found_at: BlockPos,
    pub vein: VeinReport,
}

pub struct StripMiner<'a> {
    world: &'a dyn World,
    policy: &'a RetryPolicy,
    ore: &'a BlockMatcher,
    tool: &'a str,
    marker: PeriodicMarker,
    max_steps: Option<u32>,
    step_settle_ticks: u32,
    vein_settle_ticks: u32,
}

impl<'a> StripMiner<'a> {
    pub fn new(
        world: &'a dyn World,
        policy: &'a RetryPolicy,
        ore: &'a BlockMatcher,
        tool: &'a str,
        marker: PeriodicMarker,
    ) -> Self {
        Self {
            world,
            policy,
            ore,
            tool,
            marker,
            max_steps: None,
            step_settle_ticks: 5,
            vein_settle_ticks: 5,
        }
    }

    pub fn with_max_steps(mut self, max_steps: Option<u32>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_settle_ticks(mut self, step: u32, vein: u32) -> Self {
        self.step_settle_ticks = step;
        self.vein_settle_ticks = vein;
        self
    }

    fn probe(&self, feet: BlockPos) -> Option<BlockPos> {
        PROBE_OFFSETS
            .iter()
            .map(|d| feet.offset(*d))
            .find(|pos| {
                self.world
                    .block_at(*pos)
                    .is_some_and(|block| self.ore.matches(&block))
            })
    }

    pub async fn run(mut self) -> RetryOutcome<StripReport> {
        self.world.report(&format!("Starting strip mining for {}...", self.ore));
        let mut tunnel_blocks = 0u32;
        let mut steps = 0u32;

        loop {
            let feet = self.world.position().floored();
            if let Some(found_at) = self.probe(feet) {
                self.world.report(&format!("{} found! Mining...", self.ore));
                let extractor = VeinExtractor::new(self.world, self.policy, self.vein_settle_ticks);
                let vein = extractor
                    .extract(found_at, self.ore, &mut VisitedSet::new())
                    .await?;
                self.world.report(&format!("All connected {} mined!", self.ore));
                return Ok(StripReport {
                    tunnel_blocks,
                    marker_attempts: self.marker.attempts(),
                    found_at,
                    vein,
                });
            }

            if self.max_steps.is_some_and(|max| steps >= max) {
                return Err(AgentError::SearchMiss(format!(
                    "{} within {steps} blocks of tunnel",
                    self.ore
                )));
            }

            let forward = feet.offset(FORWARD);
            let mut dug = false;
            if let Some(block) = self.world.block_at(forward).filter(|b| b.is_solid()) {
                self.policy
                    .act(self.world, ActionKind::Dig, self.world.harvest(&block))
                    .await?;
                tunnel_blocks += 1;
                dug = true;
            }

            self.policy
                .act(
                    self.world,
                    ActionKind::Navigate,
                    self.world.navigate_to(forward.center(), 0.0),
                )
                .await?;
            self.world.wait(self.step_settle_ticks).await;
            steps += 1;

            if dug && self.marker.record_harvest() {
                self.marker.place(self.world, self.policy).await;
                self.reequip_tool().await?;
            }
        }
    }

    async fn reequip_tool(&self) -> RetryOutcome<()> {
        let Some(tool) = self
            .world
            .inventory_snapshot()
            .into_iter()
            .find(|s| s.name == self.tool)
        else {
            return Err(AgentError::action(
                ActionKind::Equip,
                format!("no {} in inventory", self.tool),
            ));
        };
        self.policy
            .act(self.world, ActionKind::Equip, self.world.equip(&tool, HandSlot::Hand))
            .await
    }
}
