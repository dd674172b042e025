//! 矿脉提取：采掉与起点 6 向相连的所有匹配方块
//!
//! 用显式栈实现，访问顺序与递归深度优先的先序完全一致：
//! 邻居按 +x, -x, +y, -y, +z, -z 的固定顺序逆序入栈，先入栈的后弹出。
//! 任一方块采集失败立即终止整次提取，不再探索任何待处理的邻居。

use std::collections::HashSet;

use crate::core::{ActionKind, RetryOutcome, RetryPolicy};
use crate::world::{BlockMatcher, BlockPos, World};

/// 6 个轴向邻居（不含对角）
pub const NEIGHBOR_OFFSETS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// 单次提取内已访问的方块；只增不减，不跨调用复用
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: HashSet<BlockPos>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 首次加入返回 true
    pub fn insert(&mut self, pos: BlockPos) -> bool {
        self.inner.insert(pos)
    }

    pub fn contains(&self, pos: &BlockPos) -> bool {
        self.inner.contains(pos)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VeinReport {
    pub harvested: usize,
    pub visited: usize,
}

pub struct VeinExtractor<'a> {
    world: &'a dyn World,
    policy: &'a RetryPolicy,
    settle_ticks: u32,
}

impl<'a> VeinExtractor<'a> {
    pub fn new(world: &'a dyn World, policy: &'a RetryPolicy, settle_ticks: u32) -> Self {
        Self {
            world,
            policy,
            settle_ticks,
        }
    }

    pub async fn extract(
        &self,
        start: BlockPos,
        matcher: &BlockMatcher,
        visited: &mut VisitedSet,
    ) -> RetryOutcome<VeinReport> {
        let mut stack = vec![start];
        let mut harvested = 0usize;

        while let Some(pos) = stack.pop() {
            if !visited.insert(pos) {
                continue;
            }
            let block = match self.world.block_at(pos) {
                Some(block) if matcher.matches(&block) => block,
                _ => continue,
            };

            let dug = self
                .policy
                .act(self.world, ActionKind::Dig, self.world.harvest(&block))
                .await;
            if let Err(err) = dug {
                tracing::warn!(%pos, harvested, "vein extraction aborted");
                return Err(err);
            }
            harvested += 1;
            tracing::debug!(%pos, name = %block.name, "vein block harvested");
            self.world.wait(self.settle_ticks).await;

            stack.extend(NEIGHBOR_OFFSETS.iter().rev().map(|d| pos.offset(*d)));
        }

        Ok(VeinReport {
            harvested,
            visited: visited.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AgentError;
    use crate::world::sim::{SimEvent, SimWorld};
    use crate::world::Position;

    fn world() -> SimWorld {
        let world = SimWorld::new(Position::new(0.5, 1.0, 0.5));
        world.add_layer(-10, 0, "stone");
        world
    }

    fn diamonds() -> BlockMatcher {
        BlockMatcher::named("diamond_ore")
    }

    #[tokio::test]
    async fn test_straight_vein_with_non_matching_neighbor() {
        let world = world();
        let vein = [
            BlockPos::new(5, -5, 0),
            BlockPos::new(6, -5, 0),
            BlockPos::new(7, -5, 0),
        ];
        for pos in vein {
            world.set_block(pos, "diamond_ore");
        }
        let policy = RetryPolicy::default();
        let extractor = VeinExtractor::new(&world, &policy, 5);
        let mut visited = VisitedSet::new();

        let report = extractor.extract(vein[0], &diamonds(), &mut visited).await.unwrap();

        assert_eq!(report.harvested, 3);
        assert_eq!(world.harvested(), vein.to_vec());
        // 非匹配邻居 (8,-5,0) 被采样但从未采集
        let stone = BlockPos::new(8, -5, 0);
        assert!(visited.contains(&stone));
        assert!(!world.harvested().contains(&stone));
        assert!(visited.len() >= 4);
        assert_eq!(world.harvest_attempts(), 3);
    }

    #[tokio::test]
    async fn test_region_of_k_blocks_harvests_exactly_k() {
        let world = world();
        // L 形 + 竖直分支，共 6 块
        let region = [
            BlockPos::new(0, -3, 0),
            BlockPos::new(1, -3, 0),
            BlockPos::new(1, -3, 1),
            BlockPos::new(1, -3, 2),
            BlockPos::new(1, -2, 2),
            BlockPos::new(0, -4, 0),
        ];
        for pos in region {
            world.set_block(pos, "diamond_ore");
        }
        // 仅对角相连，不属于同一矿脉
        world.set_block(BlockPos::new(2, -2, 3), "diamond_ore");

        let policy = RetryPolicy::default();
        let extractor = VeinExtractor::new(&world, &policy, 5);
        let mut visited = VisitedSet::new();
        let report = extractor.extract(region[0], &diamonds(), &mut visited).await.unwrap();

        assert_eq!(report.harvested, region.len());
        assert_eq!(world.harvest_attempts(), region.len());
        assert_eq!(world.peek(BlockPos::new(2, -2, 3)).as_deref(), Some("diamond_ore"));
    }

    #[tokio::test]
    async fn test_depth_first_order_matches_recursion() {
        let world = world();
        // 起点的 +x 分支必须在 -x 分支之前完整采完
        for pos in [
            BlockPos::new(0, -5, 0),
            BlockPos::new(1, -5, 0),
            BlockPos::new(1, -5, 1),
            BlockPos::new(-1, -5, 0),
        ] {
            world.set_block(pos, "diamond_ore");
        }
        let policy = RetryPolicy::default();
        let extractor = VeinExtractor::new(&world, &policy, 0);
        extractor
            .extract(BlockPos::new(0, -5, 0), &diamonds(), &mut VisitedSet::new())
            .await
            .unwrap();
        assert_eq!(
            world.harvested(),
            vec![
                BlockPos::new(0, -5, 0),
                BlockPos::new(1, -5, 0),
                BlockPos::new(1, -5, 1),
                BlockPos::new(-1, -5, 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_harvest_failure_aborts_whole_extraction() {
        let world = world();
        let line: Vec<BlockPos> = (0..5).map(|x| BlockPos::new(x, -5, 0)).collect();
        for pos in &line {
            world.set_block(*pos, "diamond_ore");
        }
        // 起点另一侧还有未访问的矿
        world.set_block(BlockPos::new(-1, -5, 0), "diamond_ore");
        world.fail_harvest_at(line[2]);

        let policy = RetryPolicy::default();
        let extractor = VeinExtractor::new(&world, &policy, 5);
        let result = extractor.extract(line[0], &diamonds(), &mut VisitedSet::new()).await;

        assert!(matches!(result, Err(AgentError::ActionFailure { .. })));
        assert_eq!(world.harvested(), vec![line[0], line[1]]);
        assert_eq!(world.harvest_attempts(), 3);
        let events = world.events();
        let failed_at = events
            .iter()
            .position(|e| matches!(e, SimEvent::HarvestFailed(_)))
            .unwrap();
        assert!(!events[failed_at..]
            .iter()
            .any(|e| matches!(e, SimEvent::Harvested(..) | SimEvent::Sampled(_))));
    }

    #[tokio::test]
    async fn test_visited_positions_are_never_resampled() {
        let world = world();
        let start = BlockPos::new(0, -5, 0);
        let skipped = BlockPos::new(1, -5, 0);
        world.set_block(start, "diamond_ore");
        world.set_block(skipped, "diamond_ore");

        let mut visited = VisitedSet::new();
        visited.insert(skipped);
        let policy = RetryPolicy::default();
        let extractor = VeinExtractor::new(&world, &policy, 5);
        let report = extractor.extract(start, &diamonds(), &mut visited).await.unwrap();

        assert_eq!(report.harvested, 1);
        assert_eq!(world.count_events(|e| *e == SimEvent::Sampled(skipped)), 0);
        assert_eq!(world.peek(skipped).as_deref(), Some("diamond_ore"));
    }

    #[tokio::test]
    async fn test_non_matching_start_is_pruned() {
        let world = world();
        world.set_block(BlockPos::new(1, -5, 0), "diamond_ore");
        let policy = RetryPolicy::default();
        let extractor = VeinExtractor::new(&world, &policy, 5);
        let mut visited = VisitedSet::new();
        let report = extractor
            .extract(BlockPos::new(0, -5, 0), &diamonds(), &mut visited)
            .await
            .unwrap();
        assert_eq!(report, VeinReport { harvested: 0, visited: 1 });
        assert_eq!(world.harvest_attempts(), 0);
    }
}
