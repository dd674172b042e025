//! 探索规划：目标不在感知范围内时，随机选一个水平方向和距离移动过去
//!
//! 目的地保持当前高度，只沿一个基本方向偏移。导航失败只记录，不向上传播，
//! 调用方随后重新进入搜索。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::{ActionKind, RetryPolicy};
use crate::world::{Position, World};

/// 水平基本方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinal {
    East,
    West,
    South,
    North,
}

impl Cardinal {
    pub const ALL: [Cardinal; 4] = [Cardinal::East, Cardinal::West, Cardinal::South, Cardinal::North];

    /// (dx, dz)
    pub fn unit(&self) -> (f64, f64) {
        match self {
            Cardinal::East => (1.0, 0.0),
            Cardinal::West => (-1.0, 0.0),
            Cardinal::South => (0.0, 1.0),
            Cardinal::North => (0.0, -1.0),
        }
    }
}

/// 移动距离
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    /// [min, max] 闭区间内均匀取整数
    Between(u32, u32),
    /// 固定距离（离开已耗尽的资源点）
    Fixed(u32),
}

/// 一次规划的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destination {
    pub direction: Cardinal,
    pub distance: u32,
    pub goal: Position,
}

/// 一次探索移动的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExploreOutcome {
    pub destination: Destination,
    pub arrived: bool,
}

pub struct ExplorationPlanner {
    rng: StdRng,
    tolerance: f64,
}

impl ExplorationPlanner {
    pub fn new(tolerance: f64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            tolerance,
        }
    }

    /// 固定种子（测试可复现）
    pub fn with_seed(seed: u64, tolerance: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            tolerance,
        }
    }

    /// 以 anchor 的水平坐标为起点、保持 current_y 计算目的地
    pub fn plan(&mut self, anchor: Position, current_y: f64, distance: Distance) -> Destination {
        let direction = Cardinal::ALL[self.rng.gen_range(0..Cardinal::ALL.len())];
        let distance = match distance {
            Distance::Between(min, max) => self.rng.gen_range(min.min(max)..=max.max(min)),
            Distance::Fixed(d) => d,
        };
        let (dx, dz) = direction.unit();
        let goal = Position::new(
            anchor.x + dx * distance as f64,
            current_y,
            anchor.z + dz * distance as f64,
        );
        Destination {
            direction,
            distance,
            goal,
        }
    }

    /// 从当前位置随机探索一段距离
    pub async fn explore(
        &mut self,
        world: &dyn World,
        policy: &RetryPolicy,
        min: u32,
        max: u32,
    ) -> ExploreOutcome {
        let here = world.position();
        let destination = self.plan(here, here.y, Distance::Between(min, max));
        world.report(&format!(
            "Exploring: moving {} blocks in a random direction...",
            destination.distance
        ));
        let arrived = self.go(world, policy, destination).await;
        if arrived {
            world.report("Exploration move complete. Searching again...");
        }
        ExploreOutcome {
            destination,
            arrived,
        }
    }

    /// 离开 anchor（如已取空的箱子）固定距离
    pub async fn relocate_from(
        &mut self,
        world: &dyn World,
        policy: &RetryPolicy,
        anchor: Position,
        distance: u32,
    ) -> ExploreOutcome {
        let here = world.position();
        let destination = self.plan(anchor, here.y, Distance::Fixed(distance));
        world.report(&format!("Moving {distance} blocks away from the container..."));
        let arrived = self.go(world, policy, destination).await;
        if arrived {
            world.report("Arrived at new work site.");
        }
        ExploreOutcome {
            destination,
            arrived,
        }
    }

    async fn go(&self, world: &dyn World, policy: &RetryPolicy, destination: Destination) -> bool {
        tracing::debug!(
            direction = ?destination.direction,
            distance = destination.distance,
            goal = %destination.goal,
            "exploration move"
        );
        let result = policy
            .act(
                world,
                ActionKind::Navigate,
                world.navigate_to(destination.goal, self.tolerance),
            )
            .await;
        result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::sim::SimWorld;
    use crate::world::BlockPos;

    #[test]
    fn test_destination_keeps_height_and_single_axis() {
        let origin = Position::new(10.5, 64.0, -3.5);
        for seed in 0..200 {
            let mut planner = ExplorationPlanner::with_seed(seed, 1.0);
            let dest = planner.plan(origin, origin.y, Distance::Between(2, 6));
            assert_eq!(dest.goal.y, origin.y);
            let dx = (dest.goal.x - origin.x).abs();
            let dz = (dest.goal.z - origin.z).abs();
            // 恰好沿一个轴移动
            assert!((dx == 0.0) != (dz == 0.0), "seed {seed}: dx={dx} dz={dz}");
            let moved = dx.max(dz);
            assert!((2.0..=6.0).contains(&moved), "seed {seed}: moved {moved}");
            assert_eq!(moved, dest.distance as f64);
        }
    }

    #[test]
    fn test_all_directions_reachable() {
        let mut planner = ExplorationPlanner::with_seed(7, 1.0);
        let origin = Position::new(0.0, 0.0, 0.0);
        let mut seen = Vec::new();
        for _ in 0..100 {
            let dest = planner.plan(origin, 0.0, Distance::Fixed(20));
            assert_eq!(dest.distance, 20);
            if !seen.contains(&dest.direction) {
                seen.push(dest.direction);
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[tokio::test]
    async fn test_explore_navigation_failure_is_not_propagated() {
        let world = SimWorld::new(Position::new(0.5, 1.0, 0.5));
        world.add_layer(-1, 0, "stone");
        for (dx, dz) in [(3, 0), (-3, 0), (0, 3), (0, -3)] {
            world.fail_navigation_to(BlockPos::new(dx, 1, dz));
        }
        let policy = RetryPolicy::default();
        let mut planner = ExplorationPlanner::with_seed(1, 1.0);
        let outcome = planner.explore(&world, &policy, 3, 3).await;
        assert!(!outcome.arrived);
        assert_eq!(world.position(), Position::new(0.5, 1.0, 0.5));
        assert!(world.reports().iter().any(|r| r.starts_with("Failed to navigate")));
    }

    #[tokio::test]
    async fn test_relocate_moves_fixed_distance_from_anchor() {
        let world = SimWorld::new(Position::new(3.5, 1.0, 0.5));
        world.add_layer(-1, 0, "stone");
        let policy = RetryPolicy::default();
        let mut planner = ExplorationPlanner::with_seed(3, 1.0);
        let anchor = Position::new(2.0, 1.0, 0.0);
        let outcome = planner.relocate_from(&world, &policy, anchor, 20).await;
        assert!(outcome.arrived);
        let goal = outcome.destination.goal;
        let moved = (goal.x - anchor.x).abs() + (goal.z - anchor.z).abs();
        assert_eq!(moved, 20.0);
        assert_eq!(world.position(), goal);
    }
}
