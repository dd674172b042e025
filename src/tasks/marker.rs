//! 周期标记：条带挖矿中每成功挖掉 K 个方块，在脚下地面放一个标记（火把）
//!
//! 任何失败都只上报，不影响挖矿循环。

use crate::core::{ActionKind, RetryPolicy};
use crate::world::{Face, HandSlot, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOutcome {
    Placed,
    NoneLeft,
    Unplaceable,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PeriodicMarker {
    item: String,
    interval: u32,
    harvested: u32,
    attempts: u32,
}

impl PeriodicMarker {
    pub fn new(item: impl Into<String>, interval: u32) -> Self {
        Self {
            item: item.into(),
            interval: interval.max(1),
            harvested: 0,
            attempts: 0,
        }
    }

    /// 记录一次成功采集；返回是否该放标记了
    pub fn record_harvest(&mut self) -> bool {
        self.harvested += 1;
        self.harvested % self.interval == 0
    }

    pub fn harvested(&self) -> u32 {
        self.harvested
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// 在脚下地面放置标记
    pub async fn place(&mut self, world: &dyn World, policy: &RetryPolicy) -> MarkerOutcome {
        self.attempts += 1;
        let outcome = self.try_place(world, policy).await;
        tracing::debug!(item = %self.item, ?outcome, attempt = self.attempts, "marker placement");
        outcome
    }

    async fn try_place(&self, world: &dyn World, policy: &RetryPolicy) -> MarkerOutcome {
        let Some(marker) = world
            .inventory_snapshot()
            .into_iter()
            .find(|s| s.name == self.item)
        else {
            world.report(&format!("No {} left to place!", self.item));
            return MarkerOutcome::NoneLeft;
        };

        if policy
            .act(world, ActionKind::Equip, world.equip(&marker, HandSlot::Hand))
            .await
            .is_err()
        {
            return MarkerOutcome::Failed;
        }

        let floor = world.position().floored().below();
        let Some(floor) = world.block_at(floor).filter(|b| b.is_solid()) else {
            world.report(&format!("Cannot place {} here.", self.item));
            return MarkerOutcome::Unplaceable;
        };

        match policy
            .act(world, ActionKind::Place, world.place_block(&floor, Face::Up))
            .await
        {
            Ok(()) => {
                world.report(&format!("Placed a {}.", self.item));
                MarkerOutcome::Placed
            }
            Err(_) => MarkerOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::sim::{SimEvent, SimWorld};
    use crate::world::{BlockPos, Position};

    #[test]
    fn test_interval_over_25_harvests() {
        let mut marker = PeriodicMarker::new("torch", 10);
        let due: Vec<u32> = (1..=25).filter(|_| marker.record_harvest()).collect();
        assert_eq!(due, vec![10, 20]);
        assert_eq!(marker.harvested(), 25);
    }

    #[tokio::test]
    async fn test_place_on_floor() {
        let world = SimWorld::new(Position::new(0.5, 1.0, 0.5));
        world.add_layer(-1, 0, "stone");
        world.give("torch", 3);
        let policy = RetryPolicy::default();
        let mut marker = PeriodicMarker::new("torch", 10);

        assert_eq!(marker.place(&world, &policy).await, MarkerOutcome::Placed);
        assert_eq!(world.peek(BlockPos::new(0, 1, 0)).as_deref(), Some("torch"));
        assert_eq!(marker.attempts(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_non_fatal() {
        let world = SimWorld::new(Position::new(0.5, 1.0, 0.5));
        world.add_layer(-1, 0, "stone");
        let policy = RetryPolicy::default();
        let mut marker = PeriodicMarker::new("torch", 10);

        assert_eq!(marker.place(&world, &policy).await, MarkerOutcome::NoneLeft);

        world.give("torch", 3);
        world.fail_placements();
        assert_eq!(marker.place(&world, &policy).await, MarkerOutcome::Failed);
        assert_eq!(world.count_events(|e| matches!(e, SimEvent::PlaceFailed(_))), 1);
        assert_eq!(marker.attempts(), 2);
    }
}
