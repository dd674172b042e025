//! 背包账本：背包的只读视图
//!
//! 只保存最近一次快照；每个决策点前调用 refresh 重新读取，不跨挂起点缓存。

use crate::world::{BlockMatcher, ItemStack, World};

#[derive(Debug, Clone, Default)]
pub struct InventoryLedger {
    snapshot: Vec<ItemStack>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从世界重新读取背包
    pub fn refresh(&mut self, world: &dyn World) -> &Self {
        self.snapshot = world.inventory_snapshot();
        self
    }

    /// 匹配物品的总数
    pub fn count_matching(&self, matcher: &BlockMatcher) -> u32 {
        self.snapshot
            .iter()
            .filter(|s| matcher.matches_name(&s.name))
            .map(|s| s.count)
            .sum()
    }

    pub fn find(&self, name: &str) -> Option<&ItemStack> {
        self.snapshot.iter().find(|s| s.name == name)
    }

    /// 匹配的物品堆（按背包顺序）
    pub fn stacks_matching(&self, matcher: &BlockMatcher) -> Vec<ItemStack> {
        self.snapshot
            .iter()
            .filter(|s| matcher.matches_name(&s.name))
            .cloned()
            .collect()
    }
}
