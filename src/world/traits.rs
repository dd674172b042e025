//! 世界交互抽象
//!
//! 核心逻辑只通过 World / ContainerHandle 与世界交互：查询是同步的新鲜读取，
//! 改变世界或背包的动作是 async 的，挂起直到世界确认结果。
//! 动作失败以 `Err(String)` 返回原因，由 RetryPolicy 负责分类。

use async_trait::async_trait;

use crate::world::{BlockMatcher, BlockPos, BlockSample, Face, HandSlot, ItemStack, Position, TypeId};

/// 单个智能体所在的世界
#[async_trait]
pub trait World: Send + Sync {
    /// 智能体当前位置
    fn position(&self) -> Position;

    /// 读取指定位置的方块；未加载或世界之外返回 None
    fn block_at(&self, pos: BlockPos) -> Option<BlockSample>;

    /// 在感知范围内查找最近的匹配方块
    fn find_nearest(&self, matcher: &BlockMatcher, max_distance: u32) -> Option<BlockSample>;

    /// 当前背包快照（有序）
    fn inventory_snapshot(&self) -> Vec<ItemStack>;

    /// 导航到目标附近（tolerance 内即算到达）
    async fn navigate_to(&self, goal: Position, tolerance: f64) -> Result<(), String>;

    /// 挖掘 / 采集一个方块
    async fn harvest(&self, block: &BlockSample) -> Result<(), String>;

    /// 贴着参考方块的某个面放置手持方块
    async fn place_block(&self, reference: &BlockSample, face: Face) -> Result<(), String>;

    async fn equip(&self, item: &ItemStack, slot: HandSlot) -> Result<(), String>;

    async fn open_container(&self, block: &BlockSample) -> Result<Box<dyn ContainerHandle>, String>;

    /// 挂起固定的逻辑时长（tick）
    async fn wait(&self, ticks: u32);

    /// 观测通道（游戏内聊天），发出即忘
    fn report(&self, message: &str);
}

/// 已打开的容器
#[async_trait]
pub trait ContainerHandle: Send {
    /// 容器内的物品堆
    fn items(&self) -> Vec<ItemStack>;

    async fn withdraw(&mut self, type_id: TypeId, count: u32) -> Result<(), String>;

    async fn deposit(&mut self, type_id: TypeId, count: u32) -> Result<(), String>;

    async fn close(self: Box<Self>);
}
