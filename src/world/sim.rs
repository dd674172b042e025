//! 模拟世界（用于测试与演示，无需连接真实服务器）
//!
//! 水平无限延伸的地层 + 显式覆盖的方块、容器、背包、手持物品；
//! 等待与导航后施加重力；低于 void_below 的位置视为世界之外。
//! 所有交互写入事件日志，并支持按位置 / 动作注入故障。

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::world::record::{validate_block, validate_item, validate_position, RawScene};
use crate::world::{
    BlockMatcher, BlockPos, BlockSample, ContainerHandle, Face, HandSlot, ItemStack, Position,
    TypeId, World,
};

const AIR: &str = "air";

/// 模拟世界中发生的交互
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Sampled(BlockPos),
    Harvested(BlockPos, String),
    HarvestFailed(BlockPos),
    Placed(BlockPos, String),
    PlaceFailed(BlockPos),
    Equipped(String),
    EquipFailed(String),
    Navigated(Position),
    NavigationFailed(Position),
    Opened(BlockPos),
    OpenFailed(BlockPos),
    Withdrew(String, u32),
    Deposited(String, u32),
    TransferFailed(String),
    Closed(BlockPos),
    Waited(u32),
    Report(String),
}

#[derive(Debug, Default)]
struct Faults {
    harvest_at: HashSet<BlockPos>,
    navigate_to: HashSet<BlockPos>,
    /// 只失败一次的导航目标
    navigate_once: HashSet<BlockPos>,
    container_open: bool,
    placements: bool,
    equip: bool,
    transfer_items: HashSet<String>,
}

#[derive(Debug)]
struct SimState {
    layers: Vec<(i32, i32, String)>,
    overrides: HashMap<BlockPos, Option<String>>,
    void_below: i32,
    registry: HashMap<String, TypeId>,
    agent: Position,
    inventory: Vec<ItemStack>,
    held: Option<String>,
    containers: HashMap<BlockPos, Vec<ItemStack>>,
    ticks: u64,
    events: Vec<SimEvent>,
    faults: Faults,
}

impl SimState {
    fn type_id(&mut self, name: &str) -> TypeId {
        if name == AIR {
            return 0;
        }
        let next = self.registry.len() as TypeId + 1;
        *self.registry.entry(name.to_string()).or_insert(next)
    }

    fn name_at(&self, pos: BlockPos) -> Option<String> {
        if pos.y < self.void_below {
            return None;
        }
        if let Some(cell) = self.overrides.get(&pos) {
            return Some(cell.clone().unwrap_or_else(|| AIR.to_string()));
        }
        let layer = self
            .layers
            .iter()
            .find(|(from, to, _)| (*from..=*to).contains(&pos.y))
            .map(|(_, _, name)| name.clone());
        Some(layer.unwrap_or_else(|| AIR.to_string()))
    }

    fn sample(&mut self, pos: BlockPos) -> Option<BlockSample> {
        let name = self.name_at(pos)?;
        Some(BlockSample {
            position: pos,
            type_id: self.type_id(&name),
            name,
        })
    }

    fn is_solid(&mut self, pos: BlockPos) -> bool {
        self.sample(pos).map(|b| b.is_solid()).unwrap_or(false)
    }

    fn apply_gravity(&mut self) {
        loop {
            let below = self.agent.floored().below();
            if below.y < self.void_below || self.is_solid(below) {
                break;
            }
            self.agent.y = below.y as f64;
        }
    }

    fn add_item(&mut self, name: &str, count: u32) {
        if let Some(stack) = self.inventory.iter_mut().find(|s| s.name == name) {
            stack.count += count;
            return;
        }
        let type_id = self.type_id(name);
        self.inventory.push(ItemStack {
            type_id,
            name: name.to_string(),
            count,
        });
    }

    fn take_item(&mut self, name: &str, count: u32) -> Result<(), String> {
        let idx = self
            .inventory
            .iter()
            .position(|s| s.name == name && s.count >= count)
            .ok_or_else(|| format!("not enough {name} in inventory"))?;
        self.inventory[idx].count -= count;
        if self.inventory[idx].count == 0 {
            self.inventory.remove(idx);
            if self.held.as_deref() == Some(name) {
                self.held = None;
            }
        }
        Ok(())
    }

    fn standing_cell(&mut self, goal: Position, tolerance: f64) -> Result<Position, String> {
        let cell = goal.floored();
        if cell.y < self.void_below {
            return Err(format!("goal {goal} is outside the world"));
        }
        if !self.is_solid(cell) {
            return Ok(goal);
        }
        if tolerance < 1.0 {
            return Err(format!("goal {goal} is inside a solid block"));
        }
        [(1, 0, 0), (-1, 0, 0), (0, 0, 1), (0, 0, -1), (0, 1, 0)]
            .into_iter()
            .map(|d| cell.offset(d))
            .find(|c| c.y >= self.void_below && !self.is_solid(*c))
            .map(|c| c.center())
            .ok_or_else(|| format!("no standing spot near {goal}"))
    }
}

/// 模拟世界
#[derive(Clone)]
pub struct SimWorld {
    state: Arc<Mutex<SimState>>,
    realtime_tick: Option<Duration>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimWorld {
    pub fn new(agent: Position) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                layers: Vec::new(),
                overrides: HashMap::new(),
                void_below: -64,
                registry: HashMap::new(),
                agent,
                inventory: Vec::new(),
                held: None,
                containers: HashMap::new(),
                ticks: 0,
                events: Vec::new(),
                faults: Faults::default(),
            })),
            realtime_tick: None,
        }
    }

    /// 由场景记录构建；所有记录在此处校验
    pub fn from_scene(scene: &RawScene) -> Result<Self, AgentError> {
        let agent = match scene.agent.as_deref() {
            Some(coords) => validate_position(coords)?,
            None => Position::new(0.5, 1.0, 0.5),
        };
        let world = Self::new(agent);
        if let Some(void_below) = scene.void_below {
            let y = i32::try_from(void_below)
                .map_err(|_| AgentError::InvalidRecord(format!("void_below {void_below}")))?;
            world.set_void_below(y);
        }
        for layer in &scene.layers {
            let (from, to) = match (i32::try_from(layer.from_y), i32::try_from(layer.to_y)) {
                (Ok(from), Ok(to)) if from <= to => (from, to),
                _ => {
                    return Err(AgentError::InvalidRecord(format!(
                        "layer {} has a bad range",
                        layer.name
                    )))
                }
            };
            world.add_layer(from, to, &layer.name);
        }

        let mut guard = lock(&world.state);
        let state = &mut *guard;
        for raw in &scene.blocks {
            let block = validate_block(raw, |n| state.type_id(n))?;
            state.overrides.insert(block.position, Some(block.name));
        }
        for raw in &scene.containers {
            let block = validate_block(&raw.block, |n| state.type_id(n))?;
            let items = raw
                .items
                .iter()
                .map(|item| validate_item(item, |n| state.type_id(n)))
                .collect::<Result<Vec<_>, _>>()?;
            state.overrides.insert(block.position, Some(block.name));
            state.containers.insert(block.position, items);
        }
        for raw in &scene.inventory {
            let item = validate_item(raw, |n| state.type_id(n))?;
            state.add_item(&item.name, item.count);
        }
        drop(guard);
        Ok(world)
    }

    /// 每个逻辑 tick 对应的真实时长（演示用；测试中不设置）
    pub fn with_realtime_tick(mut self, tick: Duration) -> Self {
        self.realtime_tick = Some(tick);
        self
    }

    pub fn add_layer(&self, from_y: i32, to_y: i32, name: &str) {
        lock(&self.state).layers.push((from_y, to_y, name.to_string()));
    }

    pub fn set_void_below(&self, y: i32) {
        lock(&self.state).void_below = y;
    }

    pub fn set_block(&self, pos: BlockPos, name: &str) {
        let cell = (name != AIR).then(|| name.to_string());
        lock(&self.state).overrides.insert(pos, cell);
    }

    pub fn add_container(&self, pos: BlockPos, name: &str, items: &[(&str, u32)]) {
        let mut state = lock(&self.state);
        state.overrides.insert(pos, Some(name.to_string()));
        let stacks = items
            .iter()
            .map(|(item, count)| ItemStack {
                type_id: state.type_id(item),
                name: item.to_string(),
                count: *count,
            })
            .collect();
        state.containers.insert(pos, stacks);
    }

    pub fn give(&self, name: &str, count: u32) {
        lock(&self.state).add_item(name, count);
    }

    pub fn fail_harvest_at(&self, pos: BlockPos) {
        lock(&self.state).faults.harvest_at.insert(pos);
    }

    pub fn fail_navigation_to(&self, pos: BlockPos) {
        lock(&self.state).faults.navigate_to.insert(pos);
    }

    /// 下一次导航到该格失败，之后恢复正常
    pub fn fail_next_navigation_to(&self, pos: BlockPos) {
        lock(&self.state).faults.navigate_once.insert(pos);
    }

    pub fn fail_container_open(&self) {
        lock(&self.state).faults.container_open = true;
    }

    pub fn fail_placements(&self) {
        lock(&self.state).faults.placements = true;
    }

    pub fn fail_equip(&self) {
        lock(&self.state).faults.equip = true;
    }

    pub fn fail_transfer_of(&self, item: &str) {
        lock(&self.state).faults.transfer_items.insert(item.to_string());
    }

    pub fn events(&self) -> Vec<SimEvent> {
        lock(&self.state).events.clone()
    }

    pub fn count_events(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
        lock(&self.state).events.iter().filter(|e| pred(e)).count()
    }

    /// 成功采集的方块位置（按时间顺序）
    pub fn harvested(&self) -> Vec<BlockPos> {
        lock(&self.state)
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Harvested(pos, _) => Some(*pos),
                _ => None,
            })
            .collect()
    }

    pub fn harvest_attempts(&self) -> usize {
        self.count_events(|e| matches!(e, SimEvent::Harvested(..) | SimEvent::HarvestFailed(_)))
    }

    pub fn reports(&self) -> Vec<String> {
        lock(&self.state)
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Report(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn container_items(&self, pos: BlockPos) -> Vec<ItemStack> {
        lock(&self.state).containers.get(&pos).cloned().unwrap_or_default()
    }

    pub fn held(&self) -> Option<String> {
        lock(&self.state).held.clone()
    }

    pub fn ticks(&self) -> u64 {
        lock(&self.state).ticks
    }

    /// 不记录事件的方块读取（测试断言用）
    pub fn peek(&self, pos: BlockPos) -> Option<String> {
        lock(&self.state).name_at(pos)
    }
}

#[async_trait]
impl World for SimWorld {
    fn position(&self) -> Position {
        lock(&self.state).agent
    }

    fn block_at(&self, pos: BlockPos) -> Option<BlockSample> {
        let mut state = lock(&self.state);
        state.events.push(SimEvent::Sampled(pos));
        state.sample(pos)
    }

    fn find_nearest(&self, matcher: &BlockMatcher, max_distance: u32) -> Option<BlockSample> {
        let mut state = lock(&self.state);
        let agent = state.agent;
        let nearest = state
            .overrides
            .iter()
            .filter_map(|(pos, cell)| cell.as_ref().map(|name| (*pos, name)))
            .filter(|(_, name)| matcher.matches_name(name))
            .map(|(pos, _)| (agent.distance_to(&pos.center()), pos))
            .filter(|(dist, _)| *dist <= max_distance as f64)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, pos)| pos)?;
        state.sample(nearest)
    }

    fn inventory_snapshot(&self) -> Vec<ItemStack> {
        lock(&self.state).inventory.clone()
    }

    async fn navigate_to(&self, goal: Position, tolerance: f64) -> Result<(), String> {
        let mut state = lock(&self.state);
        let cell = goal.floored();
        if state.faults.navigate_to.contains(&cell) || state.faults.navigate_once.remove(&cell) {
            state.events.push(SimEvent::NavigationFailed(goal));
            return Err(format!("no path to {goal}"));
        }
        match state.standing_cell(goal, tolerance) {
            Ok(stand) => {
                state.agent = stand;
                state.apply_gravity();
                state.events.push(SimEvent::Navigated(goal));
                Ok(())
            }
            Err(reason) => {
                state.events.push(SimEvent::NavigationFailed(goal));
                Err(reason)
            }
        }
    }

    async fn harvest(&self, block: &BlockSample) -> Result<(), String> {
        let mut state = lock(&self.state);
        let pos = block.position;
        let current = match state.sample(pos) {
            Some(current) if !current.is_air() => current,
            _ => {
                state.events.push(SimEvent::HarvestFailed(pos));
                return Err(format!("nothing to dig at {pos}"));
            }
        };
        if current.name != block.name {
            state.events.push(SimEvent::HarvestFailed(pos));
            return Err(format!("block at {pos} is now {}", current.name));
        }
        if state.faults.harvest_at.contains(&pos) {
            state.events.push(SimEvent::HarvestFailed(pos));
            return Err(format!("digging {} at {pos} was interrupted", current.name));
        }
        state.overrides.insert(pos, None);
        state.add_item(&current.name, 1);
        state.events.push(SimEvent::Harvested(pos, current.name));
        Ok(())
    }

    async fn place_block(&self, reference: &BlockSample, face: Face) -> Result<(), String> {
        let mut state = lock(&self.state);
        let target = reference.position.offset(face.vector());
        let result = (|| {
            if state.faults.placements {
                return Err("placement rejected".to_string());
            }
            if !state.is_solid(reference.position) {
                return Err(format!("cannot place against {}", reference.name));
            }
            if state.name_at(target).is_none() || state.is_solid(target) {
                return Err(format!("{target} is occupied"));
            }
            let held = state.held.clone().ok_or_else(|| "nothing in hand".to_string())?;
            state.take_item(&held, 1)?;
            state.overrides.insert(target, Some(held.clone()));
            Ok(held)
        })();
        match result {
            Ok(name) => {
                state.events.push(SimEvent::Placed(target, name));
                Ok(())
            }
            Err(reason) => {
                state.events.push(SimEvent::PlaceFailed(target));
                Err(reason)
            }
        }
    }

    async fn equip(&self, item: &ItemStack, _slot: HandSlot) -> Result<(), String> {
        let mut state = lock(&self.state);
        let held = state.inventory.iter().any(|s| s.name == item.name);
        if state.faults.equip || !held {
            state.events.push(SimEvent::EquipFailed(item.name.clone()));
            return Err(format!("cannot equip {}", item.name));
        }
        state.held = Some(item.name.clone());
        state.events.push(SimEvent::Equipped(item.name.clone()));
        Ok(())
    }

    async fn open_container(&self, block: &BlockSample) -> Result<Box<dyn ContainerHandle>, String> {
        let mut state = lock(&self.state);
        let pos = block.position;
        if state.faults.container_open || !state.containers.contains_key(&pos) {
            state.events.push(SimEvent::OpenFailed(pos));
            return Err(format!("cannot open {} at {pos}", block.name));
        }
        state.events.push(SimEvent::Opened(pos));
        Ok(Box::new(SimContainer {
            state: Arc::clone(&self.state),
            pos,
        }))
    }

    async fn wait(&self, ticks: u32) {
        {
            let mut state = lock(&self.state);
            state.ticks += u64::from(ticks);
            state.apply_gravity();
            state.events.push(SimEvent::Waited(ticks));
        }
        match self.realtime_tick {
            Some(tick) => tokio::time::sleep(tick * ticks).await,
            // 不真实等待时也让出执行权
            None => tokio::task::yield_now().await,
        }
    }

    fn report(&self, message: &str) {
        tracing::info!(target: "mole::chat", "{}", message);
        lock(&self.state).events.push(SimEvent::Report(message.to_string()));
    }
}

/// 模拟容器：直接操作共享的世界状态
struct SimContainer {
    state: Arc<Mutex<SimState>>,
    pos: BlockPos,
}

#[async_trait]
impl ContainerHandle for SimContainer {
    fn items(&self) -> Vec<ItemStack> {
        lock(&self.state).containers.get(&self.pos).cloned().unwrap_or_default()
    }

    async fn withdraw(&mut self, type_id: TypeId, count: u32) -> Result<(), String> {
        let mut state = lock(&self.state);
        let slots = state.containers.get_mut(&self.pos).ok_or("container is gone")?;
        let idx = slots
            .iter()
            .position(|s| s.type_id == type_id && s.count >= count)
            .ok_or_else(|| format!("container has fewer than {count} of type {type_id}"))?;
        let name = slots[idx].name.clone();
        if state.faults.transfer_items.contains(&name) {
            state.events.push(SimEvent::TransferFailed(name.clone()));
            return Err(format!("withdrawing {name} was rejected"));
        }
        if let Some(slots) = state.containers.get_mut(&self.pos) {
            slots[idx].count -= count;
            if slots[idx].count == 0 {
                slots.remove(idx);
            }
        }
        state.add_item(&name, count);
        state.events.push(SimEvent::Withdrew(name, count));
        Ok(())
    }

    async fn deposit(&mut self, type_id: TypeId, count: u32) -> Result<(), String> {
        let mut state = lock(&self.state);
        let name = state
            .inventory
            .iter()
            .find(|s| s.type_id == type_id)
            .map(|s| s.name.clone())
            .ok_or_else(|| format!("no item of type {type_id} in inventory"))?;
        if state.faults.transfer_items.contains(&name) {
            state.events.push(SimEvent::TransferFailed(name.clone()));
            return Err(format!("depositing {name} was rejected"));
        }
        state.take_item(&name, count)?;
        let slots = state.containers.entry(self.pos).or_default();
        match slots.iter_mut().find(|s| s.type_id == type_id) {
            Some(stack) => stack.count += count,
            None => slots.push(ItemStack {
                type_id,
                name: name.clone(),
                count,
            }),
        }
        state.events.push(SimEvent::Deposited(name, count));
        Ok(())
    }

    async fn close(self: Box<Self>) {
        lock(&self.state).events.push(SimEvent::Closed(self.pos));
    }
}
