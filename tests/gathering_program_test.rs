//! 采集程序端到端测试

use std::sync::Arc;
use std::time::Duration;

use mole::config::AppConfig;
use mole::core::{run_orchestrator, Program, TaskOrchestrator, TaskState};
use mole::tasks::{Distance, ExplorationPlanner};
use mole::world::{BlockPos, Position, SimEvent, SimWorld, World};

const CHEST: BlockPos = BlockPos::new(-3, 1, 0);

fn gathering_world() -> SimWorld {
    let world = SimWorld::new(Position::new(0.5, 1.0, 0.5));
    world.add_layer(-4, 0, "stone");
    for y in 1..=3 {
        world.set_block(BlockPos::new(3, y, 0), "oak_log");
    }
    world.set_block(BlockPos::new(3, 1, 3), "birch_log");
    world.set_block(BlockPos::new(3, 1, -3), "birch_log");
    world.add_container(CHEST, "chest", &[]);
    world
}

const SEED: u64 = 11;

fn config(max_cycles: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.agent.max_cycles = Some(max_cycles);
    config
}

fn orchestrator_with(world: &SimWorld, config: AppConfig) -> TaskOrchestrator {
    let shared: Arc<dyn World> = Arc::new(world.clone());
    TaskOrchestrator::new(shared, config, Program::Gathering)
        .with_planner(ExplorationPlanner::with_seed(SEED, 1.0))
}

fn orchestrator(world: &SimWorld, max_cycles: u64) -> TaskOrchestrator {
    orchestrator_with(world, config(max_cycles))
}

fn harvests_before_first_deposit(events: &[SimEvent]) -> usize {
    events
        .iter()
        .take_while(|e| !matches!(e, SimEvent::Deposited(..)))
        .filter(|e| matches!(e, SimEvent::Harvested(..)))
        .count()
}

#[tokio::test]
async fn test_collects_exactly_required_before_storing() {
    let world = gathering_world();

    let summary = run_orchestrator(orchestrator(&world, 1)).await.unwrap();

    assert_eq!(harvests_before_first_deposit(&world.events()), 4);
    assert_eq!(summary.harvested, 4);
    assert_eq!(summary.stored, 4);
    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.failed_cycles, 0);
    assert_eq!(summary.final_state, TaskState::Completed);
    assert!(summary.transitions.contains(&TaskState::Storing));

    let stored: u32 = world.container_items(CHEST).iter().map(|s| s.count).sum();
    assert_eq!(stored, 4);
    // 5 根原木只采 4 根
    assert_eq!(world.harvested().len(), 4);
}

#[tokio::test]
async fn test_container_failure_retries_next_cycle_without_recollecting() {
    let world = gathering_world();
    world.fail_container_open();

    let mut agent = orchestrator(&world, 2);
    let report = agent.run_gathering().await.unwrap();

    assert_eq!(report.cycles, 2);
    assert_eq!(report.failed_cycles, 2);
    assert_eq!(report.stored, 0);
    // 第二轮背包里已有 4 根，直接去存储
    assert_eq!(report.harvested, 4);
    assert_eq!(world.count_events(|e| matches!(e, SimEvent::OpenFailed(_))), 2);
    assert!(world.reports().iter().any(|m| m.starts_with("Cycle error: ")));
    assert_eq!(agent.tracker().current(), TaskState::Completed);
}

#[tokio::test]
async fn test_dig_failure_restarts_cycle() {
    let world = gathering_world();
    world.fail_harvest_at(BlockPos::new(3, 1, 0));

    let mut agent = orchestrator(&world, 1);
    let report = agent.run_gathering().await.unwrap();

    assert_eq!(report.failed_cycles, 1);
    assert_eq!(report.harvested, 0);
    assert_eq!(world.count_events(|e| matches!(e, SimEvent::Deposited(..))), 0);
}

#[tokio::test]
async fn test_missing_container_waits_in_place() {
    let world = SimWorld::new(Position::new(0.5, 1.0, 0.5));
    world.add_layer(-4, 0, "stone");
    world.give("oak_log", 4);

    let mut agent = orchestrator(&world, 1);
    let result = tokio::time::timeout(Duration::from_millis(50), agent.run_gathering()).await;

    // 找不到容器时一直原地重查
    assert!(result.is_err());
    assert_eq!(world.count_events(|e| matches!(e, SimEvent::Navigated(_))), 0);
    assert!(world.count_events(|e| matches!(e, SimEvent::Waited(_))) > 1);
    assert_eq!(world.position(), Position::new(0.5, 1.0, 0.5));
    assert_eq!(agent.tracker().current(), TaskState::Searching);
    assert!(!agent.tracker().visited(TaskState::Exploring));
}

#[tokio::test]
async fn test_target_out_of_range_explores_then_harvests() {
    let start = Position::new(0.5, 1.0, 0.5);
    let mut preview = ExplorationPlanner::with_seed(SEED, 1.0);
    let destination = preview.plan(start, start.y, Distance::Between(2, 6));
    let (dx, dz) = destination.direction.unit();
    // 原木在第一次探索落点再往前 3 格
    let log = destination
        .goal
        .floored()
        .offset((3 * dx as i32, 0, 3 * dz as i32));

    let world = SimWorld::new(start);
    world.add_layer(-4, 0, "stone");
    world.set_block(log, "spruce_log");
    world.add_container(BlockPos::new(-10, 1, -10), "chest", &[]);
    let mut config = config(1);
    config.gathering.target_radius = 4;
    config.gathering.required = 1;

    let summary = run_orchestrator(orchestrator_with(&world, config)).await.unwrap();

    assert!(summary.transitions.contains(&TaskState::Exploring));
    assert_eq!(summary.harvested, 1);
    assert_eq!(summary.stored, 1);
    assert_eq!(world.harvested(), vec![log]);
    assert_eq!(summary.final_state, TaskState::Completed);
}
