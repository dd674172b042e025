//! Mole - 方块世界资源采集智能体
//!
//! 用法：`mole [mining|gathering] [scene.json]`
//! 入口：加载配置、初始化日志、构建模拟世界，在优雅关闭下运行行为程序，最后输出 JSON 摘要。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mole::config::load_config;
use mole::core::{run_agent, run_with_graceful_shutdown, Program, ShutdownManager};
use mole::observability;
use mole::world::record::parse_scene;
use mole::world::{SimWorld, World};

const DEMO_SCENE: &str = include_str!("../demos/scene.json");

fn load_scene(path: Option<&Path>) -> anyhow::Result<SimWorld> {
    let json = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene {}", path.display()))?,
        None => DEMO_SCENE.to_string(),
    };
    let scene = parse_scene(&json)?;
    Ok(SimWorld::from_scene(&scene)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let program_arg = args.next();
    let scene_arg = args.next().map(PathBuf::from);

    let config = load_config(None).context("Failed to load config")?;
    observability::init(&config.agent.log_level);

    let program: Program = program_arg
        .as_deref()
        .unwrap_or(&config.agent.program)
        .parse()?;
    let scene_path = scene_arg.or_else(|| config.world.scene.clone());

    let mut world = load_scene(scene_path.as_deref())?;
    if config.world.tick_ms > 0 {
        world = world.with_realtime_tick(Duration::from_millis(config.world.tick_ms));
    }
    let world: Arc<dyn World> = Arc::new(world);
    tracing::info!(%program, scene = ?scene_path, "starting mole");

    let shutdown = Arc::new(ShutdownManager::new());
    let mut reasons = shutdown.subscribe();
    let outcome = run_with_graceful_shutdown(shutdown, run_agent(world, config, program)).await;

    match outcome {
        Some(Ok(summary)) => {
            let line = serde_json::to_string(&summary).context("Failed to encode summary")?;
            println!("{line}");
            Ok(())
        }
        Some(Err(err)) => Err(anyhow::anyhow!("agent failed: {err}")),
        None => {
            match reasons.try_recv() {
                Ok(reason) => tracing::info!(?reason, "agent interrupted before finishing"),
                Err(_) => tracing::info!("agent interrupted before finishing"),
            }
            Ok(())
        }
    }
}
