//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `MOLE__*` 覆盖（双下划线表示嵌套，如 `MOLE__MINING__FLOOR_Y=-40`）。
//! 所有字段都有默认值，缺省时与原始行为程序的常量一致。

use std::path::PathBuf;

use serde::Deserialize;

use crate::world::BlockMatcher;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentSection,
    pub world: WorldSection,
    pub search: SearchSection,
    pub mining: MiningSection,
    pub gathering: GatheringSection,
    pub timing: TimingSection,
}

/// [agent] 段：行为程序、日志级别、循环上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// mining / gathering
    pub program: String,
    /// 默认日志指令，RUST_LOG 可覆盖
    pub log_level: String,
    /// 采集程序最多运行的轮数；None 表示一直运行
    pub max_cycles: Option<u64>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            program: "gathering".to_string(),
            log_level: "info".to_string(),
            max_cycles: None,
        }
    }
}

/// [world] 段：模拟世界的场景文件与真实 tick 时长
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldSection {
    pub scene: Option<PathBuf>,
    /// 每个逻辑 tick 的真实毫秒数（0 表示不真实等待）
    pub tick_ms: u64,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            scene: None,
            tick_ms: 50,
        }
    }
}

/// [search] 段：感知半径、探索前的搜索轮数、探索距离
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    /// 每轮搜索未命中后进入探索；None 表示只搜索不探索
    pub rounds_before_explore: Option<u32>,
    pub explore_min: u32,
    pub explore_max: u32,
    /// 导航到达容差（方块）
    pub arrival_tolerance: f64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            rounds_before_explore: Some(1),
            explore_min: 2,
            explore_max: 6,
            arrival_tolerance: 1.0,
        }
    }
}

/// [mining] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MiningSection {
    pub container_block: String,
    pub container_radius: u32,
    pub tool: String,
    pub marker: String,
    pub ore: String,
    /// 竖井最多下挖的方块数
    pub descent_blocks: u32,
    /// 绝对深度阈值
    pub floor_y: i32,
    pub marker_interval: u32,
    /// 取完工具后离开箱子的距离
    pub relocate_distance: u32,
    /// 条带隧道最大长度；None 表示不限
    pub max_tunnel_length: Option<u32>,
}

impl Default for MiningSection {
    fn default() -> Self {
        Self {
            container_block: "chest".to_string(),
            container_radius: 32,
            tool: "iron_pickaxe".to_string(),
            marker: "torch".to_string(),
            ore: "diamond_ore".to_string(),
            descent_blocks: 54,
            floor_y: -54,
            marker_interval: 10,
            relocate_distance: 20,
            max_tunnel_length: None,
        }
    }
}

impl MiningSection {
    pub fn withdraw_items(&self) -> Vec<String> {
        vec![self.tool.clone(), self.marker.clone()]
    }
}

/// [gathering] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatheringSection {
    /// 目标方块（采下后得到同名物品）
    pub targets: Vec<String>,
    pub target_radius: u32,
    /// 存储容器：精确名 + 后缀
    pub container_names: Vec<String>,
    pub container_suffixes: Vec<String>,
    pub container_radius: u32,
    /// 每轮需要采集的数量
    pub required: u32,
}

impl Default for GatheringSection {
    fn default() -> Self {
        Self {
            targets: vec![
                "oak_log".to_string(),
                "birch_log".to_string(),
                "spruce_log".to_string(),
            ],
            target_radius: 64,
            container_names: vec!["chest".to_string()],
            container_suffixes: vec!["_chest".to_string()],
            container_radius: 64,
            required: 4,
        }
    }
}

impl GatheringSection {
    pub fn target_matcher(&self) -> BlockMatcher {
        BlockMatcher::any_named(self.targets.iter().cloned())
    }

    pub fn container_matcher(&self) -> BlockMatcher {
        self.container_suffixes
            .iter()
            .fold(BlockMatcher::any_named(self.container_names.iter().cloned()), |m, s| {
                m.with_suffix(s.clone())
            })
    }
}

/// [timing] 段：所有逻辑等待（tick）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingSection {
    /// 定位未命中后的等待
    pub search_backoff: u32,
    /// 到达容器后的等待
    pub arrival_settle: u32,
    /// 下挖每块后的下落等待
    pub fall_settle: u32,
    /// 下挖结束后的等待
    pub post_descent: u32,
    /// 条带每前进一格的等待
    pub step_settle: u32,
    /// 矿脉每采一块的等待
    pub vein_settle: u32,
    /// 采集程序两轮之间的等待（出错后同样）
    pub cycle_pause: u32,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            search_backoff: 40,
            arrival_settle: 10,
            fall_settle: 10,
            post_descent: 20,
            step_settle: 5,
            vein_settle: 5,
            cycle_pause: 40,
        }
    }
}

/// 从 config 目录加载配置，环境变量 MOLE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 MOLE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("MOLE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
