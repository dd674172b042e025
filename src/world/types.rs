//! 世界数据类型：坐标、方块快照、物品堆、匹配谓词
//!
//! 所有类型都是值类型；BlockSample / ItemStack 是某一时刻的只读快照，随时可能过期，
//! 决策前必须重新查询。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 方块类型 ID（由世界层分配）
pub type TypeId = u32;

/// 不阻挡移动、不能作为落脚点的方块
const PASSABLE_BLOCKS: &[&str] = &[
    "air",
    "cave_air",
    "void_air",
    "water",
    "lava",
    "torch",
    "wall_torch",
    "short_grass",
];

/// 连续世界坐标
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 向下取整得到所在方块坐标
    pub fn floored(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// 方块对齐坐标（VisitedSet 的键）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(&self, (dx, dy, dz): (i32, i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn below(&self) -> Self {
        self.offset((0, -1, 0))
    }

    /// 方块底面中心，作为导航目标
    pub fn center(&self) -> Position {
        Position::new(self.x as f64 + 0.5, self.y as f64, self.z as f64 + 0.5)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// 方块快照：位置、类型 ID、类型名
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlockSample {
    pub position: BlockPos,
    pub type_id: TypeId,
    pub name: String,
}

impl BlockSample {
    pub fn is_air(&self) -> bool {
        matches!(self.name.as_str(), "air" | "cave_air" | "void_air")
    }

    /// 可站立、可挖掘的实体方块
    pub fn is_solid(&self) -> bool {
        !PASSABLE_BLOCKS.contains(&self.name.as_str())
    }
}

/// 物品堆
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub type_id: TypeId,
    pub name: String,
    pub count: u32,
}

/// 放置方块时贴靠的面
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Up,
    Down,
    East,
    West,
    South,
    North,
}

impl Face {
    pub fn vector(&self) -> (i32, i32, i32) {
        match self {
            Face::Up => (0, 1, 0),
            Face::Down => (0, -1, 0),
            Face::East => (1, 0, 0),
            Face::West => (-1, 0, 0),
            Face::South => (0, 0, 1),
            Face::North => (0, 0, -1),
        }
    }
}

/// 装备槽位
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandSlot {
    Hand,
}

/// 名称匹配谓词：精确名列表 + 后缀列表，任一命中即匹配
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockMatcher {
    names: Vec<String>,
    suffixes: Vec<String>,
}

impl BlockMatcher {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            suffixes: Vec::new(),
        }
    }

    pub fn any_named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            suffixes: Vec::new(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffixes.push(suffix.into());
        self
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name) || self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    pub fn matches(&self, block: &BlockSample) -> bool {
        self.matches_name(&block.name)
    }
}

impl fmt::Display for BlockMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.names.clone();
        parts.extend(self.suffixes.iter().map(|s| format!("*{s}")));
        write!(f, "{}", parts.join("|"))
    }
}
