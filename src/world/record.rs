//! 世界层原始记录与边界校验
//!
//! 世界层（场景文件、外部协议）给出的方块 / 物品记录是松散类型的：字段可能缺失、
//! 坐标可能是小数、数量可能为负。这里统一校验为 BlockSample / ItemStack，
//! 不合法的记录返回 `AgentError::InvalidRecord`，不进入核心逻辑。

use serde::Deserialize;

use crate::core::AgentError;
use crate::world::{BlockPos, BlockSample, ItemStack, Position, TypeId};

/// 原始方块记录
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBlockRecord {
    #[serde(default)]
    pub position: Option<Vec<f64>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub type_id: Option<i64>,
}

/// 原始物品记录
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItemRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub type_id: Option<i64>,
    #[serde(default)]
    pub count: Option<i64>,
}

/// 原始容器记录：容器方块 + 内容物
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContainerRecord {
    #[serde(flatten)]
    pub block: RawBlockRecord,
    #[serde(default)]
    pub items: Vec<RawItemRecord>,
}

/// 水平无限延伸的地层 [from_y, to_y]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLayer {
    pub from_y: i64,
    pub to_y: i64,
    pub name: String,
}

/// 场景文件（JSON）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScene {
    #[serde(default)]
    pub agent: Option<Vec<f64>>,
    #[serde(default)]
    pub void_below: Option<i64>,
    #[serde(default)]
    pub layers: Vec<RawLayer>,
    #[serde(default)]
    pub blocks: Vec<RawBlockRecord>,
    #[serde(default)]
    pub containers: Vec<RawContainerRecord>,
    #[serde(default)]
    pub inventory: Vec<RawItemRecord>,
}

pub fn parse_scene(json: &str) -> Result<RawScene, AgentError> {
    serde_json::from_str(json).map_err(|e| AgentError::InvalidRecord(format!("scene: {e}")))
}

fn validate_name(name: Option<&String>, what: &str) -> Result<String, AgentError> {
    match name.map(|n| n.trim()) {
        Some(n) if !n.is_empty() => Ok(n.to_string()),
        _ => Err(AgentError::InvalidRecord(format!("{what} without a name"))),
    }
}

fn validate_type_id(
    raw: Option<i64>,
    name: &str,
    resolve: &mut impl FnMut(&str) -> TypeId,
) -> Result<TypeId, AgentError> {
    match raw {
        Some(id) => TypeId::try_from(id)
            .map_err(|_| AgentError::InvalidRecord(format!("{name}: bad type id {id}"))),
        None => Ok(resolve(name)),
    }
}

/// 世界边界：坐标绝对值上限，留出足够余量让方块坐标加减偏移时不溢出 i32
pub const WORLD_LIMIT: f64 = 30_000_000.0;

pub fn validate_position(coords: &[f64]) -> Result<Position, AgentError> {
    match coords {
        [x, y, z] if coords.iter().all(|c| c.is_finite()) => {
            if coords.iter().any(|c| c.abs() > WORLD_LIMIT) {
                return Err(AgentError::InvalidRecord(format!(
                    "position {coords:?} is outside the world border"
                )));
            }
            Ok(Position::new(*x, *y, *z))
        }
        _ => Err(AgentError::InvalidRecord(format!(
            "position must be three finite numbers, got {coords:?}"
        ))),
    }
}

pub fn validate_block_pos(coords: &[f64]) -> Result<BlockPos, AgentError> {
    let pos = validate_position(coords)?;
    if coords.iter().any(|c| c.fract() != 0.0) {
        return Err(AgentError::InvalidRecord(format!(
            "block position must be block-aligned, got {pos}"
        )));
    }
    Ok(pos.floored())
}

/// 校验方块记录；未给出类型 ID 时由 resolve 按名称分配
pub fn validate_block(
    raw: &RawBlockRecord,
    mut resolve: impl FnMut(&str) -> TypeId,
) -> Result<BlockSample, AgentError> {
    let name = validate_name(raw.name.as_ref(), "block")?;
    let coords = raw
        .position
        .as_deref()
        .ok_or_else(|| AgentError::InvalidRecord(format!("block {name} without a position")))?;
    let position = validate_block_pos(coords)?;
    let type_id = validate_type_id(raw.type_id, &name, &mut resolve)?;
    Ok(BlockSample {
        position,
        type_id,
        name,
    })
}

pub fn validate_item(
    raw: &RawItemRecord,
    mut resolve: impl FnMut(&str) -> TypeId,
) -> Result<ItemStack, AgentError> {
    let name = validate_name(raw.name.as_ref(), "item")?;
    let count = match raw.count.unwrap_or(1) {
        c if c > 0 => u32::try_from(c)
            .map_err(|_| AgentError::InvalidRecord(format!("{name}: count {c} too large")))?,
        c => {
            return Err(AgentError::InvalidRecord(format!(
                "{name}: count must be positive, got {c}"
            )))
        }
    };
    let type_id = validate_type_id(raw.type_id, &name, &mut resolve)?;
    Ok(ItemStack {
        type_id,
        name,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_block_assigns_id() {
        let raw = RawBlockRecord {
            position: Some(vec![3.0, -2.0, 7.0]),
            name: Some("diamond_ore".into()),
            type_id: None,
        };
        let block = validate_block(&raw, |_| 42).unwrap();
        assert_eq!(block.position, BlockPos::new(3, -2, 7));
        assert_eq!(block.type_id, 42);
        assert_eq!(block.name, "diamond_ore");
    }

    #[test]
    fn test_validate_block_rejects_fractional_and_missing() {
        let fractional = RawBlockRecord {
            position: Some(vec![3.5, 0.0, 0.0]),
            name: Some("stone".into()),
            type_id: None,
        };
        assert!(matches!(
            validate_block(&fractional, |_| 1),
            Err(AgentError::InvalidRecord(_))
        ));

        let unnamed = RawBlockRecord {
            position: Some(vec![0.0, 0.0, 0.0]),
            name: Some("  ".into()),
            type_id: None,
        };
        assert!(validate_block(&unnamed, |_| 1).is_err());

        let short = RawBlockRecord {
            position: Some(vec![0.0, 0.0]),
            name: Some("stone".into()),
            type_id: None,
        };
        assert!(validate_block(&short, |_| 1).is_err());
    }

    #[test]
    fn test_coordinates_beyond_world_border_rejected() {
        let far = RawBlockRecord {
            position: Some(vec![3.0e9, 0.0, 0.0]),
            name: Some("stone".into()),
            type_id: None,
        };
        assert!(matches!(
            validate_block(&far, |_| 1),
            Err(AgentError::InvalidRecord(_))
        ));
        assert!(validate_position(&[0.5, -1.0e12, 0.5]).is_err());
        assert!(validate_block_pos(&[30_000_000.0, -64.0, 0.0]).is_ok());
    }

    #[test]
    fn test_validate_item_counts() {
        let ok = RawItemRecord {
            name: Some("torch".into()),
            type_id: Some(7),
            count: Some(16),
        };
        let item = validate_item(&ok, |_| 0).unwrap();
        assert_eq!((item.type_id, item.count), (7, 16));

        let negative = RawItemRecord {
            name: Some("torch".into()),
            type_id: None,
            count: Some(-1),
        };
        assert!(validate_item(&negative, |_| 0).is_err());

        let bad_id = RawItemRecord {
            name: Some("torch".into()),
            type_id: Some(-3),
            count: None,
        };
        assert!(validate_item(&bad_id, |_| 0).is_err());
    }

    #[test]
    fn test_parse_scene() {
        let scene = parse_scene(
            r#"{
                "agent": [0.5, 1.0, 0.5],
                "layers": [{"from_y": -4, "to_y": 0, "name": "stone"}],
                "containers": [{"position": [2, 1, 0], "name": "chest",
                                "items": [{"name": "iron_pickaxe", "count": 2}]}]
            }"#,
        )
        .unwrap();
        assert_eq!(scene.layers.len(), 1);
        assert_eq!(scene.containers[0].items.len(), 1);
        assert_eq!(scene.containers[0].block.name.as_deref(), Some("chest"));

        assert!(parse_scene("{ not json").is_err());
    }
}
