//! 世界抽象：坐标与方块类型、World / ContainerHandle trait、场景记录与模拟世界

pub mod record;
pub mod sim;
pub mod traits;
pub mod types;

pub use record::RawScene;
pub use sim::{SimEvent, SimWorld};
pub use traits::{ContainerHandle, World};
pub use types::{BlockMatcher, BlockPos, BlockSample, Face, HandSlot, ItemStack, Position, TypeId};
