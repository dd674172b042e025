//! 行为程序：在 TaskOrchestrator 上实现的两条阶段流水线
//!
//! - mining：找箱子 → 取工具 → 竖井下挖 → 条带挖矿 → 采完矿脉后结束
//! - gathering：采集目标方块直到数量足够 → 存入容器 → 暂停 → 下一轮

pub mod gathering;
pub mod mining;

pub use gathering::GatheringReport;
pub use mining::MiningReport;
