//! Mole - 方块世界中的自主资源采集智能体
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误与恢复、重试策略、阶段状态机、主控编排器、优雅关闭
//! - **observability**: 日志订阅器初始化
//! - **programs**: 采矿与采集两个行为程序
//! - **tasks**: 子任务组件（矿脉提取、竖井、条带挖矿、标记、容器、探索、背包）
//! - **world**: 世界抽象、场景记录与模拟世界

pub mod config;
pub mod core;
pub mod observability;
pub mod programs;
pub mod tasks;
pub mod world;

pub use crate::core::{run_agent, AgentError, Program, RunSummary, TaskState};
