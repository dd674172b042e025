//! 容器交互：打开容器，按物品取出 / 存入整堆，关闭容器
//!
//! 打开失败返回 ContainerUnavailable，由调用阶段经 RecoveryEngine 决定如何处理；
//! 单个物品转移失败只上报并继续处理其余物品。

use crate::core::{ActionKind, AgentError, RetryOutcome, RetryPolicy};
use crate::tasks::inventory::InventoryLedger;
use crate::world::{BlockMatcher, BlockSample, ItemStack, World};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferReport {
    /// 成功转移的物品堆
    pub moved: Vec<ItemStack>,
    /// 转移失败的物品及原因
    pub failed: Vec<(String, AgentError)>,
    /// 想要但容器里没有的物品
    pub missing: Vec<String>,
}

impl TransferReport {
    pub fn moved_count(&self, name: &str) -> u32 {
        self.moved.iter().filter(|s| s.name == name).map(|s| s.count).sum()
    }
}

pub struct ContainerInteractor<'a> {
    world: &'a dyn World,
    policy: &'a RetryPolicy,
}

impl<'a> ContainerInteractor<'a> {
    pub fn new(world: &'a dyn World, policy: &'a RetryPolicy) -> Self {
        Self { world, policy }
    }

    /// 取出容器中所有 wanted 物品（每种物品的全部堆）
    pub async fn withdraw_all(
        &self,
        container: &BlockSample,
        wanted: &[String],
    ) -> RetryOutcome<TransferReport> {
        let mut handle = self
            .policy
            .act(self.world, ActionKind::Open, self.world.open_container(container))
            .await?;
        self.world.report(&format!("Opened the {}!", container.name));

        let mut report = TransferReport::default();
        let slots = handle.items();
        for name in wanted {
            let matching: Vec<&ItemStack> = slots.iter().filter(|s| &s.name == name).collect();
            if matching.is_empty() {
                self.world.report(&format!("No {name} found in {}.", container.name));
                report.missing.push(name.clone());
                continue;
            }
            for slot in matching {
                match self
                    .policy
                    .act(
                        self.world,
                        ActionKind::Withdraw,
                        handle.withdraw(slot.type_id, slot.count),
                    )
                    .await
                {
                    Ok(()) => {
                        self.world.report(&format!("Withdrew {} {}.", slot.count, slot.name));
                        report.moved.push(slot.clone());
                    }
                    Err(err) => report.failed.push((slot.name.clone(), err)),
                }
            }
        }

        handle.close().await;
        tracing::info!(
            moved = report.moved.len(),
            failed = report.failed.len(),
            missing = report.missing.len(),
            "withdraw finished"
        );
        Ok(report)
    }

    /// 存入背包中所有匹配的物品堆
    pub async fn deposit_all(
        &self,
        container: &BlockSample,
        matcher: &BlockMatcher,
    ) -> RetryOutcome<TransferReport> {
        let mut handle = self
            .policy
            .act(self.world, ActionKind::Open, self.world.open_container(container))
            .await?;
        self.world.report(&format!("Opened {}, depositing...", container.name));

        let mut report = TransferReport::default();
        let held = InventoryLedger::new()
            .refresh(self.world)
            .stacks_matching(matcher);
        for stack in held {
            match self
                .policy
                .act(
                    self.world,
                    ActionKind::Deposit,
                    handle.deposit(stack.type_id, stack.count),
                )
                .await
            {
                Ok(()) => {
                    self.world.report(&format!("Deposited {} {}.", stack.count, stack.name));
                    report.moved.push(stack);
                }
                Err(err) => report.failed.push((stack.name.clone(), err)),
            }
        }

        handle.close().await;
        tracing::info!(
            moved = report.moved.len(),
            failed = report.failed.len(),
            "deposit finished"
        );
        Ok(report)
    }
}
