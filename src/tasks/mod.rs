//! 子任务组件：每个组件只通过 `&dyn World` 与世界交互，结果交回编排器

pub mod container;
pub mod explore;
pub mod inventory;
pub mod marker;
pub mod shaft;
pub mod strip;
pub mod vein;

pub use container::{ContainerInteractor, TransferReport};
pub use explore::{Cardinal, Destination, Distance, ExplorationPlanner, ExploreOutcome};
pub use inventory::InventoryLedger;
pub use marker::{MarkerOutcome, PeriodicMarker};
pub use shaft::{DescentReport, DescentStop, ShaftDescender};
pub use strip::{StripMiner, StripReport};
pub use vein::{VeinExtractor, VeinReport, VisitedSet};
