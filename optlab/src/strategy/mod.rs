//! Multi-leg option strategies.

pub mod composite;
pub mod leg;
pub mod template;

pub use composite::{LegSummary, Strategy, StrategyError, StrategyKind, StrategySummary};
pub use leg::{Leg, Side};
pub use template::StrategyTemplate;
