// Deterministic market-making simulator
//
// Synthetic limit-order-book events drive a quoting strategy; the strategy's
// resting orders are matched against simulated aggressor flow while
// accounting and a rule-based risk manager track position, PnL and state.
// A seeded run is fully reproducible, and a run written through the event
// log replays field-for-field identically.

pub mod accounting;
pub mod config;
pub mod market_maker;
pub mod perf;
pub mod risk;
pub mod session;
pub mod simulation;
pub mod strategy;
pub mod types;

// Re-export commonly used types for convenience
pub use accounting::{Accounting, FeeSchedule};
pub use config::{ConfigError, SimulationConfig, SimulationMode};
pub use market_maker::MarketMaker;
pub use perf::PerformanceTracker;
pub use risk::{RiskConfig, RiskManager, RiskRuleId, RiskRuleResult, RiskState};
pub use session::{RunSummary, SimulationSession};
pub use simulation::{BinaryLogger, GeneratorError, MarketSimulator, MatchingEngine};
pub use strategy::{
    strategy_from_name, AvellanedaStoikovStrategy, HeuristicStrategy, QuoteDecision, Strategy,
    StrategySnapshot,
};
pub use types::{FillEvent, MarketDataEvent, Order, OrderLevel, OrderStatus, Side, Trade};
