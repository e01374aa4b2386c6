// Quoting strategy interface and concrete implementations

pub mod avellaneda_stoikov;
pub mod estimators;
pub mod heuristic;

pub use avellaneda_stoikov::{AvellanedaStoikovConfig, AvellanedaStoikovStrategy};
pub use heuristic::HeuristicStrategy;

use crate::types::{OrderLevel, Trade};
use chrono::{DateTime, Utc};

/// Everything a strategy sees on one tick
#[derive(Debug, Clone)]
pub struct StrategySnapshot {
    pub best_bid: f64,
    pub best_ask: f64,
    pub mid_price: f64,
    pub bid_levels: Vec<OrderLevel>,
    pub ask_levels: Vec<OrderLevel>,
    pub trades: Vec<Trade>,
    pub position: i64,
    pub max_position: i64,
    pub timestamp: DateTime<Utc>,
    pub sequence_number: i64,
}

/// A two-sided quote, or a decision not to quote this tick
#[derive(Debug, Clone, Copy)]
pub struct QuoteDecision {
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_size: i64,
    pub ask_size: i64,
    pub should_quote: bool,
}

impl QuoteDecision {
    pub fn no_quote() -> Self {
        Self {
            bid_price: 0.0,
            ask_price: 0.0,
            bid_size: 0,
            ask_size: 0,
            should_quote: false,
        }
    }
}

/// Strategies may keep internal state (rolling estimators) but must be
/// deterministic given the snapshot sequence.
pub trait Strategy {
    fn compute_quotes(&mut self, snapshot: &StrategySnapshot) -> QuoteDecision;
    fn name(&self) -> &'static str;
}

/// Resolve a CLI strategy name to a boxed strategy
pub fn strategy_from_name(name: &str) -> Option<Box<dyn Strategy>> {
    match name {
        "heuristic" => Some(Box::new(HeuristicStrategy::new())),
        "avellaneda-stoikov" => Some(Box::new(AvellanedaStoikovStrategy::new(
            AvellanedaStoikovConfig::default(),
        ))),
        _ => None,
    }
}
