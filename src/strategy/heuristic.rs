// Heuristic quoting strategy: fixed spread around mid with inventory skew
// and depth-scaled sizes

use crate::strategy::{QuoteDecision, Strategy, StrategySnapshot};

const BASE_SPREAD: f64 = 0.02;
const SKEW_FACTOR: f64 = 0.001;
const MAX_SKEW: f64 = 0.01;
const BASE_SIZE: f64 = 5.0;
const SIZE_FACTOR: f64 = 0.1;
const MIN_INVENTORY_FACTOR: f64 = 0.1;

#[derive(Debug, Default)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    pub fn new() -> Self {
        Self
    }

    fn side_size(&self, top_depth: i64, position: i64, max_position: i64) -> i64 {
        let inventory_factor = if max_position > 0 {
            (1.0 - position.abs() as f64 / max_position as f64).max(MIN_INVENTORY_FACTOR)
        } else {
            MIN_INVENTORY_FACTOR
        };
        let size = BASE_SIZE * (1.0 + top_depth as f64 * SIZE_FACTOR) * inventory_factor;
        (size as i64).max(1)
    }
}

impl Strategy for HeuristicStrategy {
    fn compute_quotes(&mut self, snap: &StrategySnapshot) -> QuoteDecision {
        // Lean quotes away from the inventory: long inventory shifts both
        // quotes down, short inventory shifts them up
        let inv_skew = (-(snap.position as f64) * SKEW_FACTOR).clamp(-MAX_SKEW, MAX_SKEW);

        let bid_price = snap.mid_price - BASE_SPREAD / 2.0 + inv_skew;
        let ask_price = snap.mid_price + BASE_SPREAD / 2.0 + inv_skew;

        let bid_depth = snap.bid_levels.first().map(|l| l.size).unwrap_or(0);
        let ask_depth = snap.ask_levels.first().map(|l| l.size).unwrap_or(0);

        QuoteDecision {
            bid_price,
            ask_price,
            bid_size: self.side_size(bid_depth, snap.position, snap.max_position),
            ask_size: self.side_size(ask_depth, snap.position, snap.max_position),
            should_quote: true,
        }
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
