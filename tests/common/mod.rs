// Common test utilities and helpers

use chrono::{DateTime, TimeZone, Utc};
use market_maker_sim::{MarketDataEvent, OrderLevel, SimulationConfig};

/// Millisecond-offset timestamps matching the simulation clock convention
pub fn ts(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

/// A simulation config suitable for tests: no pacing, no per-event output
pub fn quiet_config(seed: u32, iterations: usize) -> SimulationConfig {
    SimulationConfig {
        seed,
        iterations,
        latency_ms: 0,
        quiet: true,
        ..Default::default()
    }
}

/// A one-level-per-side market data event for driving the risk manager
pub fn make_event(bid: f64, ask: f64, ts_ms: i64, sequence: i64) -> MarketDataEvent {
    let timestamp = ts(ts_ms);
    MarketDataEvent {
        instrument: "TEST".to_string(),
        best_bid_price: bid,
        best_ask_price: ask,
        best_bid_size: 100,
        best_ask_size: 100,
        bid_levels: vec![OrderLevel {
            price: bid,
            size: 100,
            order_id: 1,
            timestamp,
        }],
        ask_levels: vec![OrderLevel {
            price: ask,
            size: 100,
            order_id: 2,
            timestamp,
        }],
        trades: Vec::new(),
        mm_fills: Vec::new(),
        timestamp,
        sequence_number: sequence,
    }
}
