// Market data generator: deterministic RNG-driven book evolution in
// simulate mode, verbatim event streaming in replay mode

use crate::config::{ConfigError, SimulationConfig, SimulationMode};
use crate::simulation::event_log::{self, EventLogError, EventLogWriter};
use crate::simulation::matching_engine::MatchingEngine;
use crate::types::{
    tagged_id, FillEvent, MarketDataEvent, Order, OrderLevel, OrderStatus, Side, Trade,
    SIM_ORDER_TAG, TRADE_ID_TAG,
};
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Number of synthetic levels kept on each side of the book
const BOOK_LEVELS: usize = 5;
/// Probability of synthesizing an aggressor trade on a tick
const TRADE_PROBABILITY: f64 = 0.2;
/// Uniform price noise applied to each re-anchored level
const LEVEL_PRICE_NOISE: f64 = 0.001;
/// Simulation clock step per event
const CLOCK_STEP_MS: i64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Invalid simulation config: {0}")]
    Config(#[from] ConfigError),

    #[error("Event log error: {0}")]
    Log(#[from] EventLogError),

    #[error("Replay log exhausted")]
    ReplayExhausted,
}

/// Owns the synthetic book, the strategy-facing matching engine and the
/// deterministic RNG. All timestamps come from a millisecond counter, never
/// the wall clock, so a seed fully pins the event stream.
pub struct MarketSimulator {
    config: SimulationConfig,
    mid_price: f64,
    bid_levels: Vec<OrderLevel>,
    ask_levels: Vec<OrderLevel>,
    matching_engine: MatchingEngine,
    rng: StdRng,
    noise: Normal<f64>,
    sequence_number: i64,
    sim_order_counter: u64,
    trade_counter: u64,
    clock_ms: i64,
    event_writer: Option<EventLogWriter>,
    replay_events: Vec<MarketDataEvent>,
    replay_index: usize,
}

impl MarketSimulator {
    pub fn new(config: SimulationConfig) -> Result<Self, GeneratorError> {
        config.validate()?;

        let noise = Normal::new(0.0, config.volatility)
            .map_err(|e| ConfigError::Validation(format!("volatility: {e}")))?;

        let mut simulator = Self {
            mid_price: config.initial_price,
            bid_levels: Vec::with_capacity(BOOK_LEVELS),
            ask_levels: Vec::with_capacity(BOOK_LEVELS),
            matching_engine: MatchingEngine::new(),
            rng: StdRng::seed_from_u64(config.seed as u64),
            noise,
            sequence_number: 0,
            sim_order_counter: 0,
            trade_counter: 0,
            clock_ms: 0,
            event_writer: None,
            replay_events: Vec::new(),
            replay_index: 0,
            config,
        };

        match simulator.config.mode {
            SimulationMode::Replay => {
                // Validation guarantees the path is present
                if let Some(path) = simulator.config.replay_log_path.clone() {
                    simulator.replay_events = event_log::load(path)?;
                }
            }
            SimulationMode::Simulate => {
                simulator.initialize_book();
                if let Some(path) = simulator.config.event_log_path.clone() {
                    simulator.event_writer = Some(EventLogWriter::create(path)?);
                }
            }
        }

        Ok(simulator)
    }

    fn current_time(&self) -> DateTime<Utc> {
        // Simulation clock counts milliseconds from the epoch
        Utc.timestamp_millis_opt(self.clock_ms)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    fn next_sim_order_id(&mut self) -> u64 {
        self.sim_order_counter += 1;
        tagged_id(SIM_ORDER_TAG, self.sim_order_counter)
    }

    fn next_trade_id(&mut self) -> u64 {
        self.trade_counter += 1;
        tagged_id(TRADE_ID_TAG, self.trade_counter)
    }

    fn initialize_book(&mut self) {
        let ts = self.current_time();
        let mid = self.mid_price;
        let spread = self.config.spread;

        for i in 1..=BOOK_LEVELS {
            let offset = i as f64 * spread / 2.0;
            let bid_size = self.rng.gen_range(1..=10);
            let bid_id = self.next_sim_order_id();
            self.bid_levels.push(OrderLevel {
                price: mid - offset,
                size: bid_size,
                order_id: bid_id,
                timestamp: ts,
            });

            let ask_size = self.rng.gen_range(1..=10);
            let ask_id = self.next_sim_order_id();
            self.ask_levels.push(OrderLevel {
                price: mid + offset,
                size: ask_size,
                order_id: ask_id,
                timestamp: ts,
            });
        }
    }

    /// Produce the next event. In simulate mode this advances the RNG, the
    /// book and the simulation clock; in replay mode it streams the next
    /// logged event verbatim and signals exhaustion at the end.
    pub fn generate_event(&mut self) -> Result<MarketDataEvent, GeneratorError> {
        if self.config.mode == SimulationMode::Replay {
            return self.next_replay_event();
        }

        self.clock_ms += CLOCK_STEP_MS;
        let ts = self.current_time();

        // Gaussian mid step, floored so prices stay positive
        let step: f64 = self.noise.sample(&mut self.rng);
        self.mid_price = (self.mid_price + step).max(0.01);

        self.update_levels(ts);

        let mut trades = Vec::new();
        let mut mm_fills = Vec::new();
        self.simulate_trade_flow(ts, &mut trades, &mut mm_fills);

        self.sequence_number += 1;

        let event = MarketDataEvent {
            instrument: self.config.instrument.clone(),
            best_bid_price: self.bid_levels.first().map(|l| l.price).unwrap_or(0.0),
            best_ask_price: self.ask_levels.first().map(|l| l.price).unwrap_or(0.0),
            best_bid_size: self.bid_levels.first().map(|l| l.size).unwrap_or(0),
            best_ask_size: self.ask_levels.first().map(|l| l.size).unwrap_or(0),
            bid_levels: self.bid_levels.clone(),
            ask_levels: self.ask_levels.clone(),
            trades,
            mm_fills,
            timestamp: ts,
            sequence_number: self.sequence_number,
        };

        if let Some(writer) = &mut self.event_writer {
            writer.append(&event)?;
        }

        Ok(event)
    }

    fn next_replay_event(&mut self) -> Result<MarketDataEvent, GeneratorError> {
        let event = self
            .replay_events
            .get(self.replay_index)
            .cloned()
            .ok_or(GeneratorError::ReplayExhausted)?;
        self.replay_index += 1;
        Ok(event)
    }

    /// Re-anchor both sides around the new mid with small uniform noise and
    /// integer size jitter, then restore the side orderings.
    fn update_levels(&mut self, ts: DateTime<Utc>) {
        let mid = self.mid_price;
        let spread = self.config.spread;

        for i in 0..self.bid_levels.len() {
            let offset = (i + 1) as f64 * spread / 2.0;
            let price_noise = self.rng.gen_range(-LEVEL_PRICE_NOISE..LEVEL_PRICE_NOISE);
            let size_jitter = self.rng.gen_range(-2..=2);
            let level = &mut self.bid_levels[i];
            level.price = mid - offset + price_noise;
            level.size = (level.size + size_jitter).max(1);
            level.timestamp = ts;
        }

        for i in 0..self.ask_levels.len() {
            let offset = (i + 1) as f64 * spread / 2.0;
            let price_noise = self.rng.gen_range(-LEVEL_PRICE_NOISE..LEVEL_PRICE_NOISE);
            let size_jitter = self.rng.gen_range(-2..=2);
            let level = &mut self.ask_levels[i];
            level.price = mid + offset + price_noise;
            level.size = (level.size + size_jitter).max(1);
            level.timestamp = ts;
        }

        self.bid_levels
            .sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(std::cmp::Ordering::Equal));
        self.ask_levels
            .sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));
    }

    /// Occasionally synthesize an aggressor trade at the opposite best price
    /// and route it through the matching engine so resting strategy orders
    /// can be hit.
    fn simulate_trade_flow(
        &mut self,
        ts: DateTime<Utc>,
        trades: &mut Vec<Trade>,
        mm_fills: &mut Vec<FillEvent>,
    ) {
        if self.rng.gen::<f64>() >= TRADE_PROBABILITY {
            return;
        }

        let aggressor_side = if self.rng.gen::<f64>() < 0.5 {
            Side::Buy
        } else {
            Side::Sell
        };
        let size = self.rng.gen_range(1..=20);

        let best_opposite = match aggressor_side {
            Side::Buy => self.ask_levels.first(),
            Side::Sell => self.bid_levels.first(),
        };
        let Some(level) = best_opposite else {
            return;
        };
        let price = level.price;

        let trade_id = self.next_trade_id();
        trades.push(Trade {
            aggressor_side,
            price,
            size,
            trade_id,
            timestamp: ts,
        });

        let fills = self
            .matching_engine
            .match_incoming(aggressor_side, price, size, trade_id, ts);
        mm_fills.extend(fills);
    }

    /// Submission surface for the quoting side of the loop
    pub fn submit_order(&mut self, order: Order) -> OrderStatus {
        self.matching_engine.add_order(order)
    }

    pub fn cancel_order(&mut self, order_id: u64) -> bool {
        self.matching_engine.cancel_order(order_id)
    }

    pub fn matching_engine(&self) -> &MatchingEngine {
        &self.matching_engine
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config(seed: u32) -> SimulationConfig {
        SimulationConfig {
            seed,
            latency_ms: 0,
            quiet: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_sequence_numbers_start_at_one_and_increase() {
        let mut sim = MarketSimulator::new(quiet_config(1)).unwrap();
        for expected in 1..=5 {
            let event = sim.generate_event().unwrap();
            assert_eq!(event.sequence_number, expected);
            assert_eq!(event.timestamp.timestamp_millis(), expected);
        }
    }

    #[test]
    fn test_books_stay_sorted_and_sized() {
        let mut sim = MarketSimulator::new(quiet_config(7)).unwrap();
        for _ in 0..50 {
            let event = sim.generate_event().unwrap();
            assert_eq!(event.bid_levels.len(), BOOK_LEVELS);
            assert_eq!(event.ask_levels.len(), BOOK_LEVELS);

            for pair in event.bid_levels.windows(2) {
                assert!(pair[0].price >= pair[1].price);
            }
            for pair in event.ask_levels.windows(2) {
                assert!(pair[0].price <= pair[1].price);
            }
            for level in event.bid_levels.iter().chain(event.ask_levels.iter()) {
                assert!(level.size >= 1);
            }
        }
    }

    #[test]
    fn test_mid_price_never_goes_below_floor() {
        let config = SimulationConfig {
            initial_price: 0.02,
            volatility: 5.0,
            ..quiet_config(3)
        };
        let mut sim = MarketSimulator::new(config).unwrap();
        for _ in 0..100 {
            sim.generate_event().unwrap();
            assert!(sim.mid_price >= 0.01);
        }
    }

    #[test]
    fn test_strategy_orders_receive_fills_from_trade_flow() {
        let mut sim = MarketSimulator::new(quiet_config(11)).unwrap();

        // Rest a bid far above the market so any sell aggressor hits it
        let ts = sim.current_time();
        let order = Order::new(900_001, Side::Buy, 1_000.0, 1_000, ts);
        assert_eq!(sim.submit_order(order), OrderStatus::Acknowledged);

        let mut saw_fill = false;
        for _ in 0..200 {
            let event = sim.generate_event().unwrap();
            if event
                .mm_fills
                .iter()
                .any(|f| f.order_id == 900_001 && f.side == Side::Buy)
            {
                saw_fill = true;
                break;
            }
        }
        assert!(saw_fill, "resting strategy bid was never hit in 200 ticks");
    }
}
