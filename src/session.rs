// Simulation session: drives the per-tick loop, samples latency and folds
// every event into a replay-stable checksum

use crate::config::SimulationConfig;
use crate::market_maker::MarketMaker;
use crate::perf::PerformanceTracker;
use crate::risk::RiskConfig;
use crate::simulation::binary_log::BinaryLogger;
use crate::simulation::generator::{GeneratorError, MarketSimulator};
use crate::strategy::Strategy;
use crate::types::MarketDataEvent;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over a byte slice, continuing from a previous hash value
pub fn fnv1a_update(mut hash: u64, data: &[u8]) -> u64 {
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Stable per-event digest string covering prices, sizes, trades and fills.
/// Two runs are considered identical when their folded fingerprints match.
pub fn event_fingerprint(event: &MarketDataEvent) -> String {
    let mut fp = String::with_capacity(96);
    let _ = write!(
        fp,
        "{}|{:.6}|{:.6}|{}|{}",
        event.sequence_number,
        event.best_bid_price,
        event.best_ask_price,
        event.best_bid_size,
        event.best_ask_size
    );
    for trade in &event.trades {
        let _ = write!(
            fp,
            "|T:{}:{:.6}:{}",
            trade.aggressor_side.as_str(),
            trade.price,
            trade.size
        );
    }
    for fill in &event.mm_fills {
        let _ = write!(
            fp,
            "|F:{}:{:.6}:{}:{}",
            fill.order_id, fill.price, fill.fill_qty, fill.leaves_qty
        );
    }
    fp
}

/// Aggregates of one finished run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub last_sequence: i64,
    pub avg_bid: f64,
    pub avg_ask: f64,
    pub trade_volume: i64,
    pub checksum: u64,
}

/// One self-contained simulation run: generator, quoting agent and latency
/// tracker, all owned by this session and driven on the calling thread.
pub struct SimulationSession {
    simulator: MarketSimulator,
    maker: MarketMaker,
    perf: PerformanceTracker,
    binary_log: Option<BinaryLogger>,
    iterations: usize,
    latency_ms: u64,
    stop: Arc<AtomicBool>,
}

impl SimulationSession {
    pub fn new(
        config: SimulationConfig,
        risk_config: RiskConfig,
        strategy: Box<dyn Strategy>,
    ) -> Result<Self, GeneratorError> {
        let iterations = config.iterations;
        let latency_ms = config.latency_ms;
        let simulator = MarketSimulator::new(config)?;
        Ok(Self {
            simulator,
            maker: MarketMaker::new(risk_config, strategy),
            perf: PerformanceTracker::new(iterations),
            binary_log: None,
            iterations,
            latency_ms,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn set_binary_log(&mut self, logger: BinaryLogger) {
        self.binary_log = Some(logger);
    }

    /// Shared stop flag a host may set; checked at the top of each tick, so
    /// an in-flight tick always completes atomically.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run up to the configured number of ticks. Replay exhaustion and the
    /// stop flag end the loop cleanly; per-tick anomalies are logged by the
    /// quoting agent and never abort the run.
    pub fn run(&mut self) -> RunSummary {
        let wall_start = Instant::now();
        let mut summary = RunSummary {
            checksum: FNV_OFFSET_BASIS,
            ..Default::default()
        };
        let mut sum_bid = 0.0;
        let mut sum_ask = 0.0;

        while summary.processed < self.iterations {
            if self.stop.load(Ordering::Acquire) {
                info!("stop requested, ending run");
                break;
            }

            let tick_start = Instant::now();
            let event = match self.simulator.generate_event() {
                Ok(event) => event,
                Err(GeneratorError::ReplayExhausted) => {
                    info!(processed = summary.processed, "replay log exhausted");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "event generation failed, ending run");
                    break;
                }
            };

            self.maker.on_market_data(&event, &mut self.simulator);

            if let Some(logger) = &mut self.binary_log {
                if let Err(e) = logger.log_event(&event) {
                    warn!(error = %e, "binary log write failed");
                }
            }

            self.perf
                .record_latency(tick_start.elapsed().as_nanos() as u64);

            summary.processed += 1;
            summary.last_sequence = event.sequence_number;
            sum_bid += event.best_bid_price;
            sum_ask += event.best_ask_price;
            summary.trade_volume += event.trades.iter().map(|t| t.size).sum::<i64>();
            summary.checksum =
                fnv1a_update(summary.checksum, event_fingerprint(&event).as_bytes());

            if summary.processed <= 5 || summary.processed % 100 == 0 {
                info!(
                    sequence = event.sequence_number,
                    bid = event.best_bid_price,
                    ask = event.best_ask_price,
                    trades = event.trades.len(),
                    mm_fills = event.mm_fills.len(),
                    "event"
                );
            }

            // Optional pacing; all event state is already stamped
            if self.latency_ms > 0 {
                thread::sleep(Duration::from_millis(self.latency_ms));
            }
        }

        if summary.processed > 0 {
            summary.avg_bid = sum_bid / summary.processed as f64;
            summary.avg_ask = sum_ask / summary.processed as f64;
        }

        self.perf.set_wall_time(wall_start.elapsed());
        summary
    }

    pub fn maker(&self) -> &MarketMaker {
        &self.maker
    }

    pub fn maker_mut(&mut self) -> &mut MarketMaker {
        &mut self.maker
    }

    pub fn performance(&self) -> &PerformanceTracker {
        &self.perf
    }
}
