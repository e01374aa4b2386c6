// Simulation components: matching engine, event generator and log codecs

pub mod binary_log;
pub mod event_log;
pub mod generator;
pub mod matching_engine;

pub use binary_log::BinaryLogger;
pub use event_log::{EventLogError, EventLogWriter};
pub use generator::{GeneratorError, MarketSimulator};
pub use matching_engine::MatchingEngine;
