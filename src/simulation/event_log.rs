// Line-oriented event log codec for byte-exact replay
//
// One pipe-separated line per event; list fields are semicolon-separated and
// list entries comma-separated. Floats use the shortest round-trip decimal
// form, so decode + encode reproduces the original line byte for byte.

use crate::types::{FillEvent, MarketDataEvent, OrderLevel, Side, Trade};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("Failed to open event log {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to read event log: {0}")]
    Read(std::io::Error),

    #[error("Failed to write event log: {0}")]
    Write(std::io::Error),

    #[error("Malformed event log line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Event log {0} contains no events")]
    Empty(String),
}

/// Serialize one event as a single log line (no trailing newline)
pub fn serialize_event(event: &MarketDataEvent) -> String {
    let mut line = String::with_capacity(256);
    let _ = write!(
        line,
        "{}|{}|{}|{}|{}|{}|{}",
        event.sequence_number,
        event.instrument,
        event.best_bid_price,
        event.best_ask_price,
        event.best_bid_size,
        event.best_ask_size,
        event.timestamp.timestamp_millis(),
    );

    line.push('|');
    append_levels(&mut line, &event.bid_levels);
    line.push('|');
    append_levels(&mut line, &event.ask_levels);
    line.push('|');
    append_trades(&mut line, &event.trades);
    line.push('|');
    append_fills(&mut line, &event.mm_fills);

    line
}

fn append_levels(line: &mut String, levels: &[OrderLevel]) {
    for (i, level) in levels.iter().enumerate() {
        if i > 0 {
            line.push(';');
        }
        let _ = write!(
            line,
            "{},{},{},{}",
            level.price,
            level.size,
            level.order_id,
            level.timestamp.timestamp_millis()
        );
    }
}

fn append_trades(line: &mut String, trades: &[Trade]) {
    for (i, trade) in trades.iter().enumerate() {
        if i > 0 {
            line.push(';');
        }
        let _ = write!(
            line,
            "{},{},{},{},{}",
            trade.aggressor_side.as_str(),
            trade.price,
            trade.size,
            trade.trade_id,
            trade.timestamp.timestamp_millis()
        );
    }
}

fn append_fills(line: &mut String, fills: &[FillEvent]) {
    for (i, fill) in fills.iter().enumerate() {
        if i > 0 {
            line.push(';');
        }
        let _ = write!(
            line,
            "{},{},{},{},{},{},{}",
            fill.order_id,
            fill.trade_id,
            fill.side.as_str(),
            fill.price,
            fill.fill_qty,
            fill.leaves_qty,
            fill.timestamp.timestamp_millis()
        );
    }
}

/// Parse one log line back into an event
pub fn parse_event(line: &str, line_no: usize) -> Result<MarketDataEvent, EventLogError> {
    let malformed = |reason: &str| EventLogError::Malformed {
        line: line_no,
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != 11 {
        return Err(malformed(&format!("expected 11 fields, got {}", fields.len())));
    }

    let sequence_number = fields[0]
        .parse::<i64>()
        .map_err(|_| malformed("invalid sequence number"))?;
    let instrument = fields[1].to_string();
    let best_bid_price = parse_f64(fields[2], line_no)?;
    let best_ask_price = parse_f64(fields[3], line_no)?;
    let best_bid_size = parse_i64(fields[4], line_no)?;
    let best_ask_size = parse_i64(fields[5], line_no)?;
    let timestamp = parse_timestamp(fields[6], line_no)?;

    let bid_levels = parse_levels(fields[7], line_no)?;
    let ask_levels = parse_levels(fields[8], line_no)?;
    let trades = parse_trades(fields[9], line_no)?;
    let mm_fills = parse_fills(fields[10], line_no)?;

    Ok(MarketDataEvent {
        instrument,
        best_bid_price,
        best_ask_price,
        best_bid_size,
        best_ask_size,
        bid_levels,
        ask_levels,
        trades,
        mm_fills,
        timestamp,
        sequence_number,
    })
}

fn parse_f64(field: &str, line_no: usize) -> Result<f64, EventLogError> {
    field.parse::<f64>().map_err(|_| EventLogError::Malformed {
        line: line_no,
        reason: format!("invalid float '{field}'"),
    })
}

fn parse_i64(field: &str, line_no: usize) -> Result<i64, EventLogError> {
    field.parse::<i64>().map_err(|_| EventLogError::Malformed {
        line: line_no,
        reason: format!("invalid integer '{field}'"),
    })
}

fn parse_u64(field: &str, line_no: usize) -> Result<u64, EventLogError> {
    field.parse::<u64>().map_err(|_| EventLogError::Malformed {
        line: line_no,
        reason: format!("invalid id '{field}'"),
    })
}

fn parse_timestamp(field: &str, line_no: usize) -> Result<DateTime<Utc>, EventLogError> {
    let ms = parse_i64(field, line_no)?;
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| EventLogError::Malformed {
            line: line_no,
            reason: format!("timestamp out of range '{field}'"),
        })
}

fn parse_side(field: &str, line_no: usize) -> Result<Side, EventLogError> {
    Side::parse(field).ok_or_else(|| EventLogError::Malformed {
        line: line_no,
        reason: format!("invalid side '{field}'"),
    })
}

fn parse_levels(field: &str, line_no: usize) -> Result<Vec<OrderLevel>, EventLogError> {
    let mut levels = Vec::new();
    for entry in field.split(';').filter(|e| !e.is_empty()) {
        let parts: Vec<&str> = entry.split(',').collect();
        if parts.len() != 4 {
            return Err(EventLogError::Malformed {
                line: line_no,
                reason: format!("level entry '{entry}' has {} parts, expected 4", parts.len()),
            });
        }
        levels.push(OrderLevel {
            price: parse_f64(parts[0], line_no)?,
            size: parse_i64(parts[1], line_no)?,
            order_id: parse_u64(parts[2], line_no)?,
            timestamp: parse_timestamp(parts[3], line_no)?,
        });
    }
    Ok(levels)
}

fn parse_trades(field: &str, line_no: usize) -> Result<Vec<Trade>, EventLogError> {
    let mut trades = Vec::new();
    for entry in field.split(';').filter(|e| !e.is_empty()) {
        let parts: Vec<&str> = entry.split(',').collect();
        if parts.len() != 5 {
            return Err(EventLogError::Malformed {
                line: line_no,
                reason: format!("trade entry '{entry}' has {} parts, expected 5", parts.len()),
            });
        }
        trades.push(Trade {
            aggressor_side: parse_side(parts[0], line_no)?,
            price: parse_f64(parts[1], line_no)?,
            size: parse_i64(parts[2], line_no)?,
            trade_id: parse_u64(parts[3], line_no)?,
            timestamp: parse_timestamp(parts[4], line_no)?,
        });
    }
    Ok(trades)
}

fn parse_fills(field: &str, line_no: usize) -> Result<Vec<FillEvent>, EventLogError> {
    let mut fills = Vec::new();
    for entry in field.split(';').filter(|e| !e.is_empty()) {
        let parts: Vec<&str> = entry.split(',').collect();
        if parts.len() != 7 {
            return Err(EventLogError::Malformed {
                line: line_no,
                reason: format!("fill entry '{entry}' has {} parts, expected 7", parts.len()),
            });
        }
        fills.push(FillEvent {
            order_id: parse_u64(parts[0], line_no)?,
            trade_id: parse_u64(parts[1], line_no)?,
            side: parse_side(parts[2], line_no)?,
            price: parse_f64(parts[3], line_no)?,
            fill_qty: parse_i64(parts[4], line_no)?,
            leaves_qty: parse_i64(parts[5], line_no)?,
            timestamp: parse_timestamp(parts[6], line_no)?,
        });
    }
    Ok(fills)
}

/// Load a full replay log. Empty lines are skipped; the first malformed line
/// fails the load, as does a log with no events at all.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<MarketDataEvent>, EventLogError> {
    let display = path.as_ref().display().to_string();
    let file = File::open(&path).map_err(|source| EventLogError::Open {
        path: display.clone(),
        source,
    })?;

    let mut events = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(EventLogError::Read)?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(parse_event(&line, idx + 1)?);
    }

    if events.is_empty() {
        return Err(EventLogError::Empty(display));
    }

    Ok(events)
}

/// Append-only line writer for generated events
pub struct EventLogWriter {
    writer: BufWriter<File>,
}

impl EventLogWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, EventLogError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| EventLogError::Open {
                path: path.as_ref().display().to_string(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn append(&mut self, event: &MarketDataEvent) -> Result<(), EventLogError> {
        let line = serialize_event(event);
        writeln!(self.writer, "{line}").map_err(EventLogError::Write)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), EventLogError> {
        self.writer.flush().map_err(EventLogError::Write)
    }
}

impl Drop for EventLogWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
