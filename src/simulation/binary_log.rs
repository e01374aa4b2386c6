// Compact binary trace writer: length-prefixed little-endian records
// Write-only diagnostics surface; replay uses the line codec instead

use crate::types::{MarketDataEvent, Side};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub struct BinaryLogger {
    out: BufWriter<File>,
    buf: Vec<u8>,
}

impl BinaryLogger {
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            buf: Vec::with_capacity(256),
        })
    }

    /// Write one event record: u32 total length, then the fixed header,
    /// then the per-trade and per-fill entries.
    pub fn log_event(&mut self, event: &MarketDataEvent) -> io::Result<()> {
        self.buf.clear();

        // Length prefix is patched in once the record is complete
        self.buf.extend_from_slice(&0u32.to_le_bytes());

        self.buf
            .extend_from_slice(&event.sequence_number.to_le_bytes());
        let ts_ns = event.timestamp.timestamp_millis() * 1_000_000;
        self.buf.extend_from_slice(&ts_ns.to_le_bytes());
        self.buf
            .extend_from_slice(&event.best_bid_price.to_le_bytes());
        self.buf
            .extend_from_slice(&event.best_ask_price.to_le_bytes());
        self.buf
            .extend_from_slice(&(event.best_bid_size as i32).to_le_bytes());
        self.buf
            .extend_from_slice(&(event.best_ask_size as i32).to_le_bytes());
        self.buf
            .extend_from_slice(&(event.trades.len() as u16).to_le_bytes());
        self.buf
            .extend_from_slice(&(event.mm_fills.len() as u16).to_le_bytes());

        for trade in &event.trades {
            let side: u8 = if trade.aggressor_side == Side::Buy { 1 } else { 0 };
            self.buf.push(side);
            self.buf.extend_from_slice(&trade.price.to_le_bytes());
            self.buf
                .extend_from_slice(&(trade.size as i32).to_le_bytes());
            self.buf.extend_from_slice(&trade.trade_id.to_le_bytes());
        }

        for fill in &event.mm_fills {
            self.buf.extend_from_slice(&fill.order_id.to_le_bytes());
            self.buf.extend_from_slice(&fill.trade_id.to_le_bytes());
            let side: u8 = if fill.side == Side::Buy { 1 } else { 0 };
            self.buf.push(side);
            self.buf.extend_from_slice(&fill.price.to_le_bytes());
            self.buf
                .extend_from_slice(&(fill.fill_qty as i32).to_le_bytes());
            self.buf
                .extend_from_slice(&(fill.leaves_qty as i32).to_le_bytes());
        }

        let total_len = self.buf.len() as u32;
        self.buf[0..4].copy_from_slice(&total_len.to_le_bytes());

        self.out.write_all(&self.buf)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Drop for BinaryLogger {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}
