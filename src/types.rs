// Core order, trade and market-data types shared across the simulator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order / trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Side> {
        match s {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    Acknowledged,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

// Order-id tagging: the top 16 bits identify the id's origin so strategy
// quotes, generator seed orders and trade ids never collide. Matching never
// consults the tag.
const TAG_SHIFT: u32 = 48;
pub const STRATEGY_ORDER_TAG: u64 = 1 << TAG_SHIFT;
pub const SIM_ORDER_TAG: u64 = 2 << TAG_SHIFT;
pub const TRADE_ID_TAG: u64 = 3 << TAG_SHIFT;

/// Combine an origin tag with a per-domain counter into a unique order id.
pub fn tagged_id(tag: u64, counter: u64) -> u64 {
    tag | counter
}

/// A resting or incoming limit order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u64,
    pub side: Side,
    pub price: f64,
    pub original_qty: i64,
    /// Remaining unfilled quantity
    pub leaves_qty: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(order_id: u64, side: Side, price: f64, qty: i64, ts: DateTime<Utc>) -> Self {
        Self {
            order_id,
            side,
            price,
            original_qty: qty,
            leaves_qty: qty,
            status: OrderStatus::New,
            created_at: ts,
            updated_at: ts,
        }
    }
}

/// A (partial or full) match of a resting order against aggressor flow.
/// `side` is the side of the resting order that was hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub order_id: u64,
    pub trade_id: u64,
    pub side: Side,
    pub price: f64,
    pub fill_qty: i64,
    pub leaves_qty: i64,
    pub timestamp: DateTime<Utc>,
}

/// A single price level in a published book snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLevel {
    pub price: f64,
    pub size: i64,
    pub order_id: u64,
    pub timestamp: DateTime<Utc>,
}

/// An aggressor trade synthesized by the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub aggressor_side: Side,
    pub price: f64,
    pub size: i64,
    pub trade_id: u64,
    pub timestamp: DateTime<Utc>,
}

/// One tick of market data: book snapshot, synthesized trades and any fills
/// the aggressor flow produced against the strategy's resting orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataEvent {
    pub instrument: String,
    pub best_bid_price: f64,
    pub best_ask_price: f64,
    pub best_bid_size: i64,
    pub best_ask_size: i64,
    /// Bid levels sorted by price descending
    pub bid_levels: Vec<OrderLevel>,
    /// Ask levels sorted by price ascending
    pub ask_levels: Vec<OrderLevel>,
    pub trades: Vec<Trade>,
    pub mm_fills: Vec<FillEvent>,
    pub timestamp: DateTime<Utc>,
    /// Strictly monotonically increasing, starting at 1
    pub sequence_number: i64,
}

impl MarketDataEvent {
    pub fn mid_price(&self) -> f64 {
        (self.best_bid_price + self.best_ask_price) / 2.0
    }

    pub fn spread(&self) -> f64 {
        self.best_ask_price - self.best_bid_price
    }
}
