// Price-time priority matching engine
// Pure bookkeeping: admits, cancels and matches resting orders; accounting
// and risk are the caller's concern

use crate::types::{FillEvent, Order, OrderStatus, Side};
use chrono::{DateTime, Utc};

/// Two ordered books of resting limit orders. Bids are kept sorted by price
/// descending then creation time ascending, asks by price ascending then
/// creation time ascending; the vector order IS the matching priority.
#[derive(Debug, Default)]
pub struct MatchingEngine {
    bid_book: Vec<Order>,
    ask_book: Vec<Order>,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit an order into its book. Non-positive price or quantity is
    /// rejected and the order is not booked.
    pub fn add_order(&mut self, mut order: Order) -> OrderStatus {
        if order.leaves_qty <= 0 || order.price <= 0.0 {
            return OrderStatus::Rejected;
        }

        order.status = OrderStatus::Acknowledged;

        match order.side {
            Side::Buy => {
                let idx = self.bid_book.partition_point(|existing| {
                    existing.price > order.price
                        || (existing.price == order.price
                            && existing.created_at <= order.created_at)
                });
                self.bid_book.insert(idx, order);
            }
            Side::Sell => {
                let idx = self.ask_book.partition_point(|existing| {
                    existing.price < order.price
                        || (existing.price == order.price
                            && existing.created_at <= order.created_at)
                });
                self.ask_book.insert(idx, order);
            }
        }

        OrderStatus::Acknowledged
    }

    /// Cancel by id, searching both books. Returns whether an order was
    /// found and erased.
    pub fn cancel_order(&mut self, order_id: u64) -> bool {
        if let Some(idx) = self.bid_book.iter().position(|o| o.order_id == order_id) {
            self.bid_book.remove(idx);
            return true;
        }
        if let Some(idx) = self.ask_book.iter().position(|o| o.order_id == order_id) {
            self.ask_book.remove(idx);
            return true;
        }
        false
    }

    /// Match an incoming aggressor against the opposite book. Walks from the
    /// best price while quantity remains and the resting price is compatible,
    /// filling at the resting order's price. Fully consumed orders are
    /// erased; partially consumed ones stay with updated remaining quantity.
    pub fn match_incoming(
        &mut self,
        aggressor_side: Side,
        limit_price: f64,
        qty: i64,
        trade_id: u64,
        timestamp: DateTime<Utc>,
    ) -> Vec<FillEvent> {
        let mut fills = Vec::new();
        let mut remaining = qty;

        // Aggressor BUY hits resting asks; aggressor SELL hits resting bids
        let passive_book = match aggressor_side {
            Side::Buy => &mut self.ask_book,
            Side::Sell => &mut self.bid_book,
        };

        let mut i = 0;
        while i < passive_book.len() && remaining > 0 {
            let compatible = match aggressor_side {
                Side::Buy => passive_book[i].price <= limit_price,
                Side::Sell => passive_book[i].price >= limit_price,
            };
            if !compatible {
                break;
            }

            let resting = &mut passive_book[i];
            let fill_qty = remaining.min(resting.leaves_qty);
            resting.leaves_qty -= fill_qty;
            resting.updated_at = timestamp;
            remaining -= fill_qty;

            resting.status = if resting.leaves_qty == 0 {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };

            fills.push(FillEvent {
                order_id: resting.order_id,
                trade_id,
                side: resting.side,
                price: resting.price,
                fill_qty,
                leaves_qty: resting.leaves_qty,
                timestamp,
            });

            if passive_book[i].leaves_qty == 0 {
                passive_book.remove(i);
            } else {
                i += 1;
            }
        }

        fills
    }

    pub fn bids(&self) -> &[Order] {
        &self.bid_book
    }

    pub fn asks(&self) -> &[Order] {
        &self.ask_book
    }
}
