// Position, cash and PnL accounting with flip-aware cost basis

use crate::types::Side;
use serde::{Deserialize, Serialize};

/// Per-share and notional fee terms applied on every fill
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub maker_rebate_per_share: f64,
    pub taker_fee_per_share: f64,
    /// Basis-point fee on notional
    pub fee_bps: f64,
}

/// Tracks cash, signed position, cost basis and realized/unrealized PnL for
/// a single account over one simulation run.
#[derive(Debug, Clone)]
pub struct Accounting {
    initial_capital: f64,
    cash: f64,
    position: i64,
    cost_basis: f64,
    realized_pnl: f64,
    unrealized_pnl: f64,
    total_fees: f64,
    total_rebates: f64,
    mark_price: f64,
    fees: FeeSchedule,
}

impl Accounting {
    pub fn new(initial_capital: f64, fees: FeeSchedule) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            position: 0,
            cost_basis: 0.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            total_fees: 0.0,
            total_rebates: 0.0,
            mark_price: 0.0,
            fees,
        }
    }

    /// Apply a fill. Buy fills spend cash and extend (or cover) the position,
    /// sell fills do the reverse. When the fill opposes the current position,
    /// the closing quantity realizes PnL against the average entry price and
    /// any remainder flips the position with a fresh cost basis.
    pub fn on_fill(&mut self, side: Side, price: f64, qty: i64, is_maker: bool) {
        let notional = price * qty as f64;

        let mut fee = notional * (self.fees.fee_bps / 10_000.0);
        if is_maker {
            let rebate = self.fees.maker_rebate_per_share * qty as f64;
            self.total_rebates += rebate;
            fee -= rebate;
        } else {
            fee += self.fees.taker_fee_per_share * qty as f64;
        }
        self.total_fees += fee;

        match side {
            Side::Buy => {
                self.cash -= notional;
                if self.position >= 0 {
                    // Adding to long or opening long
                    self.cost_basis += notional;
                } else {
                    // Closing short, possibly flipping to long
                    let close_qty = qty.min(-self.position);
                    let open_qty = qty - close_qty;
                    let avg_entry = self.avg_entry_price();
                    self.realized_pnl += (avg_entry - price) * close_qty as f64;
                    if open_qty > 0 {
                        self.cost_basis = price * open_qty as f64;
                    } else {
                        self.cost_basis -= avg_entry * close_qty as f64;
                    }
                }
                self.position += qty;
            }
            Side::Sell => {
                self.cash += notional;
                if self.position <= 0 {
                    // Adding to short or opening short
                    self.cost_basis += notional;
                } else {
                    // Closing long, possibly flipping to short
                    let close_qty = qty.min(self.position);
                    let open_qty = qty - close_qty;
                    let avg_entry = self.avg_entry_price();
                    self.realized_pnl += (price - avg_entry) * close_qty as f64;
                    if open_qty > 0 {
                        self.cost_basis = price * open_qty as f64;
                    } else {
                        self.cost_basis -= avg_entry * close_qty as f64;
                    }
                }
                self.position -= qty;
            }
        }

        // Flat position keeps an exactly-zero basis, no floating-point residue
        if self.position == 0 {
            self.cost_basis = 0.0;
        }

        self.mark_to_market(price);
    }

    /// Revalue the open position at the given reference price
    pub fn mark_to_market(&mut self, mark_price: f64) {
        self.mark_price = mark_price;
        if self.position != 0 {
            let avg = self.avg_entry_price();
            if self.position > 0 {
                self.unrealized_pnl = (mark_price - avg) * self.position as f64;
            } else {
                self.unrealized_pnl = (avg - mark_price) * (-self.position) as f64;
            }
        } else {
            self.unrealized_pnl = 0.0;
        }
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.unrealized_pnl
    }

    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }

    pub fn net_pnl(&self) -> f64 {
        self.total_pnl() - self.total_fees + self.total_rebates
    }

    pub fn total_fees(&self) -> f64 {
        self.total_fees
    }

    pub fn total_rebates(&self) -> f64 {
        self.total_rebates
    }

    pub fn avg_entry_price(&self) -> f64 {
        if self.position == 0 {
            return 0.0;
        }
        self.cost_basis / self.position.abs() as f64
    }

    pub fn cost_basis(&self) -> f64 {
        self.cost_basis
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn gross_exposure(&self, mark_price: f64) -> f64 {
        self.position.abs() as f64 * mark_price
    }

    pub fn net_exposure(&self, mark_price: f64) -> f64 {
        self.position as f64 * mark_price
    }
}
