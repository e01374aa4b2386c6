// Quoting agent: applies fills to accounting, gates on risk, asks the
// strategy for quotes and keeps the two resting orders fresh

use crate::accounting::{Accounting, FeeSchedule};
use crate::risk::{RiskConfig, RiskManager, RiskRuleResult, RiskState};
use crate::simulation::generator::MarketSimulator;
use crate::strategy::{Strategy, StrategySnapshot};
use crate::types::{
    tagged_id, FillEvent, MarketDataEvent, Order, OrderStatus, Side, STRATEGY_ORDER_TAG,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

pub struct MarketMaker {
    /// Lightweight records of our own resting quotes, keyed by order id
    active_orders: HashMap<u64, Order>,
    accounting: Accounting,
    risk_manager: RiskManager,
    strategy: Box<dyn Strategy>,
    last_bid_price: f64,
    last_ask_price: f64,
    has_last_event: bool,
    last_processed_sequence: i64,
    order_counter: u64,
    total_fills: u64,
}

impl MarketMaker {
    pub fn new(risk_config: RiskConfig, strategy: Box<dyn Strategy>) -> Self {
        Self::with_accounting(
            risk_config,
            strategy,
            Accounting::new(DEFAULT_INITIAL_CAPITAL, FeeSchedule::default()),
        )
    }

    pub fn with_accounting(
        risk_config: RiskConfig,
        strategy: Box<dyn Strategy>,
        accounting: Accounting,
    ) -> Self {
        Self {
            active_orders: HashMap::new(),
            accounting,
            risk_manager: RiskManager::new(risk_config),
            strategy,
            last_bid_price: 0.0,
            last_ask_price: 0.0,
            has_last_event: false,
            last_processed_sequence: 0,
            order_counter: 0,
            total_fills: 0,
        }
    }

    /// Process one tick: fills first, then mark-to-market, then the risk
    /// gate, then (if allowed) a fresh pair of quotes. New submissions only
    /// affect the next tick's passive book.
    pub fn on_market_data(&mut self, md: &MarketDataEvent, simulator: &mut MarketSimulator) {
        if self.last_processed_sequence != 0
            && md.sequence_number != self.last_processed_sequence + 1
        {
            warn!(
                missed = md.sequence_number - self.last_processed_sequence - 1,
                sequence = md.sequence_number,
                "sequence gap detected"
            );
        }
        self.last_processed_sequence = md.sequence_number;

        if md.bid_levels.is_empty() || md.ask_levels.is_empty() {
            warn!(sequence = md.sequence_number, "empty order book, skipping tick");
            return;
        }

        for fill in &md.mm_fills {
            if self.active_orders.contains_key(&fill.order_id) {
                self.on_fill(fill);
            }
        }

        let mid_price = md.mid_price();
        self.accounting.mark_to_market(mid_price);

        self.risk_manager.evaluate(&self.accounting, md, mid_price);
        if !self.risk_manager.is_quoting_allowed() {
            self.cancel_all_orders(simulator, md.timestamp);
            return;
        }

        self.update_quotes(md, simulator);

        self.last_bid_price = md.best_bid_price;
        self.last_ask_price = md.best_ask_price;
        self.has_last_event = true;
    }

    fn on_fill(&mut self, fill: &FillEvent) {
        self.total_fills += 1;

        // Resting quotes are maker fills
        self.accounting.on_fill(fill.side, fill.price, fill.fill_qty, true);

        if fill.leaves_qty == 0 {
            self.active_orders.remove(&fill.order_id);
        } else if let Some(order) = self.active_orders.get_mut(&fill.order_id) {
            order.leaves_qty = fill.leaves_qty;
            order.status = OrderStatus::PartiallyFilled;
        }

        info!(
            side = fill.side.as_str(),
            qty = fill.fill_qty,
            price = fill.price,
            leaves = fill.leaves_qty,
            position = self.accounting.position(),
            realized = self.accounting.realized_pnl(),
            unrealized = self.accounting.unrealized_pnl(),
            "fill"
        );
    }

    fn cancel_all_orders(&mut self, simulator: &mut MarketSimulator, now: DateTime<Utc>) {
        for (order_id, _) in self.active_orders.drain() {
            self.risk_manager.record_cancel(now);
            simulator.cancel_order(order_id);
        }
    }

    fn update_quotes(&mut self, md: &MarketDataEvent, simulator: &mut MarketSimulator) {
        let snapshot = StrategySnapshot {
            best_bid: md.best_bid_price,
            best_ask: md.best_ask_price,
            mid_price: md.mid_price(),
            bid_levels: md.bid_levels.clone(),
            ask_levels: md.ask_levels.clone(),
            trades: md.trades.clone(),
            position: self.accounting.position(),
            max_position: self.risk_manager.config().max_net_position,
            timestamp: md.timestamp,
            sequence_number: md.sequence_number,
        };

        let decision = self.strategy.compute_quotes(&snapshot);
        if !decision.should_quote {
            // A decline-to-quote tick leaves the resting pair untouched
            debug!(sequence = md.sequence_number, "strategy declined to quote");
            return;
        }

        // Replace the resting pair; all cancels precede all submissions
        self.cancel_all_orders(simulator, md.timestamp);

        let (min_size, max_size) = {
            let cfg = self.risk_manager.config();
            (cfg.min_quote_size, cfg.max_quote_size)
        };
        let bid_size = decision.bid_size.clamp(min_size, max_size);
        let ask_size = decision.ask_size.clamp(min_size, max_size);

        let bid_id = self.next_order_id();
        let bid = Order::new(bid_id, Side::Buy, decision.bid_price, bid_size, md.timestamp);
        if simulator.submit_order(bid.clone()) == OrderStatus::Acknowledged {
            self.active_orders.insert(bid_id, bid);
            self.risk_manager.record_quote(md.timestamp);
        }

        let ask_id = self.next_order_id();
        let ask = Order::new(ask_id, Side::Sell, decision.ask_price, ask_size, md.timestamp);
        if simulator.submit_order(ask.clone()) == OrderStatus::Acknowledged {
            self.active_orders.insert(ask_id, ask);
            self.risk_manager.record_quote(md.timestamp);
        }
    }

    fn next_order_id(&mut self) -> u64 {
        self.order_counter += 1;
        tagged_id(STRATEGY_ORDER_TAG, self.order_counter)
    }

    pub fn mark_price(&self) -> f64 {
        if !self.has_last_event {
            return 0.0;
        }
        (self.last_bid_price + self.last_ask_price) / 2.0
    }

    /// Final console summary for a finished run
    pub fn report(&mut self) {
        if !self.has_last_event {
            println!("No market data events processed; nothing to report.");
            return;
        }

        let mark = self.mark_price();
        self.accounting.mark_to_market(mark);

        println!("=== MARKET MAKER REPORT ===");
        println!("Strategy: {}", self.strategy.name());
        println!("Position: {} shares", self.accounting.position());
        println!("Cash: ${:.2}", self.accounting.cash());
        println!("Mark Price: ${:.2}", mark);
        println!("Avg Entry Price: ${:.2}", self.accounting.avg_entry_price());
        println!("Realized PnL: ${:.2}", self.accounting.realized_pnl());
        println!("Unrealized PnL: ${:.2}", self.accounting.unrealized_pnl());
        println!("Total PnL: ${:.2}", self.accounting.total_pnl());
        println!("Fees: ${:.2}", self.accounting.total_fees());
        println!("Rebates: ${:.2}", self.accounting.total_rebates());
        println!("Net PnL: ${:.2}", self.accounting.net_pnl());
        println!("Gross Exposure: ${:.2}", self.accounting.gross_exposure(mark));
        println!("Net Exposure: ${:.2}", self.accounting.net_exposure(mark));
        println!("Risk State: {}", self.risk_manager.current_state().as_str());
        println!("Drawdown: ${:.2}", self.risk_manager.current_drawdown());
        println!("High Water Mark: ${:.2}", self.risk_manager.high_water_mark());
        println!("Total Fills: {}", self.total_fills);
        println!("Active Orders: {}", self.active_orders.len());
        println!("============================");
    }

    pub fn accounting(&self) -> &Accounting {
        &self.accounting
    }

    pub fn risk_state(&self) -> RiskState {
        self.risk_manager.current_state()
    }

    pub fn risk_details(&self) -> &[RiskRuleResult] {
        self.risk_manager.last_results()
    }

    pub fn engage_kill_switch(&mut self) {
        self.risk_manager.engage_kill_switch();
    }

    pub fn reset_kill_switch(&mut self) {
        self.risk_manager.reset_kill_switch();
    }

    pub fn total_fills(&self) -> u64 {
        self.total_fills
    }

    pub fn active_order_count(&self) -> usize {
        self.active_orders.len()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}
