// Risk manager: seven per-tick rules driving a Normal/Warning/Breached/
// KillSwitch state machine with cooldown recovery

use crate::accounting::Accounting;
use crate::types::MarketDataEvent;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Risk states ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskState {
    Normal,
    Warning,
    Breached,
    KillSwitch,
}

impl RiskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskState::Normal => "Normal",
            RiskState::Warning => "Warning",
            RiskState::Breached => "Breached",
            RiskState::KillSwitch => "KillSwitch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskRuleId {
    MaxNetPosition,
    MaxNotionalExposure,
    MaxDrawdown,
    MaxQuoteRate,
    MaxCancelRate,
    StaleMarketData,
    MaxQuoteSpread,
}

/// Outcome of a single rule evaluation
#[derive(Debug, Clone, Copy)]
pub struct RiskRuleResult {
    pub rule_id: RiskRuleId,
    pub level: RiskState,
    pub current_value: f64,
    pub limit_value: f64,
    pub tag: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub max_net_position: i64,
    pub max_notional_exposure: f64,
    pub max_drawdown: f64,
    pub max_quotes_per_second: f64,
    pub max_cancels_per_second: f64,
    pub rate_window_seconds: f64,
    pub max_stale_data_ms: f64,
    pub warning_threshold_pct: f64,
    pub cooldown_seconds: f64,
    pub max_quote_spread: f64,
    pub min_quote_size: i64,
    pub max_quote_size: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_net_position: 1000,
            max_notional_exposure: 500_000.0,
            max_drawdown: 10_000.0,
            max_quotes_per_second: 50.0,
            max_cancels_per_second: 50.0,
            rate_window_seconds: 1.0,
            max_stale_data_ms: 5000.0,
            warning_threshold_pct: 0.80,
            cooldown_seconds: 5.0,
            max_quote_spread: 0.5,
            min_quote_size: 1,
            max_quote_size: 100,
        }
    }
}

pub struct RiskManager {
    config: RiskConfig,
    state: RiskState,
    last_results: Vec<RiskRuleResult>,
    high_water_mark: f64,
    hwm_initialized: bool,
    drawdown: f64,
    quote_timestamps: VecDeque<DateTime<Utc>>,
    cancel_timestamps: VecDeque<DateTime<Utc>>,
    breach_timestamp: Option<DateTime<Utc>>,
    /// Set when `reset_kill_switch` lands back in Breached; the next
    /// `evaluate` restarts the cooldown from its event timestamp
    breach_reset_pending: bool,
    last_md_timestamp: Option<DateTime<Utc>>,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            state: RiskState::Normal,
            last_results: Vec::with_capacity(7),
            high_water_mark: 0.0,
            hwm_initialized: false,
            drawdown: 0.0,
            quote_timestamps: VecDeque::new(),
            cancel_timestamps: VecDeque::new(),
            breach_timestamp: None,
            breach_reset_pending: false,
            last_md_timestamp: None,
        }
    }

    fn classify(&self, ratio: f64) -> RiskState {
        if ratio >= 1.0 {
            RiskState::Breached
        } else if ratio >= self.config.warning_threshold_pct {
            RiskState::Warning
        } else {
            RiskState::Normal
        }
    }

    fn eval_max_net_position(&self, acct: &Accounting) -> RiskRuleResult {
        let current = acct.position().abs() as f64;
        let limit = self.config.max_net_position as f64;
        RiskRuleResult {
            rule_id: RiskRuleId::MaxNetPosition,
            level: self.classify(current / limit),
            current_value: current,
            limit_value: limit,
            tag: "net_position",
        }
    }

    fn eval_max_notional_exposure(&self, acct: &Accounting, mark_price: f64) -> RiskRuleResult {
        let current = acct.gross_exposure(mark_price);
        let limit = self.config.max_notional_exposure;
        RiskRuleResult {
            rule_id: RiskRuleId::MaxNotionalExposure,
            level: self.classify(current / limit),
            current_value: current,
            limit_value: limit,
            tag: "gross_exposure",
        }
    }

    fn eval_max_drawdown(&mut self, acct: &Accounting) -> RiskRuleResult {
        let pnl = acct.net_pnl();

        if !self.hwm_initialized {
            self.high_water_mark = pnl;
            self.hwm_initialized = true;
        } else if pnl > self.high_water_mark {
            self.high_water_mark = pnl;
        }

        self.drawdown = self.high_water_mark - pnl;
        let limit = self.config.max_drawdown;
        RiskRuleResult {
            rule_id: RiskRuleId::MaxDrawdown,
            level: self.classify(self.drawdown / limit),
            current_value: self.drawdown,
            limit_value: limit,
            tag: "drawdown",
        }
    }

    fn rate_window(&self) -> Duration {
        Duration::milliseconds((self.config.rate_window_seconds * 1000.0) as i64)
    }

    fn eval_max_quote_rate(&mut self, now: DateTime<Utc>) -> RiskRuleResult {
        let cutoff = now - self.rate_window();
        while self
            .quote_timestamps
            .front()
            .is_some_and(|ts| *ts < cutoff)
        {
            self.quote_timestamps.pop_front();
        }

        let current = self.quote_timestamps.len() as f64 / self.config.rate_window_seconds;
        let limit = self.config.max_quotes_per_second;
        RiskRuleResult {
            rule_id: RiskRuleId::MaxQuoteRate,
            level: self.classify(current / limit),
            current_value: current,
            limit_value: limit,
            tag: "quote_rate",
        }
    }

    fn eval_max_cancel_rate(&mut self, now: DateTime<Utc>) -> RiskRuleResult {
        let cutoff = now - self.rate_window();
        while self
            .cancel_timestamps
            .front()
            .is_some_and(|ts| *ts < cutoff)
        {
            self.cancel_timestamps.pop_front();
        }

        let current = self.cancel_timestamps.len() as f64 / self.config.rate_window_seconds;
        let limit = self.config.max_cancels_per_second;
        RiskRuleResult {
            rule_id: RiskRuleId::MaxCancelRate,
            level: self.classify(current / limit),
            current_value: current,
            limit_value: limit,
            tag: "cancel_rate",
        }
    }

    fn eval_stale_market_data(&mut self, md_ts: DateTime<Utc>) -> RiskRuleResult {
        let Some(last) = self.last_md_timestamp.replace(md_ts) else {
            // First tick seeds the reference timestamp
            return RiskRuleResult {
                rule_id: RiskRuleId::StaleMarketData,
                level: RiskState::Normal,
                current_value: 0.0,
                limit_value: self.config.max_stale_data_ms,
                tag: "first_tick",
            };
        };

        let current_ms = (md_ts - last).num_milliseconds() as f64;
        let limit = self.config.max_stale_data_ms;
        RiskRuleResult {
            rule_id: RiskRuleId::StaleMarketData,
            level: self.classify(current_ms / limit),
            current_value: current_ms,
            limit_value: limit,
            tag: "stale_ms",
        }
    }

    fn eval_max_quote_spread(&self, md: &MarketDataEvent) -> RiskRuleResult {
        let spread = md.spread();
        let limit = self.config.max_quote_spread;
        RiskRuleResult {
            rule_id: RiskRuleId::MaxQuoteSpread,
            level: self.classify(spread / limit),
            current_value: spread,
            limit_value: limit,
            tag: "spread",
        }
    }

    /// Run all seven rules against the tick and advance the state machine.
    /// KillSwitch is absorbing here; only `reset_kill_switch` leaves it.
    pub fn evaluate(
        &mut self,
        acct: &Accounting,
        md: &MarketDataEvent,
        mark_price: f64,
    ) -> RiskState {
        if self.state == RiskState::KillSwitch {
            return self.state;
        }

        self.last_results.clear();
        let position = self.eval_max_net_position(acct);
        self.last_results.push(position);
        let exposure = self.eval_max_notional_exposure(acct, mark_price);
        self.last_results.push(exposure);
        let drawdown = self.eval_max_drawdown(acct);
        self.last_results.push(drawdown);
        let quote_rate = self.eval_max_quote_rate(md.timestamp);
        self.last_results.push(quote_rate);
        let cancel_rate = self.eval_max_cancel_rate(md.timestamp);
        self.last_results.push(cancel_rate);
        let stale = self.eval_stale_market_data(md.timestamp);
        self.last_results.push(stale);
        let spread = self.eval_max_quote_spread(md);
        self.last_results.push(spread);

        let worst = self.worst_of_last_results();

        match self.state {
            RiskState::Normal | RiskState::Warning => {
                if worst == RiskState::Breached {
                    self.state = RiskState::Breached;
                    self.breach_timestamp = Some(md.timestamp);
                } else {
                    self.state = worst;
                }
            }
            RiskState::Breached => {
                // A re-entry via reset_kill_switch restarts the cooldown here
                if self.breach_reset_pending {
                    self.breach_timestamp = Some(md.timestamp);
                    self.breach_reset_pending = false;
                }
                // Recovery requires the cooldown elapsed AND every rule Normal
                if worst == RiskState::Normal {
                    if let Some(breached_at) = self.breach_timestamp {
                        let elapsed = (md.timestamp - breached_at).num_milliseconds() as f64 / 1000.0;
                        if elapsed >= self.config.cooldown_seconds {
                            self.state = RiskState::Normal;
                        }
                    }
                }
            }
            RiskState::KillSwitch => {}
        }

        self.state
    }

    fn worst_of_last_results(&self) -> RiskState {
        self.last_results
            .iter()
            .map(|r| r.level)
            .max()
            .unwrap_or(RiskState::Normal)
    }

    /// Force the state to KillSwitch; quoting stops until an explicit reset
    pub fn engage_kill_switch(&mut self) {
        self.state = RiskState::KillSwitch;
        self.breach_reset_pending = false;
    }

    /// Leave KillSwitch based on the most recent rule results: Normal if all
    /// rules were Normal, otherwise Breached. The breach timestamp is
    /// re-established on the next `evaluate`.
    pub fn reset_kill_switch(&mut self) {
        if self.state != RiskState::KillSwitch {
            return;
        }

        if self.worst_of_last_results() == RiskState::Normal {
            self.state = RiskState::Normal;
            self.breach_reset_pending = false;
        } else {
            self.state = RiskState::Breached;
            self.breach_reset_pending = true;
        }
    }

    pub fn record_quote(&mut self, ts: DateTime<Utc>) {
        self.quote_timestamps.push_back(ts);
    }

    pub fn record_cancel(&mut self, ts: DateTime<Utc>) {
        self.cancel_timestamps.push_back(ts);
    }

    pub fn is_quoting_allowed(&self) -> bool {
        matches!(self.state, RiskState::Normal | RiskState::Warning)
    }

    pub fn current_state(&self) -> RiskState {
        self.state
    }

    pub fn last_results(&self) -> &[RiskRuleResult] {
        &self.last_results
    }

    pub fn current_drawdown(&self) -> f64 {
        self.drawdown
    }

    pub fn high_water_mark(&self) -> f64 {
        self.high_water_mark
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}
