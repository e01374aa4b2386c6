// Avellaneda-Stoikov quoting strategy: reservation price and optimal spread
// from rolling volatility, widened by order-flow imbalance

use crate::strategy::estimators::{RollingOfi, RollingVolatility};
use crate::strategy::{QuoteDecision, Strategy, StrategySnapshot};

#[derive(Debug, Clone)]
pub struct AvellanedaStoikovConfig {
    /// Risk aversion
    pub gamma: f64,
    /// Fill-rate parameter
    pub kappa: f64,
    /// Time horizon
    pub horizon: f64,
    /// Spread floor in basis points of mid
    pub min_spread_bps: f64,
    /// Spread ceiling in basis points of mid
    pub max_spread_bps: f64,
    pub ofi_spread_factor: f64,
    pub base_size: i64,
    pub size_inventory_scale: f64,
    pub toxic_ofi_threshold: f64,
    /// Pull both quotes when |OFI| exceeds the toxic threshold
    pub pull_on_toxic: bool,
    pub vol_window: usize,
    pub ofi_window: usize,
}

impl Default for AvellanedaStoikovConfig {
    fn default() -> Self {
        Self {
            gamma: 0.1,
            kappa: 1.5,
            horizon: 1.0,
            min_spread_bps: 5.0,
            max_spread_bps: 200.0,
            ofi_spread_factor: 0.5,
            base_size: 5,
            size_inventory_scale: 1.0,
            toxic_ofi_threshold: 0.7,
            pull_on_toxic: false,
            vol_window: 100,
            ofi_window: 50,
        }
    }
}

pub struct AvellanedaStoikovStrategy {
    config: AvellanedaStoikovConfig,
    vol_estimator: RollingVolatility,
    ofi_estimator: RollingOfi,
}

impl AvellanedaStoikovStrategy {
    pub fn new(config: AvellanedaStoikovConfig) -> Self {
        let vol_estimator = RollingVolatility::new(config.vol_window);
        let ofi_estimator = RollingOfi::new(config.ofi_window);
        Self {
            config,
            vol_estimator,
            ofi_estimator,
        }
    }

    pub fn config(&self) -> &AvellanedaStoikovConfig {
        &self.config
    }

    pub fn last_sigma(&self) -> f64 {
        self.vol_estimator.sigma()
    }

    pub fn last_ofi(&self) -> f64 {
        self.ofi_estimator.normalized_ofi()
    }
}

impl Strategy for AvellanedaStoikovStrategy {
    fn compute_quotes(&mut self, snap: &StrategySnapshot) -> QuoteDecision {
        self.vol_estimator.on_mid(snap.mid_price);
        self.ofi_estimator.on_trades(&snap.trades);

        let sigma = self.vol_estimator.sigma();
        let ofi = self.ofi_estimator.normalized_ofi();
        let q = snap.position as f64;
        let q_max = snap.max_position as f64;
        let gamma = self.config.gamma;
        let kappa = self.config.kappa;
        let horizon = self.config.horizon;

        // Reservation price: r = mid - q * gamma * sigma^2 * T
        let sigma2 = sigma * sigma;
        let reservation = snap.mid_price - q * gamma * sigma2 * horizon;

        // Optimal spread: gamma*sigma^2*T + (2/gamma)*ln(1 + gamma/kappa),
        // widened by imbalance and clamped to the configured bps band
        let mut optimal_spread =
            gamma * sigma2 * horizon + (2.0 / gamma) * (1.0 + gamma / kappa).ln();
        optimal_spread *= 1.0 + self.config.ofi_spread_factor * ofi.abs();

        let min_spread = self.config.min_spread_bps * snap.mid_price / 10_000.0;
        let max_spread = self.config.max_spread_bps * snap.mid_price / 10_000.0;
        optimal_spread = optimal_spread.clamp(min_spread, max_spread);

        // Adverse-selection guard
        if self.config.pull_on_toxic && ofi.abs() > self.config.toxic_ofi_threshold {
            return QuoteDecision::no_quote();
        }

        let bid_price = reservation - optimal_spread / 2.0;
        let ask_price = reservation + optimal_spread / 2.0;

        // Asymmetric sizing: shrink the side that would grow the inventory
        let inv_ratio = if q_max > 0.0 {
            (q / q_max).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let base = self.config.base_size as f64;
        let bid_size = (base * (1.0 - inv_ratio * self.config.size_inventory_scale)) as i64;
        let ask_size = (base * (1.0 + inv_ratio * self.config.size_inventory_scale)) as i64;

        QuoteDecision {
            bid_price,
            ask_price,
            bid_size: bid_size.max(1),
            ask_size: ask_size.max(1),
            should_quote: true,
        }
    }

    fn name(&self) -> &'static str {
        "avellaneda-stoikov"
    }
}
