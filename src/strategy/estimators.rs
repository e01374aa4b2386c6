// Rolling market estimators: windowed volatility and order-flow imbalance

use crate::types::{Side, Trade};
use std::collections::VecDeque;

/// Sample standard deviation of simple returns over a bounded window of mids
#[derive(Debug, Clone)]
pub struct RollingVolatility {
    window: usize,
    mids: VecDeque<f64>,
    returns: VecDeque<f64>,
}

impl RollingVolatility {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            mids: VecDeque::with_capacity(window + 1),
            returns: VecDeque::with_capacity(window),
        }
    }

    pub fn on_mid(&mut self, mid: f64) {
        if let Some(&prev) = self.mids.back() {
            if prev > 0.0 {
                self.returns.push_back((mid - prev) / prev);
                if self.returns.len() > self.window {
                    self.returns.pop_front();
                }
            }
        }
        self.mids.push_back(mid);
        if self.mids.len() > self.window + 1 {
            self.mids.pop_front();
        }
    }

    /// 0.0 with fewer than two observed returns
    pub fn sigma(&self) -> f64 {
        let n = self.returns.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.returns.iter().sum::<f64>() / n as f64;
        let sq_sum = self
            .returns
            .iter()
            .map(|r| {
                let diff = r - mean;
                diff * diff
            })
            .sum::<f64>();
        (sq_sum / (n - 1) as f64).sqrt()
    }

    pub fn count(&self) -> usize {
        self.returns.len()
    }
}

/// Normalized order-flow imbalance over a bounded window of signed volumes
#[derive(Debug, Clone)]
pub struct RollingOfi {
    window: usize,
    signed_volumes: VecDeque<f64>,
}

impl RollingOfi {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            signed_volumes: VecDeque::with_capacity(window),
        }
    }

    pub fn on_trades(&mut self, trades: &[Trade]) {
        for trade in trades {
            let signed = match trade.aggressor_side {
                Side::Buy => trade.size as f64,
                Side::Sell => -(trade.size as f64),
            };
            self.signed_volumes.push_back(signed);
            if self.signed_volumes.len() > self.window {
                self.signed_volumes.pop_front();
            }
        }
    }

    /// Net signed volume over total absolute volume, in [-1, 1]; 0.0 when
    /// the window is empty
    pub fn normalized_ofi(&self) -> f64 {
        if self.signed_volumes.is_empty() {
            return 0.0;
        }
        let net: f64 = self.signed_volumes.iter().sum();
        let total: f64 = self.signed_volumes.iter().map(|v| v.abs()).sum();
        if total == 0.0 {
            return 0.0;
        }
        net / total
    }

    pub fn count(&self) -> usize {
        self.signed_volumes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn trade(side: Side, size: i64) -> Trade {
        Trade {
            aggressor_side: side,
            price: 100.0,
            size,
            trade_id: 1,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_sigma_zero_with_fewer_than_two_returns() {
        let mut vol = RollingVolatility::new(100);
        assert_eq!(vol.sigma(), 0.0);
        vol.on_mid(100.0);
        assert_eq!(vol.sigma(), 0.0);
        vol.on_mid(101.0);
        assert_eq!(vol.sigma(), 0.0);
    }

    #[test]
    fn test_sigma_zero_for_constant_prices() {
        let mut vol = RollingVolatility::new(100);
        for _ in 0..10 {
            vol.on_mid(100.0);
        }
        assert_eq!(vol.sigma(), 0.0);
    }

    #[test]
    fn test_sigma_for_oscillating_prices() {
        let mut vol = RollingVolatility::new(100);
        for mid in [100.0, 101.0, 100.0, 101.0, 100.0] {
            vol.on_mid(mid);
        }
        let sigma = vol.sigma();
        assert!(sigma > 0.005 && sigma < 0.015, "sigma={sigma}");
    }

    #[test]
    fn test_volatility_window_is_bounded() {
        let mut vol = RollingVolatility::new(5);
        for i in 0..100 {
            vol.on_mid(100.0 + i as f64);
        }
        assert_eq!(vol.count(), 5);
    }

    #[test]
    fn test_ofi_empty_is_zero() {
        let ofi = RollingOfi::new(50);
        assert_eq!(ofi.normalized_ofi(), 0.0);
    }

    #[test]
    fn test_ofi_all_buys_is_one() {
        let mut ofi = RollingOfi::new(50);
        ofi.on_trades(&[trade(Side::Buy, 5), trade(Side::Buy, 3)]);
        assert!((ofi.normalized_ofi() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ofi_balanced_is_zero() {
        let mut ofi = RollingOfi::new(50);
        ofi.on_trades(&[trade(Side::Buy, 5), trade(Side::Sell, 5)]);
        assert!(ofi.normalized_ofi().abs() < 1e-12);
    }

    #[test]
    fn test_ofi_window_drops_old_flow() {
        let mut ofi = RollingOfi::new(2);
        ofi.on_trades(&[trade(Side::Sell, 10)]);
        ofi.on_trades(&[trade(Side::Buy, 5), trade(Side::Buy, 5)]);
        // The sell has rolled out of the window
        assert!((ofi.normalized_ofi() - 1.0).abs() < 1e-12);
    }
}
