//! 歷史價格比較

use pricing_core::{Clock, PiecePrice, PiecePriceSource, PricingConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 價格趨勢
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
    /// 沒有之前的發布價格
    New,
}

/// 與上次發布價格的比較結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub previous_price: Option<PiecePrice>,

    /// 新價格 − 上次最終價格（顯示精度）
    pub delta: Option<Decimal>,

    /// 變動百分比（上次價格為 0 時為 None）
    pub delta_percent: Option<Decimal>,

    pub trend: Trend,
}

/// 歷史價格比較器
pub struct HistoricalComparator {
    prices: Arc<dyn PiecePriceSource>,
    clock: Arc<dyn Clock>,
    config: PricingConfig,
}

impl HistoricalComparator {
    pub fn new(
        prices: Arc<dyn PiecePriceSource>,
        clock: Arc<dyn Clock>,
        config: &PricingConfig,
    ) -> Self {
        Self {
            prices,
            clock,
            config: config.clone(),
        }
    }

    /// 與今天（含）之前最近一次發布的價格比較
    pub fn compare(
        &self,
        piece_id: &str,
        zone_id: &str,
        new_total: Decimal,
    ) -> pricing_core::Result<Comparison> {
        let today = self.clock.today();
        let previous = self.prices.latest_piece_price(piece_id, zone_id, today)?;
        let comparison = compare_with(previous, new_total, &self.config);

        tracing::debug!(
            "構件 {} 區域 {} 價格比較：{:?} {:?}",
            piece_id,
            zone_id,
            comparison.trend,
            comparison.delta
        );
        Ok(comparison)
    }
}

/// 以顯示精度比較新價格與基準價格
pub fn compare_with(
    previous: Option<PiecePrice>,
    new_total: Decimal,
    config: &PricingConfig,
) -> Comparison {
    let Some(previous) = previous else {
        return Comparison {
            previous_price: None,
            delta: None,
            delta_percent: None,
            trend: Trend::New,
        };
    };

    let baseline = config.round(previous.final_price());
    let delta = config.round(new_total) - baseline;
    let delta_percent = if baseline.is_zero() {
        None
    } else {
        Some(delta / baseline * Decimal::ONE_HUNDRED)
    };

    let trend = if delta > Decimal::ZERO {
        Trend::Up
    } else if delta < Decimal::ZERO {
        Trend::Down
    } else {
        Trend::Flat
    };

    Comparison {
        previous_price: Some(previous),
        delta: Some(delta),
        delta_percent,
        trend,
    }
}
