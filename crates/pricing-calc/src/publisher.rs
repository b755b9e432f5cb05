//! 構件價格發布

use chrono::NaiveDate;
use pricing_core::{Clock, PiecePrice, PiecePriceWriter, PricingConfig, PricingError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::breakdown::Breakdown;

/// 發布請求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    /// 生效日期
    pub effective_date: NaiveDate,

    /// 人工調整金額
    pub adjustment: Decimal,

    /// 發布者
    pub created_by: String,
}

impl PublishRequest {
    pub fn new(effective_date: NaiveDate, created_by: String) -> Self {
        Self {
            effective_date,
            adjustment: Decimal::ZERO,
            created_by,
        }
    }

    /// 建構器模式：設置調整金額
    pub fn with_adjustment(mut self, adjustment: Decimal) -> Self {
        self.adjustment = adjustment;
        self
    }
}

/// 價格發布器
///
/// 發布只新增記錄；既有記錄僅會被設定失效日。
pub struct PricePublisher {
    writer: Arc<dyn PiecePriceWriter>,
    clock: Arc<dyn Clock>,
    config: PricingConfig,
}

impl PricePublisher {
    pub fn new(
        writer: Arc<dyn PiecePriceWriter>,
        clock: Arc<dyn Clock>,
        config: &PricingConfig,
    ) -> Self {
        Self {
            writer,
            clock,
            config: config.clone(),
        }
    }

    /// 發布構件價格，回傳新價格記錄ID
    ///
    /// `piece_id`、`zone_id` 必須與拆解結果一致；有缺價物料時回傳 `IncompletePricing`，
    /// 同一生效日已有發布價格時回傳 `Conflict`。
    pub fn publish(
        &self,
        piece_id: &str,
        zone_id: &str,
        breakdown: &Breakdown,
        request: &PublishRequest,
    ) -> pricing_core::Result<Uuid> {
        if breakdown.piece_id != piece_id || breakdown.zone_id != zone_id {
            return Err(PricingError::ValidationError(format!(
                "價格拆解屬於 {}/{}，不可發布到 {}/{}",
                breakdown.piece_id, breakdown.zone_id, piece_id, zone_id
            )));
        }

        if !breakdown.is_publishable() {
            tracing::warn!(
                "構件 {} 區域 {} 有缺價物料，拒絕發布",
                piece_id,
                zone_id
            );
            return Err(PricingError::IncompletePricing {
                materials: breakdown.missing_material_ids(),
            });
        }

        if !breakdown.has_formula() && !self.config.allow_publish_without_formula {
            return Err(PricingError::ValidationError(format!(
                "構件 {} 沒有配方，不可發布價格",
                piece_id
            )));
        }

        if request.created_by.trim().is_empty() {
            return Err(PricingError::ValidationError("發布者不可為空".to_string()));
        }

        let base_price = self.config.round(breakdown.total);
        let adjustment = self.config.round(request.adjustment);
        if base_price + adjustment < Decimal::ZERO {
            return Err(PricingError::ValidationError(format!(
                "最終價格不可為負: {} + {}",
                base_price, adjustment
            )));
        }

        let price = PiecePrice::new(
            piece_id.to_string(),
            zone_id.to_string(),
            base_price,
            request.effective_date,
            request.created_by.clone(),
            self.clock.now(),
        )
        .with_adjustment(adjustment);

        self.writer.insert_piece_price(&price)?;

        tracing::info!(
            "已發布構件 {} 區域 {} 價格 {}（生效 {}）",
            piece_id,
            zone_id,
            price.final_price(),
            price.effective_date
        );
        Ok(price.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakdown::CostBreakdownCalculator;
    use crate::testing::{d, steel_fixture, InMemoryData};
    use pricing_core::{FixedClock, Piece, PiecePriceSource};

    fn calculate(data: &Arc<InMemoryData>, piece: &str, zone: &str, date: NaiveDate) -> Breakdown {
        CostBreakdownCalculator::new(
            data.clone(),
            data.clone(),
            data.clone(),
            data.clone(),
            &PricingConfig::new(),
        )
        .calculate(piece, zone, date)
        .unwrap()
    }

    fn publisher(data: &Arc<InMemoryData>, config: &PricingConfig) -> PricePublisher {
        PricePublisher::new(data.clone(), Arc::new(FixedClock::on(d(2024, 3, 1))), config)
    }

    #[test]
    fn test_publish_and_supersede() {
        let data = Arc::new(steel_fixture());
        let publisher = publisher(&data, &PricingConfig::new());

        let first = calculate(&data, "P1", "Z1", d(2024, 1, 1));
        publisher
            .publish("P1", "Z1", &first, &PublishRequest::new(d(2024, 1, 1), "ana".to_string()))
            .unwrap();

        let second = calculate(&data, "P1", "Z1", d(2024, 3, 1));
        let id = publisher
            .publish(
                "P1",
                "Z1",
                &second,
                &PublishRequest::new(d(2024, 3, 1), "ana".to_string())
                    .with_adjustment(Decimal::new(150, 2)),
            )
            .unwrap();

        let history = data.piece_prices("P1", "Z1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, id);
        assert_eq!(history[0].expiry_date, None);
        assert_eq!(history[0].final_price(), Decimal::new(2250, 2));
        assert_eq!(history[1].expiry_date, Some(d(2024, 2, 29)));
    }

    #[test]
    fn test_missing_price_blocks_publish() {
        let data = Arc::new(steel_fixture());
        let breakdown = calculate(&data, "P1", "Z2", d(2024, 1, 15));

        let result = publisher(&data, &PricingConfig::new()).publish(
            "P1",
            "Z2",
            &breakdown,
            &PublishRequest::new(d(2024, 1, 15), "ana".to_string()),
        );

        match result {
            Err(PricingError::IncompletePricing { materials }) => {
                assert_eq!(materials, vec!["STEEL".to_string()]);
            }
            other => panic!("expected IncompletePricing, got {:?}", other),
        }
        assert!(data.all_piece_prices().is_empty());
    }

    #[test]
    fn test_same_date_conflict_returns_existing() {
        let data = Arc::new(steel_fixture());
        let publisher = publisher(&data, &PricingConfig::new());
        let breakdown = calculate(&data, "P1", "Z1", d(2024, 1, 1));
        let request = PublishRequest::new(d(2024, 1, 1), "ana".to_string());

        publisher.publish("P1", "Z1", &breakdown, &request).unwrap();
        let result = publisher.publish("P1", "Z1", &breakdown, &request);

        match result {
            Err(PricingError::Conflict { existing, .. }) => {
                assert_eq!(existing.map(|p| p.base_price), Some(Decimal::from(21)));
            }
            other => panic!("expected Conflict, got {:?}", other),
        }
        assert_eq!(data.all_piece_prices().len(), 1);
    }

    #[test]
    fn test_mismatched_breakdown_rejected() {
        let data = Arc::new(steel_fixture());
        let breakdown = calculate(&data, "P1", "Z1", d(2024, 1, 1));

        let result = publisher(&data, &PricingConfig::new()).publish(
            "P1",
            "Z2",
            &breakdown,
            &PublishRequest::new(d(2024, 1, 1), "ana".to_string()),
        );
        assert!(matches!(result, Err(PricingError::ValidationError(_))));
    }

    #[test]
    fn test_no_formula_requires_config() {
        let data = Arc::new(steel_fixture().with_piece(
            Piece::new("P0".to_string(), "Sin formula".to_string(), "un".to_string())
                .with_technical(Decimal::ONE, Decimal::ZERO, Decimal::ZERO),
        ));
        let breakdown = calculate(&data, "P0", "Z1", d(2024, 1, 1));
        let request = PublishRequest::new(d(2024, 1, 1), "ana".to_string());

        let strict = publisher(&data, &PricingConfig::new()).publish("P0", "Z1", &breakdown, &request);
        assert!(matches!(strict, Err(PricingError::ValidationError(_))));

        let relaxed = publisher(&data, &PricingConfig::new().with_allow_publish_without_formula(true))
            .publish("P0", "Z1", &breakdown, &request);
        assert!(relaxed.is_ok());
    }
}
