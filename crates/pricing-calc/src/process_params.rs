//! 製程參數查詢與維護

use chrono::NaiveDate;
use pricing_core::period::{month_start, months_between};
use pricing_core::{
    PieceCatalog, PricingConfig, PricingError, ProcessParameterSource, ProcessParameterWriter,
    ProcessParameters,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 製程參數查詢結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterLookup {
    pub parameters: ProcessParameters,

    /// 是否使用之前月份的參數
    pub is_fallback: bool,
}

/// 製程參數查詢
pub struct ProcessParameterLookup {
    catalog: Arc<dyn PieceCatalog>,
    source: Arc<dyn ProcessParameterSource>,
    max_fallback_months: Option<u32>,
}

impl ProcessParameterLookup {
    pub fn new(
        catalog: Arc<dyn PieceCatalog>,
        source: Arc<dyn ProcessParameterSource>,
        config: &PricingConfig,
    ) -> Self {
        Self {
            catalog,
            source,
            max_fallback_months: config.max_fallback_months,
        }
    }

    /// 查詢區域月份參數
    ///
    /// 當月沒有記錄時取之前最近月份並標記 `is_fallback`；
    /// 完全沒有記錄時回傳 `MissingConfiguration`，不假設為 0。
    pub fn parameters(
        &self,
        zone_id: &str,
        month: NaiveDate,
    ) -> pricing_core::Result<ParameterLookup> {
        let month = month_start(month);

        if self.catalog.zone(zone_id)?.is_none() {
            return Err(PricingError::not_found("區域", zone_id));
        }

        let missing = || PricingError::MissingConfiguration {
            zone_id: zone_id.to_string(),
            month,
        };

        let parameters = self
            .source
            .latest_parameters(zone_id, month)?
            .ok_or_else(missing)?;

        let gap = months_between(parameters.month, month);
        if let Some(limit) = self.max_fallback_months {
            if gap > limit as i32 {
                tracing::warn!(
                    "區域 {} 最近參數為 {}，超過回溯上限 {} 個月",
                    zone_id,
                    parameters.month,
                    limit
                );
                return Err(missing());
            }
        }

        let is_fallback = parameters.month != month;
        if is_fallback {
            tracing::info!(
                "區域 {} 缺少 {} 製程參數，改用 {}",
                zone_id,
                month,
                parameters.month
            );
        }

        Ok(ParameterLookup {
            parameters,
            is_fallback,
        })
    }
}

/// 製程參數維護
pub struct ParameterEditor {
    catalog: Arc<dyn PieceCatalog>,
    writer: Arc<dyn ProcessParameterWriter>,
}

impl ParameterEditor {
    pub fn new(catalog: Arc<dyn PieceCatalog>, writer: Arc<dyn ProcessParameterWriter>) -> Self {
        Self { catalog, writer }
    }

    /// 儲存區域月份參數（同月份覆蓋）
    pub fn save_parameters(&self, mut params: ProcessParameters) -> pricing_core::Result<()> {
        if self
            .catalog
            .zone(&params.zone_id)?
            .filter(|z| z.is_active())
            .is_none()
        {
            return Err(PricingError::not_found("區域", params.zone_id));
        }

        for (field, value) in params.values() {
            if value < Decimal::ZERO {
                return Err(PricingError::ValidationError(format!(
                    "製程參數 {} 不可為負: {}",
                    field, value
                )));
            }
        }

        params.month = month_start(params.month);
        self.writer.save_parameters(&params)?;
        tracing::info!("已儲存區域 {} {} 製程參數", params.zone_id, params.month);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{d, InMemoryData};
    use rstest::rstest;

    fn data() -> InMemoryData {
        InMemoryData::new()
            .with_zone("Z1")
            .with_zone("Z9")
            .with_parameters(
                ProcessParameters::new("Z1".to_string(), d(2024, 1, 1))
                    .with_labor(Decimal::from(15), Decimal::from(40), Decimal::from(2)),
            )
    }

    fn lookup(config: &PricingConfig) -> ProcessParameterLookup {
        let data = Arc::new(data());
        ProcessParameterLookup::new(data.clone(), data, config)
    }

    #[test]
    fn test_exact_month() {
        let result = lookup(&PricingConfig::new())
            .parameters("Z1", d(2024, 1, 20))
            .unwrap();

        assert!(!result.is_fallback);
        assert_eq!(result.parameters.month, d(2024, 1, 1));
    }

    #[test]
    fn test_fallback_to_previous_month() {
        let result = lookup(&PricingConfig::new())
            .parameters("Z1", d(2024, 2, 15))
            .unwrap();

        assert!(result.is_fallback);
        assert_eq!(result.parameters.month, d(2024, 1, 1));
        assert_eq!(result.parameters.hourly_labor_rate, Decimal::from(15));
    }

    #[test]
    fn test_missing_configuration() {
        let result = lookup(&PricingConfig::new()).parameters("Z9", d(2024, 2, 15));
        assert!(matches!(result, Err(PricingError::MissingConfiguration { .. })));

        // 只有之後月份的參數也視為缺少
        let result = lookup(&PricingConfig::new()).parameters("Z1", d(2023, 12, 1));
        assert!(matches!(result, Err(PricingError::MissingConfiguration { .. })));
    }

    #[test]
    fn test_unknown_zone() {
        let result = lookup(&PricingConfig::new()).parameters("NOPE", d(2024, 1, 1));
        assert!(matches!(result, Err(PricingError::NotFound { .. })));
    }

    #[rstest]
    #[case(d(2024, 3, 1), true)]
    #[case(d(2024, 4, 1), false)]
    fn test_fallback_limit(#[case] month: NaiveDate, #[case] allowed: bool) {
        let config = PricingConfig::new().with_max_fallback_months(2);
        let result = lookup(&config).parameters("Z1", month);
        assert_eq!(result.is_ok(), allowed);
    }

    #[test]
    fn test_editor_rejects_negative_values() {
        let data = Arc::new(data());
        let editor = ParameterEditor::new(data.clone(), data);

        let params = ProcessParameters::new("Z1".to_string(), d(2024, 2, 1))
            .with_labor(Decimal::from(-1), Decimal::ZERO, Decimal::ZERO);
        let result = editor.save_parameters(params);
        assert!(matches!(result, Err(PricingError::ValidationError(_))));
    }

    #[test]
    fn test_editor_saves_and_lookup_sees_new_month() {
        let data = Arc::new(data());
        let editor = ParameterEditor::new(data.clone(), data.clone());

        let mut params = ProcessParameters::new("Z1".to_string(), d(2024, 2, 1));
        params.month = d(2024, 2, 10);
        editor.save_parameters(params).unwrap();

        let lookup = ProcessParameterLookup::new(data.clone(), data, &PricingConfig::new());
        let result = lookup.parameters("Z1", d(2024, 2, 15)).unwrap();
        assert!(!result.is_fallback);
        assert_eq!(result.parameters.month, d(2024, 2, 1));
    }
}
