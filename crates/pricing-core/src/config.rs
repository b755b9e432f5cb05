//! 報價引擎配置

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{PricingError, Result};

/// 報價引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// 顯示精度（小數位數），也是發布價格與趨勢比較使用的精度
    pub presentation_scale: u32,

    /// 損耗係數上限（損耗係數以比例表示：0.05 = 5%）
    pub max_waste_factor: Decimal,

    /// 製程參數回溯上限（月）
    /// - None: 不限制，取最近一筆之前月份的參數
    /// - Some(n): 超過 n 個月前的參數視為不存在
    pub max_fallback_months: Option<u32>,

    /// 是否允許發布沒有配方（BOM）的構件價格
    pub allow_publish_without_formula: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            presentation_scale: 2,
            max_waste_factor: Decimal::ONE,
            max_fallback_months: None,
            allow_publish_without_formula: false,
        }
    }
}

impl PricingConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置顯示精度
    pub fn with_presentation_scale(mut self, scale: u32) -> Self {
        self.presentation_scale = scale;
        self
    }

    /// 建構器模式：設置損耗係數上限
    pub fn with_max_waste_factor(mut self, max: Decimal) -> Self {
        self.max_waste_factor = max;
        self
    }

    /// 建構器模式：設置製程參數回溯上限
    pub fn with_max_fallback_months(mut self, months: u32) -> Self {
        self.max_fallback_months = Some(months);
        self
    }

    /// 建構器模式：設置是否允許發布無配方價格
    pub fn with_allow_publish_without_formula(mut self, allow: bool) -> Self {
        self.allow_publish_without_formula = allow;
        self
    }

    /// 從 JSON 字串載入配置（缺少的欄位使用預設值）
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PricingError::ValidationError(format!("配置解析失敗: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 從 JSON 檔案載入配置
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PricingError::ValidationError(format!("無法讀取配置檔 {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// 檢查配置是否合理
    pub fn validate(&self) -> Result<()> {
        if self.presentation_scale > 10 {
            return Err(PricingError::ValidationError(format!(
                "顯示精度過大: {}",
                self.presentation_scale
            )));
        }
        if self.max_waste_factor < Decimal::ZERO {
            return Err(PricingError::ValidationError(format!(
                "損耗係數上限不可為負: {}",
                self.max_waste_factor
            )));
        }
        Ok(())
    }

    /// 以顯示精度四捨五入
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(
            self.presentation_scale,
            RoundingStrategy::MidpointAwayFromZero,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PricingConfig::new();

        assert_eq!(config.presentation_scale, 2);
        assert_eq!(config.max_waste_factor, Decimal::ONE);
        assert_eq!(config.max_fallback_months, None);
        assert!(!config.allow_publish_without_formula);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PricingConfig::new()
            .with_presentation_scale(4)
            .with_max_waste_factor(Decimal::new(5, 1))
            .with_max_fallback_months(3)
            .with_allow_publish_without_formula(true);

        assert_eq!(config.presentation_scale, 4);
        assert_eq!(config.max_waste_factor, Decimal::new(5, 1));
        assert_eq!(config.max_fallback_months, Some(3));
        assert!(config.allow_publish_without_formula);
    }

    #[test]
    fn test_from_json_partial() {
        let config = PricingConfig::from_json_str(r#"{ "max_fallback_months": 2 }"#).unwrap();

        assert_eq!(config.max_fallback_months, Some(2));
        // 其他欄位維持預設
        assert_eq!(config.presentation_scale, 2);
    }

    #[test]
    fn test_from_json_rejects_negative_waste() {
        let result = PricingConfig::from_json_str(r#"{ "max_waste_factor": "-0.1" }"#);
        assert!(matches!(result, Err(PricingError::ValidationError(_))));
    }

    #[test]
    fn test_round() {
        let config = PricingConfig::new();
        // 四捨五入（非銀行家捨入）
        assert_eq!(config.round(Decimal::new(21005, 3)), Decimal::new(2101, 2));
        assert_eq!(config.round(Decimal::new(21004, 3)), Decimal::new(2100, 2));
        assert_eq!(config.round(Decimal::new(-21005, 3)), Decimal::new(-2101, 2));
    }
}
