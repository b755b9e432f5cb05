//! 報價引擎門面：以單一 SQLite 儲存組裝所有元件

use chrono::NaiveDate;
use pricing_cache::{CachedParameterSource, InvalidatingParameterWriter};
use pricing_calc::{
    Breakdown, Comparison, CostBreakdownCalculator, FormulaEditor, HistoricalComparator,
    MaterialPriceSetter, ParameterEditor, PricePublisher, PublishRequest,
};
use pricing_core::{
    Clock, FormulaLine, PiecePrice, PiecePriceSource, PricingConfig, ProcessParameters, Result,
    SystemClock,
};
use pricing_store::{PieceQuery, PieceSummary, SqliteStore};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// 計價結果（拆解以顯示精度呈現）
#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    pub breakdown: Breakdown,
    pub comparison: Option<Comparison>,
}

/// 報價引擎
pub struct PricingEngine {
    store: SqliteStore,
    config: PricingConfig,
    clock: Arc<dyn Clock>,
    parameter_cache: Arc<CachedParameterSource>,
    calculator: CostBreakdownCalculator,
    comparator: HistoricalComparator,
    publisher: PricePublisher,
    price_setter: MaterialPriceSetter,
    formula_editor: FormulaEditor,
    parameter_editor: ParameterEditor,
}

impl PricingEngine {
    /// 開啟資料庫檔案，使用系統時鐘
    pub fn open(path: impl AsRef<Path>, config: PricingConfig) -> Result<Self> {
        let store = SqliteStore::open(path)?;
        Self::new(store, config, Arc::new(SystemClock))
    }

    pub fn new(store: SqliteStore, config: PricingConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(store.clone());
        let parameter_cache = Arc::new(CachedParameterSource::new(shared.clone()));
        let parameter_writer = Arc::new(InvalidatingParameterWriter::new(
            shared.clone(),
            parameter_cache.clone(),
        ));

        Ok(Self {
            calculator: CostBreakdownCalculator::new(
                shared.clone(),
                shared.clone(),
                shared.clone(),
                parameter_cache.clone(),
                &config,
            ),
            comparator: HistoricalComparator::new(shared.clone(), clock.clone(), &config),
            publisher: PricePublisher::new(shared.clone(), clock.clone(), &config),
            price_setter: MaterialPriceSetter::new(shared.clone(), shared.clone(), clock.clone()),
            formula_editor: FormulaEditor::new(shared.clone(), shared.clone(), &config),
            parameter_editor: ParameterEditor::new(shared, parameter_writer),
            parameter_cache,
            store,
            config,
            clock,
        })
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// 計算構件價格（未指定日期時以今天計算），可選擇與上次發布價格比較
    pub fn calculate_price(
        &self,
        piece_id: &str,
        zone_id: &str,
        date: Option<NaiveDate>,
        compare: bool,
    ) -> Result<PriceQuote> {
        let as_of = date.unwrap_or_else(|| self.today());
        tracing::info!(
            "報價請求：構件 {}，區域 {}，日期 {}，比較 {}",
            piece_id,
            zone_id,
            as_of,
            compare
        );
        let breakdown = self.calculator.calculate(piece_id, zone_id, as_of)?;

        let comparison = if compare {
            Some(self.comparator.compare(piece_id, zone_id, breakdown.total)?)
        } else {
            None
        };

        Ok(PriceQuote {
            breakdown: breakdown.rounded(&self.config),
            comparison,
        })
    }

    /// 以生效日重新計算並發布構件價格
    pub fn publish_price(
        &self,
        piece_id: &str,
        zone_id: &str,
        request: &PublishRequest,
    ) -> Result<Uuid> {
        tracing::info!(
            "發布請求：構件 {}，區域 {}，生效 {}，發布者 {}",
            piece_id,
            zone_id,
            request.effective_date,
            request.created_by
        );
        let breakdown = self
            .calculator
            .calculate(piece_id, zone_id, request.effective_date)?;
        self.publisher.publish(piece_id, zone_id, &breakdown, request)
    }

    /// 發布已計算的拆解結果
    pub fn publish_breakdown(&self, breakdown: &Breakdown, request: &PublishRequest) -> Result<Uuid> {
        self.publisher
            .publish(&breakdown.piece_id, &breakdown.zone_id, breakdown, request)
    }

    pub fn set_material_price(
        &self,
        material_id: &str,
        zone_id: &str,
        price: Decimal,
        valid_from: NaiveDate,
        created_by: &str,
    ) -> Result<Uuid> {
        self.price_setter
            .set_price(material_id, zone_id, price, valid_from, created_by)
    }

    pub fn replace_formula(&self, piece_id: &str, lines: Vec<FormulaLine>) -> Result<()> {
        self.formula_editor.replace_formula(piece_id, lines)
    }

    /// 儲存製程參數並使該區域快取失效
    pub fn save_parameters(&self, params: ProcessParameters) -> Result<()> {
        self.parameter_editor.save_parameters(params)?;
        tracing::debug!("製程參數快取統計：{:?}", self.parameter_cache.stats());
        Ok(())
    }

    /// 發布價格歷史（依生效日遞減）
    pub fn price_history(&self, piece_id: &str, zone_id: &str) -> Result<Vec<PiecePrice>> {
        self.store.piece_prices(piece_id, zone_id)
    }

    pub fn list_pieces(&self, query: &PieceQuery) -> Result<Vec<PieceSummary>> {
        Ok(self.store.list_pieces(query)?)
    }

    pub fn parameter_cache(&self) -> &CachedParameterSource {
        &self.parameter_cache
    }
}
