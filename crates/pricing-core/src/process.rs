//! 製程參數模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::month_start;

/// 區域月份製程參數
///
/// 每個 (zone_id, month) 最多一筆，`month` 一律為當月 1 日。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessParameters {
    /// 區域ID
    pub zone_id: String,

    /// 月份（當月 1 日）
    pub month: NaiveDate,

    /// 養護能源成本（每噸）
    pub curing_energy_per_tn: Decimal,

    /// 工廠管銷（每噸）
    pub factory_overhead_per_tn: Decimal,

    /// 公司管銷（每噸）
    pub company_overhead_per_tn: Decimal,

    /// 利潤（每噸）
    pub profit_per_tn: Decimal,

    /// 工程設計（每噸）
    pub engineering_per_tn: Decimal,

    /// 工時單價
    pub hourly_labor_rate: Decimal,

    /// 鋼筋加工工時（每噸）
    pub labor_hours_per_tn_steel: Decimal,

    /// 混凝土澆置工時（每 m3）
    pub labor_hours_per_m3_concrete: Decimal,
}

impl ProcessParameters {
    /// 創建全部為 0 的參數（月份自動正規化為當月 1 日）
    pub fn new(zone_id: String, month: NaiveDate) -> Self {
        Self {
            zone_id,
            month: month_start(month),
            curing_energy_per_tn: Decimal::ZERO,
            factory_overhead_per_tn: Decimal::ZERO,
            company_overhead_per_tn: Decimal::ZERO,
            profit_per_tn: Decimal::ZERO,
            engineering_per_tn: Decimal::ZERO,
            hourly_labor_rate: Decimal::ZERO,
            labor_hours_per_tn_steel: Decimal::ZERO,
            labor_hours_per_m3_concrete: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置每噸成本項目
    pub fn with_per_ton_costs(
        mut self,
        curing_energy: Decimal,
        factory_overhead: Decimal,
        company_overhead: Decimal,
        profit: Decimal,
        engineering: Decimal,
    ) -> Self {
        self.curing_energy_per_tn = curing_energy;
        self.factory_overhead_per_tn = factory_overhead;
        self.company_overhead_per_tn = company_overhead;
        self.profit_per_tn = profit;
        self.engineering_per_tn = engineering;
        self
    }

    /// 建構器模式：設置人工參數
    pub fn with_labor(
        mut self,
        hourly_rate: Decimal,
        hours_per_tn_steel: Decimal,
        hours_per_m3_concrete: Decimal,
    ) -> Self {
        self.hourly_labor_rate = hourly_rate;
        self.labor_hours_per_tn_steel = hours_per_tn_steel;
        self.labor_hours_per_m3_concrete = hours_per_m3_concrete;
        self
    }

    /// 每噸製程成本合計
    pub fn per_ton_total(&self) -> Decimal {
        self.curing_energy_per_tn
            + self.factory_overhead_per_tn
            + self.company_overhead_per_tn
            + self.profit_per_tn
            + self.engineering_per_tn
    }

    /// 所有數值欄位（名稱, 值），供驗證使用
    pub fn values(&self) -> [(&'static str, Decimal); 8] {
        [
            ("curing_energy_per_tn", self.curing_energy_per_tn),
            ("factory_overhead_per_tn", self.factory_overhead_per_tn),
            ("company_overhead_per_tn", self.company_overhead_per_tn),
            ("profit_per_tn", self.profit_per_tn),
            ("engineering_per_tn", self.engineering_per_tn),
            ("hourly_labor_rate", self.hourly_labor_rate),
            ("labor_hours_per_tn_steel", self.labor_hours_per_tn_steel),
            ("labor_hours_per_m3_concrete", self.labor_hours_per_m3_concrete),
        ]
    }
}
