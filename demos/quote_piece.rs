//! 構件報價示例：建立主檔、設定價格與製程參數、計算並發布

use anyhow::Context;
use chrono::NaiveDate;
use pricing::{PricingConfig, PricingEngine, PublishRequest, SqliteStore};
use pricing_core::{FixedClock, FormulaLine, Material, Piece, ProcessParameters, Zone};
use rust_decimal::Decimal;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("無效日期 {}-{}-{}", y, m, d))
}

fn main() -> anyhow::Result<()> {
    pricing::logging::init();
    println!("=== 構件報價示例 ===\n");

    let store = SqliteStore::open_in_memory()?;
    store.save_zone(&Zone::new("NORTE".to_string(), "Planta Norte".to_string()))?;
    store.save_material(&Material::new(
        "ACERO-12".to_string(),
        "Acero corrugado 12mm".to_string(),
        "kg".to_string(),
    ))?;
    store.save_material(&Material::new(
        "HORM-H30".to_string(),
        "Hormigón H30".to_string(),
        "m3".to_string(),
    ))?;
    store.save_piece(
        &Piece::new("VIGA-V1".to_string(), "Viga V1 6m".to_string(), "un".to_string())
            .with_technical(Decimal::new(18, 1), Decimal::new(75, 2), Decimal::from(95)),
    )?;

    let today = date(2024, 3, 10)?;
    let engine = PricingEngine::new(store, PricingConfig::new(), Arc::new(FixedClock::on(today)))?;

    engine.replace_formula(
        "VIGA-V1",
        vec![
            FormulaLine::new("VIGA-V1".to_string(), "ACERO-12".to_string(), Decimal::from(95))
                .with_waste_factor(Decimal::new(5, 2)),
            FormulaLine::new("VIGA-V1".to_string(), "HORM-H30".to_string(), Decimal::new(75, 2))
                .with_waste_factor(Decimal::new(2, 2)),
        ],
    )?;

    engine.set_material_price("ACERO-12", "NORTE", Decimal::new(185, 2), date(2024, 1, 1)?, "compras")?;
    engine.set_material_price("HORM-H30", "NORTE", Decimal::from(140), date(2024, 1, 1)?, "compras")?;
    engine.save_parameters(
        ProcessParameters::new("NORTE".to_string(), date(2024, 1, 1)?)
            .with_per_ton_costs(
                Decimal::from(12),
                Decimal::from(35),
                Decimal::from(20),
                Decimal::from(40),
                Decimal::from(8),
            )
            .with_labor(Decimal::from(22), Decimal::from(18), Decimal::new(35, 1)),
    )?;

    // 1 月發布，3 月鋼筋漲價後重新報價
    engine.publish_price(
        "VIGA-V1",
        "NORTE",
        &PublishRequest::new(date(2024, 1, 15)?, "ventas".to_string()),
    )?;
    engine.set_material_price("ACERO-12", "NORTE", Decimal::new(205, 2), date(2024, 3, 1)?, "compras")?;

    let quote = engine.calculate_price("VIGA-V1", "NORTE", None, true)?;
    let breakdown = &quote.breakdown;

    println!("構件 {} 區域 {}（{}）", breakdown.piece_id, breakdown.zone_id, breakdown.as_of);
    for line in &breakdown.lines {
        println!(
            "  - {:<24} {:>8} {:<3} x {:>8} = {:>10}",
            line.material_name,
            line.effective_quantity,
            line.unit,
            line.unit_price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            line.cost
        );
    }
    println!("\n物料成本:     {:>10}", breakdown.materials_cost);
    println!("製程成本:     {:>10}", breakdown.process_cost_per_ton);
    println!("混凝土人工:   {:>10}", breakdown.labor_cost_concrete);
    println!("鋼筋人工:     {:>10}", breakdown.labor_cost_steel);
    println!("合計:         {:>10}", breakdown.total);

    for warning in &breakdown.warnings {
        println!("⚠ {:?}: {}", warning.kind, warning.message);
    }

    if let Some(comparison) = &quote.comparison {
        println!(
            "\n與上次發布比較: {:?}，差額 {:?}，變動 {:?}%",
            comparison.trend, comparison.delta, comparison.delta_percent
        );
    }

    Ok(())
}
