//! 測試替身：記憶體內資料來源

use chrono::{NaiveDate, NaiveDateTime};
use pricing_core::{
    plan_supersede, FormulaLine, FormulaSource, FormulaWriter, Material, MaterialPlantPrice,
    MaterialPriceSource, MaterialPriceWriter, Piece, PieceCatalog, PiecePrice, PiecePriceSource,
    PiecePriceWriter, PricingError, ProcessParameterSource, ProcessParameterWriter,
    ProcessParameters, Result, Supersede, Zone,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    pieces: HashMap<String, Piece>,
    materials: HashMap<String, Material>,
    zones: HashMap<String, Zone>,
    formulas: HashMap<String, Vec<FormulaLine>>,
    material_prices: Vec<MaterialPlantPrice>,
    parameters: Vec<ProcessParameters>,
    piece_prices: Vec<PiecePrice>,
}

/// 記憶體內資料來源（實作全部資料存取介面）
#[derive(Default)]
pub struct InMemoryData {
    state: Mutex<State>,
    /// 價格查詢次數
    pub price_reads: AtomicUsize,
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn ts(y: i32, m: u32, day: u32) -> NaiveDateTime {
    d(y, m, day).and_hms_opt(0, 0, 0).unwrap()
}

impl InMemoryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_piece(self, piece: Piece) -> Self {
        self.state.lock().unwrap().pieces.insert(piece.id.clone(), piece);
        self
    }

    pub fn with_material(self, material: Material) -> Self {
        self.state
            .lock()
            .unwrap()
            .materials
            .insert(material.id.clone(), material);
        self
    }

    pub fn with_zone(self, zone_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .zones
            .insert(zone_id.to_string(), Zone::new(zone_id.to_string(), zone_id.to_string()));
        self
    }

    pub fn with_formula_line(self, line: FormulaLine) -> Self {
        self.state
            .lock()
            .unwrap()
            .formulas
            .entry(line.piece_id.clone())
            .or_default()
            .push(line);
        self
    }

    pub fn with_price(self, price: MaterialPlantPrice) -> Self {
        self.state.lock().unwrap().material_prices.push(price);
        self
    }

    pub fn with_parameters(self, params: ProcessParameters) -> Self {
        self.state.lock().unwrap().parameters.push(params);
        self
    }

    pub fn with_piece_price(self, price: PiecePrice) -> Self {
        self.state.lock().unwrap().piece_prices.push(price);
        self
    }

    pub fn all_piece_prices(&self) -> Vec<PiecePrice> {
        self.state.lock().unwrap().piece_prices.clone()
    }

    pub fn all_material_prices(&self) -> Vec<MaterialPlantPrice> {
        self.state.lock().unwrap().material_prices.clone()
    }
}

/// 標準測試資料：構件 P1 使用鋼筋 10 kg/un，損耗 5%，Z1 鋼筋 $2/kg
pub fn steel_fixture() -> InMemoryData {
    InMemoryData::new()
        .with_piece(Piece::new("P1".to_string(), "Panel".to_string(), "un".to_string()))
        .with_material(Material::new("STEEL".to_string(), "Acero".to_string(), "kg".to_string()))
        .with_zone("Z1")
        .with_zone("Z2")
        .with_formula_line(
            FormulaLine::new("P1".to_string(), "STEEL".to_string(), Decimal::from(10))
                .with_waste_factor(Decimal::new(5, 2)),
        )
        .with_price(MaterialPlantPrice::new(
            "STEEL".to_string(),
            "Z1".to_string(),
            Decimal::from(2),
            d(2024, 1, 1),
            ts(2024, 1, 1),
        ))
        .with_parameters(ProcessParameters::new("Z1".to_string(), d(2024, 1, 1)))
        .with_parameters(ProcessParameters::new("Z2".to_string(), d(2024, 1, 1)))
}

impl PieceCatalog for InMemoryData {
    fn piece(&self, piece_id: &str) -> Result<Option<Piece>> {
        Ok(self.state.lock().unwrap().pieces.get(piece_id).cloned())
    }

    fn material(&self, material_id: &str) -> Result<Option<Material>> {
        Ok(self.state.lock().unwrap().materials.get(material_id).cloned())
    }

    fn zone(&self, zone_id: &str) -> Result<Option<Zone>> {
        Ok(self.state.lock().unwrap().zones.get(zone_id).cloned())
    }
}

impl FormulaSource for InMemoryData {
    fn formula_lines(&self, piece_id: &str) -> Result<Vec<FormulaLine>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .formulas
            .get(piece_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl FormulaWriter for InMemoryData {
    fn replace_formula(&self, piece_id: &str, lines: &[FormulaLine]) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .formulas
            .insert(piece_id.to_string(), lines.to_vec());
        Ok(())
    }
}

impl MaterialPriceSource for InMemoryData {
    fn material_prices(&self, material_id: &str, zone_id: &str) -> Result<Vec<MaterialPlantPrice>> {
        self.price_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .lock()
            .unwrap()
            .material_prices
            .iter()
            .filter(|p| p.material_id == material_id && p.zone_id == zone_id)
            .cloned()
            .collect())
    }
}

impl MaterialPriceWriter for InMemoryData {
    fn append_material_price(&self, price: &MaterialPlantPrice) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let indices: Vec<usize> = state
            .material_prices
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                p.is_active && p.material_id == price.material_id && p.zone_id == price.zone_id
            })
            .map(|(i, _)| i)
            .collect();
        let rows: Vec<MaterialPlantPrice> = indices
            .iter()
            .map(|&i| state.material_prices[i].clone())
            .collect();

        match plan_supersede(&rows, price.valid_from) {
            Supersede::Duplicate(_) => Err(PricingError::conflict("duplicate valid_from")),
            Supersede::Apply { close, new_end } => {
                if let Some((idx, until)) = close {
                    state.material_prices[indices[idx]].valid_until = Some(until);
                }
                let mut new_price = price.clone();
                new_price.valid_until = new_end;
                state.material_prices.push(new_price);
                Ok(())
            }
        }
    }
}

impl ProcessParameterSource for InMemoryData {
    fn latest_parameters(
        &self,
        zone_id: &str,
        month: NaiveDate,
    ) -> Result<Option<ProcessParameters>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .parameters
            .iter()
            .filter(|p| p.zone_id == zone_id && p.month <= month)
            .max_by_key(|p| p.month)
            .cloned())
    }
}

impl ProcessParameterWriter for InMemoryData {
    fn save_parameters(&self, params: &ProcessParameters) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .parameters
            .retain(|p| !(p.zone_id == params.zone_id && p.month == params.month));
        state.parameters.push(params.clone());
        Ok(())
    }
}

impl PiecePriceSource for InMemoryData {
    fn piece_prices(&self, piece_id: &str, zone_id: &str) -> Result<Vec<PiecePrice>> {
        let mut prices: Vec<PiecePrice> = self
            .state
            .lock()
            .unwrap()
            .piece_prices
            .iter()
            .filter(|p| p.piece_id == piece_id && p.zone_id == zone_id)
            .cloned()
            .collect();
        prices.sort_by(|a, b| b.effective_date.cmp(&a.effective_date));
        Ok(prices)
    }
}

impl PiecePriceWriter for InMemoryData {
    fn insert_piece_price(&self, price: &PiecePrice) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let indices: Vec<usize> = state
            .piece_prices
            .iter()
            .enumerate()
            .filter(|(_, p)| p.piece_id == price.piece_id && p.zone_id == price.zone_id)
            .map(|(i, _)| i)
            .collect();
        let rows: Vec<PiecePrice> = indices.iter().map(|&i| state.piece_prices[i].clone()).collect();

        match plan_supersede(&rows, price.effective_date) {
            Supersede::Duplicate(idx) => Err(PricingError::Conflict {
                message: "duplicate effective_date".to_string(),
                existing: Some(Box::new(rows[idx].clone())),
            }),
            Supersede::Apply { close, new_end } => {
                if let Some((idx, expiry)) = close {
                    state.piece_prices[indices[idx]].expiry_date = Some(expiry);
                }
                let mut new_price = price.clone();
                new_price.expiry_date = new_end;
                state.piece_prices.push(new_price);
                Ok(())
            }
        }
    }
}
