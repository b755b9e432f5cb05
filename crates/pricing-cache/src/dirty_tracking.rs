//! 髒標記追蹤

use std::collections::HashMap;

/// 髒標記追蹤器（以區域為單位）
///
/// 每個區域保存一個世代號，每次標記髒時遞增。
/// 讀取方在載入前記下世代號，寫入快取前比對，不一致即表示載入期間有寫入。
#[derive(Debug, Default)]
pub struct DirtyTracker {
    generations: HashMap<String, u64>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記區域參數已變更，回傳新的世代號
    pub fn mark_dirty(&mut self, zone_id: &str) -> u64 {
        let generation = self.generations.entry(zone_id.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    /// 區域目前的世代號（從未標記過為 0）
    pub fn generation(&self, zone_id: &str) -> u64 {
        self.generations.get(zone_id).copied().unwrap_or(0)
    }
}
