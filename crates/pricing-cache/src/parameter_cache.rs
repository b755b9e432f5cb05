//! 製程參數讀取快取

use chrono::NaiveDate;
use pricing_core::period::month_start;
use pricing_core::{ProcessParameterSource, ProcessParameterWriter, ProcessParameters};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::dirty_tracking::DirtyTracker;

type CacheKey = (String, NaiveDate);

/// 快取命中統計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// 讀穿式製程參數快取
///
/// 以 (zone, month) 為鍵保存查詢結果（含「無參數」）。
/// 區域失效時立即清除該區域的項目並遞增世代號；
/// 載入期間世代號改變的結果不寫入快取。
/// 鎖的取得順序固定為 `entries` → `dirty`。鎖中毒時直接讀取底層來源。
pub struct CachedParameterSource {
    inner: Arc<dyn ProcessParameterSource>,
    entries: RwLock<HashMap<CacheKey, Option<ProcessParameters>>>,
    dirty: Mutex<DirtyTracker>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedParameterSource {
    pub fn new(inner: Arc<dyn ProcessParameterSource>) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            dirty: Mutex::new(DirtyTracker::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// 使區域的快取項目失效
    pub fn invalidate_zone(&self, zone_id: &str) {
        let mut entries = self.entries.write();
        let generation = self.dirty.lock().map(|mut dirty| dirty.mark_dirty(zone_id));
        match entries.as_mut() {
            Ok(entries) => entries.retain(|(zone, _), _| zone.as_str() != zone_id),
            Err(_) => tracing::warn!("製程參數快取鎖中毒，無法清除區域 {}", zone_id),
        }
        tracing::debug!("製程參數快取：區域 {} 失效（世代 {:?}）", zone_id, generation.ok());
    }

    /// 清除全部快取
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn generation(&self, zone_id: &str) -> Option<u64> {
        self.dirty.lock().ok().map(|dirty| dirty.generation(zone_id))
    }
}

impl ProcessParameterSource for CachedParameterSource {
    fn latest_parameters(
        &self,
        zone_id: &str,
        month: NaiveDate,
    ) -> pricing_core::Result<Option<ProcessParameters>> {
        let key = (zone_id.to_string(), month_start(month));
        if let Ok(entries) = self.entries.read() {
            if let Some(cached) = entries.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(cached.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let loaded_at = self.generation(zone_id);
        let loaded = self.inner.latest_parameters(zone_id, month)?;

        match self.entries.write() {
            Ok(mut entries) => {
                if loaded_at.is_some() && self.generation(zone_id) == loaded_at {
                    entries.insert(key, loaded.clone());
                } else {
                    tracing::debug!("製程參數快取：區域 {} 載入期間已變更，略過寫入", zone_id);
                }
            }
            Err(_) => tracing::warn!("製程參數快取鎖中毒，略過寫入"),
        }
        Ok(loaded)
    }
}

/// 寫入後使快取失效的製程參數寫入器
pub struct InvalidatingParameterWriter {
    inner: Arc<dyn ProcessParameterWriter>,
    cache: Arc<CachedParameterSource>,
}

impl InvalidatingParameterWriter {
    pub fn new(inner: Arc<dyn ProcessParameterWriter>, cache: Arc<CachedParameterSource>) -> Self {
        Self { inner, cache }
    }
}

impl ProcessParameterWriter for InvalidatingParameterWriter {
    fn save_parameters(&self, params: &ProcessParameters) -> pricing_core::Result<()> {
        self.inner.save_parameters(params)?;
        self.cache.invalidate_zone(&params.zone_id);
        Ok(())
    }
}
