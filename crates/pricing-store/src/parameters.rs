//! 製程參數（process_parameters）

use chrono::NaiveDate;
use pricing_core::period::month_start;
use pricing_core::{PricingError, ProcessParameterSource, ProcessParameterWriter, ProcessParameters};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::decimal_at;
use crate::{SqliteStore, StoreResult};

fn map_parameters(row: &Row<'_>) -> rusqlite::Result<ProcessParameters> {
    Ok(ProcessParameters {
        zone_id: row.get(0)?,
        month: row.get(1)?,
        curing_energy_per_tn: decimal_at(row, 2)?,
        factory_overhead_per_tn: decimal_at(row, 3)?,
        company_overhead_per_tn: decimal_at(row, 4)?,
        profit_per_tn: decimal_at(row, 5)?,
        engineering_per_tn: decimal_at(row, 6)?,
        hourly_labor_rate: decimal_at(row, 7)?,
        labor_hours_per_tn_steel: decimal_at(row, 8)?,
        labor_hours_per_m3_concrete: decimal_at(row, 9)?,
    })
}

impl SqliteStore {
    fn find_latest_parameters(
        &self,
        zone_id: &str,
        month: NaiveDate,
    ) -> StoreResult<Option<ProcessParameters>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT zone_id, month, curing_energy_per_tn, factory_overhead_per_tn,
                        company_overhead_per_tn, profit_per_tn, engineering_per_tn,
                        hourly_labor_rate, labor_hours_per_tn_steel, labor_hours_per_m3_concrete
                 FROM process_parameters
                 WHERE zone_id = ?1 AND month <= ?2
                 ORDER BY month DESC
                 LIMIT 1",
                params![zone_id, month_start(month)],
                map_parameters,
            )
            .optional()?)
    }

    fn upsert_parameters(&self, p: &ProcessParameters) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO process_parameters
                (zone_id, month, curing_energy_per_tn, factory_overhead_per_tn,
                 company_overhead_per_tn, profit_per_tn, engineering_per_tn,
                 hourly_labor_rate, labor_hours_per_tn_steel, labor_hours_per_m3_concrete)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(zone_id, month) DO UPDATE SET
                curing_energy_per_tn = excluded.curing_energy_per_tn,
                factory_overhead_per_tn = excluded.factory_overhead_per_tn,
                company_overhead_per_tn = excluded.company_overhead_per_tn,
                profit_per_tn = excluded.profit_per_tn,
                engineering_per_tn = excluded.engineering_per_tn,
                hourly_labor_rate = excluded.hourly_labor_rate,
                labor_hours_per_tn_steel = excluded.labor_hours_per_tn_steel,
                labor_hours_per_m3_concrete = excluded.labor_hours_per_m3_concrete",
            params![
                p.zone_id,
                month_start(p.month),
                p.curing_energy_per_tn.to_string(),
                p.factory_overhead_per_tn.to_string(),
                p.company_overhead_per_tn.to_string(),
                p.profit_per_tn.to_string(),
                p.engineering_per_tn.to_string(),
                p.hourly_labor_rate.to_string(),
                p.labor_hours_per_tn_steel.to_string(),
                p.labor_hours_per_m3_concrete.to_string(),
            ],
        )?;
        Ok(())
    }
}

impl ProcessParameterSource for SqliteStore {
    fn latest_parameters(
        &self,
        zone_id: &str,
        month: NaiveDate,
    ) -> pricing_core::Result<Option<ProcessParameters>> {
        self.find_latest_parameters(zone_id, month)
            .map_err(PricingError::from)
    }
}

impl ProcessParameterWriter for SqliteStore {
    fn save_parameters(&self, params: &ProcessParameters) -> pricing_core::Result<()> {
        self.upsert_parameters(params).map_err(PricingError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{d, seeded_store};
    use rust_decimal::Decimal;

    fn params_for(month: NaiveDate, rate: i64) -> ProcessParameters {
        ProcessParameters::new("Z1".to_string(), month).with_labor(
            Decimal::from(rate),
            Decimal::from(30),
            Decimal::new(15, 1),
        )
    }

    #[test]
    fn test_latest_not_after_month() {
        let store = seeded_store();
        store.save_parameters(&params_for(d(2024, 1, 1), 10)).unwrap();
        store.save_parameters(&params_for(d(2024, 3, 1), 12)).unwrap();

        let feb = store.latest_parameters("Z1", d(2024, 2, 15)).unwrap().unwrap();
        assert_eq!(feb.month, d(2024, 1, 1));
        assert_eq!(feb.hourly_labor_rate, Decimal::from(10));

        let mar = store.latest_parameters("Z1", d(2024, 3, 31)).unwrap().unwrap();
        assert_eq!(mar.month, d(2024, 3, 1));

        assert!(store.latest_parameters("Z1", d(2023, 12, 31)).unwrap().is_none());
    }

    #[test]
    fn test_upsert_same_month() {
        let store = seeded_store();
        store.save_parameters(&params_for(d(2024, 1, 1), 10)).unwrap();
        store.save_parameters(&params_for(d(2024, 1, 20), 11)).unwrap();

        let p = store.latest_parameters("Z1", d(2024, 1, 31)).unwrap().unwrap();
        assert_eq!(p.hourly_labor_rate, Decimal::from(11));
        assert_eq!(p.labor_hours_per_m3_concrete, Decimal::new(15, 1));
    }
}
