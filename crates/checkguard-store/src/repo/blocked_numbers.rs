use crate::db::SqlitePool;
use crate::error::{Result, StoreError};
use checkguard_core::domain::{BlockedRecord, BlockedSummary, CheckAmount, PhoneNumber, RecordId};
use checkguard_core::rules::BlockReport;
use checkguard_core::time::{format_date, incident_date, parse_date};
use rusqlite::params;

// One statement so two reports for the same number can never produce two
// rows: the second writer waits on the write lock, then takes the UPDATE arm.
const UPSERT_SQL: &str = "INSERT INTO blocked_numbers
    (phone_number, reason, store_location, incident_date, check_amount_cents, notes, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
    ON CONFLICT(phone_number) DO UPDATE SET
        reason = excluded.reason,
        store_location = excluded.store_location,
        incident_date = excluded.incident_date,
        check_amount_cents = excluded.check_amount_cents,
        notes = CASE
            WHEN blocked_numbers.notes IS NULL THEN excluded.notes
            WHEN excluded.notes IS NULL THEN blocked_numbers.notes
            ELSE excluded.notes || char(10) || blocked_numbers.notes
        END,
        updated_at = excluded.updated_at
    RETURNING id, phone_number, reason, store_location, incident_date, check_amount_cents, notes, created_at, updated_at;";

const SELECT_BY_PHONE_SQL: &str = "SELECT id, phone_number, reason, store_location, incident_date, check_amount_cents, notes, created_at, updated_at
    FROM blocked_numbers WHERE phone_number = ?1;";

pub struct BlockedNumbersRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BlockedNumbersRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a record for a new number or merges the report into the
    /// existing one. Returns the row as stored after the write.
    pub fn create_or_merge(&self, now_utc: i64, report: &BlockReport) -> Result<BlockedRecord> {
        let incident = format_date(incident_date(now_utc)?);
        let amount_cents = report.check_amount.map(CheckAmount::cents);

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare_cached(UPSERT_SQL)?;
        let mut rows = stmt.query(params![
            report.phone_number.as_str(),
            report.reason,
            report.store_location,
            incident,
            amount_cents,
            report.notes,
            now_utc,
        ])?;
        let record = match rows.next()? {
            Some(row) => record_from_row(row)?,
            None => {
                return Err(StoreError::InvalidRow(format!(
                    "upsert returned no row for {}",
                    report.phone_number
                )))
            }
        };
        Ok(record)
    }

    pub fn find(&self, phone_number: &PhoneNumber) -> Result<Option<BlockedRecord>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare_cached(SELECT_BY_PHONE_SQL)?;
        let mut rows = stmt.query([phone_number.as_str()])?;
        let record = match rows.next()? {
            Some(row) => Some(record_from_row(row)?),
            None => None,
        };
        Ok(record)
    }

    pub fn get(&self, phone_number: &PhoneNumber) -> Result<BlockedRecord> {
        self.find(phone_number)?
            .ok_or_else(|| StoreError::NotFound(phone_number.to_string()))
    }

    /// Newest insert first.
    pub fn list_summaries(&self) -> Result<Vec<BlockedSummary>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, phone_number, created_at FROM blocked_numbers ORDER BY id DESC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(summary_from_row(row)?);
        }
        Ok(items)
    }

    pub fn delete(&self, phone_number: &PhoneNumber) -> Result<()> {
        let conn = self.pool.get()?;
        let deleted = conn.execute(
            "DELETE FROM blocked_numbers WHERE phone_number = ?1;",
            [phone_number.as_str()],
        )?;
        if deleted == 0 {
            return Err(StoreError::NotFound(phone_number.to_string()));
        }
        Ok(())
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM blocked_numbers;", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn phone_from_column(raw: String) -> Result<PhoneNumber> {
    PhoneNumber::new(&raw).map_err(|_| StoreError::InvalidRow(format!("phone number {raw}")))
}

fn record_from_row(row: &rusqlite::Row<'_>) -> Result<BlockedRecord> {
    let phone_number = phone_from_column(row.get(1)?)?;
    let incident_raw: String = row.get(4)?;
    let incident_date = parse_date(&incident_raw)
        .map_err(|_| StoreError::InvalidRow(format!("incident date {incident_raw}")))?;
    let amount_cents: Option<i64> = row.get(5)?;
    let check_amount = amount_cents
        .map(|cents| {
            CheckAmount::from_cents(cents)
                .map_err(|_| StoreError::InvalidRow(format!("check amount {cents}")))
        })
        .transpose()?;

    Ok(BlockedRecord {
        id: RecordId(row.get(0)?),
        phone_number,
        reason: row.get(2)?,
        store_location: row.get(3)?,
        incident_date,
        check_amount,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> Result<BlockedSummary> {
    Ok(BlockedSummary {
        id: RecordId(row.get(0)?),
        phone_number: phone_from_column(row.get(1)?)?,
        created_at: row.get(2)?,
    })
}
