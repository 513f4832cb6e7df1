use anyhow::Result;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, Transaction};
use std::collections::HashMap;
use std::path::Path;

use super::report::{LoadReport, LoadSummary, StoredRecord, TableInfo};
use super::schema_gen::{
    generate_create_table, generate_drop_table, generate_indexes, generate_insert, generate_select,
};
use crate::config::BatchPolicy;
use crate::error::{LoadResult, SchemaError, StorageContext, StorageError};
use crate::parser::{find_source, read_records, validate_record, ParsedRow, RawRecord, SqlValue};
use crate::schema::{get_table, TableSchema, ALL_TABLES};
use crate::ui::{Phase, SilentUi, Ui};

/// Progress is reported every this many records
const PROGRESS_INTERVAL: usize = 500;

/// Source records keyed by table name
pub type Datasets = HashMap<String, Vec<RawRecord>>;

/// The benchmark database.
///
/// Every mutating operation runs in its own transaction, which rolls back
/// when an error drops it before commit.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)
            .storage(|| format!("opening {:?}", db_path))?;
        Self::configure(conn)
    }

    /// Open an existing database without creating or writing it
    pub fn open_read_only(db_path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .storage(|| format!("opening {:?} read-only", db_path))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().storage(|| "opening in-memory database".into())?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;",
        )
        .storage(|| "configuring connection".into())?;

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Drop and recreate all five tables with their indexes
    pub fn reset_schema(&mut self) -> LoadResult<()> {
        self.reset_tables(ALL_TABLES)
    }

    /// Drop and recreate the given tables in one transaction
    pub fn reset_tables(&mut self, tables: &[&TableSchema]) -> LoadResult<()> {
        let tx = self
            .conn
            .transaction()
            .storage(|| "starting schema reset".into())?;

        for schema in tables {
            reset_in_tx(&tx, schema)?;
        }

        tx.commit().storage(|| "committing schema reset".into())?;
        Ok(())
    }

    /// Validate and append records to a table
    pub fn load_table(
        &mut self,
        table_name: &str,
        records: &[RawRecord],
        policy: BatchPolicy,
    ) -> LoadResult<LoadReport> {
        self.load_table_with_ui(table_name, records, policy, &mut SilentUi)
    }

    pub fn load_table_with_ui<U: Ui>(
        &mut self,
        table_name: &str,
        records: &[RawRecord],
        policy: BatchPolicy,
        ui: &mut U,
    ) -> LoadResult<LoadReport> {
        let schema = lookup(table_name)?;
        let tx = self
            .conn
            .transaction()
            .storage(|| format!("starting load of {}", schema.name))?;

        let report = load_in_tx(&tx, schema, records, policy, ui)?;

        tx.commit()
            .storage(|| format!("committing load of {}", schema.name))?;
        Ok(report)
    }

    /// Replace a table's contents: drop, recreate and load in one transaction
    pub fn reload_table(
        &mut self,
        table_name: &str,
        records: &[RawRecord],
        policy: BatchPolicy,
    ) -> LoadResult<LoadReport> {
        let schema = lookup(table_name)?;
        let tx = self
            .conn
            .transaction()
            .storage(|| format!("starting reload of {}", schema.name))?;

        reset_in_tx(&tx, schema)?;
        let report = load_in_tx(&tx, schema, records, policy, &mut SilentUi)?;

        tx.commit()
            .storage(|| format!("committing reload of {}", schema.name))?;
        Ok(report)
    }

    /// Load every dataset, one transaction per table, in fixed table order.
    ///
    /// Unknown table names are rejected before anything is written. A failing
    /// table leaves the tables before it loaded and the tables after it untouched.
    pub fn load_all<U: Ui>(
        &mut self,
        datasets: &Datasets,
        policy: BatchPolicy,
        ui: &mut U,
    ) -> LoadResult<LoadSummary> {
        for name in datasets.keys() {
            lookup(name)?;
        }

        ui.set_phase(Phase::Loading);
        let mut summary = LoadSummary::default();

        for schema in ALL_TABLES {
            let Some(records) = datasets.get(schema.name) else {
                summary.skipped.push(schema.name);
                continue;
            };

            if ui.should_stop() {
                ui.warn(format!("Stopped before loading {}", schema.name));
                summary.stopped = true;
                break;
            }

            ui.set_info(format!("{} ({} records, policy {})", schema.name, records.len(), policy));
            let report = self.load_table_with_ui(schema.name, records, policy, ui)?;
            ui.log(format!(
                "{}: {} records loaded, {} rejected",
                schema.name,
                report.inserted,
                report.rejected.len()
            ));
            summary.reports.push(report);
        }

        ui.clear_progress();
        Ok(summary)
    }

    pub fn get_record(&self, table_name: &str, id: i64) -> LoadResult<Option<StoredRecord>> {
        let schema = lookup(table_name)?;
        let sql = format!("{} WHERE id = ?1", generate_select(schema));

        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .storage(|| format!("reading {} record {}", schema.name, id))?;
        let mut rows = stmt
            .query_map([id], |row| read_row(row, schema))
            .storage(|| format!("reading {} record {}", schema.name, id))?;

        let record = rows
            .next()
            .transpose()
            .storage(|| format!("reading {} record {}", schema.name, id))?;
        Ok(record)
    }

    /// All records whose `column` equals `value`, in identifier order
    pub fn find_by(
        &self,
        table_name: &str,
        column: &str,
        value: &SqlValue,
    ) -> LoadResult<Vec<StoredRecord>> {
        let schema = lookup(table_name)?;
        if schema.column(column).is_none() {
            return Err(SchemaError::UnknownColumn {
                table: schema.name.to_string(),
                column: column.to_string(),
            }
            .into());
        }

        let sql = format!(
            "{} WHERE \"{}\" = ?1 ORDER BY id",
            generate_select(schema),
            column
        );
        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .storage(|| format!("querying {}.{}", schema.name, column))?;
        let records = stmt
            .query_map([value], |row| read_row(row, schema))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .storage(|| format!("querying {}.{}", schema.name, column))?;

        Ok(records)
    }

    pub fn count(&self, table_name: &str) -> LoadResult<u64> {
        let schema = lookup(table_name)?;
        let sql = format!("SELECT COUNT(*) FROM {}", schema.name);
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .storage(|| format!("counting {}", schema.name))?;
        Ok(count as u64)
    }

    pub fn table_exists(&self, table_name: &str) -> LoadResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table_name],
                |row| row.get(0),
            )
            .storage(|| format!("looking up table {}", table_name))?;
        Ok(count > 0)
    }

    /// Describe every table that exists: columns, indexes, row count, first row
    pub fn inspect(&self) -> LoadResult<Vec<TableInfo>> {
        let mut infos = Vec::new();

        for schema in ALL_TABLES {
            if !self.table_exists(schema.name)? {
                continue;
            }

            let columns = self
                .pragma_rows(&format!("PRAGMA table_info({})", schema.name), |row| {
                    Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
                })
                .storage(|| format!("reading columns of {}", schema.name))?;

            let mut indexes = self
                .pragma_rows(&format!("PRAGMA index_list({})", schema.name), |row| {
                    row.get::<_, String>(1)
                })
                .storage(|| format!("reading indexes of {}", schema.name))?;
            indexes.sort();

            let sample = self
                .conn
                .query_row(
                    &format!("{} ORDER BY id LIMIT 1", generate_select(schema)),
                    [],
                    |row| read_row(row, schema),
                )
                .optional()
                .storage(|| format!("sampling {}", schema.name))?;

            infos.push(TableInfo {
                name: schema.name,
                columns,
                indexes,
                row_count: self.count(schema.name)?,
                sample,
            });
        }

        Ok(infos)
    }

    fn pragma_rows<T, F>(&self, sql: &str, f: F) -> rusqlite::Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], f)?;
        rows.collect()
    }

    /// Finalize the database
    pub fn finalize(self) -> Result<(), StorageError> {
        self.conn
            .execute_batch("PRAGMA optimize;")
            .storage(|| "optimizing database".into())
    }
}

fn lookup(table_name: &str) -> Result<&'static TableSchema, SchemaError> {
    get_table(table_name).ok_or_else(|| SchemaError::UnknownTable(table_name.to_string()))
}

fn reset_in_tx(tx: &Transaction, schema: &TableSchema) -> Result<(), SchemaError> {
    let statements = std::iter::once(generate_drop_table(schema))
        .chain(std::iter::once(generate_create_table(schema)))
        .chain(generate_indexes(schema));

    for sql in statements {
        log::debug!("{}", sql);
        tx.execute_batch(&sql)
            .map_err(|source| SchemaError::Ddl {
                statement: sql.clone(),
                source,
            })?;
    }

    Ok(())
}

fn load_in_tx<U: Ui>(
    tx: &Transaction,
    schema: &'static TableSchema,
    records: &[RawRecord],
    policy: BatchPolicy,
    ui: &mut U,
) -> LoadResult<LoadReport> {
    let insert_sql = generate_insert(schema);
    log::debug!("{}", insert_sql);

    let total = records.len() as u64;
    let mut report = LoadReport::new(schema.name);
    let mut stmt = tx
        .prepare_cached(&insert_sql)
        .storage(|| format!("preparing insert into {}", schema.name))?;

    for (index, record) in records.iter().enumerate() {
        match validate_record(record, schema, index) {
            Ok(row) => {
                insert_row(&mut stmt, &row)
                    .storage(|| format!("inserting {} record {}", schema.name, index))?;
                report.record_insert(tx.last_insert_rowid());
            }
            Err(err) => match policy {
                BatchPolicy::Abort => {
                    ui.warn(format!("{}; rolling back {}", err, schema.name));
                    return Err(err.into());
                }
                BatchPolicy::Skip => {
                    ui.warn(format!("Skipped {}", err));
                    report.rejected.push(err);
                }
            },
        }

        if (index + 1) % PROGRESS_INTERVAL == 0 {
            ui.set_progress(index as u64 + 1, total, schema.name);
        }
    }

    ui.set_progress(total, total, schema.name);
    log::debug!(
        "{}: ids {:?}..={:?}",
        schema.name,
        report.first_id,
        report.last_id
    );

    Ok(report)
}

/// Insert one validated row
fn insert_row(stmt: &mut rusqlite::Statement, row: &ParsedRow) -> rusqlite::Result<()> {
    for (idx, value) in row.values.iter().enumerate() {
        value.bind_to(idx + 1, stmt)?;
    }
    stmt.raw_execute()?;
    Ok(())
}

fn read_row(row: &Row<'_>, schema: &'static TableSchema) -> rusqlite::Result<StoredRecord> {
    let id: i64 = row.get(0)?;
    let mut values = Vec::with_capacity(schema.columns.len());
    for idx in 0..schema.columns.len() {
        values.push(SqlValue::from_value_ref(row.get_ref(idx + 1)?));
    }

    Ok(StoredRecord { id, schema, values })
}

/// Read every table's source file from `input_dir` and load it into `db_path`.
///
/// With `reset`, the selected tables are dropped and recreated first (all five
/// tables through `reset_schema` when no filter applies); otherwise records
/// are appended.
pub fn load_directory<U: Ui>(
    input_dir: &Path,
    db_path: &Path,
    tables: &[&'static TableSchema],
    policy: BatchPolicy,
    reset: bool,
    ui: &mut U,
) -> Result<LoadSummary> {
    ui.set_phase(Phase::Reading);
    let mut datasets = Datasets::new();

    for schema in tables {
        match find_source(input_dir, schema) {
            Some(path) => {
                let records = read_records(&path)?;
                ui.log(format!("{}: {} records in {:?}", schema.name, records.len(), path));
                datasets.insert(schema.name.to_string(), records);
            }
            None => ui.log(format!("{}: skipped (no source file)", schema.name)),
        }
    }

    let mut store = SqliteStore::open(db_path)?;

    if reset {
        ui.set_phase(Phase::Resetting);
        if tables.len() == ALL_TABLES.len() {
            store.reset_schema()?;
        } else {
            store.reset_tables(tables)?;
        }
        ui.log(format!("Reset {} tables", tables.len()));
    }

    let summary = store.load_all(&datasets, policy, ui)?;
    store.finalize()?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureReason, LoadError};
    use serde_json::{json, Value};

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn production(district: &str, crop: &str, yield_: f64) -> RawRecord {
        record(json!({"district": district, "crop": crop, "yield": yield_, "season": "2021/22"}))
    }

    fn fresh_store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.reset_schema().unwrap();
        store
    }

    #[test]
    fn test_reset_creates_empty_tables() {
        let store = fresh_store();
        for schema in ALL_TABLES {
            assert!(store.table_exists(schema.name).unwrap());
            assert_eq!(store.count(schema.name).unwrap(), 0);
        }
    }

    #[test]
    fn test_load_assigns_sequential_ids() {
        let mut store = fresh_store();
        let records = vec![
            production("Lilongwe", "Maize", 2.4),
            production("Kasungu", "Tobacco", 1.1),
            production("Zomba", "Rice", 3.0),
        ];

        let report = store.load_table("production", &records, BatchPolicy::Abort).unwrap();
        assert_eq!(report.inserted, 3);
        assert_eq!(report.first_id, Some(1));
        assert_eq!(report.last_id, Some(3));

        let more = store
            .load_table("production", &[production("Dedza", "Potato", 8.2)], BatchPolicy::Abort)
            .unwrap();
        assert_eq!(more.first_id, Some(4));
    }

    #[test]
    fn test_abort_rolls_back_table() {
        let mut store = fresh_store();
        let records = vec![
            production("Lilongwe", "Maize", 2.4),
            record(json!({"district": "Mchinji", "yield": 1.0, "season": "2021/22"})),
        ];

        let err = store.load_table("production", &records, BatchPolicy::Abort).unwrap_err();
        match err {
            LoadError::Validation(v) => {
                assert_eq!(v.record_index, 1);
                assert_eq!(v.field, "crop");
                assert_eq!(v.reason, FailureReason::Missing);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(store.count("production").unwrap(), 0);
    }

    #[test]
    fn test_skip_keeps_valid_records() {
        let mut store = fresh_store();
        let records = vec![
            production("Lilongwe", "Maize", 2.4),
            record(json!({"district": "Mchinji", "crop": "Maize", "yield": "abc", "season": "2021/22"})),
            production("Ntcheu", "Beans", 0.7),
        ];

        let report = store.load_table("production", &records, BatchPolicy::Skip).unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].field, "yield");
        assert_eq!(report.rejected[0].reason, FailureReason::NotANumber);
        assert_eq!(report.last_id, Some(2));
        assert_eq!(store.count("production").unwrap(), 2);
    }

    #[test]
    fn test_unknown_table() {
        let mut store = fresh_store();
        let err = store.load_table("average_prices", &[], BatchPolicy::Abort).unwrap_err();
        assert!(matches!(err, LoadError::Schema(SchemaError::UnknownTable(ref t)) if t == "average_prices"));
    }

    #[test]
    fn test_find_by_unknown_column() {
        let store = fresh_store();
        let err = store
            .find_by("population", "district", &SqlValue::Text("Lilongwe".into()))
            .unwrap_err();
        assert!(matches!(err, LoadError::Schema(SchemaError::UnknownColumn { .. })));
    }

    #[test]
    fn test_get_missing_record() {
        let store = fresh_store();
        assert!(store.get_record("food_insecurity", 1).unwrap().is_none());
    }

    #[test]
    fn test_reload_restarts_ids() {
        let mut store = fresh_store();
        store
            .load_table(
                "production",
                &[production("Lilongwe", "Maize", 2.4), production("Dowa", "Maize", 1.9)],
                BatchPolicy::Abort,
            )
            .unwrap();

        let report = store
            .reload_table("production", &[production("Salima", "Cassava", 12.5)], BatchPolicy::Abort)
            .unwrap();

        assert_eq!(report.first_id, Some(1));
        assert_eq!(store.count("production").unwrap(), 1);
    }

    #[test]
    fn test_failed_reload_keeps_old_rows() {
        let mut store = fresh_store();
        store
            .load_table("production", &[production("Lilongwe", "Maize", 2.4)], BatchPolicy::Abort)
            .unwrap();

        let bad = record(json!({"district": "Salima", "crop": "Cassava", "season": "2021/22"}));
        assert!(store.reload_table("production", &[bad], BatchPolicy::Abort).is_err());

        assert_eq!(store.count("production").unwrap(), 1);
    }

    #[test]
    fn test_load_all_rejects_unknown_dataset_first() {
        let mut store = fresh_store();
        let mut datasets = Datasets::new();
        datasets.insert("production".into(), vec![production("Lilongwe", "Maize", 2.4)]);
        datasets.insert("weather".into(), vec![]);

        assert!(store.load_all(&datasets, BatchPolicy::Abort, &mut SilentUi).is_err());
        assert_eq!(store.count("production").unwrap(), 0);
    }

    #[test]
    fn test_inspect_reports_indexes() {
        let mut store = fresh_store();
        store
            .load_table("production", &[production("Lilongwe", "Maize", 2.4)], BatchPolicy::Abort)
            .unwrap();

        let infos = store.inspect().unwrap();
        assert_eq!(infos.len(), ALL_TABLES.len());

        let info = &infos[0];
        assert_eq!(info.name, "production");
        assert_eq!(info.row_count, 1);
        assert_eq!(info.columns[0], ("id".to_string(), "INTEGER".to_string()));
        assert_eq!(
            info.indexes,
            vec!["idx_production_crop", "idx_production_district", "idx_production_season"]
        );
        assert_eq!(
            info.sample.as_ref().and_then(|r| r.get("crop")),
            Some(&SqlValue::Text("Maize".into()))
        );
        assert!(infos[1].sample.is_none());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut store = fresh_store();
        let records = vec![
            production("Lilongwe", "Maize", 2.4),
            production("Kasungu", "Tobacco", 1.1),
            production("Zomba", "Rice", 3.0),
        ];
        store.load_table("production", &records, BatchPolicy::Abort).unwrap();

        store
            .connection()
            .execute("DELETE FROM production WHERE id = 3", [])
            .unwrap();

        let report = store
            .load_table("production", &[production("Dedza", "Potato", 8.2)], BatchPolicy::Abort)
            .unwrap();
        assert_eq!(report.first_id, Some(4));
    }

    #[test]
    fn test_ids_continue_after_aborted_load() {
        let mut store = fresh_store();
        store
            .load_table(
                "production",
                &[production("Lilongwe", "Maize", 2.4), production("Dowa", "Maize", 1.9)],
                BatchPolicy::Abort,
            )
            .unwrap();

        let aborted = vec![
            production("Mzimba", "Maize", 2.0),
            record(json!({"district": "Mchinji", "crop": "Maize", "yield": "n/a", "season": "2021/22"})),
        ];
        assert!(store.load_table("production", &aborted, BatchPolicy::Abort).is_err());

        let report = store
            .load_table("production", &[production("Balaka", "Cotton", 0.9)], BatchPolicy::Abort)
            .unwrap();
        assert_eq!(report.first_id, Some(3));
        assert_eq!(store.count("production").unwrap(), 3);
    }

    #[test]
    fn test_storage_failure_rolls_back_table() {
        let mut store = fresh_store();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_third BEFORE INSERT ON production
                 WHEN (SELECT COUNT(*) FROM production) >= 2
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let records = vec![
            production("Lilongwe", "Maize", 2.4),
            production("Kasungu", "Tobacco", 1.1),
            production("Zomba", "Rice", 3.0),
        ];
        let err = store.load_table("production", &records, BatchPolicy::Skip).unwrap_err();

        match err {
            LoadError::Storage(e) => assert_eq!(e.operation, "inserting production record 2"),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(store.count("production").unwrap(), 0);
    }

    #[test]
    fn test_load_into_missing_table_is_storage_error() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .load_table("production", &[production("Lilongwe", "Maize", 2.4)], BatchPolicy::Abort)
            .unwrap_err();
        assert!(matches!(err, LoadError::Storage(_)));
        assert!(!store.table_exists("production").unwrap());
    }

    #[test]
    fn test_read_only_open_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.db");

        assert!(SqliteStore::open_read_only(&missing).is_err());
        assert!(!missing.exists());
    }
}
