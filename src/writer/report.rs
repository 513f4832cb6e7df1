use crate::error::ValidationError;
use crate::parser::SqlValue;
use crate::schema::TableSchema;

/// Outcome of loading one table
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub table: &'static str,
    pub inserted: u64,
    /// Identifiers assigned to the first and last inserted records
    pub first_id: Option<i64>,
    pub last_id: Option<i64>,
    /// Records skipped under the `skip` policy
    pub rejected: Vec<ValidationError>,
}

impl LoadReport {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            inserted: 0,
            first_id: None,
            last_id: None,
            rejected: Vec::new(),
        }
    }

    pub(crate) fn record_insert(&mut self, id: i64) {
        self.inserted += 1;
        self.first_id.get_or_insert(id);
        self.last_id = Some(id);
    }
}

/// Outcome of loading several tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadSummary {
    pub reports: Vec<LoadReport>,
    /// Tables with no source records
    pub skipped: Vec<&'static str>,
    /// Set when the UI asked to stop between tables
    pub stopped: bool,
}

impl LoadSummary {
    pub fn total_inserted(&self) -> u64 {
        self.reports.iter().map(|r| r.inserted).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.reports.iter().map(|r| r.rejected.len()).sum()
    }

    pub fn report(&self, table: &str) -> Option<&LoadReport> {
        self.reports.iter().find(|r| r.table == table)
    }
}

/// A row read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: i64,
    pub schema: &'static TableSchema,
    /// Values in `schema.columns` order
    pub values: Vec<SqlValue>,
}

impl StoredRecord {
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.schema
            .columns
            .iter()
            .position(|c| c.name == column)
            .map(|i| &self.values[i])
    }
}

/// Shape and contents of one table as found in the database
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: &'static str,
    /// `(name, declared type)` pairs from `PRAGMA table_info`
    pub columns: Vec<(String, String)>,
    pub indexes: Vec<String>,
    pub row_count: u64,
    pub sample: Option<StoredRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureReason;

    #[test]
    fn test_record_insert_tracks_id_range() {
        let mut report = LoadReport::new("production");
        report.record_insert(4);
        report.record_insert(5);
        report.record_insert(6);

        assert_eq!(report.inserted, 3);
        assert_eq!(report.first_id, Some(4));
        assert_eq!(report.last_id, Some(6));
    }

    #[test]
    fn test_summary_totals() {
        let mut production = LoadReport::new("production");
        production.record_insert(1);
        let mut prices = LoadReport::new("commodity_prices");
        prices.record_insert(1);
        prices.record_insert(2);
        prices.rejected.push(ValidationError {
            table: "commodity_prices".into(),
            record_index: 2,
            field: "year".into(),
            reason: FailureReason::NotAnInteger,
            value: Some("\"2023a\"".into()),
        });

        let summary = LoadSummary {
            reports: vec![production, prices],
            ..Default::default()
        };

        assert_eq!(summary.total_inserted(), 3);
        assert_eq!(summary.total_rejected(), 1);
        assert!(summary.report("commodity_prices").is_some());
        assert!(summary.report("population").is_none());
    }
}
