use crate::schema::TableSchema;

/// Generate DROP TABLE SQL for a table schema
///
/// Dropping a table also drops its indexes and its AUTOINCREMENT sequence.
pub fn generate_drop_table(schema: &TableSchema) -> String {
    format!("DROP TABLE IF EXISTS {}", schema.name)
}

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", schema.name);
    let mut columns = vec!["    id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        columns.push(format!(
            "    \"{}\" {}{}",
            col.name,
            col.col_type.sql_type(),
            null_constraint
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for the declared indexes
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .indexes
        .iter()
        .map(|index| {
            let columns: Vec<String> = index.columns.iter().map(|c| format!("\"{}\"", c)).collect();
            format!(
                "CREATE INDEX {} ON {}({})",
                index.name(schema.name),
                schema.name,
                columns.join(", ")
            )
        })
        .collect()
}

/// Generate the INSERT statement, one placeholder per declared column
pub fn generate_insert(schema: &TableSchema) -> String {
    let columns: Vec<String> = schema.columns.iter().map(|c| format!("\"{}\"", c.name)).collect();
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Generate a SELECT of `id` followed by every declared column
pub fn generate_select(schema: &TableSchema) -> String {
    let columns: Vec<String> = schema.columns.iter().map(|c| format!("\"{}\"", c.name)).collect();
    format!("SELECT id, {} FROM {}", columns.join(", "), schema.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{COMMODITY_PRICES, MSE_DAILY, PRODUCTION};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&PRODUCTION);
        assert!(sql.contains("CREATE TABLE production"));
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("\"district\" TEXT NOT NULL"));
        assert!(sql.contains("\"yield\" REAL NOT NULL"));
    }

    #[test]
    fn test_optional_columns_are_nullable() {
        let sql = generate_create_table(&COMMODITY_PRICES);
        assert!(sql.contains("\"price\" REAL,"));
        assert!(sql.contains("\"year\" INTEGER NOT NULL"));
    }

    #[test]
    fn test_generate_indexes() {
        let indexes = generate_indexes(&MSE_DAILY);
        assert_eq!(
            indexes,
            vec![
                "CREATE INDEX idx_mse_daily_ticker ON mse_daily(\"ticker\")",
                "CREATE INDEX idx_mse_daily_company_name ON mse_daily(\"company_name\")",
                "CREATE INDEX idx_mse_daily_trade_date ON mse_daily(\"trade_date\")",
            ]
        );
    }

    #[test]
    fn test_generate_insert() {
        assert_eq!(
            generate_insert(&PRODUCTION),
            "INSERT INTO production (\"district\", \"crop\", \"yield\", \"season\") VALUES (?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_generate_select() {
        assert_eq!(
            generate_select(&PRODUCTION),
            "SELECT id, \"district\", \"crop\", \"yield\", \"season\" FROM production"
        );
    }

    #[test]
    fn test_generate_drop_table() {
        assert_eq!(generate_drop_table(&PRODUCTION), "DROP TABLE IF EXISTS production");
    }
}
