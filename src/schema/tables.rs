//! Table schema definitions for the benchmark database

use super::types::*;

// =============================================================================
// Agriculture
// =============================================================================

pub static PRODUCTION: TableSchema = TableSchema {
    name: "production",
    columns: &[
        Column::required("district", ColumnType::Text),
        Column::required("crop", ColumnType::Text),
        Column::required("yield", ColumnType::Real),
        Column::required("season", ColumnType::Text),
    ],
    indexes: &[
        Index::on(&["district"]),
        Index::on(&["crop"]),
        Index::on(&["season"]),
    ],
};

// =============================================================================
// Census
// =============================================================================

pub static POPULATION: TableSchema = TableSchema {
    name: "population",
    columns: &[
        Column::required("region_code", ColumnType::Integer),
        Column::new("region_name", ColumnType::Text),
        Column::required("district_code", ColumnType::Integer),
        Column::new("district_name", ColumnType::Text),
        Column::new("district_name2", ColumnType::Text),
        Column::new("admin_status", ColumnType::Text),
        // EA/TA codes keep leading zeros, so they stay text
        Column::new("ea_number", ColumnType::Text),
        Column::new("ea_code", ColumnType::Text),
        Column::new("ta_code", ColumnType::Text),
        Column::required("ta_name", ColumnType::Text),
        Column::new("tpa", ColumnType::Text),
        Column::required("population_male", ColumnType::Real),
        Column::required("population_female", ColumnType::Real),
        Column::required("number_households", ColumnType::Real),
        Column::required("sum_value", ColumnType::Real),
        Column::required("population_text", ColumnType::Text),
        Column::required("total_population", ColumnType::Text),
    ],
    indexes: &[
        Index::on(&["district_name"]),
        Index::on(&["region_name"]),
        Index::on(&["ta_name"]),
    ],
};

// =============================================================================
// Malawi Stock Exchange
// =============================================================================

pub static MSE_DAILY: TableSchema = TableSchema {
    name: "mse_daily",
    columns: &[
        Column::new("counter_id", ColumnType::Integer),
        Column::required("ticker", ColumnType::Text),
        Column::new("company_name", ColumnType::Text),
        Column::new("sector", ColumnType::Text),
        Column::required("trade_date", ColumnType::Text),
        Column::required("print_time", ColumnType::Text),
        Column::required("previous_close_price", ColumnType::Real),
        Column::required("close_price", ColumnType::Real),
        Column::new("high_price", ColumnType::Real),
        Column::new("low_price", ColumnType::Real),
        Column::new("bid_price", ColumnType::Real),
        Column::new("ask_price", ColumnType::Real),
        Column::required("volume", ColumnType::Real),
        Column::required("dividend_mwk", ColumnType::Real),
        Column::required("dividend_yield_pct", ColumnType::Real),
        Column::required("earnings_yield_pct", ColumnType::Real),
        Column::required("pe_ratio", ColumnType::Real),
        Column::new("pbv_ratio", ColumnType::Real),
        Column::new("market_cap_mwk_mn", ColumnType::Real),
        Column::required("profit_after_tax_mwk_mn", ColumnType::Real),
        Column::new("shares_outstanding", ColumnType::Real),
    ],
    indexes: &[
        Index::on(&["ticker"]),
        Index::on(&["company_name"]),
        Index::on(&["trade_date"]),
    ],
};

// =============================================================================
// Market prices
// =============================================================================

pub static COMMODITY_PRICES: TableSchema = TableSchema {
    name: "commodity_prices",
    columns: &[
        Column::required("add_name", ColumnType::Text),
        Column::required("epa_name", ColumnType::Text),
        Column::required("district", ColumnType::Text),
        Column::required("market", ColumnType::Text),
        Column::required("month_name", ColumnType::Text),
        Column::required("year", ColumnType::Integer),
        Column::required("commodity", ColumnType::Text),
        // Not every market records every commodity each month
        Column::new("price", ColumnType::Real),
        Column::required("collection_date", ColumnType::Text),
    ],
    indexes: &[
        Index::on(&["district"]),
        Index::on(&["market"]),
        Index::on(&["commodity"]),
        Index::on(&["collection_date"]),
    ],
};

// =============================================================================
// Food security
// =============================================================================

pub static FOOD_INSECURITY: TableSchema = TableSchema {
    name: "food_insecurity",
    columns: &[
        Column::required("district", ColumnType::Text),
        Column::required("analyzed_population", ColumnType::Integer),
        Column::required("time_period", ColumnType::Text),
        Column::required("percentage_population", ColumnType::Integer),
        Column::required("insecurity_level", ColumnType::Integer),
        Column::required("insecurity_desc_short", ColumnType::Text),
        Column::required("insecurity_desc_long", ColumnType::Text),
    ],
    indexes: &[
        Index::on(&["district"]),
        Index::on(&["time_period"]),
    ],
};

// =============================================================================
// All Tables (fixed load order)
// =============================================================================

/// All tables in the order they are reset, loaded and reported
pub static ALL_TABLES: &[&TableSchema] = &[
    &PRODUCTION,
    &POPULATION,
    &MSE_DAILY,
    &COMMODITY_PRICES,
    &FOOD_INSECURITY,
];

/// Get a table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_order() {
        assert_eq!(
            table_names(),
            vec!["production", "population", "mse_daily", "commodity_prices", "food_insecurity"]
        );
    }

    #[test]
    fn test_get_table() {
        assert_eq!(get_table("mse_daily").map(|t| t.name), Some("mse_daily"));
        assert!(get_table("average_prices").is_none());
    }

    #[test]
    fn test_index_columns_exist() {
        for table in ALL_TABLES {
            for index in table.indexes {
                for col in index.columns {
                    assert!(
                        table.column(col).is_some(),
                        "index column {}.{} is not declared",
                        table.name,
                        col
                    );
                }
            }
        }
    }

    #[test]
    fn test_food_insecurity_all_required() {
        assert!(FOOD_INSECURITY.columns.iter().all(|c| !c.nullable));
    }

    #[test]
    fn test_commodity_price_is_optional() {
        let price = COMMODITY_PRICES.column("price").unwrap();
        assert!(price.nullable);
        assert_eq!(price.col_type, ColumnType::Real);
    }

    #[test]
    fn test_no_table_declares_id() {
        for table in ALL_TABLES {
            assert!(table.column("id").is_none(), "{} declares id", table.name);
        }
    }
}
