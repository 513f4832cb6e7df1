use crate::schema::{get_table, TableSchema, ALL_TABLES};
use anyhow::{bail, Result};
use std::collections::HashSet;

/// Resolves which tables to process based on include/exclude filters.
///
/// The result always keeps the fixed load order, whatever order the
/// filter lists names in.
pub fn resolve_tables(
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
) -> Result<Vec<&'static TableSchema>> {
    match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --include and --exclude at the same time");
        }
        (Some(include_list), None) => {
            let names = validate_names(&include_list)?;
            Ok(ALL_TABLES
                .iter()
                .filter(|t| names.contains(t.name))
                .copied()
                .collect())
        }
        (None, Some(exclude_list)) => {
            let names = validate_names(&exclude_list)?;
            Ok(ALL_TABLES
                .iter()
                .filter(|t| !names.contains(t.name))
                .copied()
                .collect())
        }
        (None, None) => Ok(ALL_TABLES.to_vec()),
    }
}

fn validate_names(names: &[String]) -> Result<HashSet<&str>> {
    let mut set = HashSet::new();
    for name in names {
        let name = name.trim();
        if get_table(name).is_none() {
            bail!("Unknown table: {}", name);
        }
        set.insert(name);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tables: &[&TableSchema]) -> Vec<&'static str> {
        tables.iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_no_filter_returns_all() {
        let tables = resolve_tables(None, None).unwrap();
        assert_eq!(tables.len(), 5);
    }

    #[test]
    fn test_include_keeps_load_order() {
        let tables = resolve_tables(
            Some(vec!["food_insecurity".into(), "production".into()]),
            None,
        )
        .unwrap();
        assert_eq!(names(&tables), vec!["production", "food_insecurity"]);
    }

    #[test]
    fn test_exclude() {
        let tables = resolve_tables(None, Some(vec!["mse_daily".into()])).unwrap();
        assert_eq!(
            names(&tables),
            vec!["production", "population", "commodity_prices", "food_insecurity"]
        );
    }

    #[test]
    fn test_unknown_table_error() {
        let err = resolve_tables(Some(vec!["average_prices".into()]), None).unwrap_err();
        assert_eq!(err.to_string(), "Unknown table: average_prices");
    }

    #[test]
    fn test_include_and_exclude_conflict() {
        assert!(resolve_tables(Some(vec!["production".into()]), Some(vec!["population".into()])).is_err());
    }
}
