//! Property-based tests for statement construction
//!
//! These tests verify that:
//! - Every generated statement carries exactly one parameter per placeholder
//! - Parameters follow the record order of the input
//! - Identifiers outside the allowed character class never reach SQL text
//! - Batch inserts write exactly as many rows as were given

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    use sqlbridge::core::db::dialect::Dialect;
    use sqlbridge::core::db::query::{Ident, QueryBuilder};
    use sqlbridge::core::db::sqlite::SqliteDriver;
    use sqlbridge::{Aggregate, ConnectionParams, DataError, Database, Record, Value};

    fn arb_ident() -> impl Strategy<Value = String> {
        "[A-Za-z_][A-Za-z0-9_]{0,20}"
    }

    fn arb_bad_ident() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Za-z_]{0,5}[^A-Za-z0-9_$][A-Za-z0-9_]{0,5}",
            "[0-9][A-Za-z0-9_]{0,10}",
            "[a-z]{65,80}",
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(Value::Integer),
            (-1.0e6f64..1.0e6).prop_map(Value::Real),
            ".{0,20}".prop_map(Value::Text),
        ]
    }

    fn arb_record() -> impl Strategy<Value = Record> {
        prop::collection::btree_map(arb_ident(), arb_value(), 1..6)
            .prop_map(|map: BTreeMap<String, Value>| map.into_iter().collect())
    }

    fn arb_dialect() -> impl Strategy<Value = Dialect> {
        prop_oneof![Just(Dialect::Sqlite), Just(Dialect::MySql)]
    }

    proptest! {
        #[test]
        fn prop_filter_params_align_with_placeholders(
            dialect in arb_dialect(),
            table in arb_ident(),
            filters in arb_record(),
        ) {
            let stmt = QueryBuilder::new(dialect).select_filtered(&table, &filters).unwrap();
            prop_assert_eq!(stmt.placeholder_count(), stmt.params.len());
            let expected: Vec<Value> = filters.values().cloned().collect();
            prop_assert_eq!(stmt.params, expected);
        }

        #[test]
        fn prop_update_params_are_data_then_conditions(
            dialect in arb_dialect(),
            table in arb_ident(),
            data in arb_record(),
            conditions in arb_record(),
        ) {
            let stmt = QueryBuilder::new(dialect).update(&table, &data, &conditions).unwrap();
            prop_assert_eq!(stmt.placeholder_count(), data.len() + conditions.len());
            let expected: Vec<Value> = data.values().chain(conditions.values()).cloned().collect();
            prop_assert_eq!(stmt.params, expected);
        }

        #[test]
        fn prop_batch_insert_params_cover_every_row(
            dialect in arb_dialect(),
            table in arb_ident(),
            template in arb_record(),
            copies in 1usize..8,
        ) {
            let rows = vec![template.clone(); copies];
            let stmt = QueryBuilder::new(dialect).insert_many(&table, &rows).unwrap();
            prop_assert_eq!(stmt.placeholder_count(), template.len() * copies);
            prop_assert_eq!(stmt.params.len(), template.len() * copies);
        }

        #[test]
        fn prop_bad_identifiers_rejected(dialect in arb_dialect(), bad in arb_bad_ident()) {
            prop_assert!(Ident::parse(&bad).is_err());

            let builder = QueryBuilder::new(dialect);
            prop_assert!(matches!(builder.select_all(&bad), Err(DataError::Execution(_))));
            prop_assert!(matches!(builder.drop_table(&bad), Err(DataError::Execution(_))));
            prop_assert!(matches!(
                builder.select_filtered("users", &Record::new().with(bad.clone(), 1)),
                Err(DataError::Execution(_))
            ));
            prop_assert!(matches!(
                builder.aggregate("users", Aggregate::Sum, &bad),
                Err(DataError::Execution(_))
            ));
        }

        #[test]
        fn prop_valid_identifiers_are_quoted(dialect in arb_dialect(), table in arb_ident()) {
            let stmt = QueryBuilder::new(dialect).select_all(&table).unwrap();
            let quoted = match dialect {
                Dialect::Sqlite => format!("\"{}\"", table),
                Dialect::MySql => format!("`{}`", table),
            };
            prop_assert_eq!(stmt.sql, format!("SELECT * FROM {}", quoted));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_batch_insert_writes_every_row(ages in prop::collection::vec(0i64..120, 1..20)) {
            let file = NamedTempFile::new().unwrap();
            let params = ConnectionParams::new("", "", "", file.path().to_str().unwrap());
            let db = Database::new(SqliteDriver::default());
            db.execute_custom_query(&params, "CREATE TABLE people (age INTEGER)").unwrap();

            let rows: Vec<Record> = ages.iter().map(|age| Record::new().with("age", *age)).collect();
            db.insert_multiple_rows(&params, "people", &rows).unwrap();

            let count = db.get_aggregated_data(&params, "people", Aggregate::Count, "*").unwrap();
            prop_assert_eq!(count, Value::Integer(ages.len() as i64));
        }
    }
}
