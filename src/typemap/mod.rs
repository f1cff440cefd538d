//! Type mapping from MySQL-native column types to portable ones.

use std::fmt;

use crate::models::{
    schema::{ColumnSchema, TableSchema},
    types::{longest_value, ColumnType},
};

/// Length given to an enum with no declared values.
pub const DEFAULT_ENUM_LENGTH: u32 = 255;

/// Map a source column type to its portable equivalent.
///
/// Rules are tried in this order, first match wins: enum, datetime and
/// timestamp, date, time, year, double and float, decimal, tinyint,
/// mediumint. MySQL's sized text, blob and binary spellings then fall
/// back to their generic `TEXT` and `BYTEA` forms; anything else is kept
/// as is. Collation stripping runs on the result whichever rule fired.
pub fn to_portable(source: &ColumnType) -> ColumnType {
    let mapped = match source {
        ColumnType::Enum { values, .. } => ColumnType::VarChar {
            length: Some(enum_length(values)),
            collation: None,
        },
        ColumnType::MySqlDateTime { .. } | ColumnType::MySqlTimestamp { .. } => {
            ColumnType::DateTime
        }
        ColumnType::MySqlDate => ColumnType::Date,
        ColumnType::MySqlTime { .. } => ColumnType::Time,
        ColumnType::Year => ColumnType::SmallInteger,
        ColumnType::Double | ColumnType::MySqlFloat => ColumnType::Float,
        ColumnType::Decimal {
            precision: Some(precision),
            scale: Some(scale),
        } => ColumnType::Numeric {
            precision: Some(*precision),
            scale: Some(*scale),
        },
        // Half-specified decimals lose both parameters.
        ColumnType::Decimal { .. } => ColumnType::Numeric {
            precision: None,
            scale: None,
        },
        ColumnType::TinyInt => ColumnType::SmallInteger,
        ColumnType::MediumInt => ColumnType::Integer,
        ColumnType::MySqlText { collation, .. } => ColumnType::Text {
            collation: collation.clone(),
        },
        ColumnType::MySqlBlob { .. } | ColumnType::MySqlBinary { .. } => ColumnType::LargeBinary,
        other => other.clone(),
    };

    strip_collation(mapped)
}

/// Replace a collated string type by a collation-free one: a bounded
/// `VARCHAR` when a non-zero length is declared, `TEXT` otherwise.
pub fn strip_collation(column_type: ColumnType) -> ColumnType {
    if column_type.collation().is_none() {
        return column_type;
    }

    match column_type.length() {
        Some(length) if length > 0 => ColumnType::VarChar {
            length: Some(length),
            collation: None,
        },
        _ => ColumnType::Text { collation: None },
    }
}

fn enum_length(values: &[String]) -> u32 {
    longest_value(values).unwrap_or(DEFAULT_ENUM_LENGTH)
}

/// Rewrite one column's type. Name and flags are copied untouched.
pub fn map_column(column: &ColumnSchema) -> ColumnSchema {
    ColumnSchema {
        data_type: to_portable(&column.data_type),
        ..column.clone()
    }
}

/// A column whose type changed during translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRewrite {
    pub column: String,
    pub from: ColumnType,
    pub to: ColumnType,
}

impl fmt::Display for TypeRewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - Column {}: MySQL {} -> {}",
            self.column, self.from, self.to
        )
    }
}

/// Translate every column of a table, keeping table name and column order.
pub fn translate_table(table: &TableSchema) -> (TableSchema, Vec<TypeRewrite>) {
    let mut rewrites = Vec::new();

    let columns = table
        .columns
        .iter()
        .map(|column| {
            let mapped = map_column(column);
            if mapped.data_type != column.data_type {
                rewrites.push(TypeRewrite {
                    column: column.name.clone(),
                    from: column.data_type.clone(),
                    to: mapped.data_type.clone(),
                });
            }
            mapped
        })
        .collect();

    let translated = TableSchema {
        table_name: table.table_name.clone(),
        columns,
    };

    (translated, rewrites)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, column_type: &str, collation: Option<&str>) -> ColumnSchema {
        ColumnSchema {
            name: name.to_string(),
            data_type: ColumnType::parse_mysql(column_type, collation.map(str::to_string)),
            is_nullable: true,
            is_primary_key: false,
            is_auto_increment: false,
        }
    }

    fn varchar(length: u32) -> ColumnType {
        ColumnType::VarChar {
            length: Some(length),
            collation: None,
        }
    }

    #[test]
    fn test_enum_uses_longest_value() {
        let source = ColumnType::Enum {
            values: vec!["a".into(), "bb".into(), "ccc".into()],
            collation: Some("utf8mb4_general_ci".into()),
        };
        assert_eq!(to_portable(&source), varchar(3));
    }

    #[test]
    fn test_enum_length_counts_characters() {
        let source = ColumnType::Enum {
            values: vec!["ផ្ទះ".into(), "ab".into()],
            collation: None,
        };
        assert_eq!(to_portable(&source), varchar(4));
    }

    #[test]
    fn test_empty_enum_defaults_to_255() {
        let source = ColumnType::Enum {
            values: vec![],
            collation: None,
        };
        assert_eq!(to_portable(&source), varchar(DEFAULT_ENUM_LENGTH));
    }

    #[test]
    fn test_temporal_types() {
        assert_eq!(
            to_portable(&ColumnType::MySqlDateTime { fsp: Some(6) }),
            ColumnType::DateTime
        );
        assert_eq!(
            to_portable(&ColumnType::MySqlTimestamp { fsp: None }),
            ColumnType::DateTime
        );
        assert_eq!(to_portable(&ColumnType::MySqlDate), ColumnType::Date);
        assert_eq!(
            to_portable(&ColumnType::MySqlTime { fsp: Some(3) }),
            ColumnType::Time
        );
        assert_eq!(to_portable(&ColumnType::Year), ColumnType::SmallInteger);
    }

    #[test]
    fn test_float_family_drops_parameters() {
        assert_eq!(
            to_portable(&ColumnType::parse_mysql("double(10,2)", None)),
            ColumnType::Float
        );
        assert_eq!(
            to_portable(&ColumnType::parse_mysql("float(7,4)", None)),
            ColumnType::Float
        );
    }

    #[test]
    fn test_decimal_keeps_precision_and_scale() {
        assert_eq!(
            to_portable(&ColumnType::parse_mysql("decimal(10,2)", None)),
            ColumnType::Numeric {
                precision: Some(10),
                scale: Some(2),
            }
        );
    }

    #[test]
    fn test_partial_decimal_is_unparameterized() {
        let unparameterized = ColumnType::Numeric {
            precision: None,
            scale: None,
        };
        assert_eq!(
            to_portable(&ColumnType::Decimal {
                precision: Some(12),
                scale: None,
            }),
            unparameterized
        );
        assert_eq!(
            to_portable(&ColumnType::Decimal {
                precision: None,
                scale: Some(2),
            }),
            unparameterized
        );
        assert_eq!(
            to_portable(&ColumnType::parse_mysql("decimal", None)),
            unparameterized
        );
    }

    #[test]
    fn test_small_integers_widen() {
        assert_eq!(to_portable(&ColumnType::TinyInt), ColumnType::SmallInteger);
        assert_eq!(to_portable(&ColumnType::MediumInt), ColumnType::Integer);
    }

    #[test]
    fn test_collation_stripped_from_untouched_types() {
        let collated = |t: &str| ColumnType::parse_mysql(t, Some("utf8mb3_general_ci".into()));

        assert_eq!(to_portable(&collated("varchar(50)")), varchar(50));
        assert_eq!(to_portable(&collated("char(2)")), varchar(2));
        assert_eq!(
            to_portable(&collated("mediumtext")),
            ColumnType::Text { collation: None }
        );
        assert_eq!(
            to_portable(&collated("varchar(0)")),
            ColumnType::Text { collation: None }
        );
    }

    #[test]
    fn test_collated_set_becomes_bounded_varchar() {
        let set = |t: &str| ColumnType::parse_mysql(t, Some("latin1_bin".into()));

        assert_eq!(to_portable(&set("set('x','yy')")), varchar(2));
        assert_eq!(to_portable(&set("set('','')")), ColumnType::Text { collation: None });
        assert_eq!(to_portable(&set("set()")), ColumnType::Text { collation: None });
    }

    #[test]
    fn test_large_objects_fall_back_to_generic_types() {
        assert_eq!(
            to_portable(&ColumnType::parse_mysql("longtext", None)),
            ColumnType::Text { collation: None }
        );
        for blob in ["tinyblob", "blob", "mediumblob", "longblob", "binary(16)", "varbinary(255)"] {
            assert_eq!(
                to_portable(&ColumnType::parse_mysql(blob, None)),
                ColumnType::LargeBinary,
                "{}",
                blob
            );
        }
    }

    #[test]
    fn test_translate_reports_large_object_rewrites() {
        let table = TableSchema {
            table_name: "documents".to_string(),
            columns: vec![
                column("body", "mediumtext", None),
                column("summary", "text", None),
                column("scan", "longblob", None),
            ],
        };

        let (translated, rewrites) = translate_table(&table);

        let types: Vec<String> = translated
            .columns
            .iter()
            .map(|c| c.data_type.to_string())
            .collect();
        assert_eq!(types, ["TEXT", "TEXT", "BYTEA"]);
        let rewritten: Vec<String> = rewrites.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            rewritten,
            [
                "  - Column body: MySQL MEDIUMTEXT -> TEXT",
                "  - Column scan: MySQL LONGBLOB -> BYTEA",
            ]
        );
    }

    #[test]
    fn test_uncollated_and_unknown_types_pass_through() {
        for source in [
            ColumnType::parse_mysql("char(2)", None),
            ColumnType::parse_mysql("varchar(80)", None),
            ColumnType::parse_mysql("json", None),
            ColumnType::parse_mysql("set('x','y')", None),
            ColumnType::parse_mysql("bit(1)", None),
            ColumnType::Integer,
            ColumnType::BigInteger,
            ColumnType::LargeBinary,
        ] {
            assert_eq!(to_portable(&source), source);
        }
    }

    #[test]
    fn test_map_column_keeps_flags() {
        let source = ColumnSchema {
            name: "id".to_string(),
            data_type: ColumnType::MediumInt,
            is_nullable: false,
            is_primary_key: true,
            is_auto_increment: true,
        };
        let mapped = map_column(&source);
        assert_eq!(mapped.name, "id");
        assert_eq!(mapped.data_type, ColumnType::Integer);
        assert!(!mapped.is_nullable);
        assert!(mapped.is_primary_key);
        assert!(mapped.is_auto_increment);
    }

    #[test]
    fn test_translate_users_table() {
        let mut id = column("id", "tinyint", None);
        id.is_primary_key = true;
        id.is_nullable = false;
        let table = TableSchema {
            table_name: "users".to_string(),
            columns: vec![
                id,
                column("status", "enum('a','bb','ccc')", None),
                column("note", "varchar(50)", Some("utf8mb3_general_ci")),
                column("email", "varchar(120)", None),
            ],
        };

        let (translated, rewrites) = translate_table(&table);

        assert_eq!(translated.table_name, "users");
        let types: Vec<String> = translated
            .columns
            .iter()
            .map(|c| c.data_type.to_string())
            .collect();
        assert_eq!(types, ["SMALLINT", "VARCHAR(3)", "VARCHAR(50)", "VARCHAR(120)"]);
        assert_eq!(translated.primary_key(), ["id"]);

        let rewritten: Vec<&str> = rewrites.iter().map(|r| r.column.as_str()).collect();
        assert_eq!(rewritten, ["id", "status", "note"]);
        assert_eq!(
            rewrites[2].to_string(),
            "  - Column note: MySQL VARCHAR(50) COLLATE utf8mb3_general_ci -> VARCHAR(50)"
        );
    }

    #[test]
    fn test_translate_numeric_and_year_columns() {
        let table = TableSchema {
            table_name: "listings".to_string(),
            columns: vec![
                column("price", "decimal(10,2)", None),
                column("price2", "decimal", None),
                column("born", "year", None),
                column("big", "mediumint", None),
            ],
        };

        let (translated, rewrites) = translate_table(&table);

        let types: Vec<String> = translated
            .columns
            .iter()
            .map(|c| c.data_type.to_string())
            .collect();
        assert_eq!(types, ["NUMERIC(10,2)", "NUMERIC", "SMALLINT", "INTEGER"]);
        assert_eq!(rewrites.len(), 4);
    }
}
