use std::fmt;

use serde::{Deserialize, Serialize};

/// A column type descriptor.
///
/// The first group of variants is portable: every one of them renders to
/// valid PostgreSQL. The second group is MySQL-native and only ever comes
/// out of [`ColumnType::parse_mysql`]. `Other` carries any spelling the
/// parser does not know, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    SmallInteger,
    Integer,
    BigInteger,
    Float,
    Numeric {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    VarChar {
        length: Option<u32>,
        collation: Option<String>,
    },
    Char {
        length: Option<u32>,
        collation: Option<String>,
    },
    Text {
        collation: Option<String>,
    },
    DateTime,
    Date,
    Time,
    Boolean,
    LargeBinary,

    Enum {
        values: Vec<String>,
        collation: Option<String>,
    },
    MySqlDateTime {
        fsp: Option<u32>,
    },
    MySqlTimestamp {
        fsp: Option<u32>,
    },
    MySqlDate,
    MySqlTime {
        fsp: Option<u32>,
    },
    Year,
    Double,
    MySqlFloat,
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    TinyInt,
    MediumInt,
    Set {
        values: Vec<String>,
        collation: Option<String>,
    },
    /// `TINYTEXT`, `MEDIUMTEXT` or `LONGTEXT`; plain `TEXT` parses to [`ColumnType::Text`].
    MySqlText {
        size: LobSize,
        collation: Option<String>,
    },
    MySqlBlob {
        size: LobSize,
    },
    MySqlBinary {
        length: Option<u32>,
        varying: bool,
    },

    Other(String),
}

/// Size prefix of MySQL's large-object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobSize {
    Tiny,
    Regular,
    Medium,
    Long,
}

impl LobSize {
    fn prefix(self) -> &'static str {
        match self {
            LobSize::Tiny => "TINY",
            LobSize::Regular => "",
            LobSize::Medium => "MEDIUM",
            LobSize::Long => "LONG",
        }
    }
}

impl ColumnType {
    /// Parse a MySQL `COLUMN_TYPE` value such as `decimal(10,2)`,
    /// `enum('a','b')` or `int(10) unsigned`.
    ///
    /// Display widths, `unsigned` and `zerofill` are dropped. Spellings
    /// that are not recognised come back as [`ColumnType::Other`].
    pub fn parse_mysql(column_type: &str, collation: Option<String>) -> Self {
        let raw = column_type.trim();
        let lower = raw.to_ascii_lowercase();

        // ASCII lowercasing keeps byte offsets, so `raw` can be sliced with
        // positions found in `lower` (enum values keep their case).
        let (name, args) = match (lower.find('('), lower.rfind(')')) {
            (Some(open), Some(close)) if close > open => {
                (lower[..open].trim(), Some(&raw[open + 1..close]))
            }
            _ => (lower.split_whitespace().next().unwrap_or_default(), None),
        };

        let numbers = args.map(parse_numbers).unwrap_or_default();
        let first = numbers.first().copied().flatten();
        let second = numbers.get(1).copied().flatten();

        match name {
            "enum" => ColumnType::Enum {
                values: args.map(parse_quoted_list).unwrap_or_default(),
                collation,
            },
            "datetime" => ColumnType::MySqlDateTime { fsp: first },
            "timestamp" => ColumnType::MySqlTimestamp { fsp: first },
            "date" => ColumnType::MySqlDate,
            "time" => ColumnType::MySqlTime { fsp: first },
            "year" => ColumnType::Year,
            "double" | "real" => ColumnType::Double,
            "float" => ColumnType::MySqlFloat,
            "decimal" | "numeric" | "dec" | "fixed" => ColumnType::Decimal {
                precision: first,
                scale: second,
            },
            "tinyint" => ColumnType::TinyInt,
            "mediumint" => ColumnType::MediumInt,
            "smallint" => ColumnType::SmallInteger,
            "int" | "integer" => ColumnType::Integer,
            "bigint" => ColumnType::BigInteger,
            "varchar" => ColumnType::VarChar {
                length: first,
                collation,
            },
            "char" => ColumnType::Char {
                length: first,
                collation,
            },
            "set" => ColumnType::Set {
                values: args.map(parse_quoted_list).unwrap_or_default(),
                collation,
            },
            "text" => ColumnType::Text { collation },
            "tinytext" => ColumnType::MySqlText {
                size: LobSize::Tiny,
                collation,
            },
            "mediumtext" => ColumnType::MySqlText {
                size: LobSize::Medium,
                collation,
            },
            "longtext" => ColumnType::MySqlText {
                size: LobSize::Long,
                collation,
            },
            "tinyblob" => ColumnType::MySqlBlob {
                size: LobSize::Tiny,
            },
            "blob" => ColumnType::MySqlBlob {
                size: LobSize::Regular,
            },
            "mediumblob" => ColumnType::MySqlBlob {
                size: LobSize::Medium,
            },
            "longblob" => ColumnType::MySqlBlob {
                size: LobSize::Long,
            },
            "binary" => ColumnType::MySqlBinary {
                length: first,
                varying: false,
            },
            "varbinary" => ColumnType::MySqlBinary {
                length: first,
                varying: true,
            },
            _ => ColumnType::Other(raw.to_string()),
        }
    }

    /// Build a type from the `information_schema.columns` fields PostgreSQL reports.
    pub fn from_postgres(
        data_type: &str,
        char_length: Option<i32>,
        precision: Option<i32>,
        scale: Option<i32>,
    ) -> Self {
        let to_u32 = |value: Option<i32>| value.and_then(|n| u32::try_from(n).ok());

        match data_type.to_ascii_lowercase().as_str() {
            "smallint" => ColumnType::SmallInteger,
            "integer" => ColumnType::Integer,
            "bigint" => ColumnType::BigInteger,
            "double precision" | "real" => ColumnType::Float,
            "numeric" => ColumnType::Numeric {
                precision: to_u32(precision),
                scale: to_u32(scale),
            },
            "character varying" => ColumnType::VarChar {
                length: to_u32(char_length),
                collation: None,
            },
            "character" => ColumnType::Char {
                length: to_u32(char_length),
                collation: None,
            },
            "text" => ColumnType::Text { collation: None },
            "timestamp without time zone" => ColumnType::DateTime,
            "date" => ColumnType::Date,
            "time without time zone" => ColumnType::Time,
            "boolean" => ColumnType::Boolean,
            "bytea" => ColumnType::LargeBinary,
            other => ColumnType::Other(other.to_string()),
        }
    }

    /// Source-specific collation attached to a string-like type, if any.
    pub fn collation(&self) -> Option<&str> {
        match self {
            ColumnType::VarChar { collation, .. }
            | ColumnType::Char { collation, .. }
            | ColumnType::Text { collation }
            | ColumnType::Enum { collation, .. }
            | ColumnType::Set { collation, .. }
            | ColumnType::MySqlText { collation, .. } => collation.as_deref(),
            _ => None,
        }
    }

    /// Declared length of a bounded string type. A set counts its longest member.
    pub fn length(&self) -> Option<u32> {
        match self {
            ColumnType::VarChar { length, .. } | ColumnType::Char { length, .. } => *length,
            ColumnType::Set { values, .. } => Some(longest_value(values).unwrap_or(0)),
            _ => None,
        }
    }
}

/// Length in characters of the longest value, `None` for an empty list.
pub fn longest_value(values: &[String]) -> Option<u32> {
    values
        .iter()
        .map(|v| v.chars().count())
        .max()
        .map(|len| u32::try_from(len).unwrap_or(u32::MAX))
}

fn write_values(f: &mut fmt::Formatter<'_>, name: &str, values: &[String]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "'{}'", value.replace('\'', "''"))?;
    }
    f.write_str(")")
}

fn parse_numbers(args: &str) -> Vec<Option<u32>> {
    args.split(',').map(|part| part.trim().parse().ok()).collect()
}

/// Split `'a','it''s'` into its values, undoing the `''` escape.
fn parse_quoted_list(args: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut chars = args.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\'' {
            continue;
        }
        let mut value = String::new();
        while let Some(c) = chars.next() {
            if c != '\'' {
                value.push(c);
            } else if chars.peek() == Some(&'\'') {
                chars.next();
                value.push('\'');
            } else {
                break;
            }
        }
        values.push(value);
    }

    values
}

fn write_sized(f: &mut fmt::Formatter<'_>, name: &str, size: Option<u32>) -> fmt::Result {
    match size {
        Some(size) => write!(f, "{}({})", name, size),
        None => f.write_str(name),
    }
}

fn write_precision(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    precision: Option<u32>,
    scale: Option<u32>,
) -> fmt::Result {
    match (precision, scale) {
        (Some(p), Some(s)) => write!(f, "{}({},{})", name, p, s),
        (Some(p), None) => write!(f, "{}({})", name, p),
        _ => f.write_str(name),
    }
}

fn write_collation(f: &mut fmt::Formatter<'_>, collation: &Option<String>) -> fmt::Result {
    match collation {
        Some(collation) => write!(f, " COLLATE {}", collation),
        None => Ok(()),
    }
}

/// Portable variants render as PostgreSQL DDL, MySQL-native ones as MySQL spells them.
impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::SmallInteger => f.write_str("SMALLINT"),
            ColumnType::Integer => f.write_str("INTEGER"),
            ColumnType::BigInteger => f.write_str("BIGINT"),
            ColumnType::Float => f.write_str("FLOAT"),
            ColumnType::Numeric { precision, scale } => {
                write_precision(f, "NUMERIC", *precision, *scale)
            }
            ColumnType::VarChar { length, collation } => {
                write_sized(f, "VARCHAR", *length)?;
                write_collation(f, collation)
            }
            ColumnType::Char { length, collation } => {
                write_sized(f, "CHAR", *length)?;
                write_collation(f, collation)
            }
            ColumnType::Text { collation } => {
                f.write_str("TEXT")?;
                write_collation(f, collation)
            }
            ColumnType::DateTime => f.write_str("TIMESTAMP WITHOUT TIME ZONE"),
            ColumnType::Date => f.write_str("DATE"),
            ColumnType::Time => f.write_str("TIME WITHOUT TIME ZONE"),
            ColumnType::Boolean => f.write_str("BOOLEAN"),
            ColumnType::LargeBinary => f.write_str("BYTEA"),
            ColumnType::Enum { values, collation } => {
                write_values(f, "ENUM", values)?;
                write_collation(f, collation)
            }
            ColumnType::MySqlDateTime { fsp } => write_sized(f, "DATETIME", *fsp),
            ColumnType::MySqlTimestamp { fsp } => write_sized(f, "TIMESTAMP", *fsp),
            ColumnType::MySqlDate => f.write_str("DATE"),
            ColumnType::MySqlTime { fsp } => write_sized(f, "TIME", *fsp),
            ColumnType::Year => f.write_str("YEAR"),
            ColumnType::Double => f.write_str("DOUBLE"),
            ColumnType::MySqlFloat => f.write_str("FLOAT"),
            ColumnType::Decimal { precision, scale } => {
                write_precision(f, "DECIMAL", *precision, *scale)
            }
            ColumnType::TinyInt => f.write_str("TINYINT"),
            ColumnType::MediumInt => f.write_str("MEDIUMINT"),
            ColumnType::Set { values, collation } => {
                write_values(f, "SET", values)?;
                write_collation(f, collation)
            }
            ColumnType::MySqlText { size, collation } => {
                write!(f, "{}TEXT", size.prefix())?;
                write_collation(f, collation)
            }
            ColumnType::MySqlBlob { size } => write!(f, "{}BLOB", size.prefix()),
            ColumnType::MySqlBinary { length, varying } => {
                write_sized(f, if *varying { "VARBINARY" } else { "BINARY" }, *length)
            }
            ColumnType::Other(raw) => f.write_str(raw),
        }
    }
}
