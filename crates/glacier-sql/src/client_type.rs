use crate::column::ColumnError;
use std::fmt;

///
/// ClientType
///
/// Client-facing SQL type codes. The numeric values are the registry values
/// clients exchange on the wire and must never be renumbered.
///

macro_rules! client_types {
    ($($variant:ident = $code:literal => $name:literal),* $(,)?) => {
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub enum ClientType {
            $($variant,)*
        }

        impl ClientType {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            #[must_use]
            pub const fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            pub const fn from_code(code: i32) -> Result<Self, ColumnError> {
                match code {
                    $($code => Ok(Self::$variant),)*
                    _ => Err(ColumnError::UnknownClientType { code }),
                }
            }
        }
    };
}

client_types! {
    Bit = -7 => "BIT",
    TinyInt = -6 => "TINYINT",
    SmallInt = 5 => "SMALLINT",
    Integer = 4 => "INTEGER",
    BigInt = -5 => "BIGINT",
    Float = 6 => "FLOAT",
    Real = 7 => "REAL",
    Double = 8 => "DOUBLE",
    Numeric = 2 => "NUMERIC",
    Decimal = 3 => "DECIMAL",
    Char = 1 => "CHAR",
    VarChar = 12 => "VARCHAR",
    LongVarChar = -1 => "LONGVARCHAR",
    Date = 91 => "DATE",
    Time = 92 => "TIME",
    Timestamp = 93 => "TIMESTAMP",
    Binary = -2 => "BINARY",
    VarBinary = -3 => "VARBINARY",
    LongVarBinary = -4 => "LONGVARBINARY",
    Null = 0 => "NULL",
    Other = 1111 => "OTHER",
    JavaObject = 2000 => "JAVA_OBJECT",
    Distinct = 2001 => "DISTINCT",
    Struct = 2002 => "STRUCT",
    Array = 2003 => "ARRAY",
    Blob = 2004 => "BLOB",
    Clob = 2005 => "CLOB",
    Ref = 2006 => "REF",
    DataLink = 70 => "DATALINK",
    Boolean = 16 => "BOOLEAN",
    RowId = -8 => "ROWID",
    NChar = -15 => "NCHAR",
    NVarChar = -9 => "NVARCHAR",
    LongNVarChar = -16 => "LONGNVARCHAR",
    NClob = 2011 => "NCLOB",
    SqlXml = 2009 => "SQLXML",
    RefCursor = 2012 => "REF_CURSOR",
    TimeWithTimezone = 2013 => "TIME_WITH_TIMEZONE",
    TimestampWithTimezone = 2014 => "TIMESTAMP_WITH_TIMEZONE",
}

impl ClientType {
    /// Typical rendered width for fixed-width types; `None` when the width
    /// depends on the column.
    #[must_use]
    pub const fn display_size_hint(self) -> Option<u32> {
        match self {
            Self::Bit | Self::Boolean | Self::Null => Some(1),
            Self::TinyInt => Some(4),
            Self::SmallInt => Some(6),
            Self::Integer => Some(11),
            Self::BigInt => Some(20),
            Self::Real => Some(15),
            Self::Float | Self::Double => Some(25),
            Self::Date => Some(10),
            Self::Time => Some(18),
            Self::Timestamp | Self::TimeWithTimezone | Self::TimestampWithTimezone => Some(24),
            _ => None,
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for ClientType {
    type Error = ColumnError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

///
/// TESTS
///
