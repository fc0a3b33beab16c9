use crate::client_type::ClientType;
use glacier_core::codec::wire::{WireError, WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error as ThisError;

///
/// ColumnError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ColumnError {
    #[error("unknown client type code {code}")]
    UnknownClientType { code: i32 },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("malformed column descriptor: {message}")]
    Declarative { message: String },
}

impl From<serde_json::Error> for ColumnError {
    fn from(err: serde_json::Error) -> Self {
        Self::Declarative {
            message: err.to_string(),
        }
    }
}

///
/// ColumnInfo
///
/// Descriptor for one result column returned with the first page of a SQL
/// response. The client type and display size travel together: a column
/// without a client type always has a display size of zero.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "ColumnRepr", into = "ColumnRepr")]
pub struct ColumnInfo {
    table: String,
    name: String,
    engine_type: String,
    client_type: Option<ClientType>,
    display_size: u32,
}

impl ColumnInfo {
    /// Column without client type information.
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        name: impl Into<String>,
        engine_type: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            engine_type: engine_type.into(),
            client_type: None,
            display_size: 0,
        }
    }

    #[must_use]
    pub const fn with_client_type(mut self, client_type: ClientType, display_size: u32) -> Self {
        self.client_type = Some(client_type);
        self.display_size = display_size;
        self
    }

    /// Owning table; empty when the column is computed.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name as the engine reports it.
    #[must_use]
    pub fn engine_type(&self) -> &str {
        &self.engine_type
    }

    #[must_use]
    pub const fn client_type(&self) -> Option<ClientType> {
        self.client_type
    }

    #[must_use]
    pub const fn display_size(&self) -> u32 {
        self.display_size
    }

    //
    // wire
    //

    pub fn write_wire(&self, out: &mut WireWriter) {
        out.write_string(&self.table);
        out.write_string(&self.name);
        out.write_string(&self.engine_type);

        match self.client_type {
            Some(client_type) => {
                out.write_bool(true);
                out.write_zint(client_type.code());
                out.write_vint(self.display_size);
            }
            None => out.write_bool(false),
        }
    }

    pub fn read_wire(input: &mut WireReader<'_>) -> Result<Self, ColumnError> {
        let table = input.read_string()?;
        let name = input.read_string()?;
        let engine_type = input.read_string()?;

        let (client_type, display_size) = if input.read_bool()? {
            let client_type = ClientType::from_code(input.read_zint()?)?;
            (Some(client_type), input.read_vint()?)
        } else {
            (None, 0)
        };

        Ok(Self {
            table,
            name,
            engine_type,
            client_type,
            display_size,
        })
    }

    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = WireWriter::new();
        self.write_wire(&mut out);

        out.into_bytes()
    }

    /// Decode one descriptor; the buffer must hold exactly one.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, ColumnError> {
        let mut input = WireReader::new(bytes);
        let column = Self::read_wire(&mut input)?;
        input.finish()?;

        Ok(column)
    }

    //
    // declarative
    //

    pub fn to_json(&self) -> Result<JsonValue, ColumnError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: JsonValue) -> Result<Self, ColumnError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ColumnError> {
        Ok(serde_json::from_str(text)?)
    }
}

///
/// ColumnRepr
///
/// Declarative shape. Unknown keys are tolerated; `table` and the client
/// type pair are omitted when unset.
///

#[derive(Deserialize, Serialize)]
struct ColumnRepr {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    table: String,
    name: String,
    #[serde(rename = "type")]
    engine_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jdbc_type: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_size: Option<u32>,
}

impl TryFrom<ColumnRepr> for ColumnInfo {
    type Error = ColumnError;

    fn try_from(repr: ColumnRepr) -> Result<Self, Self::Error> {
        let client_type = repr.jdbc_type.map(ClientType::from_code).transpose()?;
        // display size is part of the client type pair; alone it is dropped
        let display_size = match client_type {
            Some(_) => repr.display_size.unwrap_or(0),
            None => 0,
        };

        Ok(Self {
            table: repr.table,
            name: repr.name,
            engine_type: repr.engine_type,
            client_type,
            display_size,
        })
    }
}

impl From<ColumnInfo> for ColumnRepr {
    fn from(column: ColumnInfo) -> Self {
        Self {
            table: column.table,
            name: column.name,
            engine_type: column.engine_type,
            jdbc_type: column.client_type.map(ClientType::code),
            display_size: column.client_type.map(|_| column.display_size),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_round_trip_keeps_every_field() {
        let column =
            ColumnInfo::new("t", "c", "long").with_client_type(ClientType::BigInt, 20);

        let decoded = ColumnInfo::from_wire(&column.to_wire()).expect("descriptor decodes");

        assert_eq!(decoded, column);
        assert_eq!(decoded.client_type(), Some(ClientType::BigInt));
        assert_eq!(decoded.display_size(), 20);
    }

    #[test]
    fn wire_without_client_type_is_a_single_false_flag() {
        let bytes = ColumnInfo::new("", "c2", "text").to_wire();

        assert_eq!(bytes, b"\x00\x02c2\x04text\x00".to_vec());
    }

    #[test]
    fn negative_codes_stay_short_on_the_wire() {
        let bytes = ColumnInfo::new("", "c", "long")
            .with_client_type(ClientType::BigInt, 20)
            .to_wire();

        // zig-zag(-5) = 9, then display size 20
        assert_eq!(&bytes[bytes.len() - 3..], &[1, 9, 20]);
    }

    #[test]
    fn unknown_wire_code_is_rejected() {
        let mut out = WireWriter::new();
        out.write_string("");
        out.write_string("c");
        out.write_string("long");
        out.write_bool(true);
        out.write_zint(4242);
        out.write_vint(1);

        assert_eq!(
            ColumnInfo::from_wire(out.as_bytes()),
            Err(ColumnError::UnknownClientType { code: 4242 })
        );
    }

    #[test]
    fn truncated_wire_input_fails() {
        let bytes = ColumnInfo::new("t", "c", "long").to_wire();

        assert!(matches!(
            ColumnInfo::from_wire(&bytes[..bytes.len() - 1]),
            Err(ColumnError::Wire(WireError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn declarative_form_omits_unset_fields() {
        let column = ColumnInfo::new("", "c2", "text");

        assert_eq!(
            column.to_json().expect("descriptor encodes"),
            json!({ "name": "c2", "type": "text" })
        );
    }

    #[test]
    fn declarative_form_emits_client_type_pair_together() {
        let column =
            ColumnInfo::new("t", "c", "long").with_client_type(ClientType::BigInt, 20);

        assert_eq!(
            column.to_json().expect("descriptor encodes"),
            json!({ "table": "t", "name": "c", "type": "long", "jdbc_type": -5, "display_size": 20 })
        );
    }

    #[test]
    fn declarative_decoding_defaults_and_tolerates_unknown_keys() {
        let column = ColumnInfo::from_json(json!({
            "name": "c",
            "type": "long",
            "jdbc_type": -5,
            "extra": true
        }))
        .expect("descriptor decodes");

        assert_eq!(column.table(), "");
        assert_eq!(column.client_type(), Some(ClientType::BigInt));
        assert_eq!(column.display_size(), 0);
    }

    #[test]
    fn declarative_decoding_requires_name_and_type() {
        assert!(matches!(
            ColumnInfo::from_json_str(r#"{"type":"long"}"#),
            Err(ColumnError::Declarative { .. })
        ));
    }

    #[test]
    fn declarative_decoding_rejects_unknown_codes() {
        assert!(ColumnInfo::from_json(json!({ "name": "c", "type": "x", "jdbc_type": 4242 })).is_err());
    }
}
