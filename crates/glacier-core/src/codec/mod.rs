pub mod json;
pub mod wire;

#[cfg(test)]
mod tests;

use crate::{
    codec::{
        json::{BOOST_KEY, NAME_KEY, ParseError, boost_to_json, parse_node},
        wire::{WireError, WireReader, WireWriter},
    },
    node::QueryNode,
    obs::sink::{CodecFormat, QueryEvent, record},
    registry::node_registry,
};
use serde_json::{Map, Value as JsonValue};

///
/// Query Codecs
///
/// Entry points for the two serialized forms of a query node.
///
/// - declarative: `{ "<type>": { <fields>, "boost"?, "_name"? } }`
/// - wire: type id string, variant body, then the boost/name tail for
///   variants that carry them
///
/// Variant-specific field layout lives with each variant in `crate::node`.
///

/// Encode a node to its declarative value.
#[must_use]
pub fn to_json(node: &QueryNode) -> JsonValue {
    let mut body = Map::new();
    node.write_json_body(&mut body);

    if node.supports_boost_and_name() {
        if !node.boost().is_default() {
            body.insert(BOOST_KEY.to_string(), boost_to_json(node.boost()));
        }
        if let Some(name) = node.name() {
            body.insert(NAME_KEY.to_string(), JsonValue::String(name.to_string()));
        }
    }

    let mut outer = Map::new();
    outer.insert(node.type_id().to_string(), JsonValue::Object(body));
    record(QueryEvent::Encoded {
        format: CodecFormat::Declarative,
        kind: node.kind(),
    });

    JsonValue::Object(outer)
}

/// Encode a node to compact declarative text.
#[must_use]
pub fn to_json_string(node: &QueryNode) -> String {
    to_json(node).to_string()
}

/// Decode a node from its declarative value.
pub fn from_json(value: &JsonValue) -> Result<QueryNode, ParseError> {
    let result = parse_node(value, "", 0);
    match &result {
        Ok(node) => record(QueryEvent::Decoded {
            format: CodecFormat::Declarative,
            kind: node.kind(),
        }),
        Err(err) => {
            tracing::debug!(path = err.path(), error = %err, "declarative decode failed");
            record(QueryEvent::DecodeFailed {
                format: CodecFormat::Declarative,
            });
        }
    }

    result
}

/// Decode a node from declarative text.
pub fn from_json_str(text: &str) -> Result<QueryNode, ParseError> {
    let value: JsonValue = serde_json::from_str(text).map_err(|err| ParseError::Malformed {
        message: err.to_string(),
    })?;

    from_json(&value)
}

/// Encode a node to wire bytes.
#[must_use]
pub fn to_wire(node: &QueryNode) -> Vec<u8> {
    let mut out = WireWriter::new();
    write_node(&mut out, node);
    record(QueryEvent::Encoded {
        format: CodecFormat::Wire,
        kind: node.kind(),
    });

    out.into_bytes()
}

/// Decode a node from wire bytes; the buffer must hold exactly one node.
pub fn from_wire(bytes: &[u8]) -> Result<QueryNode, WireError> {
    let mut input = WireReader::new(bytes);
    let result = read_node(&mut input).and_then(|node| input.finish().map(|()| node));

    match &result {
        Ok(node) => record(QueryEvent::Decoded {
            format: CodecFormat::Wire,
            kind: node.kind(),
        }),
        Err(err) => {
            if err.is_fatal() {
                tracing::warn!(offset = input.position(), error = %err, "wire decode aborted");
            }
            record(QueryEvent::DecodeFailed {
                format: CodecFormat::Wire,
            });
        }
    }

    result
}

/// Write one node (type id, body, boost/name tail) into an open stream.
pub fn write_node(out: &mut WireWriter, node: &QueryNode) {
    out.write_string(node.type_id());
    node.write_wire_body(out);

    if node.supports_boost_and_name() {
        out.write_boost(node.boost());
        out.write_optional_string(node.name());
    }
}

/// Read one node from an open stream, dispatching through the registry.
///
/// An unregistered type id aborts the decode; the stream position is then
/// meaningless and must not be reused.
pub fn read_node(input: &mut WireReader<'_>) -> Result<QueryNode, WireError> {
    let type_id = input.read_string()?;
    let decoders = node_registry()
        .lookup(&type_id)
        .ok_or(WireError::UnknownNodeType { type_id })?;

    input.enter()?;
    let node = (decoders.wire)(input);
    input.exit();

    node
}
