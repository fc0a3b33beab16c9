//! Binary wire streams.
//!
//! Format rules shared by every node and by the SQL column descriptor:
//! - required fields are written unconditionally, in a fixed order
//! - optional tails are a `bool` presence flag followed, only when `true`,
//!   by the dependent fields in a fixed order
//! - integers that are usually small use 7-bit variable-length groups
//!   (low-order group first, high bit set while more groups follow)
#![expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use crate::value::{Boost, FieldValue, Float64};
use thiserror::Error as ThisError;

/// Upper bound for one length-prefixed string or list on decode.
pub const MAX_WIRE_LEN: usize = 16 * 1024 * 1024;

/// Upper bound for nested node depth on decode.
pub const MAX_NESTING_DEPTH: usize = 64;

///
/// WireError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum WireError {
    #[error("unexpected end of stream at byte {offset}")]
    UnexpectedEof { offset: usize },

    #[error("invalid boolean byte {byte:#04x} at byte {offset}")]
    InvalidBool { byte: u8, offset: usize },

    #[error("invalid utf-8 string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("variable-length integer overflow at byte {offset}")]
    VarIntOverflow { offset: usize },

    #[error("invalid field value tag {tag} at byte {offset}")]
    InvalidValueTag { tag: u8, offset: usize },

    #[error("unknown query node type '{type_id}'")]
    UnknownNodeType { type_id: String },

    #[error("length {len} exceeds wire limit {max}")]
    LengthLimitExceeded { len: usize, max: usize },

    #[error("query nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },

    #[error("{remaining} trailing bytes after a complete value")]
    TrailingBytes { remaining: usize },

    #[error("invalid {what} at byte {offset}: {message}")]
    InvalidField {
        what: &'static str,
        offset: usize,
        message: String,
    },
}

impl WireError {
    /// Fatal errors leave the stream unpositioned; the caller must discard
    /// the cursor instead of resuming from it.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::TrailingBytes { .. })
    }
}

///
/// WireWriter
///

#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn write_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Unsigned 32-bit variable-length integer (1..=5 bytes).
    pub fn write_vint(&mut self, value: u32) {
        self.write_vlong(u64::from(value));
    }

    /// Unsigned 64-bit variable-length integer (1..=10 bytes).
    pub fn write_vlong(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Signed 32-bit integer, zig-zag folded then variable-length encoded.
    pub fn write_zint(&mut self, value: i32) {
        self.write_vint(((value << 1) ^ (value >> 31)) as u32);
    }

    /// Signed 64-bit integer, zig-zag folded then variable-length encoded.
    pub fn write_zlong(&mut self, value: i64) {
        self.write_vlong(((value << 1) ^ (value >> 63)) as u64);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_bits().to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_bits().to_be_bytes());
    }

    pub fn write_len(&mut self, len: usize) {
        self.write_vlong(len as u64);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn write_optional_string(&mut self, value: Option<&str>) {
        match value {
            Some(value) => {
                self.write_bool(true);
                self.write_string(value);
            }
            None => self.write_bool(false),
        }
    }

    pub fn write_string_list(&mut self, values: &[String]) {
        self.write_len(values.len());
        for value in values {
            self.write_string(value);
        }
    }

    // signed zero is folded so equal values encode identically
    pub fn write_boost(&mut self, boost: Boost) {
        let value = boost.get();
        self.write_f32(if value == 0.0 { 0.0 } else { value });
    }

    pub fn write_field_value(&mut self, value: &FieldValue) {
        self.write_u8(value.tag());
        match value {
            FieldValue::Text(v) => self.write_string(v),
            FieldValue::Int(v) => self.write_zlong(*v),
            FieldValue::Double(v) => {
                let value = v.get();
                self.write_f64(if value == 0.0 { 0.0 } else { value });
            }
            FieldValue::Bool(v) => self.write_bool(*v),
        }
    }

    pub fn write_optional_field_value(&mut self, value: Option<&FieldValue>) {
        match value {
            Some(value) => {
                self.write_bool(true);
                self.write_field_value(value);
            }
            None => self.write_bool(false),
        }
    }
}

///
/// WireReader
///
/// Cursor over an encoded buffer. Tracks node nesting depth so recursive
/// decoders stay bounded on untrusted input.
///

#[derive(Debug)]
pub struct WireReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> WireReader<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            depth: 0,
        }
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Require that the whole buffer has been consumed.
    pub const fn finish(&self) -> Result<(), WireError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(WireError::TrailingBytes { remaining }),
        }
    }

    pub(crate) const fn enter(&mut self) -> Result<(), WireError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(WireError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;

        Ok(())
    }

    pub(crate) const fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::UnexpectedEof {
                offset: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;

        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);

        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        let offset = self.pos;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(WireError::InvalidBool { byte, offset }),
        }
    }

    pub fn read_vint(&mut self) -> Result<u32, WireError> {
        let offset = self.pos;
        let value = self.read_varint(5)?;

        u32::try_from(value).map_err(|_| WireError::VarIntOverflow { offset })
    }

    pub fn read_vlong(&mut self) -> Result<u64, WireError> {
        self.read_varint(10)
    }

    fn read_varint(&mut self, max_bytes: u32) -> Result<u64, WireError> {
        let offset = self.pos;
        let mut value = 0u64;

        for i in 0..max_bytes {
            let byte = self.read_u8()?;
            let bits = u64::from(byte & 0x7f);
            let shift = 7 * i;
            if shift == 63 && bits > 1 {
                return Err(WireError::VarIntOverflow { offset });
            }
            value |= bits << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(WireError::VarIntOverflow { offset })
    }

    pub fn read_zint(&mut self) -> Result<i32, WireError> {
        let raw = self.read_vint()?;

        Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
    }

    pub fn read_zlong(&mut self) -> Result<i64, WireError> {
        let raw = self.read_vlong()?;

        Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
    }

    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        Ok(f32::from_bits(u32::from_be_bytes(self.take_array()?)))
    }

    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.take_array()?)))
    }

    pub fn read_len(&mut self) -> Result<usize, WireError> {
        let raw = self.read_vlong()?;
        let len = usize::try_from(raw).unwrap_or(usize::MAX);
        if len > MAX_WIRE_LEN {
            return Err(WireError::LengthLimitExceeded {
                len,
                max: MAX_WIRE_LEN,
            });
        }

        Ok(len)
    }

    pub fn read_string(&mut self) -> Result<String, WireError> {
        let len = self.read_len()?;
        let offset = self.pos;
        let bytes = self.take(len)?;

        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| WireError::InvalidUtf8 { offset })
    }

    pub fn read_optional_string(&mut self) -> Result<Option<String>, WireError> {
        if self.read_bool()? {
            self.read_string().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_string_list(&mut self) -> Result<Vec<String>, WireError> {
        let len = self.read_len()?;
        // Cap the pre-allocation; every entry consumes at least one byte.
        let mut out = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            out.push(self.read_string()?);
        }

        Ok(out)
    }

    pub fn read_boost(&mut self) -> Result<Boost, WireError> {
        self.read_f32().map(Boost::from_raw)
    }

    pub fn read_field_value(&mut self) -> Result<FieldValue, WireError> {
        let offset = self.pos;
        match self.read_u8()? {
            0 => self.read_string().map(FieldValue::Text),
            1 => self.read_zlong().map(FieldValue::Int),
            2 => self.read_f64().map(|v| FieldValue::Double(Float64::new(v))),
            3 => self.read_bool().map(FieldValue::Bool),
            tag => Err(WireError::InvalidValueTag { tag, offset }),
        }
    }

    pub fn read_optional_field_value(&mut self) -> Result<Option<FieldValue>, WireError> {
        if self.read_bool()? {
            self.read_field_value().map(Some)
        } else {
            Ok(None)
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::{MAX_NESTING_DEPTH, WireError, WireReader, WireWriter};
    use crate::value::FieldValue;

    #[test]
    fn vint_uses_seven_bit_groups_low_order_first() {
        let mut out = WireWriter::new();
        out.write_vint(300);
        assert_eq!(out.as_bytes(), &[0xac, 0x02]);

        let mut input = WireReader::new(out.as_bytes());
        assert_eq!(input.read_vint().expect("vint"), 300);
        input.finish().expect("fully consumed");
    }

    #[test]
    fn zig_zag_keeps_small_negative_values_short() {
        let mut out = WireWriter::new();
        out.write_zint(-5);
        assert_eq!(out.as_bytes(), &[9]);

        let mut input = WireReader::new(out.as_bytes());
        assert_eq!(input.read_zint().expect("zint"), -5);
    }

    #[test]
    fn zlong_extremes_round_trip() {
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            let mut out = WireWriter::new();
            out.write_zlong(value);
            let mut input = WireReader::new(out.as_bytes());
            assert_eq!(input.read_zlong().expect("zlong"), value);
            input.finish().expect("fully consumed");
        }
    }

    #[test]
    fn vint_rejects_values_wider_than_32_bits() {
        let mut out = WireWriter::new();
        out.write_vlong(u64::from(u32::MAX) + 1);

        let mut input = WireReader::new(out.as_bytes());
        assert!(matches!(
            input.read_vint(),
            Err(WireError::VarIntOverflow { offset: 0 })
        ));
    }

    #[test]
    fn bool_rejects_bytes_other_than_zero_and_one() {
        let mut input = WireReader::new(&[2]);
        assert_eq!(
            input.read_bool(),
            Err(WireError::InvalidBool { byte: 2, offset: 0 })
        );
    }

    #[test]
    fn truncated_string_reports_eof() {
        let mut out = WireWriter::new();
        out.write_string("hello");
        let bytes = &out.as_bytes()[..3];

        let mut input = WireReader::new(bytes);
        assert!(matches!(
            input.read_string(),
            Err(WireError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn invalid_value_tag_is_reported_with_offset() {
        let mut input = WireReader::new(&[9]);
        assert_eq!(
            input.read_field_value(),
            Err(WireError::InvalidValueTag { tag: 9, offset: 0 })
        );
    }

    #[test]
    fn optional_field_value_absent_is_a_single_false_byte() {
        let mut out = WireWriter::new();
        out.write_optional_field_value(None);
        out.write_optional_field_value(Some(&FieldValue::Int(-3)));
        assert_eq!(out.as_bytes()[0], 0);

        let mut input = WireReader::new(out.as_bytes());
        assert_eq!(input.read_optional_field_value().expect("absent"), None);
        assert_eq!(
            input.read_optional_field_value().expect("present"),
            Some(FieldValue::Int(-3))
        );
    }

    #[test]
    fn nesting_guard_trips_at_limit() {
        let mut input = WireReader::new(&[]);
        for _ in 0..MAX_NESTING_DEPTH {
            input.enter().expect("within limit");
        }
        assert_eq!(
            input.enter(),
            Err(WireError::NestingTooDeep {
                max: MAX_NESTING_DEPTH
            })
        );
    }
}
