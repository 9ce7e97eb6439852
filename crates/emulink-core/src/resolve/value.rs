use crate::error::{Error, Result};
use crate::model::ValueType;

fn word<const N: usize>(data: &[u8]) -> Option<[u8; N]> {
    data.get(..N)?.try_into().ok()
}

/// Decode raw bytes per the declared type.
///
/// Short buffers and `ValueType::Unknown` decode to zero.
pub fn decode_value(data: &[u8], value_type: ValueType) -> f64 {
    let decoded = match value_type {
        ValueType::U8 => data.first().map(|&b| b as f64),
        ValueType::U16Be => word(data).map(|w| u16::from_be_bytes(w) as f64),
        ValueType::U16Le => word(data).map(|w| u16::from_le_bytes(w) as f64),
        ValueType::U32Be => word(data).map(|w| u32::from_be_bytes(w) as f64),
        ValueType::U32Le => word(data).map(|w| u32::from_le_bytes(w) as f64),
        ValueType::FloatBe => word(data).map(|w| f32::from_be_bytes(w) as f64),
        ValueType::FloatLe => word(data).map(|w| f32::from_le_bytes(w) as f64),
        ValueType::Unknown => None,
    };
    decoded.unwrap_or(0.0)
}

/// Encode an integer at 1, 2 or 4 bytes, truncating to the target width.
pub fn encode_value(value: i32, size: usize, little_endian: bool) -> Result<Vec<u8>> {
    let bytes = match (size, little_endian) {
        (1, _) => vec![value as u8],
        (2, true) => (value as u16).to_le_bytes().to_vec(),
        (2, false) => (value as u16).to_be_bytes().to_vec(),
        (4, true) => value.to_le_bytes().to_vec(),
        (4, false) => value.to_be_bytes().to_vec(),
        _ => {
            return Err(Error::invalid(format!(
                "cannot encode a value at {} bytes (expected 1, 2 or 4)",
                size
            )));
        }
    };
    Ok(bytes)
}
