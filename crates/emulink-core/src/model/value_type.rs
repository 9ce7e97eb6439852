use serde::Deserialize;
use strum::{Display, EnumString, IntoStaticStr};

/// Declared encoding of a data point's raw bytes.
///
/// Unrecognized type names deserialize to `Unknown`, which decodes to zero.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(from = "String")]
pub enum ValueType {
    #[strum(serialize = "u8")]
    U8,
    #[strum(serialize = "u16_be")]
    U16Be,
    #[strum(serialize = "u16_le")]
    U16Le,
    #[strum(serialize = "u32_be")]
    U32Be,
    #[strum(serialize = "u32_le")]
    U32Le,
    #[strum(serialize = "float_be")]
    FloatBe,
    #[strum(serialize = "float_le")]
    FloatLe,
    #[default]
    #[strum(serialize = "unknown")]
    Unknown,
}

impl From<String> for ValueType {
    fn from(name: String) -> Self {
        name.parse().unwrap_or(Self::Unknown)
    }
}

impl ValueType {
    /// Little-endian types; everything else is written big-endian.
    pub fn is_little_endian(&self) -> bool {
        matches!(self, Self::U16Le | Self::U32Le | Self::FloatLe)
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_types() {
        assert_eq!("u8".parse::<ValueType>().unwrap(), ValueType::U8);
        assert_eq!("u32_le".parse::<ValueType>().unwrap(), ValueType::U32Le);
        assert_eq!("float_be".parse::<ValueType>().unwrap(), ValueType::FloatBe);
    }

    #[test]
    fn test_unknown_type_from_json() {
        let value: ValueType = serde_json::from_str("\"s64_be\"").unwrap();
        assert_eq!(value, ValueType::Unknown);
    }

    #[test]
    fn test_endianness() {
        assert!(ValueType::U16Le.is_little_endian());
        assert!(!ValueType::U16Be.is_little_endian());
        assert!(!ValueType::U8.is_little_endian());
        assert_eq!(ValueType::FloatLe.as_str(), "float_le");
    }
}
