use std::collections::HashMap;

use serde::Deserialize;

use crate::model::ValueType;

/// All readable and writable quantities for one game or game family.
///
/// Profiles are immutable once loaded; a profile change replaces the whole value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    pub id: String,
    pub name: String,
    /// Console tag the profile targets (`GCN`, `WII`, ...).
    #[serde(rename = "platform", default)]
    pub platform_tag: Option<String>,
    #[serde(default)]
    pub data_points: Vec<DataPoint>,
    #[serde(default)]
    pub macros: Vec<MacroConfig>,
}

impl ProfileConfig {
    pub fn point(&self, id: &str) -> Option<&DataPoint> {
        self.data_points.iter().find(|p| p.id == id)
    }

    pub fn macro_by_id(&self, id: &str) -> Option<&MacroConfig> {
        self.macros.iter().find(|m| m.id == id)
    }

    /// GameCube and Wii store pointers big-endian.
    pub fn big_endian_pointers(&self) -> bool {
        matches!(self.platform_tag.as_deref(), Some("GCN") | Some("WII"))
    }
}

/// One named, typed, addressable quantity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataPoint {
    pub id: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(rename = "size")]
    pub byte_size: usize,
    #[serde(default)]
    pub formula: Option<String>,
    /// Game key pattern (full ID, 4-char, 3-char or `default`) to hex address.
    #[serde(rename = "addresses", default)]
    pub static_addresses: HashMap<String, String>,
    /// Game key pattern to the hex address holding the base pointer.
    #[serde(rename = "pointer", default)]
    pub pointer_base: Option<HashMap<String, String>>,
    #[serde(rename = "offsets", default)]
    pub offset_chain: Option<Vec<String>>,
    /// Single-offset shorthand, used when `offsets` is absent.
    #[serde(default)]
    pub offset: Option<String>,
}

impl DataPoint {
    /// Offsets walked after the base pointer, `None` when the point declares none.
    pub fn offsets(&self) -> Option<Vec<&str>> {
        match (&self.offset_chain, &self.offset) {
            (Some(chain), _) => Some(chain.iter().map(String::as_str).collect()),
            (None, Some(single)) => Some(vec![single.as_str()]),
            (None, None) => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_base.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MacroConfig {
    pub id: String,
    #[serde(default)]
    pub steps: Vec<MacroStep>,
}

/// One macro step. A step without `varId`/`value` is a pure delay.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MacroStep {
    #[serde(rename = "varId", default)]
    pub target_var_id: Option<String>,
    /// Integer literal, or the id of a data point whose last raw value is written.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "delay", default)]
    pub delay_ms: Option<u64>,
}

/// Where a macro step takes the value it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroValue<'a> {
    Literal(i32),
    Reference(&'a str),
}

impl MacroStep {
    /// Target and value source for steps that write, `None` for pure delays.
    ///
    /// Values made only of digits and `-` are literals; a literal that does
    /// not fit an `i32` makes the step a no-op.
    pub fn write_target(&self) -> Option<(&str, MacroValue<'_>)> {
        let target = self.target_var_id.as_deref()?;
        let value = self.value.as_deref()?;

        let is_literal =
            !value.is_empty() && value.chars().all(|c| c.is_ascii_digit() || c == '-');
        if is_literal {
            let literal = value.parse().ok()?;
            Some((target, MacroValue::Literal(literal)))
        } else {
            Some((target, MacroValue::Reference(value)))
        }
    }
}
