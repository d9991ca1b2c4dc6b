//! Located parameter descriptors.
//!
//! Every parameter carries the shared capability set {name, type, class,
//! size, location, direction}; variants add their extensions (pointer
//! target, array element, record fields, enum constants). The JSON shape
//! is dictated by this sum: serialization is untagged, deserialization
//! re-dispatches on the embedded `class` string.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A function with its located parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// A global variable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(deserialize_with = "size_from_int_or_string")]
    pub size: i64,
    #[serde(default)]
    pub direction: String,
}

/// The parameter sum. Serialization is untagged: each variant writes its
/// own fields, and the `class` value identifies the variant on reload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Parameter {
    Pointer(PointerParameter),
    Array(ArrayParameter),
    Structure(StructureParameter),
    Enum(EnumParameter),
    Qualified(QualifiedParameter),
    Basic(BasicParameter),
}

impl Parameter {
    /// Parameter name from the shared capability set.
    pub fn name(&self) -> &str {
        match self {
            Self::Pointer(p) => &p.name,
            Self::Array(p) => &p.name,
            Self::Structure(p) => &p.name,
            Self::Enum(p) => &p.name,
            Self::Qualified(p) => &p.name,
            Self::Basic(p) => &p.name,
        }
    }

    /// Class tag from the shared capability set.
    pub fn class(&self) -> &str {
        match self {
            Self::Pointer(p) => &p.class,
            Self::Array(p) => &p.class,
            Self::Structure(p) => &p.class,
            Self::Enum(p) => &p.class,
            Self::Qualified(p) => &p.class,
            Self::Basic(p) => &p.class,
        }
    }

    /// Size in bytes from the shared capability set.
    pub fn size(&self) -> i64 {
        match self {
            Self::Pointer(p) => p.size,
            Self::Array(p) => p.size,
            Self::Structure(p) => p.size,
            Self::Enum(p) => p.size,
            Self::Qualified(p) => p.size,
            Self::Basic(p) => p.size,
        }
    }

    /// ABI location from the shared capability set.
    pub fn location(&self) -> &str {
        match self {
            Self::Pointer(p) => &p.location,
            Self::Array(p) => &p.location,
            Self::Structure(p) => &p.location,
            Self::Enum(p) => &p.location,
            Self::Qualified(p) => &p.location,
            Self::Basic(p) => &p.location,
        }
    }

    /// Sets the ABI location (used for top-level components only).
    pub fn set_location(&mut self, location: String) {
        match self {
            Self::Pointer(p) => p.location = location,
            Self::Array(p) => p.location = location,
            Self::Structure(p) => p.location = location,
            Self::Enum(p) => p.location = location,
            Self::Qualified(p) => p.location = location,
            Self::Basic(p) => p.location = location,
        }
    }

    /// Sets the direction (used for top-level components only).
    pub fn set_direction(&mut self, direction: String) {
        match self {
            Self::Pointer(p) => p.direction = direction,
            Self::Array(p) => p.direction = direction,
            Self::Structure(p) => p.direction = direction,
            Self::Enum(p) => p.direction = direction,
            Self::Qualified(p) => p.direction = direction,
            Self::Basic(p) => p.direction = direction,
        }
    }
}

/// A scalar or otherwise unstructured parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BasicParameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub class: String,
    #[serde(deserialize_with = "size_from_int_or_string", default)]
    pub size: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub direction: String,
}

/// A pointer parameter with its target description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerParameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    pub class: String,
    #[serde(deserialize_with = "size_from_int_or_string", default)]
    pub size: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub direction: String,
    /// The pointed-to description; absent when recursion was cut.
    pub underlying_type: Option<Box<Parameter>>,
    #[serde(default)]
    pub indirections: i64,
}

/// A fixed-size array parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayParameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    pub class: String,
    #[serde(deserialize_with = "size_from_int_or_string", default)]
    pub size: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub direction: String,
    /// Element count (-1 when the DWARF left the array incomplete).
    #[serde(default)]
    pub count: i64,
    /// Element description.
    pub items_type: Option<Box<Parameter>>,
}

/// A struct, union, or class parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureParameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    pub class: String,
    #[serde(deserialize_with = "size_from_int_or_string", default)]
    pub size: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub fields: Vec<Parameter>,
}

/// An enumeration parameter with its constant table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumParameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    pub class: String,
    #[serde(deserialize_with = "size_from_int_or_string", default)]
    pub size: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub constants: BTreeMap<String, i64>,
}

/// A qualified (const/volatile/restrict/packed) parameter, collapsed to
/// its inner type's size and name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualifiedParameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    pub class: String,
    #[serde(deserialize_with = "size_from_int_or_string", default)]
    pub size: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub direction: String,
}

impl<'de> Deserialize<'de> for Parameter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let class = value
            .get("class")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let parameter = match class.as_str() {
            "Pointer" => Parameter::Pointer(
                serde_json::from_value(value).map_err(de::Error::custom)?,
            ),
            "Array" => Parameter::Array(
                serde_json::from_value(value).map_err(de::Error::custom)?,
            ),
            "Struct" | "Union" | "Class" | "Structure" => Parameter::Structure(
                serde_json::from_value(value).map_err(de::Error::custom)?,
            ),
            "Enum" => Parameter::Enum(
                serde_json::from_value(value).map_err(de::Error::custom)?,
            ),
            "Qualified" => Parameter::Qualified(
                serde_json::from_value(value).map_err(de::Error::custom)?,
            ),
            _ => Parameter::Basic(
                serde_json::from_value(value).map_err(de::Error::custom)?,
            ),
        };
        Ok(parameter)
    }
}

/// Sizes were historically emitted as decimal strings; accept both forms
/// and fail loudly on malformed digits.
fn size_from_int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct SizeVisitor;

    impl de::Visitor<'_> for SizeVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a decimal string")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
            i64::try_from(value).map_err(|_| E::custom("size out of range"))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
            Ok(value as i64)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
            value
                .parse::<i64>()
                .map_err(|_| E::custom(format!("malformed size string {value:?}")))
        }
    }

    deserializer.deserialize_any(SizeVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_round_trips() {
        let parameter = Parameter::Basic(BasicParameter {
            name: "a".into(),
            type_name: "int".into(),
            class: "Int".into(),
            size: 4,
            location: "%rdi".into(),
            direction: "import".into(),
        });
        let json = serde_json::to_string(&parameter).unwrap();
        let back: Parameter = serde_json::from_str(&json).unwrap();
        assert_eq!(parameter, back);
    }

    #[test]
    fn class_field_selects_the_variant() {
        let json = r#"{
            "name": "p", "type": "char", "class": "Pointer", "size": 8,
            "location": "%rdi", "direction": "import",
            "underlying_type": {"name": "", "type": "char", "class": "Char", "size": 1,
                                "location": "", "direction": ""},
            "indirections": 1
        }"#;
        let parameter: Parameter = serde_json::from_str(json).unwrap();
        let Parameter::Pointer(pointer) = parameter else {
            panic!("expected pointer variant");
        };
        assert_eq!(pointer.indirections, 1);
        let underlying = pointer.underlying_type.unwrap();
        assert_eq!(underlying.class(), "Char");
        assert_eq!(underlying.size(), 1);
    }

    #[test]
    fn string_sizes_are_coerced() {
        let json = r#"{"name": "x", "type": "int", "class": "Int", "size": "42",
                       "location": "", "direction": ""}"#;
        let parameter: Parameter = serde_json::from_str(json).unwrap();
        assert_eq!(parameter.size(), 42);
    }

    #[test]
    fn malformed_size_digits_are_fatal() {
        let json = r#"{"name": "x", "type": "int", "class": "Int", "size": "4x",
                       "location": "", "direction": ""}"#;
        assert!(serde_json::from_str::<Parameter>(json).is_err());
    }

    #[test]
    fn union_class_reloads_as_structure() {
        let json = r#"{"name": "u", "type": "U", "class": "Union", "size": 8,
                       "location": "none", "direction": "import", "fields": []}"#;
        let parameter: Parameter = serde_json::from_str(json).unwrap();
        assert!(matches!(parameter, Parameter::Structure(_)));
    }

    #[test]
    fn qualified_survives_the_round_trip() {
        let parameter = Parameter::Qualified(QualifiedParameter {
            name: "q".into(),
            type_name: "int".into(),
            class: "Qualified".into(),
            size: 4,
            location: "%rsi".into(),
            direction: "import".into(),
        });
        let json = serde_json::to_string(&parameter).unwrap();
        let back: Parameter = serde_json::from_str(&json).unwrap();
        assert_eq!(parameter, back);
    }
}
