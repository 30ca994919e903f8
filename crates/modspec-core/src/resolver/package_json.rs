//! Package descriptor (`package.json`) fields used by resolution.

use super::target::{Target, TargetMap};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// The subset of `package.json` the resolver reads.
///
/// Fields of an unexpected type are treated as absent instead of failing the
/// whole descriptor, matching how loaders ignore them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageJson {
    #[serde(default, deserialize_with = "string_or_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "string_or_none")]
    pub main: Option<String>,

    #[serde(default)]
    pub exports: Option<Target>,

    #[serde(default, deserialize_with = "map_or_none")]
    pub imports: Option<TargetMap>,

    #[serde(default, deserialize_with = "engines_or_none")]
    pub engines: Option<BTreeMap<String, String>>,
}

impl PackageJson {
    /// Parse a descriptor from JSON text.
    ///
    /// # Errors
    /// Returns an error if the text is not JSON or `exports` is malformed.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Build a descriptor from an already parsed JSON value.
    ///
    /// # Errors
    /// Returns an error if `exports` is malformed.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// The `main` field, if it names something.
    #[must_use]
    pub fn main(&self) -> Option<&str> {
        self.main.as_deref().filter(|main| !main.is_empty())
    }
}

/// Read and parse a `package.json` from disk.
///
/// Returns None if the file doesn't exist or is invalid JSON.
#[must_use]
pub fn read_package_json(path: &Path) -> Option<PackageJson> {
    let content = std::fs::read_to_string(path).ok()?;
    PackageJson::parse(&content).ok()
}

fn string_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn map_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<TargetMap>, D::Error> {
    match Option::<Target>::deserialize(deserializer) {
        Ok(Some(Target::Conditional(map))) => Ok(Some(map)),
        Ok(_) | Err(_) => Ok(None),
    }
}

fn engines_or_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, String>>, D::Error> {
    let Value::Object(obj) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };

    Ok(Some(
        obj.into_iter()
            .filter_map(|(engine, range)| match range {
                Value::String(range) => Some((engine, range)),
                _ => None,
            })
            .collect(),
    ))
}
