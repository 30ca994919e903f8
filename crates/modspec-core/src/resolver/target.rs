//! Package target trees.
//!
//! `exports`, `imports`, override maps and builtin lists all share one
//! recursive shape: a string leaf, an ordered list, or an ordered map whose
//! keys are conditions (or, at the top of `exports`/`imports`, subpaths).

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;

/// A target tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `"./dist/index.js"`
    Leaf(String),
    /// `["./a.js", "./b.js"]`, tried in order.
    List(Vec<Target>),
    /// `{ "import": ..., "default": ... }`, tried in declared order.
    Conditional(TargetMap),
}

impl Target {
    /// The empty target. `null` in JSON deserializes to this.
    #[must_use]
    pub fn none() -> Self {
        Self::List(Vec::new())
    }

    /// Build a leaf.
    pub fn leaf(s: impl Into<String>) -> Self {
        Self::Leaf(s.into())
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Self::Leaf(s.to_string())
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Self::Leaf(s)
    }
}

impl From<TargetMap> for Target {
    fn from(map: TargetMap) -> Self {
        Self::Conditional(map)
    }
}

/// An insertion-ordered map from key to target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetMap {
    entries: Vec<(String, Target)>,
}

impl TargetMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, target: impl Into<Target>) {
        let key = key.into();
        let target = target.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = target;
        } else {
            self.entries.push((key, target));
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, target: impl Into<Target>) -> Self {
        self.insert(key, target);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Target> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, target)| target)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Target)> {
        self.entries.iter().map(|(k, target)| (k.as_str(), target))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, T: Into<Target>> FromIterator<(K, T)> for TargetMap {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, target) in iter {
            map.insert(key, target);
        }
        map
    }
}

/// How an `exports` field is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportsField<'a> {
    /// Every key starts with `.`: a map from subpath to target.
    Subpaths(&'a TargetMap),
    /// A string, a list, or a map with no `.` keys: the main export itself.
    Main(&'a Target),
    /// Some keys start with `.` and some do not.
    Mixed,
}

impl<'a> ExportsField<'a> {
    /// Classify an `exports` value once, before matching.
    #[must_use]
    pub fn classify(exports: &'a Target) -> Self {
        let Target::Conditional(map) = exports else {
            return Self::Main(exports);
        };

        let dotted = map.keys().filter(|k| k.starts_with('.')).count();
        if dotted == 0 {
            Self::Main(exports)
        } else if dotted == map.len() {
            Self::Subpaths(map)
        } else {
            Self::Mixed
        }
    }

    /// The target for the `.` subpath, if any.
    #[must_use]
    pub fn main(&self) -> Option<&'a Target> {
        match self {
            Self::Main(target) => Some(target),
            Self::Subpaths(map) => map.get("."),
            Self::Mixed => None,
        }
    }
}

/// Whether a conditional key would alias an array index.
#[must_use]
pub fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

struct TargetVisitor;

impl<'de> Visitor<'de> for TargetVisitor {
    type Value = Target;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, an array, an object or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Target, E> {
        Ok(Target::Leaf(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Target, E> {
        Ok(Target::Leaf(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Target, E> {
        Ok(Target::none())
    }

    fn visit_none<E: de::Error>(self) -> Result<Target, E> {
        Ok(Target::none())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Target, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Target, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Target>()? {
            items.push(item);
        }
        Ok(Target::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Target, A::Error> {
        TargetMapVisitor.visit_map(map).map(Target::Conditional)
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TargetVisitor)
    }
}

struct TargetMapVisitor;

impl<'de> Visitor<'de> for TargetMapVisitor {
    type Value = TargetMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of targets")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TargetMap, A::Error> {
        let mut map = TargetMap::new();
        while let Some((key, target)) = access.next_entry::<String, Target>()? {
            map.insert(key, target);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for TargetMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TargetMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target(value: serde_json::Value) -> Target {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_deserialize_shapes() {
        assert_eq!(target(json!("./e.js")), Target::leaf("./e.js"));
        assert_eq!(
            target(json!(["./a.js", null])),
            Target::List(vec![Target::leaf("./a.js"), Target::none()])
        );
        assert_eq!(target(json!(null)), Target::none());
    }

    #[test]
    fn test_deserialize_preserves_order() {
        let t: Target =
            serde_json::from_str(r#"{"require": "./e.cjs", "import": "./e.mjs", "default": "./e.js"}"#)
                .unwrap();
        let Target::Conditional(map) = t else {
            panic!("expected conditional");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["require", "import", "default"]);
    }

    #[test]
    fn test_deserialize_rejects_scalars() {
        assert!(serde_json::from_value::<Target>(json!(1)).is_err());
        assert!(serde_json::from_value::<Target>(json!(true)).is_err());
    }

    #[test]
    fn test_classify_exports() {
        let main = target(json!("./e.js"));
        assert_eq!(ExportsField::classify(&main).main(), Some(&main));

        let list = target(json!(["./e.js"]));
        assert!(matches!(ExportsField::classify(&list), ExportsField::Main(_)));

        let conditions = target(json!({ "import": "./e.mjs", "default": "./e.js" }));
        assert!(matches!(ExportsField::classify(&conditions), ExportsField::Main(_)));

        let subpaths = target(json!({ ".": "./e.js", "./f": "./f.js" }));
        let field = ExportsField::classify(&subpaths);
        assert!(matches!(field, ExportsField::Subpaths(_)));
        assert_eq!(field.main(), Some(&Target::leaf("./e.js")));

        let no_main = target(json!({ "./f": "./f.js" }));
        assert_eq!(ExportsField::classify(&no_main).main(), None);

        let mixed = target(json!({ ".": "./e.js", "import": "./e.mjs" }));
        assert_eq!(ExportsField::classify(&mixed), ExportsField::Mixed);
        assert_eq!(ExportsField::classify(&mixed).main(), None);
    }

    #[test]
    fn test_numeric_key() {
        assert!(is_numeric_key("0"));
        assert!(is_numeric_key("12"));
        assert!(!is_numeric_key(""));
        assert!(!is_numeric_key("default"));
        assert!(!is_numeric_key("1a"));
    }

    #[test]
    fn test_map_insert_keeps_position() {
        let map = TargetMap::new()
            .with("a", "./a.js")
            .with("b", "./b.js")
            .with("a", "./c.js");
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&Target::leaf("./c.js")));
    }
}
