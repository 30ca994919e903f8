//! Per-call resolution options.

use super::conditions::Conditions;
use super::target::{Target, TargetMap};
use crate::error::Error;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Default scheme prefix for builtin candidates.
pub const DEFAULT_BUILTIN_PROTOCOL: &str = "builtin:";

/// Options for one resolution.
///
/// Loadable from JSON with camelCase keys; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveOptions {
    /// Prefix for builtin candidates.
    pub builtin_protocol: String,

    /// Builtin target trees whose leaves are `name[@version]`.
    pub builtins: Vec<Target>,

    /// Active conditions: a flat list in priority order, or a list of such
    /// sets evaluated one after another. `default` always matches.
    pub conditions: Conditions,

    /// Supplied engine versions, checked against `engines` in descriptors.
    pub engines: BTreeMap<String, String>,

    /// Suffixes tried after the literal file name.
    pub extensions: Vec<String>,

    /// Import map consulted before any package scope.
    pub imports: Option<TargetMap>,

    /// Import maps keyed by parent URL, consulted before anything else.
    pub resolutions: BTreeMap<String, TargetMap>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            builtin_protocol: DEFAULT_BUILTIN_PROTOCOL.to_string(),
            builtins: Vec::new(),
            conditions: Conditions::default(),
            engines: BTreeMap::new(),
            extensions: Vec::new(),
            imports: None,
            resolutions: BTreeMap::new(),
        }
    }
}

impl ResolveOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::OptionsRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| Error::OptionsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn with_builtin_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.builtin_protocol = protocol.into();
        self
    }

    #[must_use]
    pub fn with_builtins<I, T>(mut self, builtins: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        self.builtins = builtins.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = Conditions::flat(conditions);
        self
    }

    /// Evaluate conditional targets once per set, in order.
    #[must_use]
    pub fn with_condition_sets<I, J, S>(mut self, sets: I) -> Self
    where
        I: IntoIterator<Item = J>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = Conditions::sets(sets);
        self
    }

    /// Supply a version for one engine.
    #[must_use]
    pub fn with_engine(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.engines.insert(name.into(), version.into());
        self
    }

    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_imports(mut self, imports: TargetMap) -> Self {
        self.imports = Some(imports);
        self
    }

    /// Add an import map used when resolving from `parent_url`.
    #[must_use]
    pub fn with_resolution(mut self, parent_url: impl Into<String>, map: TargetMap) -> Self {
        self.resolutions.insert(parent_url.into(), map);
        self
    }
}
