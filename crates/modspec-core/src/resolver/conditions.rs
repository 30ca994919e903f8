//! Active conditions and conditional-map matching.

use super::target::{Target, TargetMap};
use serde::{Deserialize, Deserializer};

/// One or more condition sets, each in priority order.
///
/// A flat list is a single set. With several sets a conditional map is
/// evaluated once per set, in order, so one resolution can cover several
/// environments. `default` is selected by every set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditions {
    // Never empty.
    sets: Vec<Vec<String>>,
}

impl Default for Conditions {
    fn default() -> Self {
        Self {
            sets: vec![Vec::new()],
        }
    }
}

impl Conditions {
    /// A single condition set.
    pub fn flat<I, S>(conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sets: vec![conditions.into_iter().map(Into::into).collect()],
        }
    }

    /// Several condition sets. No sets at all behaves like one empty set.
    pub fn sets<I, J, S>(sets: I) -> Self
    where
        I: IntoIterator<Item = J>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sets: Vec<Vec<String>> = sets
            .into_iter()
            .map(|set| set.into_iter().map(Into::into).collect())
            .collect();

        if sets.is_empty() {
            Self::default()
        } else {
            Self { sets }
        }
    }

    #[must_use]
    pub fn as_sets(&self) -> &[Vec<String>] {
        &self.sets
    }

    /// Whether no set names any condition.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(Vec::is_empty)
    }

    /// Append `conditions` to every set.
    pub fn extend<I, S>(&mut self, conditions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extra: Vec<String> = conditions.into_iter().map(Into::into).collect();
        for set in &mut self.sets {
            set.extend(extra.iter().cloned());
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConditionsRepr {
    Flat(Vec<String>),
    Sets(Vec<Vec<String>>),
}

impl<'de> Deserialize<'de> for Conditions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ConditionsRepr::deserialize(deserializer)? {
            ConditionsRepr::Flat(conditions) => Self::flat(conditions),
            ConditionsRepr::Sets(sets) => Self::sets(sets),
        })
    }
}

fn selects(set: &[String], key: &str) -> bool {
    key == "default" || set.iter().any(|c| c == key)
}

/// For each set in order, the first key of `map` that set selects.
///
/// Each match carries the set that chose it; the selected target is
/// evaluated under that set alone.
pub(crate) fn condition_matches<'a>(
    map: &'a TargetMap,
    sets: &'a [Vec<String>],
) -> impl Iterator<Item = (&'a str, &'a Target, &'a [Vec<String>])> + 'a {
    sets.iter().filter_map(move |set| {
        map.iter()
            .find(|(key, _)| selects(set, key))
            .map(|(key, target)| (key, target, std::slice::from_ref(set)))
    })
}
