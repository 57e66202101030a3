use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One entry of the `GET /hardware` response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HardwareOption {
    pub provider: String,
    pub instance: String,
    pub cpu: u32,
    pub memory: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Default)]
pub struct HardwareSpecs {
    pub cpu: u32,
    // GiB
    pub memory: f64,
}

/// Hardware options grouped by provider, then by instance name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HardwareCatalog {
    providers: BTreeMap<String, BTreeMap<String, HardwareSpecs>>,
}

impl HardwareCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a flat option list into the nested catalog. A repeated
    /// `(provider, instance)` pair overwrites the earlier entry.
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = HardwareOption>,
    {
        let mut catalog = Self::new();
        for option in options {
            catalog.insert(option);
        }
        catalog
    }

    pub fn insert(&mut self, option: HardwareOption) {
        self.providers.entry(option.provider).or_default().insert(
            option.instance,
            HardwareSpecs {
                cpu: option.cpu,
                memory: option.memory,
            },
        );
    }

    pub fn specs(&self, provider: &str, instance: &str) -> Option<&HardwareSpecs> {
        self.providers.get(provider)?.get(instance)
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn instances(&self, provider: &str) -> impl Iterator<Item = (&str, &HardwareSpecs)> {
        self.providers
            .get(provider)
            .into_iter()
            .flat_map(|instances| instances.iter().map(|(name, specs)| (name.as_str(), specs)))
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Total number of `(provider, instance)` pairs.
    pub fn len(&self) -> usize {
        self.providers.values().map(BTreeMap::len).sum()
    }
}

impl FromIterator<HardwareOption> for HardwareCatalog {
    fn from_iter<T: IntoIterator<Item = HardwareOption>>(iter: T) -> Self {
        Self::from_options(iter)
    }
}

/// Outcome of the one-shot catalog fetch.
///
/// A failed load is kept apart from a successful load that returned no
/// hardware so callers can tell "nothing configured" from "could not reach
/// the service".
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogLoad {
    Loaded(HardwareCatalog),
    Failed(String),
}

impl CatalogLoad {
    pub fn catalog(&self) -> Option<&HardwareCatalog> {
        match self {
            CatalogLoad::Loaded(catalog) => Some(catalog),
            CatalogLoad::Failed(_) => None,
        }
    }
}

impl fmt::Display for CatalogLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogLoad::Loaded(catalog) => {
                write!(f, "loaded {} hardware targets", catalog.len())
            }
            CatalogLoad::Failed(reason) => write!(f, "failed to load hardware: {reason}"),
        }
    }
}
