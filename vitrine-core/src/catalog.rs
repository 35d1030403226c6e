//! Label to product lookup.
//!
//! The catalog file is a JSON object mapping classifier labels to product
//! indices. Indices are non-negative integers. Any label, usually the idle
//! label, may instead carry the marker `"reset"` or `"idle"` to resolve idle:
//!
//! ```json
//! { "dermaCo": 0, "TheBodyShop": 1, "Welcome!": "reset" }
//! ```

use log::{debug, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::CatalogError;
use crate::label::DetectionLabel;

/// Stable ordinal used to fetch product content.
pub type ProductIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogEntry {
    Idle,
    Product(ProductIndex),
}

impl CatalogEntry {
    pub fn is_idle(&self) -> bool {
        matches!(self, CatalogEntry::Idle)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Index(serde_json::Number),
    Marker(String),
}

const IDLE_MARKERS: [&str; 2] = ["reset", "idle"];

fn product_index(number: &serde_json::Number) -> Result<ProductIndex, String> {
    if let Some(index) = number.as_u64() {
        return ProductIndex::try_from(index).map_err(|_| format!("product index {} is out of range", number));
    }
    if number.is_i64() {
        return Err(format!("product index {} is negative", number));
    }

    // Integers beyond u64 arrive here as floats.
    let value = number.as_f64().unwrap_or(f64::NAN);
    if value.fract() != 0.0 {
        Err(format!("product index {} is not a whole number", number))
    } else if value < 0.0 {
        Err(format!("product index {} is negative", number))
    } else if value >= u64::MAX as f64 {
        Err(format!("product index {} is out of range", number))
    } else {
        Err(format!("product index {} must be written without a decimal point", number))
    }
}

/// Immutable label lookup. Unknown labels resolve to [`CatalogEntry::Idle`].
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    idle_label: DetectionLabel,
    products: HashMap<DetectionLabel, ProductIndex>,
}

impl ProductCatalog {
    /// Build from label/index pairs. Used by tests and embedders that already
    /// hold the mapping in memory.
    pub fn from_pairs<I, L>(idle_label: impl Into<DetectionLabel>, pairs: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (L, ProductIndex)>,
        L: Into<DetectionLabel>,
    {
        let idle_label = idle_label.into();
        let mut products = HashMap::new();
        let mut owners: BTreeMap<ProductIndex, DetectionLabel> = BTreeMap::new();

        for (label, index) in pairs {
            let label = label.into();
            if label == idle_label {
                return Err(CatalogError::IdleLabelMapped(label.to_string()));
            }
            if let Some(first) = owners.get(&index) {
                return Err(CatalogError::DuplicateIndex {
                    index,
                    first: first.to_string(),
                    second: label.to_string(),
                });
            }
            owners.insert(index, label.clone());
            products.insert(label, index);
        }

        if products.is_empty() {
            warn!("Product catalog has no products; the kiosk will stay on the welcome view");
        }

        Ok(Self { idle_label, products })
    }

    pub fn from_json(idle_label: impl Into<DetectionLabel>, content: &str) -> Result<Self, CatalogError> {
        let idle_label = idle_label.into();
        let value: serde_json::Value = serde_json::from_str(content)?;
        if !value.is_object() {
            return Err(CatalogError::NotAnObject);
        }
        let raw: BTreeMap<String, RawEntry> = serde_json::from_value(value)?;

        let mut pairs = Vec::with_capacity(raw.len());
        for (label, entry) in raw {
            match entry {
                RawEntry::Index(number) => match product_index(&number) {
                    Ok(index) => pairs.push((label, index)),
                    Err(reason) => return Err(CatalogError::InvalidEntry { label, reason }),
                },
                RawEntry::Marker(marker) if IDLE_MARKERS.contains(&marker.as_str()) => {
                    if label != idle_label.as_str() {
                        debug!("Catalog label {:?} marked idle", label);
                    }
                }
                RawEntry::Marker(marker) => {
                    return Err(CatalogError::InvalidEntry {
                        label,
                        reason: format!("unknown marker {:?}", marker),
                    });
                }
            }
        }

        Self::from_pairs(idle_label, pairs)
    }

    pub fn load(idle_label: impl Into<DetectionLabel>, path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(idle_label, &content)
    }

    pub fn resolve(&self, label: &DetectionLabel) -> CatalogEntry {
        if *label == self.idle_label {
            return CatalogEntry::Idle;
        }
        match self.products.get(label) {
            Some(&index) => CatalogEntry::Product(index),
            None => CatalogEntry::Idle,
        }
    }

    pub fn idle_label(&self) -> &DetectionLabel {
        &self.idle_label
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Product labels ordered by index.
    pub fn products(&self) -> Vec<(&DetectionLabel, ProductIndex)> {
        let mut list: Vec<_> = self.products.iter().map(|(l, &i)| (l, i)).collect();
        list.sort_by_key(|&(_, index)| index);
        list
    }
}
