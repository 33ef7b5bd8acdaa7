//! Parcel records for ratio studies
//!
//! This module provides the record type consumed by the grouped report and
//! the attribute lookup used by valuation models and coverage counts.
//!
//! # Overview
//!
//! A ratio study compares what a valuation model (or an appraiser) predicted
//! for a parcel against the price the parcel actually sold for:
//!
//! ```text
//! Parcel
//! ├─ id (optional, for display)
//! ├─ predicted_value  (estimated sale price, ESP)
//! ├─ sale_price       (observed transaction price)
//! ├─ group            (optional grouping label, e.g. neighborhood)
//! └─ attributes       (model inputs, ignored by the ratio measures)
//! ```
//!
//! # Serialization
//!
//! All types implement `serde` traits for JSON serialization:
//!
//! ```json
//! {
//!   "id": "12-104-007",
//!   "predicted_value": 187200.0,
//!   "sale_price": 240000.0,
//!   "group": "Nbhd 12",
//!   "attributes": { "SqFt": 1840.0, "Baths": 2.0 }
//! }
//! ```
//!
//! # Examples
//!
//! ```
//! use ratio_study::parcel::{AttributeSource, Parcel};
//!
//! let parcel = Parcel::new(187_200.0, 240_000.0)
//!     .with_group("Nbhd 12")
//!     .with_attribute("SqFt", 1840.0);
//!
//! assert_eq!(parcel.ratio(), Some(0.78));
//! assert_eq!(parcel.attribute("SqFt"), Some(1840.0));
//! assert_eq!(parcel.attribute("Baths"), None);
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A single sold parcel with its predicted value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Parcel {
    /// Parcel identifier, if the input carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Predicted (appraised or estimated) value
    pub predicted_value: f64,
    /// Observed sale price
    pub sale_price: f64,
    /// Grouping label such as a neighborhood or property class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Additional numeric attributes, not used by the ratio measures
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, f64>,
}

impl Parcel {
    #[must_use]
    pub fn new(predicted_value: f64, sale_price: f64) -> Self {
        Self {
            id: None,
            predicted_value,
            sale_price,
            group: None,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Assessment ratio `predicted_value / sale_price`, or `None` for a zero sale price.
    #[must_use]
    pub fn ratio(&self) -> Option<f64> {
        (self.sale_price != 0.0).then(|| self.predicted_value / self.sale_price)
    }
}

/// Lookup of named numeric attributes on a record.
pub trait AttributeSource {
    /// Returns the value of the attribute, or `None` if the record lacks it.
    fn attribute(&self, name: &str) -> Option<f64>;
}

impl AttributeSource for Parcel {
    fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }
}

impl AttributeSource for BTreeMap<String, f64> {
    fn attribute(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<S> AttributeSource for HashMap<String, f64, S>
where
    S: std::hash::BuildHasher,
{
    fn attribute(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<A> AttributeSource for &A
where
    A: AttributeSource + ?Sized,
{
    fn attribute(&self, name: &str) -> Option<f64> {
        (**self).attribute(name)
    }
}
