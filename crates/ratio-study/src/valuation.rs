//! Linear valuation models
//!
//! A [`LinearValuationModel`] estimates a parcel's value as an intercept plus
//! a weighted sum of named attributes. Models fitted on log prices use
//! [`ModelTarget::Log`], which exponentiates the sum back to a price.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "intercept": 10.82,
//!   "terms": [
//!     { "attribute": "LnSqFt", "coefficient": 0.412 },
//!     { "attribute": "Nbhd_12", "coefficient": -0.087 }
//!   ],
//!   "target": "log"
//! }
//! ```
//!
//! # Examples
//!
//! ```
//! use ratio_study::{
//!     parcel::Parcel,
//!     valuation::{LinearValuationModel, ModelTarget},
//! };
//!
//! let model = LinearValuationModel::new(20_000.0, ModelTarget::Linear)
//!     .with_term("SqFt", 95.0)
//!     .with_term("Baths", 7_500.0);
//!
//! let parcel = Parcel::new(0.0, 230_000.0)
//!     .with_attribute("SqFt", 2_000.0)
//!     .with_attribute("Baths", 2.0);
//!
//! assert_eq!(model.estimate(&parcel).unwrap(), 225_000.0);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parcel::AttributeSource;

/// Name of the intercept in a coefficient table.
pub const INTERCEPT_NAME: &str = "const";

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ValuationError {
    #[display("attribute '{attribute}' is missing")]
    MissingAttribute { attribute: String },
    #[display("attribute '{attribute}' is not finite ({value})")]
    NonFiniteAttribute { attribute: String, value: f64 },
    #[display("estimate is not finite ({value})")]
    NonFiniteEstimate { value: f64 },
    #[display("coefficient table has no '{name}' entry")]
    MissingIntercept { name: String },
}

/// Scale on which the model was fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTarget {
    /// The linear combination is the price itself
    #[default]
    Linear,
    /// The linear combination is the natural log of the price
    Log,
}

/// One `coefficient · attribute` term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTerm {
    pub attribute: String,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearValuationModel {
    pub intercept: f64,
    #[serde(default)]
    pub terms: Vec<ModelTerm>,
    #[serde(default)]
    pub target: ModelTarget,
}

impl LinearValuationModel {
    #[must_use]
    pub fn new(intercept: f64, target: ModelTarget) -> Self {
        Self {
            intercept,
            terms: vec![],
            target,
        }
    }

    #[must_use]
    pub fn with_term(mut self, attribute: impl Into<String>, coefficient: f64) -> Self {
        self.terms.push(ModelTerm {
            attribute: attribute.into(),
            coefficient,
        });
        self
    }

    /// Builds a model from a coefficient table keyed by attribute name.
    ///
    /// The entry named [`INTERCEPT_NAME`] becomes the intercept; every other
    /// entry becomes a term, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::MissingIntercept`] if the table has no
    /// intercept entry.
    pub fn from_coefficients(
        coefficients: &BTreeMap<String, f64>,
        target: ModelTarget,
    ) -> Result<Self, ValuationError> {
        let intercept = coefficients.get(INTERCEPT_NAME).copied().ok_or_else(|| {
            ValuationError::MissingIntercept {
                name: INTERCEPT_NAME.to_owned(),
            }
        })?;
        let terms = coefficients
            .iter()
            .filter(|(name, _)| *name != INTERCEPT_NAME)
            .map(|(name, &coefficient)| ModelTerm {
                attribute: name.clone(),
                coefficient,
            })
            .collect();
        Ok(Self {
            intercept,
            terms,
            target,
        })
    }

    /// Attribute names the model reads, in term order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|term| term.attribute.as_str())
    }

    /// Estimates the value of `record`.
    ///
    /// # Errors
    ///
    /// Fails if an attribute is missing or not finite, or if the estimate
    /// overflows.
    pub fn estimate<A>(&self, record: &A) -> Result<f64, ValuationError>
    where
        A: AttributeSource + ?Sized,
    {
        let mut sum = self.intercept;
        for term in &self.terms {
            let value = record.attribute(&term.attribute).ok_or_else(|| {
                ValuationError::MissingAttribute {
                    attribute: term.attribute.clone(),
                }
            })?;
            if !value.is_finite() {
                return Err(ValuationError::NonFiniteAttribute {
                    attribute: term.attribute.clone(),
                    value,
                });
            }
            sum += term.coefficient * value;
        }

        let value = match self.target {
            ModelTarget::Linear => sum,
            ModelTarget::Log => sum.exp(),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ValuationError::NonFiniteEstimate { value })
        }
    }

    /// Estimates every record, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// See [`LinearValuationModel::estimate`].
    pub fn estimate_all<'a, A, I>(&self, records: I) -> Result<Vec<f64>, ValuationError>
    where
        A: AttributeSource + 'a,
        I: IntoIterator<Item = &'a A>,
    {
        records
            .into_iter()
            .map(|record| self.estimate(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parcel::Parcel;

    fn attributes(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), *value))
            .collect()
    }

    #[test]
    fn test_log_target_exponentiates() {
        let model = LinearValuationModel::new(1.0, ModelTarget::Log).with_term("LnSqFt", 0.5);
        let record = attributes(&[("LnSqFt", 2.0)]);
        let estimate = model.estimate(&record).unwrap();
        assert!((estimate - 2f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn test_intercept_only_model() {
        let model = LinearValuationModel::new(150_000.0, ModelTarget::Linear);
        assert_eq!(model.estimate(&Parcel::new(0.0, 1.0)).unwrap(), 150_000.0);
    }

    #[test]
    fn test_from_coefficients() {
        let table = attributes(&[("const", 11.0), ("Baths", 0.1), ("LnSqFt", 0.4)]);
        let model = LinearValuationModel::from_coefficients(&table, ModelTarget::Log).unwrap();
        assert_eq!(model.intercept, 11.0);
        assert_eq!(model.attributes().collect::<Vec<_>>(), ["Baths", "LnSqFt"]);

        let err = LinearValuationModel::from_coefficients(&attributes(&[]), ModelTarget::Log)
            .unwrap_err();
        assert_eq!(
            err,
            ValuationError::MissingIntercept {
                name: "const".to_owned()
            }
        );
    }

    #[test]
    fn test_missing_and_non_finite_attributes() {
        let model = LinearValuationModel::new(0.0, ModelTarget::Linear).with_term("SqFt", 1.0);
        assert_eq!(
            model.estimate(&attributes(&[])).unwrap_err(),
            ValuationError::MissingAttribute {
                attribute: "SqFt".to_owned()
            }
        );
        assert!(matches!(
            model.estimate(&attributes(&[("SqFt", f64::INFINITY)])),
            Err(ValuationError::NonFiniteAttribute { .. })
        ));
    }

    #[test]
    fn test_overflowing_estimate() {
        let model = LinearValuationModel::new(1_000.0, ModelTarget::Log);
        assert!(matches!(
            model.estimate(&attributes(&[])),
            Err(ValuationError::NonFiniteEstimate { .. })
        ));
    }

    #[test]
    fn test_estimate_all() {
        let model = LinearValuationModel::new(10.0, ModelTarget::Linear).with_term("x", 2.0);
        let records = [attributes(&[("x", 1.0)]), attributes(&[("x", 4.0)])];
        assert_eq!(model.estimate_all(&records).unwrap(), [12.0, 18.0]);
    }

    #[test]
    fn test_json_format() {
        let json = r#"{
            "intercept": 10.5,
            "terms": [{ "attribute": "LnSqFt", "coefficient": 0.25 }],
            "target": "log"
        }"#;
        let model: LinearValuationModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.target, ModelTarget::Log);
        assert_eq!(model.terms.len(), 1);

        let linear: LinearValuationModel = serde_json::from_str(r#"{"intercept": 1.0}"#).unwrap();
        assert_eq!(linear, LinearValuationModel::new(1.0, ModelTarget::Linear));
    }
}
