//! Host-side reference predictor
//!
//! Runs the same tokenizer, hash lookup and arena-walk voting that the
//! generated C performs, directly on the model. Tests use it as the oracle
//! for the compiled path.

use serde::{Deserialize, Serialize};

use crate::bundle::ModelBundle;
use crate::errors::Result;
use crate::forest::Ensembles;
use crate::hash_table::HashTable;
use crate::request::{Request, FIELD_COUNT};
use crate::target::Target;
use crate::tokenizer::{extract_features, FeatureVector};
use crate::vocab::Vocabulary;

/// Raw class ids, as printed by the compiled predictor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictedIds {
    pub service_id: usize,
    pub activity_id: usize,
}

impl PredictedIds {
    pub fn get(&self, target: Target) -> usize {
        match target {
            Target::Service => self.service_id,
            Target::Activity => self.activity_id,
        }
    }
}

/// Pure-Rust evaluator of a validated model
#[derive(Debug, Clone)]
pub struct ReferencePredictor {
    table: HashTable,
    max_features: usize,
    ensembles: Ensembles,
}

impl ReferencePredictor {
    /// Validate the model and build the lookup table.
    pub fn new(
        ensembles: Ensembles,
        vocabulary: &Vocabulary,
        max_features: Option<usize>,
    ) -> Result<Self> {
        let max_features = vocabulary.resolve_max_features(max_features)?;
        for target in Target::ALL {
            ensembles.get(target).validate(target, max_features)?;
        }
        Ok(Self {
            table: HashTable::build(vocabulary)?,
            max_features,
            ensembles,
        })
    }

    pub fn from_bundle(bundle: &ModelBundle, max_features: Option<usize>) -> Result<Self> {
        Self::new(bundle.ensembles()?, &bundle.vocabulary, max_features)
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    pub fn features(&self, fields: &[Option<&str>; FIELD_COUNT]) -> FeatureVector {
        extract_features(fields, &self.table, self.max_features)
    }

    /// Predict from the eight positional argument strings.
    pub fn predict_fields(&self, fields: &[Option<&str>; FIELD_COUNT]) -> PredictedIds {
        let features = self.features(fields);
        PredictedIds {
            service_id: self.ensembles.service.predict(features.as_slice()),
            activity_id: self.ensembles.activity.predict(features.as_slice()),
        }
    }

    /// Predict from unsanitised request fields.
    ///
    /// The invoker replaces missing fields with `-` and spaces with `%20`
    /// before calling the executable; those rewrites can change tokens, so
    /// compare against the invoker using [`predict_fields`](Self::predict_fields)
    /// on the sanitised arguments instead.
    pub fn predict(&self, request: &Request) -> PredictedIds {
        self.predict_fields(&request.fields())
    }
}
