//! Random-forest classifier model
//!
//! - `tree`: index-addressed node arena and arena-walk evaluation
//! - `ensemble`: majority voting with lowest-id tie-break
//! - `sklearn`: conversion from the training library's parallel arrays

pub mod ensemble;
pub mod sklearn;
pub mod tree;

pub use ensemble::{select_by_vote, Ensemble};
pub use sklearn::{argmax, SklearnTreeArrays};
pub use tree::{Node, Tree};

use crate::target::Target;

/// The service and activity ensembles compiled into one predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensembles {
    pub service: Ensemble,
    pub activity: Ensemble,
}

impl Ensembles {
    pub fn get(&self, target: Target) -> &Ensemble {
        match target {
            Target::Service => &self.service,
            Target::Activity => &self.activity,
        }
    }
}
