//! Classification targets produced by the compiled predictor

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two independently trained classification targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Service,
    Activity,
}

impl Target {
    /// Both targets in emission order.
    pub const ALL: [Target; 2] = [Target::Service, Target::Activity];

    /// Lowercase identifier used in generated function names and mapping files.
    pub fn name(self) -> &'static str {
        match self {
            Target::Service => "service",
            Target::Activity => "activity",
        }
    }

    /// Section header written above this target's rows in `label_mappings.txt`.
    pub fn mapping_header(self) -> &'static str {
        match self {
            Target::Service => "Service Class Mappings:",
            Target::Activity => "Activity Class Mappings:",
        }
    }

    /// Key of this target's id in the predictor's JSON output.
    pub fn id_key(self) -> &'static str {
        match self {
            Target::Service => "service_id",
            Target::Activity => "activity_id",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
