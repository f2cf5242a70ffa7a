//! Class label mapping file
//!
//! Written next to the generated source as `label_mappings.txt`:
//!
//! ```text
//! Service Class Mappings:
//! 0: Box
//! 1: Dropbox
//!
//! Activity Class Mappings:
//! 0: Download
//! 1: Upload
//! ```
//!
//! The reader is deliberately loose so that hand-edited and tab-separated
//! variants of the file keep working. Lines it cannot make sense of are
//! skipped, never fatal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{CompileError, Result};
use crate::target::Target;

/// Class id → label for one target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap(BTreeMap<usize, String>);

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels in class-id order, as a label encoder stores its classes.
    pub fn from_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            classes
                .into_iter()
                .enumerate()
                .map(|(i, label)| (i, label.into()))
                .collect(),
        )
    }

    pub fn insert(&mut self, class_id: usize, label: impl Into<String>) {
        self.0.insert(class_id, label.into());
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.0.get(&class_id).map(String::as_str)
    }

    pub fn contains(&self, class_id: usize) -> bool {
        self.0.contains_key(&class_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.0.iter().map(|(&id, label)| (id, label.as_str()))
    }
}

impl FromIterator<(usize, String)> for LabelMap {
    fn from_iter<T: IntoIterator<Item = (usize, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Label maps for both targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMaps {
    pub service: LabelMap,
    pub activity: LabelMap,
}

impl LabelMaps {
    pub fn get(&self, target: Target) -> &LabelMap {
        match target {
            Target::Service => &self.service,
            Target::Activity => &self.activity,
        }
    }

    fn get_mut(&mut self, target: Target) -> &mut LabelMap {
        match target {
            Target::Service => &mut self.service,
            Target::Activity => &mut self.activity,
        }
    }

    /// Label for `class_id` of `target`, if known.
    pub fn label(&self, target: Target, class_id: usize) -> Option<&str> {
        self.get(target).get(class_id)
    }

    /// Check that every label survives a write/parse round trip.
    pub fn validate(&self) -> Result<()> {
        for target in Target::ALL {
            for (class_id, label) in self.get(target).iter() {
                check_writable(label).map_err(|reason| CompileError::InvalidLabel {
                    target,
                    class_id,
                    reason: reason.to_string(),
                })?;
            }
        }
        Ok(())
    }

    /// Render the mapping file.
    pub fn to_text(&self) -> Result<String> {
        self.validate()?;

        let mut out = String::new();
        for (i, target) in Target::ALL.into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(target.mapping_header());
            out.push('\n');
            for (class_id, label) in self.get(target).iter() {
                // Writing to a String cannot fail
                let _ = writeln!(out, "{class_id}: {label}");
            }
        }
        Ok(out)
    }

    /// Parse a mapping file, skipping anything unrecognised.
    pub fn parse(text: &str) -> Self {
        let mut maps = Self::default();
        let mut current: Option<Target> = None;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(target) = section_header(line) {
                current = Some(target);
                continue;
            }

            match parse_entry(line, current) {
                Some((target, class_id, label)) => {
                    maps.get_mut(target).insert(class_id, label);
                }
                None => debug!("Skipping label mapping line {:?}", line),
            }
        }

        maps
    }

    /// Read a mapping file; invalid UTF-8 is replaced rather than rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let maps = Self::parse(&String::from_utf8_lossy(&bytes));
        debug!(
            "Loaded {} service and {} activity labels from {}",
            maps.service.len(),
            maps.activity.len(),
            path.display()
        );
        Ok(maps)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text()?)?;
        info!("Label mappings saved to {}", path.display());
        Ok(())
    }
}

/// Target named by a section header line, if `line` is one.
fn section_header(line: &str) -> Option<Target> {
    let lower = line.to_lowercase();
    if !lower.contains("mapping") {
        return None;
    }
    Target::ALL
        .into_iter()
        .find(|target| lower.contains(target.name()))
}

fn parse_entry(line: &str, current: Option<Target>) -> Option<(Target, usize, String)> {
    let parts: Vec<&str> = line.split('\t').collect();
    let (target, index, label) = match parts.as_slice() {
        [kind, index, label] => {
            let target = Target::ALL.into_iter().find(|t| t.name() == *kind)?;
            (target, *index, *label)
        }
        [first, second] => {
            let target = current?;
            match first.split_once(':') {
                Some((index, label)) => (target, index, label),
                None => (target, *first, *second),
            }
        }
        _ => {
            let (index, label) = line.split_once(':')?;
            (current?, index, label)
        }
    };

    let class_id = index.trim().parse::<usize>().ok()?;
    Some((target, class_id, label.trim().to_string()))
}

fn check_writable(label: &str) -> std::result::Result<(), &'static str> {
    if label.contains(['\n', '\r']) {
        return Err("contains a line break");
    }
    if label.contains('\t') {
        return Err("contains a tab");
    }
    if label.trim() != label {
        return Err("has leading or trailing whitespace");
    }
    if section_header(label).is_some() {
        return Err("would be read back as a section header");
    }
    Ok(())
}
