// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::Error;
use std::{fs::File, io, ops::Index, path::Path};
use tracing::debug;

/// Classes of the bundled flowers model, in output order.
pub const FLOWER_CLASSES: [&str; 5] = ["Daisy", "Dandelion", "Rose", "Sunflower", "Tulip"];

/// Display names for the model outputs, indexed by class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self::new(FLOWER_CLASSES)
    }
}

impl ClassLabels {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads labels from a JSON file holding either an array of strings or
    /// an object with a `classes` array.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::open(path.as_ref())?;
        let json: serde_json::Value = serde_json::from_reader(file)?;
        let labels = Self::from_json(&json)?;
        debug!(path = %path.as_ref().display(), classes = labels.len(), "loaded class labels");
        Ok(labels)
    }

    pub fn from_json(json: &serde_json::Value) -> Result<Self, Error> {
        let classes = match json {
            serde_json::Value::Array(_) => json,
            _ => &json["classes"],
        };
        let Some(classes) = classes.as_array() else {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "Did not find classes as an array",
            )));
        };

        let mut names = Vec::with_capacity(classes.len());
        for class in classes {
            match class.as_str() {
                Some(name) => names.push(name.to_string()),
                None => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("class label {class} is not a string"),
                    )));
                }
            }
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Fails unless there is exactly one label per model output and at least
    /// one output.
    pub fn validate(&self, num_outputs: usize) -> Result<(), Error> {
        if num_outputs == 0 || self.names.len() != num_outputs {
            return Err(Error::Labels {
                expected: num_outputs,
                found: self.names.len(),
            });
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Index<usize> for ClassLabels {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.names[index]
    }
}
