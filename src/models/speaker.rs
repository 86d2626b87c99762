//! Speaker name to model identity mapping
//!
//! The identities are the rows of the synthesizer's speaker embedding table,
//! so the table is fixed for the lifetime of a loaded checkpoint. A registry
//! is validated once at construction and is read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use super::config::VcConfig;
use crate::error::{Result, VcError};

/// Index of a speaker in the model's embedding table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeakerId(u32);

impl SpeakerId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named speaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerIdentity {
    pub name: String,
    pub id: SpeakerId,
}

/// Immutable bijection between speaker names and [`SpeakerId`]s
#[derive(Debug, Clone)]
pub struct SpeakerRegistry {
    /// Names in configuration order
    names: Vec<String>,
    by_name: HashMap<String, SpeakerId>,
    by_id: HashMap<SpeakerId, usize>,
}

impl SpeakerRegistry {
    /// Build a registry from `(name, id)` pairs.
    ///
    /// Ids must be non-negative, unique, and below `n_speakers` when the
    /// model declares a bound. Names must be unique.
    pub fn new<I, S>(entries: I, n_speakers: Option<usize>) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut names = Vec::new();
        let mut by_name = HashMap::new();
        let mut by_id = HashMap::new();

        for (name, raw_id) in entries {
            let name = name.into();
            let id = u32::try_from(raw_id).map_err(|_| {
                VcError::InvalidSpeakerTable(format!("speaker '{name}' has invalid id {raw_id}"))
            })?;
            if let Some(bound) = n_speakers {
                if id as usize >= bound {
                    return Err(VcError::InvalidSpeakerTable(format!(
                        "speaker '{name}' has id {id}, model only has {bound} speakers"
                    )));
                }
            }
            let id = SpeakerId(id);
            if by_name.contains_key(&name) {
                return Err(VcError::InvalidSpeakerTable(format!(
                    "speaker '{name}' listed twice"
                )));
            }
            if let Some(&other) = by_id.get(&id) {
                return Err(VcError::InvalidSpeakerTable(format!(
                    "speakers '{}' and '{name}' share id {id}",
                    names[other]
                )));
            }

            by_id.insert(id, names.len());
            by_name.insert(name.clone(), id);
            names.push(name);
        }

        Ok(Self {
            names,
            by_name,
            by_id,
        })
    }

    /// Build from the `speakers` table of a model config
    pub fn from_config(config: &VcConfig) -> Result<Self> {
        let registry = Self::new(
            config
                .speakers
                .iter()
                .map(|(name, &id)| (name.as_str(), id)),
            config.n_speakers(),
        )?;
        tracing::info!(speakers = registry.len(), "Loaded speaker table");
        Ok(registry)
    }

    /// Look up the model identity of `name`
    pub fn resolve(&self, name: &str) -> Result<SpeakerId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| VcError::UnknownSpeaker(name.to_string()))
    }

    /// Reverse lookup
    pub fn name_of(&self, id: SpeakerId) -> Option<&str> {
        self.by_id.get(&id).map(|&idx| self.names[idx].as_str())
    }

    /// Speaker names in configuration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = SpeakerIdentity> + '_ {
        self.names.iter().map(|name| SpeakerIdentity {
            name: name.clone(),
            id: self.by_name[name],
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
