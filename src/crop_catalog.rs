//! Static agronomic reference data per crop.
//!
//! The built-in table ships as `data/crop_profiles.toml`; a deployment can
//! point `catalog.profiles_path` at its own file instead.

use crate::errors::{AdvisorError, AdvisorResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

const BUILTIN_PROFILES: &str = include_str!("../data/crop_profiles.toml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropProfile {
    pub optimal_temperature: String,
    pub optimal_humidity: String,
    pub optimal_rainfall: String,
    pub ph_range: String,
    pub season: String,
    pub soil_type: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    crop: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    #[serde(flatten)]
    profile: CropProfile,
}

/// Crop profiles in file order, with lookup by exact label.
#[derive(Debug, Clone)]
pub struct CropCatalog {
    names: Vec<String>,
    profiles: HashMap<String, CropProfile>,
}

impl CropCatalog {
    pub fn builtin() -> AdvisorResult<Self> {
        Self::from_toml_str(BUILTIN_PROFILES)
    }

    pub fn from_toml_str(source: &str) -> AdvisorResult<Self> {
        let file: CatalogFile = toml::from_str(source)
            .map_err(|e| AdvisorError::catalog(format!("invalid crop profile TOML: {e}")))?;
        Self::from_entries(
            file.crop
                .into_iter()
                .map(|entry| (entry.name, entry.profile)),
        )
    }

    pub fn from_file(path: impl AsRef<Path>) -> AdvisorResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| AdvisorError::io(format!("reading {}", path.display()), e))?;
        let catalog = Self::from_toml_str(&source)?;
        info!(path = %path.display(), crops = catalog.len(), "crop catalog loaded");
        Ok(catalog)
    }

    /// Use the file at `path` when given, the built-in table otherwise.
    pub fn load(path: Option<&str>) -> AdvisorResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::builtin(),
        }
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, CropProfile)>,
    ) -> AdvisorResult<Self> {
        let mut names = Vec::new();
        let mut profiles = HashMap::new();
        for (name, profile) in entries {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AdvisorError::catalog("crop name must not be empty"));
            }
            if profiles.insert(name.clone(), profile).is_some() {
                return Err(AdvisorError::catalog(format!("duplicate crop '{name}'")));
            }
            names.push(name);
        }
        if names.is_empty() {
            return Err(AdvisorError::catalog("catalog contains no crops"));
        }
        Ok(Self { names, profiles })
    }

    pub fn lookup(&self, label: &str) -> Option<&CropProfile> {
        self.profiles.get(label)
    }

    /// Crop names in catalog order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CropProfile)> + '_ {
        self.names
            .iter()
            .filter_map(|n| self.profiles.get(n).map(|p| (n.as_str(), p)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
