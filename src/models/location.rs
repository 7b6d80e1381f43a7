use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;

use crate::error::{EtlError, Result};

/// A named point to fetch observations for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Location {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl Location {
    /// Build a location, normalizing the name to trimmed lowercase.
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            latitude,
            longitude,
        }
    }
}

/// Location entry as it appears in configuration.
///
/// Every field is optional; `LocationSet::from_configs` reports what is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub name: Option<String>,

    #[serde(alias = "latitude")]
    pub lat: Option<f64>,

    #[serde(alias = "longitude")]
    pub lon: Option<f64>,
}

impl LocationConfig {
    pub fn new(name: &str, lat: f64, lon: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            lat: Some(lat),
            lon: Some(lon),
        }
    }
}

/// Ordered, validated list of locations for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSet {
    locations: Vec<Location>,
}

impl LocationSet {
    /// Names are normalized to trimmed lowercase before the uniqueness check.
    pub fn new(locations: Vec<Location>) -> Result<Self> {
        let locations: Vec<Location> = locations
            .into_iter()
            .map(|l| Location::new(&l.name, l.latitude, l.longitude))
            .collect();
        let mut seen = HashSet::with_capacity(locations.len());

        for location in &locations {
            location.validate()?;

            // Names become partition path segments
            if location.name.contains(['/', '\\', '=']) {
                return Err(EtlError::Config(format!(
                    "Location name '{}' contains a reserved path character",
                    location.name
                )));
            }

            if !seen.insert(location.name.as_str()) {
                return Err(EtlError::Config(format!(
                    "Duplicate location name '{}'",
                    location.name
                )));
            }
        }

        Ok(Self { locations })
    }

    pub fn from_configs(configs: &[LocationConfig]) -> Result<Self> {
        let mut locations = Vec::with_capacity(configs.len());

        for (index, entry) in configs.iter().enumerate() {
            let name = entry.name.as_deref().ok_or_else(|| {
                EtlError::Config(format!("Location #{} is missing 'name'", index))
            })?;
            let lat = entry.lat.ok_or_else(|| {
                EtlError::Config(format!("Location '{}' is missing 'lat'", name))
            })?;
            let lon = entry.lon.ok_or_else(|| {
                EtlError::Config(format!("Location '{}' is missing 'lon'", name))
            })?;

            locations.push(Location::new(name, lat, lon));
        }

        Self::new(locations)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.locations.iter().map(|l| l.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a LocationSet {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}
