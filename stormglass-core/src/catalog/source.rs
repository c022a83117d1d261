use serde::{Serialize, Serializer};
use std::fmt;

/// Forecast agency that produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataSource {
    /// Deutscher Wetterdienst, ICON model.
    Icon,
    /// Deutscher Wetterdienst.
    Dwd,
    /// National Oceanic and Atmospheric Administration.
    Noaa,
    /// Météo-France.
    MeteoFrance,
    /// UK Met Office.
    UkMetOffice,
    /// Danish Defence Centre for Operational Oceanography.
    Fcoo,
    /// Finnish Meteorological Institute.
    Fmi,
    /// Norwegian Meteorological Institute and NRK.
    Yr,
    /// Swedish Meteorological and Hydrological Institute.
    Smhi,
    /// Storm Glass' own per-region pick.
    StormGlass,
}

impl DataSource {
    /// Wire token used in the `source` query parameter and as the inner JSON key.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Icon => "icon",
            DataSource::Dwd => "dwd",
            DataSource::Noaa => "noaa",
            DataSource::MeteoFrance => "meteo",
            DataSource::UkMetOffice => "meto",
            DataSource::Fcoo => "fcoo",
            DataSource::Fmi => "fmi",
            DataSource::Yr => "yr",
            DataSource::Smhi => "smhi",
            DataSource::StormGlass => "sg",
        }
    }

    pub const fn all() -> &'static [DataSource] {
        &[
            DataSource::Icon,
            DataSource::Dwd,
            DataSource::Noaa,
            DataSource::MeteoFrance,
            DataSource::UkMetOffice,
            DataSource::Fcoo,
            DataSource::Fmi,
            DataSource::Yr,
            DataSource::Smhi,
            DataSource::StormGlass,
        ]
    }

    /// Exact (case-sensitive) lookup by wire token.
    pub fn from_token(token: &str) -> Option<DataSource> {
        Self::all().iter().copied().find(|s| s.as_str() == token)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<&str> for DataSource {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_token(value).ok_or_else(|| {
            let known = Self::all().iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ");
            anyhow::anyhow!("Unknown data source '{value}'. Supported sources: {known}.")
        })
    }
}

impl Serialize for DataSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
