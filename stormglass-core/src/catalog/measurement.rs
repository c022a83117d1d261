use serde::{Serialize, Serializer};
use std::fmt;

/// Physical unit a measurement is reported in. Display only; values are never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Celsius,
    Hectopascals,
    Degrees,
    MetersPerSecond,
    Meters,
    Kilometers,
    Seconds,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Hectopascals => "hPa",
            Unit::Degrees => "°",
            Unit::MetersPerSecond => "m/s",
            Unit::Meters => "m",
            Unit::Kilometers => "km",
            Unit::Seconds => "s",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A quantity the point endpoint can return, at a fixed altitude or pressure level
/// where that applies. Directions are degrees with 0° meaning "coming from north".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeasurementName {
    AirTemperature,
    AirTemperature80m,
    AirTemperature100m,
    AirTemperature1000hpa,
    AirTemperature800hpa,
    AirTemperature500hpa,
    AirTemperature200hpa,
    Pressure,
    /// Total cloud coverage, percent.
    CloudCover,
    CurrentDirection,
    CurrentSpeed,
    Gust,
    /// Relative humidity, percent.
    Humidity,
    /// Proportion of ice cover, 0-1.
    IceCover,
    /// Mean precipitation.
    Precipitation,
    SnowDepth,
    /// Sea level relative to MSL.
    SeaLevel,
    SwellDirection,
    SwellHeight,
    SwellPeriod,
    SecondarySwellDirection,
    SecondarySwellHeight,
    SecondarySwellPeriod,
    /// Horizontal visibility.
    Visibility,
    WaterTemperature,
    /// Combined wind and swell waves.
    WaveDirection,
    /// Significant height of combined wind and swell waves.
    WaveHeight,
    WavePeriod,
    WindWaveDirection,
    WindWaveHeight,
    WindWavePeriod,
    /// Wind direction at 10m above sea level.
    WindDirection,
    WindDirection20m,
    WindDirection30m,
    WindDirection40m,
    WindDirection50m,
    WindDirection80m,
    WindDirection100m,
    WindDirection1000hpa,
    WindDirection800hpa,
    WindDirection500hpa,
    WindDirection200hpa,
    /// Wind speed at 10m above sea level.
    WindSpeed,
    WindSpeed20m,
    WindSpeed30m,
    WindSpeed40m,
    WindSpeed50m,
    WindSpeed80m,
    WindSpeed100m,
    WindSpeed1000hpa,
    WindSpeed800hpa,
    WindSpeed500hpa,
    WindSpeed200hpa,
}

impl MeasurementName {
    /// Wire token: the `params` query value and the JSON key inside each period.
    pub fn as_str(&self) -> &'static str {
        use MeasurementName::*;
        match self {
            AirTemperature => "airTemperature",
            AirTemperature80m => "airTemperature80m",
            AirTemperature100m => "airTemperature100m",
            AirTemperature1000hpa => "airTemperature1000hpa",
            AirTemperature800hpa => "airTemperature800hpa",
            AirTemperature500hpa => "airTemperature500hpa",
            AirTemperature200hpa => "airTemperature200hpa",
            Pressure => "pressure",
            CloudCover => "cloudCover",
            CurrentDirection => "currentDirection",
            CurrentSpeed => "currentSpeed",
            Gust => "gust",
            Humidity => "humidity",
            IceCover => "iceCover",
            Precipitation => "precipitation",
            SnowDepth => "snowDepth",
            SeaLevel => "seaLevel",
            SwellDirection => "swellDirection",
            SwellHeight => "swellHeight",
            SwellPeriod => "swellPeriod",
            SecondarySwellDirection => "secondarySwellDirection",
            SecondarySwellHeight => "secondarySwellHeight",
            SecondarySwellPeriod => "secondarySwellPeriod",
            Visibility => "visibility",
            WaterTemperature => "waterTemperature",
            WaveDirection => "waveDirection",
            WaveHeight => "waveHeight",
            WavePeriod => "wavePeriod",
            WindWaveDirection => "windWaveDirection",
            WindWaveHeight => "windWaveHeight",
            WindWavePeriod => "windWavePeriod",
            WindDirection => "windDirection",
            WindDirection20m => "windDirection20m",
            WindDirection30m => "windDirection30m",
            WindDirection40m => "windDirection40m",
            WindDirection50m => "windDirection50m",
            WindDirection80m => "windDirection80m",
            WindDirection100m => "windDirection100m",
            WindDirection1000hpa => "windDirection1000hpa",
            WindDirection800hpa => "windDirection800hpa",
            WindDirection500hpa => "windDirection500hpa",
            WindDirection200hpa => "windDirection200hpa",
            WindSpeed => "windSpeed",
            WindSpeed20m => "windSpeed20m",
            WindSpeed30m => "windSpeed30m",
            WindSpeed40m => "windSpeed40m",
            WindSpeed50m => "windSpeed50m",
            WindSpeed80m => "windSpeed80m",
            WindSpeed100m => "windSpeed100m",
            WindSpeed1000hpa => "windSpeed1000hpa",
            WindSpeed800hpa => "windSpeed800hpa",
            WindSpeed500hpa => "windSpeed500hpa",
            WindSpeed200hpa => "windSpeed200hpa",
        }
    }

    /// Unit the API reports this measurement in, or `None` for ratios, percentages
    /// and precipitation, which the API documents without a unit.
    pub fn unit(&self) -> Option<Unit> {
        use MeasurementName::*;
        match self {
            Humidity | IceCover | CloudCover | Precipitation => None,
            AirTemperature | AirTemperature80m | AirTemperature100m | AirTemperature1000hpa
            | AirTemperature800hpa | AirTemperature500hpa | AirTemperature200hpa
            | WaterTemperature => Some(Unit::Celsius),
            Pressure => Some(Unit::Hectopascals),
            CurrentDirection | SwellDirection | SecondarySwellDirection | WaveDirection
            | WindWaveDirection | WindDirection | WindDirection20m | WindDirection30m
            | WindDirection40m | WindDirection50m | WindDirection80m | WindDirection100m
            | WindDirection1000hpa | WindDirection800hpa | WindDirection500hpa
            | WindDirection200hpa => Some(Unit::Degrees),
            CurrentSpeed | Gust | WindSpeed | WindSpeed20m | WindSpeed30m | WindSpeed40m
            | WindSpeed50m | WindSpeed80m | WindSpeed100m | WindSpeed1000hpa
            | WindSpeed800hpa | WindSpeed500hpa | WindSpeed200hpa => Some(Unit::MetersPerSecond),
            SnowDepth | SeaLevel | SwellHeight | SecondarySwellHeight | WaveHeight
            | WindWaveHeight => Some(Unit::Meters),
            SwellPeriod | SecondarySwellPeriod | WavePeriod | WindWavePeriod => {
                Some(Unit::Seconds)
            }
            Visibility => Some(Unit::Kilometers),
        }
    }

    /// Every measurement, in declaration order. Decoding walks this order.
    pub const fn all() -> &'static [MeasurementName] {
        use MeasurementName::*;
        &[
            AirTemperature,
            AirTemperature80m,
            AirTemperature100m,
            AirTemperature1000hpa,
            AirTemperature800hpa,
            AirTemperature500hpa,
            AirTemperature200hpa,
            Pressure,
            CloudCover,
            CurrentDirection,
            CurrentSpeed,
            Gust,
            Humidity,
            IceCover,
            Precipitation,
            SnowDepth,
            SeaLevel,
            SwellDirection,
            SwellHeight,
            SwellPeriod,
            SecondarySwellDirection,
            SecondarySwellHeight,
            SecondarySwellPeriod,
            Visibility,
            WaterTemperature,
            WaveDirection,
            WaveHeight,
            WavePeriod,
            WindWaveDirection,
            WindWaveHeight,
            WindWavePeriod,
            WindDirection,
            WindDirection20m,
            WindDirection30m,
            WindDirection40m,
            WindDirection50m,
            WindDirection80m,
            WindDirection100m,
            WindDirection1000hpa,
            WindDirection800hpa,
            WindDirection500hpa,
            WindDirection200hpa,
            WindSpeed,
            WindSpeed20m,
            WindSpeed30m,
            WindSpeed40m,
            WindSpeed50m,
            WindSpeed80m,
            WindSpeed100m,
            WindSpeed1000hpa,
            WindSpeed800hpa,
            WindSpeed500hpa,
            WindSpeed200hpa,
        ]
    }

    /// Exact (case-sensitive) lookup by wire token.
    pub fn from_token(token: &str) -> Option<MeasurementName> {
        Self::all().iter().copied().find(|m| m.as_str() == token)
    }
}

impl fmt::Display for MeasurementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<&str> for MeasurementName {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_token(value)
            .ok_or_else(|| anyhow::anyhow!("Unknown measurement '{value}'."))
    }
}

impl Serialize for MeasurementName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
