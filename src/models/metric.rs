use serde::{Deserialize, Serialize};
use std::fmt;

/// Hourly measurements requested from the source and carried through to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Temperature,
    RelativeHumidity,
    ApparentTemperature,
    Precipitation,
    CloudCover,
    WindSpeed,
    WindDirection,
}

/// How hourly values of a metric roll up into a daily value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Mean,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Temperature,
        Metric::RelativeHumidity,
        Metric::ApparentTemperature,
        Metric::Precipitation,
        Metric::CloudCover,
        Metric::WindSpeed,
        Metric::WindDirection,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature_2m",
            Metric::RelativeHumidity => "relative_humidity_2m",
            Metric::ApparentTemperature => "apparent_temperature",
            Metric::Precipitation => "precipitation",
            Metric::CloudCover => "cloud_cover",
            Metric::WindSpeed => "windspeed_10m",
            Metric::WindDirection => "winddirection_10m",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.column_name() == name)
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            Metric::Precipitation => Aggregation::Sum,
            _ => Aggregation::Mean,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One optional `f64` per metric. Field names match the stored column names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub windspeed_10m: Option<f64>,
    pub winddirection_10m: Option<f64>,
}

impl MetricValues {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.temperature_2m,
            Metric::RelativeHumidity => self.relative_humidity_2m,
            Metric::ApparentTemperature => self.apparent_temperature,
            Metric::Precipitation => self.precipitation,
            Metric::CloudCover => self.cloud_cover,
            Metric::WindSpeed => self.windspeed_10m,
            Metric::WindDirection => self.winddirection_10m,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::Temperature => &mut self.temperature_2m,
            Metric::RelativeHumidity => &mut self.relative_humidity_2m,
            Metric::ApparentTemperature => &mut self.apparent_temperature,
            Metric::Precipitation => &mut self.precipitation,
            Metric::CloudCover => &mut self.cloud_cover,
            Metric::WindSpeed => &mut self.windspeed_10m,
            Metric::WindDirection => &mut self.winddirection_10m,
        };
        *slot = value;
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_column_name(metric.column_name()), Some(metric));
        }
        assert_eq!(Metric::from_column_name("latitude"), None);
    }

    #[test]
    fn test_only_precipitation_sums() {
        let sums: Vec<Metric> = Metric::ALL
            .into_iter()
            .filter(|m| m.aggregation() == Aggregation::Sum)
            .collect();
        assert_eq!(sums, vec![Metric::Precipitation]);
    }

    #[test]
    fn test_metric_values_get_set() {
        let mut values = MetricValues::default().with(Metric::Temperature, 12.5);
        values.set(Metric::WindDirection, Some(270.0));

        assert_eq!(values.get(Metric::Temperature), Some(12.5));
        assert_eq!(values.winddirection_10m, Some(270.0));
        assert_eq!(values.get(Metric::CloudCover), None);
    }
}
