pub mod extractor;
pub mod open_meteo;
pub mod weather_source;

pub use extractor::Extractor;
pub use open_meteo::OpenMeteoSource;
pub use weather_source::WeatherSource;
