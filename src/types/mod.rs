pub mod variables;
pub mod weather_record;
