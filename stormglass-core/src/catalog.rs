pub mod measurement;
pub mod source;

pub use measurement::{MeasurementName, Unit};
pub use source::DataSource;
