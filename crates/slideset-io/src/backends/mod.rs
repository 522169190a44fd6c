#[cfg(feature = "csv")]
pub mod csv;
#[cfg(feature = "json")]
pub mod json;
