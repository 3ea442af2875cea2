#![deny(missing_docs)]
#![doc = "Core value, parameter, locator and error types for the sweep workflow compiler."]

pub mod errors;
/// Canonical hashing helpers.
pub mod hash;
pub mod locator;
pub mod params;
/// Canonical JSON and YAML serde helpers.
pub mod serde;
pub mod value;

pub use errors::{ErrorInfo, SweepError};
pub use hash::stable_hash_string;
pub use locator::Locator;
pub use params::Parameters;
pub use value::{ParamValue, DEFAULT_LABEL};
