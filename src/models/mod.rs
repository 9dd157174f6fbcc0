pub mod occurrence;
pub mod profile;

pub use occurrence::*;
pub use profile::*;
