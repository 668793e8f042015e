pub mod error;
pub mod id;

pub use error::Error;
