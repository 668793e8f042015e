pub mod figment;
mod sensitive;

pub use self::sensitive::Sensitive;
