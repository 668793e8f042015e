/// Prevents downstream crates from implementing crate-only traits
/// such as [`Marker`](crate::types::id::marker::Marker).
pub trait Sealed {}
