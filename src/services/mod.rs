//! Request handlers independent of the HTTP layer. Each request is a
//! struct with a `perform` method taking the [`App`](crate::App) and,
//! where needed, the [`Actor`](crate::http::Actor) behind it.

pub mod follow;
pub mod views;
