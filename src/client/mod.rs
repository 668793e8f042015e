//! Client-side pieces that talk to a ShabdSetu server.

pub mod views;
