pub mod app;
pub mod client;
pub mod config;
pub mod database;
pub mod hooks;
pub mod http;
pub mod logging;
pub mod mailer;
pub mod schema;
pub mod services;
pub mod types;
pub mod util;

pub use app::App;

pub(crate) mod internal;

#[cfg(test)]
pub(crate) mod test_utils;
