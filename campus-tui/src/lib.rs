//! Campus console library exports.

pub mod api_client;
pub mod config;
pub mod error;
pub mod events;
pub mod keys;
pub mod logging;
pub mod nav;
pub mod notifications;
pub mod query;
pub mod state;
pub mod theme;
pub mod timer;
pub mod viewport;
pub mod views;
pub mod widgets;
