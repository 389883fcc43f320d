//! HTTP surface: the page shell routes and the overlay JSON API

pub mod csrf;
pub mod handlers;
pub mod models;
pub mod server;
