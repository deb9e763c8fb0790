//! Dashboard and client for a Sturmovik campaign server: the map of a
//! campaign day, derived per-coalition figures and the server's REST API.

pub mod aggregate;
pub mod braille;
pub mod client;
pub mod config;
pub mod controller;
pub mod events;
pub mod export;
pub mod map;
pub mod model;
pub mod timeline;
