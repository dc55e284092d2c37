//! Lesson Studio · Hebrew reading-lesson generator client
//!
//! - `transport`: content API client (`/api/generate`, `/api/adapt`) returning one envelope shape
//! - `studio`: generation workflow + dependent adaptation workflow, cycle-guarded
//! - `view`: pure rendering of the studio state for the page
//! - `admin`: validated per-level prompt configuration
//! - `routes`: axum HTTP + WebSocket surface used by the browser

pub mod admin;
pub mod config;
pub mod domain;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod studio;
pub mod telemetry;
pub mod transport;
pub mod util;
pub mod view;
