//! Arcana report engine: raw generated report text → structured document →
//! themed, paginated PDF, plus the storage and HTTP surface around it.

pub mod config;
pub mod document;
pub mod errors;
pub mod layout;
pub mod render;
pub mod routes;
pub mod service;
pub mod state;
pub mod storage;
pub mod theme;
