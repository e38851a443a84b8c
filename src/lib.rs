//! Library crate for oche-back, exposing modules for binaries and integration tests.

mod config;
pub mod dao;
mod dto;
pub mod engine;
mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod upstream;
