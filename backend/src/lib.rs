//! Fitbot Backend Library
//!
//! Check-in chat bot for OneBot connectors. Exposes the backend modules for
//! use in integration tests.

pub mod adapters;
pub mod auth;
pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
