//! Clip insight server library.
//!
//! Video library, provider-backed analysis, per-user pattern insights and
//! cross-user insight generation, shared by the HTTP server and the job runner.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
