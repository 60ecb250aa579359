//! Weblytics - request telemetry for the player prediction web app
//!
//! This library provides the embedded telemetry pipeline of the prediction
//! service: every request/response cycle is captured by a middleware,
//! persisted asynchronously, optionally enriched with client metadata and
//! geolocation, and served back as time-windowed aggregate views.
//!
//! # Architecture
//! - `analytics`: event model, user-agent classification, extraction, sink, retention
//! - `api`: HTTP services and the capture middleware
//! - `services`: business logic (aggregation, geoip lookup)
//! - `storage`: SeaORM storage backend and queries
//! - `config`: configuration loading
//! - `system`: logging initialization
//! - `utils`: client IP resolution

pub mod analytics;
pub mod api;
pub mod config;
pub mod errors;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
