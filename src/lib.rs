//! OregonSMB Growth Suite Library
//!
//! This library provides the dashboard data API for the OregonSMB directory
//! (plan entitlements, server-side redaction, the dataset endpoints) and the
//! dashboard client built on top of it (plan store, data gateway, widgets and
//! page shell).
//!
//! # Modules
//!
//! - `app`: Router assembly.
//! - `catalog`: Sample data backing the API.
//! - `config`: Configuration management.
//! - `dashboard`: Mounted dashboard view with concurrent widget fetches.
//! - `datasets`: Entitlement-aware dataset builders.
//! - `entitlements`: Plan/feature access table.
//! - `errors`: Error handling types.
//! - `gateway_client`: HTTP client for the dashboard API.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `plan_store`: Persisted current-plan state.
//! - `redaction`: Lead masking for locked plans.
//! - `retry`: Retry policy and backoff for dataset fetches.
//! - `shell`: Marketing tabs, pricing and plan selection.
//! - `sources`: Live or static dataset sources.
//! - `widgets`: Widget state machine and view models.

pub mod app;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod datasets;
pub mod entitlements;
pub mod errors;
pub mod gateway_client;
pub mod handlers;
pub mod models;
pub mod plan_store;
pub mod redaction;
pub mod retry;
pub mod shell;
pub mod sources;
pub mod widgets;
