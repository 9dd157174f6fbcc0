//! # Cyclecast Rust Engine
//!
//! Cycle forecasting engine: predicts the next occurrences of a recurring
//! biological cycle from a sparse, user-reported history and maps the
//! forecast onto a month calendar.
//!
//! This crate provides the Rust engine for the cycle-tracking system: a
//! standalone, deterministic three-stage prediction pipeline. Account
//! management, record persistence, and calendar rendering live in external
//! collaborators; this crate consumes and produces plain data records.
//!
//! ## Features
//!
//! - **Interval Extraction**: confirmed start-to-start cycle observations
//!   with anomaly filtering
//! - **Staged Estimation**: fixed default, recency-weighted average, or a
//!   per-user learned sequence model, selected by history depth
//! - **Projection**: two forecast windows anchored on the latest confirmed
//!   occurrence, clipped to any query month
//! - **Calendar Annotation**: priority-ordered day flags for a Sunday-first
//!   month grid
//! - **Artifact Store**: per-user model/normalizer persistence behind a
//!   repository trait (in-memory and filesystem backends)
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: types exchanged with callers
//! - [`models`]: occurrence and profile domain types
//! - [`db`]: artifact repository pattern and persistence layer
//! - [`services`]: the estimation/projection/calendar pipeline

pub mod api;

pub mod db;
pub mod models;

pub mod services;
