//! # Engine Module
//!
//! The stateful query core of the library.
//!
//! ## Overview
//!
//! This layer owns the performance-oriented structures the proximity engine
//! is built around: the [`points::PointSet`] query surface with its lazily
//! maintained caches, the exact [`kdtree::KdTree`], and the
//! [`sampling::GridSampler`] lattice generator. Algorithm selection is
//! adaptive — small collections are scanned linearly, large ones are indexed
//! — with the size thresholds supplied by [`config::ProximityConfig`].
//!
//! ## Key Components
//!
//! - [`points`] - Ordered point collection with nearest/radius/shell queries,
//!   set algebra, and de-duplication
//! - [`kdtree`] - Arena-backed exact k-d tree (build, unbalanced insert,
//!   branch-and-bound nearest, range search)
//! - [`sampling`] - Regular-grid candidate-point generation with row-major
//!   and snake traversal orders
//! - [`config`] - Adaptive-policy thresholds and their TOML loader
//! - [`error`] - Contract-violation error types

pub mod config;
pub mod error;
pub mod kdtree;
pub mod points;
pub mod sampling;
