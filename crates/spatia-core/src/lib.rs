//! # Spatia Core Library
//!
//! An adaptively-indexed spatial proximity engine for molecular point clouds.
//! The crate provides the geometric substrate of a binding-site prediction
//! pipeline: exact nearest-neighbor and radius queries over atom-like points,
//! sphere and shell cutouts, identity-based set algebra, greedy
//! de-duplication, and regular-grid candidate-point sampling.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers with a clear separation of concerns:
//!
//! - **[`core`]: The Foundation.** Stateless value types — the [`core::models::point::Point`]
//!   sample with its optional identity and element metadata, and pure geometry
//!   such as [`core::geometry::BoundingBox`].
//!
//! - **[`engine`]: The Query Core.** Stateful, performance-oriented
//!   structures: the [`engine::points::PointSet`] query surface with its lazily
//!   built caches, the exact [`engine::kdtree::KdTree`], and the
//!   [`engine::sampling::GridSampler`] lattice generator. Algorithm selection
//!   is adaptive: small sets are scanned linearly, large sets are indexed,
//!   with the thresholds driven by [`engine::config::ProximityConfig`].
//!
//! All queries are exact and eager; there is no approximation, no internal
//! concurrency, and no background cache maintenance. Cache staleness rules
//! are part of the documented contract — see [`engine::points::PointSet`].

pub mod core;
pub mod engine;
