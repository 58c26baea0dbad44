#![deny(missing_docs)]

//! Allocator-aware red-black tree engine, [`collections::RbTree`], on which ordered maps, sets,
//! multimaps and multisets can be built.

//!# Features
//!
//! This crate supports the following cargo features:
//! - `unsafe-optim` : Enable unsafe optimisations in release mode.
//! - `cap` : tests report memory usage through a capped global allocator.

/// Memory allocation.
pub mod alloc;

/// Containers.
pub mod collections;

mod vec;
