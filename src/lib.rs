// src/lib.rs

//! Multi-source radio station catalog synchronizer.
//!
//! Aggregates station metadata from a curated list, a flat public catalog
//! API, and a hierarchical OPML directory, and keeps a SQLite catalog in
//! sync with what each scheduled source observed.

pub mod crawler;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod schedule;
pub mod sources;
pub mod storage;
pub mod utils;
