//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and operations
//! - Block-allocated collections and object stores
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
