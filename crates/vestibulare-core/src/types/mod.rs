//! Core type definitions used across the VestibulaRe workspace.

pub mod id;

pub use id::*;
