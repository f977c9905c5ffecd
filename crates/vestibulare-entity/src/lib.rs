//! # vestibulare-entity
//!
//! Domain entity models for VestibulaRe. Every struct in this crate
//! represents a database table row or a domain value object. Row types
//! derive `sqlx::FromRow`; enums map onto PostgreSQL enum types.

pub mod attempt;
pub mod event;
pub mod profile;
pub mod program;
pub mod subscription;
