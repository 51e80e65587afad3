//! Core domain types for the tutorbook booking engine.
//!
//! This crate is the database-free heart of the system: the domain
//! models, the slot lifecycle state machine, the error taxonomy and the
//! repository traits the storage layer implements.

pub mod error;
pub mod machine;
pub mod models;
pub mod repository;
