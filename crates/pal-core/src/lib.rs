//! # pal-core
//!
//! Core types and pure algorithms for Palanquée.
//!
//! This crate provides the foundational types shared across all Palanquée crates:
//! - Entity structs for the club domain (people, sessions, dive groups, curriculum)
//! - Enums with explicit ordering (proficiency levels) and link states
//! - ID prefix constants
//! - Cross-cutting error types
//! - Section resolution and candidate narrowing
//! - Group assignment planning and spreadsheet matrix parsing
//! - Progression rollup over the exercise → competency → group hierarchy
//! - Report payloads handed to document and mail collaborators

pub mod assignment;
pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod matrix;
pub mod notify;
pub mod progression;
pub mod rating;
pub mod reports;
pub mod section;
