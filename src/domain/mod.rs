//! Domain layer for windlint
//!
//! CDD Principle: Domain Model - Pure business logic for convention enforcement
//! - Contains all core value objects (spans, findings, violations, reports)
//! - Independent of infrastructure concerns like file systems or terminal output
//! - Expresses the ubiquitous language of styling-convention checks

pub mod findings;

// Re-export main domain types for convenience
pub use findings::*;
