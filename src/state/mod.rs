/// State management module
///
/// This module handles all persistent application state:
/// - The camera registry database (registry.rs)
/// - Shared data structures (data.rs)

pub mod data;
pub mod registry;
