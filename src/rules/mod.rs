//! Validation Passes
//!
//! Run in this order by the `Validator`: structure, resources,
//! dependencies, best practices.

pub mod best_practices;
pub mod dependencies;
pub mod references;
pub mod resources;
pub mod structural;

pub use best_practices::BestPracticesPass;
pub use dependencies::DependencyPass;
pub use resources::ResourcePass;
pub use structural::StructuralPass;
