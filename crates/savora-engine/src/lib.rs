#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! The hybrid recommendation engine: catalog, query encoding, score fusion,
//! ranking, result cache and the facade that ties them together.

pub mod cache;
pub mod catalog;
pub mod encoder;
pub mod engine;
pub mod fusion;
pub mod rank;

pub use catalog::{Catalog, CatalogArtifact};
pub use engine::RecipeEngine;
