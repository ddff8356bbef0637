pub mod categories;
pub mod clients;
pub mod error;
pub mod orders;
pub mod products;
pub mod reconciler;
pub mod recommendation;
pub mod seed;
pub mod validation;
