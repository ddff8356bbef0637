pub mod amount;
pub mod association_rule;
pub mod category;
pub mod client;
pub mod order;
pub mod product;
pub mod product_equivalence;
