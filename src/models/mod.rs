pub mod bid;
pub mod product;
pub mod user;
