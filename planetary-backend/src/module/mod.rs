pub mod caption;
pub mod catalog;
