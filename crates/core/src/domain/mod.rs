pub mod analysis;
pub mod contract;
pub mod filter;
