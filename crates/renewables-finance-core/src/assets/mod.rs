pub mod asset;
pub mod contract;
pub mod validation;

pub use asset::{Asset, Technology};
pub use contract::{Contract, ContractTerms};
