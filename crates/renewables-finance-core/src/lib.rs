pub mod error;
pub mod period;
pub mod time_value;
pub mod types;

#[cfg(feature = "revenue")]
pub mod assets;

#[cfg(feature = "revenue")]
pub mod pricing;

#[cfg(feature = "revenue")]
pub mod revenue;

#[cfg(feature = "financing")]
pub mod financing;

#[cfg(feature = "statements")]
pub mod statements;

#[cfg(feature = "risk")]
pub mod risk;

pub use error::FinanceError;
pub use types::*;

/// Standard result type for all renewables-finance operations
pub type FinanceResult<T> = Result<T, FinanceError>;
