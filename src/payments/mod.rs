//! Payment provider integration (M-Pesa Daraja)

pub mod error;
pub mod provider;
pub mod providers;
pub mod types;
pub mod utils;

pub use error::{PaymentError, PaymentResult};
pub use provider::AccessTokenProvider;
