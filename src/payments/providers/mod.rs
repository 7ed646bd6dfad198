pub mod mpesa;

pub use mpesa::{MpesaConfig, MpesaTokenProvider, UrlRegistrar};
