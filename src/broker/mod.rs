pub mod alpaca;
pub mod traits;
pub mod types;
