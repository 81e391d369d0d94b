//! HTTP clients for public market data endpoints

pub mod sina;

pub use sina::SinaClient;
