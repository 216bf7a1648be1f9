pub mod aggregator;
pub mod identity;
pub mod issuer;
pub mod qr;
pub mod redemption;
