pub mod attendance;
pub mod identity;
pub mod requests;
pub mod responses;
pub mod roster;
pub mod token;
