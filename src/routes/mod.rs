pub mod attendance;
pub mod event;
pub mod health;
pub mod schedules;
pub mod users;
pub mod warnings;
