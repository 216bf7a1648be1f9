pub mod api;
pub mod events;
pub mod reaper;
pub mod state;
