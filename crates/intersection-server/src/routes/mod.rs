pub mod events;
pub mod lanes;
pub mod run;
pub mod state;
