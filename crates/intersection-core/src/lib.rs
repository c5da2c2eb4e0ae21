pub mod assignment;
pub mod config;
pub mod controller;
pub mod density;
pub mod error;
pub mod evidence;
pub mod lane;
pub mod notification;
pub mod paths;
pub mod playback;
pub mod scheduler;
pub mod signal;
pub mod ticker;

pub use error::{IntersectionError, Result};
