pub mod auth;
pub mod blog;
pub mod course;
pub mod post;
pub mod reel;
pub mod shared;
pub mod upload;
pub mod waitlist;
