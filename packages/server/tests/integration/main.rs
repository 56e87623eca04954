mod common;

mod auth;
mod blogs;
mod courses;
mod posts;
mod reels;
mod waitlist;
