pub mod blog_post;
pub mod bookmark;
pub mod comment;
pub mod course;
pub mod course_purchase;
pub mod course_video;
pub mod like;
pub mod post;
pub mod reel;
pub mod reel_comment;
pub mod reel_like;
pub mod user;
pub mod waitlist_user;
