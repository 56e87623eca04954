use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/posts", post_routes())
        .nest("/reels", reel_routes())
        .nest("/courses", course_routes())
        .nest("/blogs", blog_routes())
        .nest("/waitlist", waitlist_routes())
        .nest("/uploads", upload_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::signup))
        .routes(routes!(handlers::auth::send_otp))
        .routes(routes!(handlers::auth::verify_otp))
        .routes(routes!(handlers::auth::admin_signin))
        .routes(routes!(handlers::auth::create_admin))
        .routes(routes!(handlers::auth::profile))
}

fn post_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::post::list_posts, handlers::post::create_post))
        .routes(routes!(handlers::post::create_retweet))
        .routes(routes!(
            handlers::post::get_post,
            handlers::post::update_post,
            handlers::post::delete_post
        ))
        .routes(routes!(handlers::post::toggle_post_like))
        .routes(routes!(handlers::post::toggle_post_bookmark))
        .routes(routes!(
            handlers::post::list_comments,
            handlers::post::create_comment
        ))
        .routes(routes!(
            handlers::post::update_comment,
            handlers::post::delete_comment
        ))
        .routes(routes!(handlers::post::toggle_comment_like))
}

fn reel_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::reel::list_reels, handlers::reel::create_reel))
        .routes(routes!(
            handlers::reel::get_reel,
            handlers::reel::update_reel,
            handlers::reel::delete_reel
        ))
        .routes(routes!(handlers::reel::toggle_reel_like))
        .routes(routes!(handlers::reel::share_reel))
        .routes(routes!(
            handlers::reel::list_reel_comments,
            handlers::reel::create_reel_comment
        ))
        .routes(routes!(
            handlers::reel::update_reel_comment,
            handlers::reel::delete_reel_comment
        ))
        .routes(routes!(handlers::reel::toggle_reel_comment_like))
}

fn course_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::course::list_courses,
            handlers::course::create_course
        ))
        .routes(routes!(handlers::course::course_stats))
        .routes(routes!(handlers::course::seed_courses))
        .routes(routes!(handlers::course::list_purchased_courses))
        .routes(routes!(
            handlers::course::get_course,
            handlers::course::update_course,
            handlers::course::delete_course
        ))
        .routes(routes!(handlers::course::purchase_course))
        .routes(routes!(
            handlers::course::list_course_videos,
            handlers::course::create_course_video
        ))
        .routes(routes!(
            handlers::course::get_course_video,
            handlers::course::update_course_video,
            handlers::course::delete_course_video
        ))
}

fn blog_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::blog::list_blogs))
        .routes(routes!(handlers::blog::generate_blogs))
        .routes(routes!(handlers::blog::get_blog))
}

fn waitlist_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::waitlist::join_waitlist))
        .routes(routes!(handlers::waitlist::waitlist_count))
        .routes(routes!(handlers::waitlist::list_waitlist_users))
        .routes(routes!(handlers::waitlist::delete_waitlist_user))
}

fn upload_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::upload::create_presigned_url))
}
