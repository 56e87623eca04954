use sea_orm::*;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::user::ROLE_ADMIN;
use crate::entity::{course, course_video, user};
use crate::error::AppError;
use crate::utils::hash;

/// Indexes the schema sync cannot express: composite uniques, the
/// partial uniques behind the polymorphic like rows, and a few
/// query-shaped composites. Created manually on startup.
const INDEXES: &[(&str, &str)] = &[
    (
        "idx_likes_user_post",
        r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_likes_user_post" ON "likes" ("user_id", "post_id") WHERE "post_id" IS NOT NULL"#,
    ),
    (
        "idx_likes_user_comment",
        r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_likes_user_comment" ON "likes" ("user_id", "comment_id") WHERE "comment_id" IS NOT NULL"#,
    ),
    (
        "idx_reel_like_user_reel",
        r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_reel_like_user_reel" ON "reel_like" ("user_id", "reel_id") WHERE "reel_id" IS NOT NULL"#,
    ),
    (
        "idx_reel_like_user_comment",
        r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_reel_like_user_comment" ON "reel_like" ("user_id", "reel_comment_id") WHERE "reel_comment_id" IS NOT NULL"#,
    ),
    (
        "idx_bookmark_user_post",
        r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_bookmark_user_post" ON "bookmark" ("user_id", "post_id")"#,
    ),
    (
        "idx_purchase_user_course",
        r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_purchase_user_course" ON "course_purchase" ("user_id", "course_id")"#,
    ),
    (
        "idx_post_retweet_once",
        r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_post_retweet_once" ON "post" ("user_id", "original_post_id") WHERE "is_retweet" AND "original_post_id" IS NOT NULL"#,
    ),
    (
        "idx_post_created",
        r#"CREATE INDEX IF NOT EXISTS "idx_post_created" ON "post" ("created_at")"#,
    ),
    (
        "idx_comment_post_created",
        r#"CREATE INDEX IF NOT EXISTS "idx_comment_post_created" ON "comment" ("post_id", "created_at")"#,
    ),
    (
        "idx_blog_published",
        r#"CREATE INDEX IF NOT EXISTS "idx_blog_published" ON "blog_post" ("published_at")"#,
    ),
];

/// Ensure required database indexes exist.
///
/// The uniqueness constraints here are what turns toggle/retweet/purchase
/// races into clean 409s instead of duplicate rows.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    for &(name, stmt) in INDEXES {
        match db.execute_unprepared(stmt).await {
            Ok(_) => info!("Ensured index {name} exists"),
            Err(e) => tracing::warn!("Failed to create index {name}: {e}"),
        }
    }
    Ok(())
}

/// Create the bootstrap admin account from config, if configured and
/// not already present.
pub async fn seed_admin(db: &DatabaseConnection, auth: &AuthConfig) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&auth.admin_email, &auth.admin_password) else {
        return Ok(());
    };

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email.to_lowercase()))
        .count(db)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let password_hash = hash::hash_password(password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let now = chrono::Utc::now();
    let admin = user::ActiveModel {
        name: Set("Administrator".to_string()),
        username: Set("admin".to_string()),
        email: Set(email.to_lowercase()),
        mobile_number: Set("0000000000".to_string()),
        password: Set(Some(password_hash)),
        role: Set(ROLE_ADMIN.to_string()),
        is_verified: Set(true),
        avatar: Set(None),
        is_influencer: Set(false),
        influencer_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    admin.insert(db).await?;

    info!(email = %email, "Seeded bootstrap admin account");
    Ok(())
}

struct DemoCourse {
    title: &'static str,
    description: &'static str,
    price: i32,
    original_price: i32,
    level: &'static str,
    category: &'static str,
    videos: &'static [(&'static str, i32)],
}

const DEMO_COURSES: &[DemoCourse] = &[
    DemoCourse {
        title: "Stock Market Foundations",
        description: "How exchanges, order books and index funds actually work.",
        price: 49900,
        original_price: 99900,
        level: "beginner",
        category: "equities",
        videos: &[("What is a share?", 420), ("Reading an order book", 540)],
    },
    DemoCourse {
        title: "Options Strategies",
        description: "Covered calls, spreads and the greeks, with worked examples.",
        price: 129900,
        original_price: 199900,
        level: "intermediate",
        category: "derivatives",
        videos: &[("Calls and puts", 600), ("The greeks in practice", 720)],
    },
    DemoCourse {
        title: "Portfolio Risk Management",
        description: "Position sizing, drawdowns and hedging for active portfolios.",
        price: 159900,
        original_price: 249900,
        level: "advanced",
        category: "risk",
        videos: &[("Sizing positions", 480), ("Hedging with futures", 660)],
    },
];

/// Insert the demo catalog when the course table is empty.
/// Returns the number of courses created.
pub async fn seed_demo_courses(db: &DatabaseConnection) -> Result<u32, AppError> {
    let existing = course::Entity::find().count(db).await?;
    if existing > 0 {
        return Ok(0);
    }

    let now = chrono::Utc::now();
    let txn = db.begin().await?;

    for demo in DEMO_COURSES {
        let new_course = course::ActiveModel {
            title: Set(demo.title.to_string()),
            description: Set(demo.description.to_string()),
            price: Set(demo.price),
            original_price: Set(Some(demo.original_price)),
            level: Set(demo.level.to_string()),
            category: Set(demo.category.to_string()),
            thumbnail: Set(format!(
                "https://assets.finch.app/courses/{}.png",
                demo.title.to_lowercase().replace(' ', "-")
            )),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = new_course.insert(&txn).await?;

        for (position, &(title, duration)) in demo.videos.iter().enumerate() {
            let new_video = course_video::ActiveModel {
                course_id: Set(model.id),
                title: Set(title.to_string()),
                video_url: Set(format!(
                    "https://assets.finch.app/courses/{}/{}.mp4",
                    model.id, position
                )),
                duration_seconds: Set(duration),
                position: Set(position as i32),
                is_active: Set(true),
                created_at: Set(now),
                ..Default::default()
            };
            new_video.insert(&txn).await?;
        }
    }

    txn.commit().await?;

    info!(count = DEMO_COURSES.len(), "Seeded demo course catalog");
    Ok(DEMO_COURSES.len() as u32)
}
