use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use server::entity::course_purchase;

use crate::common::{MEDIA_BASE_URL, TestApp, routes};

#[tokio::test]
async fn course_creation_is_admin_only_and_transactional() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("cadmin", "p@ssw0rd_1").await;
    let user = app.create_user("student", "9200000001").await;

    let body = json!({
        "title": "Futures 101",
        "description": "Margin and settlement.",
        "price": 79900,
        "level": "beginner",
        "category": "derivatives",
        "thumbnail": format!("{MEDIA_BASE_URL}/courses/f.png"),
        "videos": [
            {"title": "Contracts", "videoUrl": "v1.mp4", "durationSeconds": 300},
            {"title": "Margins", "videoUrl": "v2.mp4", "durationSeconds": 400},
        ],
    });

    let res = app.post_with_token(routes::COURSES, &body, &user).await;
    assert_eq!(res.status, 403, "{}", res.text);

    let res = app.post_with_token(routes::COURSES, &body, &admin).await;
    assert_eq!(res.status, 201, "{}", res.text);
    let course_id = res.id();

    // Videos landed with positions from the array order; admin bypasses
    // the purchase gate.
    let res = app
        .get_with_token(&routes::course_videos(course_id), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let videos = res.data().as_array().unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0]["title"], "Contracts");
    assert_eq!(videos[0]["position"], 0);
    assert_eq!(videos[1]["position"], 1);
}

#[tokio::test]
async fn purchase_snapshots_price_and_rejects_duplicates() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("padmin", "p@ssw0rd_2").await;
    let user = app.create_user("buyer", "9200000002").await;
    let user_id = app.user_id("buyer").await;

    let course_id = app.create_course(&admin, "Price Course", 50000).await;

    let res = app
        .post_with_token(&routes::course_purchase(course_id), &json!({}), &user)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.data()["purchasePrice"], 50000);

    let res = app
        .post_with_token(&routes::course_purchase(course_id), &json!({}), &user)
        .await;
    assert_eq!(res.status, 409, "{}", res.text);

    // Catalog price changes leave the recorded price untouched.
    let res = app
        .put_with_token(&routes::course(course_id), &json!({"price": 99000}), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let purchase = course_purchase::Entity::find()
        .filter(course_purchase::Column::UserId.eq(user_id))
        .filter(course_purchase::Column::CourseId.eq(course_id as i32))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(purchase.purchase_price, 50000);
}

#[tokio::test]
async fn videos_are_gated_on_purchase() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("vadmin", "p@ssw0rd_3").await;
    let user = app.create_user("viewer", "9200000003").await;

    let course_id = app.create_course(&admin, "Gated Course", 10000).await;

    // Out-of-order positions to prove ordering on read.
    for (title, pos) in [("Third", 2), ("First", 0), ("Second", 1)] {
        let res = app
            .post_with_token(
                &routes::course_videos(course_id),
                &json!({
                    "title": title,
                    "videoUrl": format!("{title}.mp4"),
                    "durationSeconds": 120,
                    "position": pos,
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let res = app
        .get_with_token(&routes::course_videos(course_id), &user)
        .await;
    assert_eq!(res.status, 403, "{}", res.text);

    app.post_with_token(&routes::course_purchase(course_id), &json!({}), &user)
        .await;

    let res = app
        .get_with_token(&routes::course_videos(course_id), &user)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let titles: Vec<_> = res
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);
}

#[tokio::test]
async fn single_video_read_is_gated_and_scoped() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("svadmin", "p@ssw0rd_4").await;
    let user = app.create_user("sviewer", "9200000004").await;

    let course_a = app.create_course(&admin, "Course A", 10000).await;
    let course_b = app.create_course(&admin, "Course B", 10000).await;

    let res = app
        .post_with_token(
            &routes::course_videos(course_a),
            &json!({"title": "Only in A", "videoUrl": "a.mp4", "durationSeconds": 60}),
            &admin,
        )
        .await;
    let video_id = res.id();

    app.post_with_token(&routes::course_purchase(course_a), &json!({}), &user)
        .await;

    let res = app
        .get_with_token(&routes::course_video(course_a, video_id), &user)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    // The same video is not addressable through another course.
    let res = app
        .get_with_token(&routes::course_video(course_b, video_id), &admin)
        .await;
    assert_eq!(res.status, 404, "{}", res.text);
}

#[tokio::test]
async fn soft_deleted_course_survives_for_buyers() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("dadmin", "p@ssw0rd_5").await;
    let user = app.create_user("keeper", "9200000005").await;

    let course_id = app.create_course(&admin, "Retiring Course", 30000).await;
    app.post_with_token(&routes::course_purchase(course_id), &json!({}), &user)
        .await;

    let res = app.delete_with_token(&routes::course(course_id), &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);

    // Gone from the public catalog and by-id reads...
    let res = app.get_without_token(routes::COURSES).await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);
    let res = app.get_with_token(&routes::course(course_id), &user).await;
    assert_eq!(res.status, 404, "{}", res.text);

    // ...but admins still see it, and the buyer's library keeps it.
    let res = app.get_with_token(&routes::course(course_id), &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get_with_token(routes::PURCHASED, &user).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data().as_array().unwrap().len(), 1);
    assert_eq!(res.data()[0]["id"], course_id);

    // Purchasing a retired course is rejected.
    let other = app.create_user("late", "9200000006").await;
    let res = app
        .post_with_token(&routes::course_purchase(course_id), &json!({}), &other)
        .await;
    assert_eq!(res.status, 404, "{}", res.text);
}

#[tokio::test]
async fn admin_stats_aggregate_purchases() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("sadmin", "p@ssw0rd_6").await;
    let buyer_a = app.create_user("buyera", "9200000007").await;
    let buyer_b = app.create_user("buyerb", "9200000008").await;

    let course_a = app.create_course(&admin, "Stats A", 10000).await;
    let course_b = app.create_course(&admin, "Stats B", 25000).await;

    app.post_with_token(&routes::course_purchase(course_a), &json!({}), &buyer_a)
        .await;
    app.post_with_token(&routes::course_purchase(course_b), &json!({}), &buyer_a)
        .await;
    app.post_with_token(&routes::course_purchase(course_b), &json!({}), &buyer_b)
        .await;

    let res = app.get_with_token(routes::COURSE_STATS, &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["totalCourses"], 2);
    assert_eq!(res.data()["activeCourses"], 2);
    assert_eq!(res.data()["totalPurchases"], 3);
    assert_eq!(res.data()["totalRevenue"], 60000);

    let user_res = app.get_with_token(routes::COURSE_STATS, &buyer_a).await;
    assert_eq!(user_res.status, 403);
}

#[tokio::test]
async fn demo_seed_is_idempotent() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("seeder", "p@ssw0rd_7").await;

    let res = app
        .post_with_token(routes::COURSE_SEED, &json!({}), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["coursesCreated"], 3);

    // A non-empty catalog is left alone.
    let res = app
        .post_with_token(routes::COURSE_SEED, &json!({}), &admin)
        .await;
    assert_eq!(res.data()["coursesCreated"], 0);

    let res = app.get_without_token(routes::COURSES).await;
    assert_eq!(res.data().as_array().unwrap().len(), 3);
}
