use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use server::entity::{reel_comment, reel_like};

use crate::common::{MEDIA_BASE_URL, TestApp, routes};

#[tokio::test]
async fn create_reel_validates_duration() {
    let app = TestApp::spawn().await;
    let token = app.create_user("reeler", "9100000001").await;

    for bad in [0, 301, -5] {
        let res = app
            .post_with_token(
                routes::REELS,
                &json!({
                    "videoUrl": format!("{MEDIA_BASE_URL}/reels/clip.mp4"),
                    "durationSeconds": bad,
                }),
                &token,
            )
            .await;
        assert_eq!(res.status, 400, "duration {bad}: {}", res.text);
    }

    let res = app
        .post_with_token(
            routes::REELS,
            &json!({
                "videoUrl": format!("{MEDIA_BASE_URL}/reels/clip.mp4"),
                "durationSeconds": 300,
            }),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.data()["likeCount"], 0);
    assert_eq!(res.data()["shareCount"], 0);
}

#[tokio::test]
async fn reel_like_toggle_and_share_counter() {
    let app = TestApp::spawn().await;
    let token = app.create_user("viral", "9100000002").await;
    let reel_id = app.create_reel(&token, 30).await;

    let res = app
        .post_with_token(&routes::reel_like(reel_id), &json!({}), &token)
        .await;
    assert_eq!(res.data()["liked"], true);
    assert_eq!(res.data()["likeCount"], 1);

    let res = app
        .post_with_token(&routes::reel_like(reel_id), &json!({}), &token)
        .await;
    assert_eq!(res.data()["liked"], false);
    assert_eq!(res.data()["likeCount"], 0);

    let res = app
        .post_with_token(&routes::reel_share(reel_id), &json!({}), &token)
        .await;
    assert_eq!(res.data()["shareCount"], 1);
    let res = app
        .post_with_token(&routes::reel_share(reel_id), &json!({}), &token)
        .await;
    assert_eq!(res.data()["shareCount"], 2);
}

#[tokio::test]
async fn reel_comments_mirror_post_comments() {
    let app = TestApp::spawn().await;
    let owner = app.create_user("rowner", "9100000003").await;
    let fan = app.create_user("rfan", "9100000004").await;
    let reel_id = app.create_reel(&owner, 45).await;

    let res = app
        .post_with_token(
            &routes::reel_comments(reel_id),
            &json!({"content": "banger"}),
            &fan,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let comment_id = res.id();

    let res = app
        .post_with_token(&routes::reel_comment_like(comment_id), &json!({}), &owner)
        .await;
    assert_eq!(res.data()["liked"], true);
    assert_eq!(res.data()["likeCount"], 1);

    let res = app
        .get_without_token(&routes::reel_comments(reel_id))
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 1);

    // Enriched on the reel itself.
    let res = app.get_without_token(&routes::reel(reel_id)).await;
    assert_eq!(res.data()["commentCount"], 1);
    assert_eq!(res.data()["comments"][0]["content"], "banger");
}

#[tokio::test]
async fn update_reel_is_owner_only_and_caption_only() {
    let app = TestApp::spawn().await;
    let owner = app.create_user("rauth", "9100000005").await;
    let intruder = app.create_user("rintr", "9100000006").await;
    let reel_id = app.create_reel(&owner, 60).await;

    let res = app
        .put_with_token(&routes::reel(reel_id), &json!({"content": "nope"}), &intruder)
        .await;
    assert_eq!(res.status, 403, "{}", res.text);

    let res = app
        .put_with_token(&routes::reel(reel_id), &json!({"content": "new caption"}), &owner)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["content"], "new caption");
    assert_eq!(res.data()["durationSeconds"], 60);
}

#[tokio::test]
async fn delete_reel_cascades_and_cleans_video() {
    let app = TestApp::spawn().await;
    let owner = app.create_user("rdel", "9100000007").await;
    let fan = app.create_user("rdelfan", "9100000008").await;
    let reel_id = app.create_reel(&owner, 20).await;

    let res = app
        .post_with_token(
            &routes::reel_comments(reel_id),
            &json!({"content": "gone soon"}),
            &fan,
        )
        .await;
    let comment_id = res.id();
    app.post_with_token(&routes::reel_like(reel_id), &json!({}), &fan)
        .await;
    app.post_with_token(&routes::reel_comment_like(comment_id), &json!({}), &fan)
        .await;

    let res = app.delete_with_token(&routes::reel(reel_id), &owner).await;
    assert_eq!(res.status, 200, "{}", res.text);

    assert_eq!(reel_comment::Entity::find().count(&app.db).await.unwrap(), 0);
    assert_eq!(reel_like::Entity::find().count(&app.db).await.unwrap(), 0);
    assert!(app.store.deleted_keys().contains(&"reels/clip.mp4".to_string()));

    let res = app.get_without_token(&routes::reel(reel_id)).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn reel_feed_paginates_newest_first() {
    let app = TestApp::spawn().await;
    let token = app.create_user("rfeed", "9100000009").await;

    for i in 0..3 {
        app.create_reel(&token, 10 + i).await;
    }

    let res = app.get_without_token("/api/reels?page=1&limit=2").await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data().as_array().unwrap().len(), 2);
    assert_eq!(res.pagination()["total"], 3);
    assert_eq!(res.pagination()["totalPages"], 2);
    assert_eq!(res.data()[0]["durationSeconds"], 12);
}
