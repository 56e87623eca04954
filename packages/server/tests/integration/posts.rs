use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use server::entity::{bookmark, comment, like};

use crate::common::{MEDIA_BASE_URL, TestApp, routes};

#[tokio::test]
async fn create_post_starts_with_zero_counters() {
    let app = TestApp::spawn().await;
    let token = app.create_user("poster", "9000000010").await;

    let res = app
        .post_with_token(routes::POSTS, &json!({"content": "first!"}), &token)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    let data = res.data();
    assert_eq!(data["likeCount"], 0);
    assert_eq!(data["shareCount"], 0);
    assert_eq!(data["bookmarkCount"], 0);
    assert_eq!(data["commentCount"], 0);
    assert_eq!(data["isRetweet"], false);
    assert_eq!(data["isLiked"], false);
    assert_eq!(data["user"]["username"], "poster");
}

#[tokio::test]
async fn create_post_requires_content_or_images() {
    let app = TestApp::spawn().await;
    let token = app.create_user("empty", "9000000011").await;

    let res = app.post_with_token(routes::POSTS, &json!({}), &token).await;
    assert_eq!(res.status, 400, "{}", res.text);

    let res = app
        .post_with_token(
            routes::POSTS,
            &json!({"content": "  ", "images": []}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);

    let res = app
        .post_with_token(
            routes::POSTS,
            &json!({"images": [format!("{MEDIA_BASE_URL}/posts/a.png")]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
}

#[tokio::test]
async fn retweet_bumps_share_count_and_enforces_invariants() {
    let app = TestApp::spawn().await;
    let author = app.create_user("author", "9000000012").await;
    let fan = app.create_user("fan", "9000000013").await;
    let other = app.create_user("other", "9000000014").await;

    let post_id = app.create_post(&author, "retweet me").await;

    let res = app
        .post_with_token(
            routes::RETWEET,
            &json!({"originalPostId": post_id, "content": "so true"}),
            &fan,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let retweet_id = res.id();
    assert_eq!(res.data()["isRetweet"], true);
    assert_eq!(res.data()["originalPost"]["id"], post_id);

    // Exactly one share counted on the original.
    let res = app.get_without_token(&routes::post(post_id)).await;
    assert_eq!(res.data()["shareCount"], 1);

    // Same user retweeting the same original again conflicts.
    let res = app
        .post_with_token(routes::RETWEET, &json!({"originalPostId": post_id}), &fan)
        .await;
    assert_eq!(res.status, 409, "{}", res.text);

    // Retweeting a retweet is rejected.
    let res = app
        .post_with_token(
            routes::RETWEET,
            &json!({"originalPostId": retweet_id}),
            &other,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);

    // Counter unchanged by the failed attempts.
    let res = app.get_without_token(&routes::post(post_id)).await;
    assert_eq!(res.data()["shareCount"], 1);
}

#[tokio::test]
async fn retweet_of_missing_post_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.create_user("ghost", "9000000015").await;

    let res = app
        .post_with_token(routes::RETWEET, &json!({"originalPostId": 424242}), &token)
        .await;
    assert_eq!(res.status, 404, "{}", res.text);
}

#[tokio::test]
async fn like_toggle_round_trip() {
    let app = TestApp::spawn().await;
    let token = app.create_user("liker", "9000000016").await;
    let post_id = app.create_post(&token, "like me").await;

    let res = app
        .post_with_token(&routes::post_like(post_id), &json!({}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["liked"], true);
    assert_eq!(res.data()["likeCount"], 1);

    let res = app
        .post_with_token(&routes::post_like(post_id), &json!({}), &token)
        .await;
    assert_eq!(res.data()["liked"], false);
    assert_eq!(res.data()["likeCount"], 0);
}

#[tokio::test]
async fn bookmark_toggle_round_trip() {
    let app = TestApp::spawn().await;
    let token = app.create_user("marker", "9000000017").await;
    let post_id = app.create_post(&token, "save me").await;

    let res = app
        .post_with_token(&routes::post_bookmark(post_id), &json!({}), &token)
        .await;
    assert_eq!(res.data()["bookmarked"], true);
    assert_eq!(res.data()["bookmarkCount"], 1);

    let res = app
        .post_with_token(&routes::post_bookmark(post_id), &json!({}), &token)
        .await;
    assert_eq!(res.data()["bookmarked"], false);
    assert_eq!(res.data()["bookmarkCount"], 0);
}

#[tokio::test]
async fn feed_pagination_boundaries() {
    let app = TestApp::spawn().await;
    let token = app.create_user("pager", "9000000018").await;

    for i in 0..5 {
        app.create_post(&token, &format!("post {i}")).await;
    }

    let res = app.get_without_token("/api/posts?page=1&limit=2").await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data().as_array().unwrap().len(), 2);
    assert_eq!(res.pagination()["total"], 5);
    assert_eq!(res.pagination()["totalPages"], 3);

    // Last page holds the remainder.
    let res = app.get_without_token("/api/posts?page=3&limit=2").await;
    assert_eq!(res.data().as_array().unwrap().len(), 1);

    // Beyond the last page: empty data, same metadata.
    let res = app.get_without_token("/api/posts?page=4&limit=2").await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);
    assert_eq!(res.pagination()["totalPages"], 3);
}

#[tokio::test]
async fn feed_is_newest_first_and_viewer_enriched() {
    let app = TestApp::spawn().await;
    let author = app.create_user("writer", "9000000019").await;
    let reader = app.create_user("reader", "9000000020").await;

    let first = app.create_post(&author, "older").await;
    let second = app.create_post(&author, "newer").await;

    app.post_with_token(&routes::post_like(first), &json!({}), &reader)
        .await;

    let res = app.get_with_token("/api/posts?limit=10", &reader).await;
    let items = res.data().as_array().unwrap();
    assert_eq!(items[0]["id"], second);
    assert_eq!(items[1]["id"], first);
    assert_eq!(items[1]["isLiked"], true);
    assert_eq!(items[0]["isLiked"], false);

    // Anonymous feed carries no viewer state.
    let res = app.get_without_token("/api/posts?limit=10").await;
    let items = res.data().as_array().unwrap();
    assert_eq!(items[1]["isLiked"], false);
}

#[tokio::test]
async fn single_post_read_omits_viewer_flags() {
    let app = TestApp::spawn().await;
    let token = app.create_user("asym", "9000000021").await;
    let post_id = app.create_post(&token, "flagless").await;

    app.post_with_token(&routes::post_like(post_id), &json!({}), &token)
        .await;

    // The by-id path never computes viewer state, token or not.
    let res = app.get_with_token(&routes::post(post_id), &token).await;
    assert_eq!(res.data()["isLiked"], false);
    assert_eq!(res.data()["likeCount"], 1);
}

#[tokio::test]
async fn update_post_is_owner_only() {
    let app = TestApp::spawn().await;
    let owner = app.create_user("owner", "9000000022").await;
    let intruder = app.create_user("intruder", "9000000023").await;
    let post_id = app.create_post(&owner, "mine").await;

    let res = app
        .put_with_token(&routes::post(post_id), &json!({"content": "hacked"}), &intruder)
        .await;
    assert_eq!(res.status, 403, "{}", res.text);

    let res = app
        .put_with_token(&routes::post(post_id), &json!({"content": "edited"}), &owner)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["content"], "edited");
}

#[tokio::test]
async fn delete_post_cascades_and_cleans_media() {
    let app = TestApp::spawn().await;
    let owner = app.create_user("cascade", "9000000024").await;
    let commenter = app.create_user("chatty", "9000000025").await;

    let image_url = format!("{MEDIA_BASE_URL}/posts/pic.png");
    let res = app
        .post_with_token(
            routes::POSTS,
            &json!({"content": "doomed", "images": [image_url]}),
            &owner,
        )
        .await;
    let post_id = res.id();

    let res = app
        .post_with_token(
            &routes::post_comments(post_id),
            &json!({"content": "rip"}),
            &commenter,
        )
        .await;
    let comment_id = res.id();

    app.post_with_token(&routes::post_like(post_id), &json!({}), &commenter)
        .await;
    app.post_with_token(&routes::comment_like(comment_id), &json!({}), &commenter)
        .await;
    app.post_with_token(&routes::post_bookmark(post_id), &json!({}), &commenter)
        .await;

    let res = app.delete_with_token(&routes::post(post_id), &owner).await;
    assert_eq!(res.status, 200, "{}", res.text);

    // No rows reference the deleted post any more.
    let comments = comment::Entity::find()
        .filter(comment::Column::PostId.eq(post_id as i32))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(comments, 0);

    let likes = like::Entity::find().count(&app.db).await.unwrap();
    assert_eq!(likes, 0);

    let bookmarks = bookmark::Entity::find()
        .filter(bookmark::Column::PostId.eq(post_id as i32))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(bookmarks, 0);

    // Image cleanup went through the object store.
    assert!(app.store.deleted_keys().contains(&"posts/pic.png".to_string()));

    let res = app.get_without_token(&routes::post(post_id)).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn deleting_original_clears_retweet_origin() {
    let app = TestApp::spawn().await;
    let author = app.create_user("origin", "9000000026").await;
    let fan = app.create_user("echo", "9000000027").await;

    let post_id = app.create_post(&author, "short-lived").await;
    let res = app
        .post_with_token(routes::RETWEET, &json!({"originalPostId": post_id}), &fan)
        .await;
    let retweet_id = res.id();

    app.delete_with_token(&routes::post(post_id), &author).await;

    let res = app.get_without_token(&routes::post(retweet_id)).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["isRetweet"], true);
    assert!(res.data()["originalPost"].is_null());
}

#[tokio::test]
async fn comment_crud_and_like() {
    let app = TestApp::spawn().await;
    let owner = app.create_user("cowner", "9000000028").await;
    let other = app.create_user("cother", "9000000029").await;
    let post_id = app.create_post(&owner, "discuss").await;

    let res = app
        .post_with_token(
            &routes::post_comments(post_id),
            &json!({"content": "interesting"}),
            &other,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let comment_id = res.id();
    assert_eq!(res.data()["likeCount"], 0);

    // Comment likes toggle with their own counter.
    let res = app
        .post_with_token(&routes::comment_like(comment_id), &json!({}), &owner)
        .await;
    assert_eq!(res.data()["liked"], true);
    assert_eq!(res.data()["likeCount"], 1);

    // Only the comment owner can edit it.
    let res = app
        .put_with_token(
            &routes::comment(comment_id),
            &json!({"content": "edited"}),
            &owner,
        )
        .await;
    assert_eq!(res.status, 403, "{}", res.text);

    let res = app
        .put_with_token(
            &routes::comment(comment_id),
            &json!({"content": "edited"}),
            &other,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app
        .get_without_token(&routes::post_comments(post_id))
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 1);
    assert_eq!(res.data()[0]["content"], "edited");

    let res = app
        .delete_with_token(&routes::comment(comment_id), &other)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app
        .get_without_token(&routes::post_comments(post_id))
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn feed_carries_latest_five_comments() {
    let app = TestApp::spawn().await;
    let owner = app.create_user("busy", "9000000030").await;
    let post_id = app.create_post(&owner, "popular").await;

    for i in 0..7 {
        let res = app
            .post_with_token(
                &routes::post_comments(post_id),
                &json!({"content": format!("comment {i}")}),
                &owner,
            )
            .await;
        assert_eq!(res.status, 201);
    }

    let res = app.get_without_token(&routes::post(post_id)).await;
    assert_eq!(res.data()["commentCount"], 7);
    assert_eq!(res.data()["comments"].as_array().unwrap().len(), 5);
    // Newest first.
    assert_eq!(res.data()["comments"][0]["content"], "comment 6");
}
