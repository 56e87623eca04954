use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn join_count_and_duplicate_rejection() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::WAITLIST_JOIN,
            &json!({"name": "Early Bird", "email": "early@x.com"}),
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.data()["email"], "early@x.com");

    let res = app
        .post_without_token(routes::WAITLIST_JOIN, &json!({"email": "second@x.com"}))
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    // Same email, different casing still conflicts.
    let res = app
        .post_without_token(routes::WAITLIST_JOIN, &json!({"email": "EARLY@x.com"}))
        .await;
    assert_eq!(res.status, 409, "{}", res.text);

    let res = app.get_without_token(routes::WAITLIST_COUNT).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["count"], 2);
}

#[tokio::test]
async fn join_validates_email() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(routes::WAITLIST_JOIN, &json!({"email": "nope"}))
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
}

#[tokio::test]
async fn admin_crud_is_role_gated() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("wladmin", "p@ssw0rd_8").await;
    let user = app.create_user("wluser", "9400000001").await;

    app.post_without_token(routes::WAITLIST_JOIN, &json!({"email": "a@x.com"}))
        .await;
    app.post_without_token(routes::WAITLIST_JOIN, &json!({"email": "b@x.com"}))
        .await;

    let res = app.get_with_token(routes::WAITLIST_ADMIN, &user).await;
    assert_eq!(res.status, 403, "{}", res.text);

    let res = app.get_with_token(routes::WAITLIST_ADMIN, &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);
    let entries = res.data().as_array().unwrap();
    assert_eq!(entries.len(), 2);
    // Oldest first.
    assert_eq!(entries[0]["email"], "a@x.com");

    let first_id = entries[0]["id"].as_i64().unwrap();
    let res = app
        .delete_with_token(&routes::waitlist_admin_user(first_id), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get_without_token(routes::WAITLIST_COUNT).await;
    assert_eq!(res.data()["count"], 1);

    let res = app
        .delete_with_token(&routes::waitlist_admin_user(first_id), &admin)
        .await;
    assert_eq!(res.status, 404, "{}", res.text);
}

#[tokio::test]
async fn presigned_url_issuance() {
    let app = TestApp::spawn().await;
    let token = app.create_user("uploader", "9500000001").await;

    let res = app
        .post_without_token(
            routes::PRESIGNED_URL,
            &json!({"fileName": "a.png", "contentType": "image/png"}),
        )
        .await;
    assert_eq!(res.status, 401, "{}", res.text);

    let res = app
        .post_with_token(
            routes::PRESIGNED_URL,
            &json!({"fileName": "sunset.jpg", "contentType": "image/jpeg", "folder": "posts"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let key = res.data()["key"].as_str().unwrap();
    assert!(key.starts_with("posts/"));
    assert!(key.ends_with(".jpg"));
    assert!(res.data()["uploadUrl"].as_str().unwrap().contains(key));
    assert!(res.data()["publicUrl"].as_str().unwrap().ends_with(key));

    let res = app
        .post_with_token(
            routes::PRESIGNED_URL,
            &json!({"fileName": "evil.exe", "contentType": "image/png"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
}
