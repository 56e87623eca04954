use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn signup_returns_token_and_issues_otp() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::SIGNUP,
            &json!({
                "name": "A",
                "username": "a1",
                "email": "a@x.com",
                "mobileNumber": "9999999999",
            }),
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["success"], true);
    let token = res.body["data"]["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(res.body["data"]["user"]["role"], "user");
    assert_eq!(res.body["data"]["user"]["isVerified"], false);

    // Signup triggers an OTP send for the number.
    let code = app.otp_code("9999999999").await;
    assert_eq!(code.len(), 6);

    let profile = app.get_with_token(routes::PROFILE, token).await;
    assert_eq!(profile.status, 200);
    assert_eq!(profile.data()["username"], "a1");
}

#[tokio::test]
async fn signup_rejects_duplicates_and_bad_input() {
    let app = TestApp::spawn().await;

    app.create_user("dupe", "9000000001").await;

    let res = app
        .post_without_token(
            routes::SIGNUP,
            &json!({
                "name": "Other",
                "username": "dupe",
                "email": "other@x.com",
                "mobileNumber": "9000000002",
            }),
        )
        .await;
    assert_eq!(res.status, 409, "{}", res.text);
    assert_eq!(res.body["success"], false);

    let res = app
        .post_without_token(
            routes::SIGNUP,
            &json!({
                "name": "B",
                "username": "b1",
                "email": "not-an-email",
                "mobileNumber": "9000000003",
            }),
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
}

#[tokio::test]
async fn verify_otp_end_to_end() {
    let app = TestApp::spawn().await;

    app.create_user("otp_user", "9111111111").await;
    let code = app.otp_code("9111111111").await;

    let res = app
        .post_without_token(
            routes::VERIFY_OTP,
            &json!({"mobileNumber": "9111111111", "code": code}),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["user"]["role"], "user");
    assert_eq!(res.body["data"]["user"]["isVerified"], true);

    // One-time use: replaying the code fails.
    let res = app
        .post_without_token(
            routes::VERIFY_OTP,
            &json!({"mobileNumber": "9111111111", "code": code}),
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
}

#[tokio::test]
async fn wrong_otp_attempts_then_lockout() {
    let app = TestApp::spawn().await;

    app.create_user("locked", "9222222222").await;
    let code = app.otp_code("9222222222").await;
    let wrong = if code == "000000" { "000001" } else { "000000" };

    for _ in 0..5 {
        let res = app
            .post_without_token(
                routes::VERIFY_OTP,
                &json!({"mobileNumber": "9222222222", "code": wrong}),
            )
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
    }

    // Sixth attempt is locked out even with the correct code.
    let res = app
        .post_without_token(
            routes::VERIFY_OTP,
            &json!({"mobileNumber": "9222222222", "code": code}),
        )
        .await;
    assert_eq!(res.status, 429, "{}", res.text);
}

#[tokio::test]
async fn correct_otp_before_lockout_succeeds() {
    let app = TestApp::spawn().await;

    app.create_user("almost", "9333333333").await;
    let code = app.otp_code("9333333333").await;
    let wrong = if code == "000000" { "000001" } else { "000000" };

    for _ in 0..4 {
        let res = app
            .post_without_token(
                routes::VERIFY_OTP,
                &json!({"mobileNumber": "9333333333", "code": wrong}),
            )
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
    }

    let res = app
        .post_without_token(
            routes::VERIFY_OTP,
            &json!({"mobileNumber": "9333333333", "code": code}),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn resend_otp_is_rate_limited_while_fresh() {
    let app = TestApp::spawn().await;

    app.create_user("resend", "9444444444").await;

    let res = app
        .post_without_token(routes::SEND_OTP, &json!({"mobileNumber": "9444444444"}))
        .await;
    assert_eq!(res.status, 429, "{}", res.text);
}

#[tokio::test]
async fn send_otp_unknown_number_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(routes::SEND_OTP, &json!({"mobileNumber": "9555555555"}))
        .await;
    assert_eq!(res.status, 404, "{}", res.text);
}

#[tokio::test]
async fn admin_signin_and_admin_create() {
    let app = TestApp::spawn().await;

    let admin_token = app.create_admin("root", "s3cure_P@ss!").await;

    let res = app
        .post_with_token(
            routes::ADMIN_CREATE,
            &json!({
                "name": "Second Admin",
                "username": "root2",
                "email": "root2@example.com",
                "mobileNumber": "9666666666",
                "password": "another_P@ss!",
            }),
            &admin_token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.data()["role"], "admin");

    // The new admin can sign in with their password.
    let res = app
        .post_without_token(
            routes::ADMIN_SIGNIN,
            &json!({"email": "root2@example.com", "password": "another_P@ss!"}),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn admin_endpoints_are_role_gated() {
    let app = TestApp::spawn().await;

    let user_token = app.create_user("pleb", "9777777777").await;

    let res = app
        .post_with_token(
            routes::ADMIN_CREATE,
            &json!({
                "name": "X",
                "username": "x1",
                "email": "x@example.com",
                "mobileNumber": "9888888888",
                "password": "whatever_123",
            }),
            &user_token,
        )
        .await;
    assert_eq!(res.status, 403, "{}", res.text);
}

#[tokio::test]
async fn admin_signin_rejects_regular_accounts_and_bad_passwords() {
    let app = TestApp::spawn().await;

    app.create_user("nopass", "9123456780").await;
    let res = app
        .post_without_token(
            routes::ADMIN_SIGNIN,
            &json!({"email": "nopass@example.com", "password": "anything123"}),
        )
        .await;
    assert_eq!(res.status, 401, "{}", res.text);

    app.create_admin("realadmin", "correct_P@ss1").await;
    let res = app
        .post_without_token(
            routes::ADMIN_SIGNIN,
            &json!({"email": "realadmin@example.com", "password": "wrong_P@ss1"}),
        )
        .await;
    assert_eq!(res.status, 401, "{}", res.text);
}

#[tokio::test]
async fn profile_requires_token() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::PROFILE).await;
    assert_eq!(res.status, 401);

    let res = app.get_with_token(routes::PROFILE, "garbage").await;
    assert_eq!(res.status, 401);
}
