use portfolio_server::entity::user::UserType;
use portfolio_server::utils::jwt;
use serde_json::json;

use crate::common::{ImagePart, TEST_JWT_SECRET, TestApp, routes};

fn claims_of(token: &str) -> jwt::Claims {
    jwt::verify(token, TEST_JWT_SECRET).expect("token should verify with the server secret")
}

mod regular_accounts {
    use super::*;

    #[tokio::test]
    async fn registered_user_gets_a_regular_token() {
        let app = TestApp::spawn().await;
        let body = json!({"username": "alice", "password": "securepass"});

        let reg = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);
        assert_eq!(reg.body["username"], "alice");
        let res = app.post_without_token(routes::LOGIN, &body).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["user_type"], "regular");
        let claims = claims_of(res.body["token"].as_str().unwrap());
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.uid, reg.body["id"].as_i64().unwrap() as i32);
        assert_eq!(claims.user_type, UserType::Regular);
    }

    #[tokio::test]
    async fn me_reports_the_regular_user_type() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["id"], claims_of(&token).uid);
        assert_eq!(res.body["user_type"], "regular");
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "alice", "password": "otherpass"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "USERNAME_TAKEN");
    }

    #[tokio::test]
    async fn guest_style_usernames_cannot_be_registered() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "guest-0123abcd", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "wrongpass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

mod guest_accounts {
    use super::*;

    #[tokio::test]
    async fn guest_login_issues_a_guest_token() {
        let app = TestApp::spawn().await;

        let res = app.post_without_token(routes::GUEST, &json!({})).await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["user_type"], "guest");
        let username = res.body["username"].as_str().unwrap();
        assert!(username.starts_with("guest-"), "{username}");

        let claims = claims_of(res.body["token"].as_str().unwrap());
        assert_eq!(claims.sub, username);
        assert_eq!(claims.user_type, UserType::Guest);
    }

    #[tokio::test]
    async fn me_reports_the_guest_user_type() {
        let app = TestApp::spawn().await;
        let first = app.create_guest().await;
        let second = app.create_guest().await;

        let first_me = app.get_with_token(routes::ME, &first).await;
        let second_me = app.get_with_token(routes::ME, &second).await;

        assert_eq!(first_me.status, 200);
        assert_eq!(first_me.body["user_type"], "guest");
        assert_eq!(second_me.body["user_type"], "guest");
        assert_ne!(first_me.body["id"], second_me.body["id"]);
        assert_ne!(first_me.body["username"], second_me.body["username"]);
    }

    #[tokio::test]
    async fn guest_accounts_cannot_log_in_by_password() {
        let app = TestApp::spawn().await;
        let guest = app.create_guest().await;
        let username = claims_of(&guest).sub;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": username, "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn guest_cannot_change_a_portfolio_it_created() {
        let app = TestApp::spawn().await;
        let guest = app.create_guest().await;
        let id = app.create_portfolio(&guest, "Scratchpad", "", vec![]).await;

        let patch = app
            .patch_with_token(&routes::portfolio(&id), &json!({"name": "Renamed"}), &guest)
            .await;
        assert_eq!(patch.status, 403);
        assert_eq!(patch.body["message"], "Guests cannot update portfolios");

        let upload = app
            .multipart_with_token(&routes::images(&id), &[], vec![ImagePart::png("a.png")], &guest)
            .await;
        assert_eq!(upload.status, 403);

        let delete = app.delete_with_token(&routes::portfolio(&id), &guest).await;
        assert_eq!(delete.status, 403);
        assert_eq!(delete.body["message"], "Guests cannot delete portfolios");

        let res = app.get_with_token(&routes::portfolio(&id), &guest).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["portfolio"]["name"], "Scratchpad");
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let app = TestApp::spawn().await;
        let forged = jwt::sign(1, "alice", UserType::Regular, "some-other-secret", 7).unwrap();

        let res = app.get_with_token(routes::ME, &forged).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let app = TestApp::spawn().await;
        let expired = jwt::sign(1, "alice", UserType::Regular, TEST_JWT_SECRET, -1).unwrap();

        let res = app.get_with_token(routes::ME, &expired).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
