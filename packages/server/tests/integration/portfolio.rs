use serde_json::json;

use crate::common::{ImagePart, TestApp, routes};

mod creation {
    use super::*;

    #[tokio::test]
    async fn user_can_create_a_portfolio_with_images() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .multipart_with_token(
                routes::PORTFOLIOS,
                &[
                    ("name", "  ReX  "),
                    ("description", "Enterprise AI assistant"),
                    ("ai_context", "Built with Rust and Postgres"),
                ],
                vec![ImagePart::png("first.png"), ImagePart::png("second.png")],
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["portfolio"]["name"], "ReX");
        assert_eq!(res.body["portfolio"]["description"], "Enterprise AI assistant");
        assert_eq!(res.body["portfolio"]["ai_context"], "Built with Rust and Postgres");
        let images = res.body["images"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0]["image_name"], "first.png");
        assert_eq!(images[1]["image_name"], "second.png");
        assert_eq!(images[0]["content_type"], "image/png");

        let portfolio_id = res.body["portfolio"]["id"].as_str().unwrap();
        let url = images[0]["image_url"].as_str().unwrap();
        assert!(url.contains(&format!("/api/v1/blobs/portfolio-{portfolio_id}/")), "{url}");
        assert!(url.ends_with("-first.png"), "{url}");
    }

    #[tokio::test]
    async fn portfolio_without_images_is_accepted() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .multipart_with_token(routes::PORTFOLIOS, &[("name", "Weather Bot")], vec![], &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["portfolio"]["description"].is_null());
        assert_eq!(res.body["images"], json!([]));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .multipart_with_token(routes::PORTFOLIOS, &[("name", "   ")], vec![], &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn name_longer_than_100_characters_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let long_name = "a".repeat(101);

        let res = app
            .multipart_with_token(routes::PORTFOLIOS, &[("name", &long_name)], vec![], &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn duplicate_name_for_the_same_owner_conflicts() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        app.create_portfolio(&token, "ReX", "first", vec![]).await;

        let res = app
            .multipart_with_token(routes::PORTFOLIOS, &[("name", "ReX")], vec![], &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn different_owners_may_reuse_a_name() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;

        app.create_portfolio(&alice, "ReX", "", vec![]).await;
        app.create_portfolio(&bob, "ReX", "", vec![]).await;
    }

    #[tokio::test]
    async fn unsupported_image_type_is_rejected_and_nothing_is_stored() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .multipart_with_token(
                routes::PORTFOLIOS,
                &[("name", "ReX")],
                vec![ImagePart::with("notes.txt", "text/plain", b"hello".to_vec())],
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let list = app.get_with_token(routes::PORTFOLIOS, &token).await;
        assert_eq!(list.body["total"], 0);
    }

    #[tokio::test]
    async fn oversized_image_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let big = vec![0u8; crate::common::TEST_MAX_IMAGE_SIZE as usize + 1];

        let res = app
            .multipart_with_token(
                routes::PORTFOLIOS,
                &[("name", "ReX")],
                vec![ImagePart::with("big.png", "image/png", big)],
                &token,
            )
            .await;

        assert_eq!(res.status, 413);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn too_many_images_in_one_request_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let images = (0..11)
            .map(|i| ImagePart::png(&format!("shot-{i}.png")))
            .collect();

        let res = app
            .multipart_with_token(routes::PORTFOLIOS, &[("name", "ReX")], images, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn image_type_is_inferred_from_the_file_name() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .multipart_with_token(
                routes::PORTFOLIOS,
                &[("name", "ReX")],
                vec![ImagePart::with(
                    "photo.jpg",
                    "application/octet-stream",
                    b"\xff\xd8\xff".to_vec(),
                )],
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["images"][0]["content_type"], "image/jpeg");
    }
}

mod visibility {
    use super::*;

    #[tokio::test]
    async fn regular_users_only_list_their_own_portfolios_newest_first() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        app.create_portfolio(&alice, "ReX", "", vec![]).await;
        app.create_portfolio(&alice, "Weather Bot", "", vec![]).await;
        app.create_portfolio(&bob, "Bob's Blog", "", vec![]).await;

        let res = app.get_with_token(routes::PORTFOLIOS, &alice).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
        assert_eq!(res.body["portfolios"][0]["name"], "Weather Bot");
        assert_eq!(res.body["portfolios"][1]["name"], "ReX");
    }

    #[tokio::test]
    async fn guests_list_every_portfolio() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        app.create_portfolio(&alice, "ReX", "", vec![]).await;
        app.create_portfolio(&bob, "Bob's Blog", "", vec![]).await;
        let guest = app.create_guest().await;

        let res = app.get_with_token(routes::PORTFOLIOS, &guest).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
    }

    #[tokio::test]
    async fn other_users_portfolio_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_portfolio(&alice, "ReX", "", vec![]).await;

        let res = app.get_with_token(&routes::portfolio(&id), &bob).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn owner_gets_portfolio_with_images() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let id = app
            .create_portfolio(&alice, "ReX", "AI", vec![ImagePart::png("a.png")])
            .await;

        let res = app.get_with_token(&routes::portfolio(&id), &alice).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["portfolio"]["id"], id.as_str());
        assert_eq!(res.body["images"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_id_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;

        let res = app.get_with_token(&routes::portfolio("not-a-uuid"), &alice).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn listing_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::PORTFOLIOS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn owner_can_rename_and_clear_fields() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_portfolio(&alice, "ReX", "AI", vec![]).await;
        let before = app.get_with_token(&routes::portfolio(&id), &alice).await;

        let res = app
            .patch_with_token(
                &routes::portfolio(&id),
                &json!({"name": "ReX Enterprise", "description": null}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "ReX Enterprise");
        assert!(res.body["description"].is_null());
        assert_ne!(
            res.body["updated_at"],
            before.body["portfolio"]["updated_at"]
        );
    }

    #[tokio::test]
    async fn empty_patch_returns_the_current_record() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_portfolio(&alice, "ReX", "AI", vec![]).await;

        let res = app
            .patch_with_token(&routes::portfolio(&id), &json!({}), &alice)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "ReX");
        assert_eq!(res.body["description"], "AI");
    }

    #[tokio::test]
    async fn rename_onto_an_existing_name_conflicts() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        app.create_portfolio(&alice, "ReX", "", vec![]).await;
        let id = app.create_portfolio(&alice, "Weather Bot", "", vec![]).await;

        let res = app
            .patch_with_token(&routes::portfolio(&id), &json!({"name": "ReX"}), &alice)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn non_owner_cannot_update() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_portfolio(&alice, "ReX", "", vec![]).await;

        let res = app
            .patch_with_token(&routes::portfolio(&id), &json!({"name": "Mine"}), &bob)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["message"], "You can only update your own portfolios");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn owner_can_delete_a_portfolio_and_its_blobs() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let id = app
            .create_portfolio(&alice, "ReX", "", vec![ImagePart::png("a.png")])
            .await;
        let detail = app.get_with_token(&routes::portfolio(&id), &alice).await;
        let image_url = detail.body["images"][0]["image_url"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(app.client.get(&image_url).send().await.unwrap().status(), 200);

        let res = app.delete_with_token(&routes::portfolio(&id), &alice).await;
        assert_eq!(res.status, 204);

        let gone = app.get_with_token(&routes::portfolio(&id), &alice).await;
        assert_eq!(gone.status, 404);
        assert_eq!(app.client.get(&image_url).send().await.unwrap().status(), 404);
    }

    #[tokio::test]
    async fn guests_cannot_delete() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_portfolio(&alice, "ReX", "", vec![]).await;
        let guest = app.create_guest().await;

        let res = app.delete_with_token(&routes::portfolio(&id), &guest).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        assert_eq!(res.body["message"], "Guests cannot delete portfolios");
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_portfolio(&alice, "ReX", "", vec![]).await;

        let res = app.delete_with_token(&routes::portfolio(&id), &bob).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["message"], "You can only delete your own portfolios");
    }

    #[tokio::test]
    async fn deleting_a_missing_portfolio_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .delete_with_token(
                &routes::portfolio("01936f0e-1234-7abc-8000-000000000001"),
                &alice,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}
