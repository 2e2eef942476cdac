use serde_json::Value;

use crate::common::{ImagePart, SseFrame, TestApp};

const PANEL_ORDER: [&str; 6] = [
    "data-kind",
    "data-id",
    "data-title",
    "data-clear",
    "data-portfolioDelta",
    "data-finish",
];

fn event_names(frames: &[SseFrame]) -> Vec<&str> {
    frames.iter().map(|f| f.event.as_str()).collect()
}

/// The envelope carried by the `data-portfolioDelta` frame.
fn envelope(frames: &[SseFrame]) -> Value {
    let delta = frames
        .iter()
        .find(|f| f.event == "data-portfolioDelta")
        .expect("stream should contain a portfolioDelta frame");
    serde_json::from_str(delta.data["data"].as_str().unwrap()).unwrap()
}

fn tool_output(frames: &[SseFrame]) -> &Value {
    &frames
        .last()
        .filter(|f| f.event == "tool-output")
        .expect("stream should end with a tool-output frame")
        .data
}

#[tokio::test]
async fn fuzzy_mention_streams_the_matching_portfolio() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;
    app.create_portfolio(&alice, "AI Code Review Assistant", "Reviews PRs", vec![
        ImagePart::png("one.png"),
        ImagePart::png("two.png"),
    ])
    .await;

    let (status, frames) = app.display("code review", &alice).await;

    assert_eq!(status, 200);
    let mut expected = PANEL_ORDER.to_vec();
    expected.push("tool-output");
    assert_eq!(event_names(&frames), expected);

    assert_eq!(frames[0].data["data"], "portfolio");
    assert_eq!(frames[2].data["data"], "code review");
    assert_eq!(frames[0].data["transient"], true);

    let envelope = envelope(&frames);
    assert_eq!(envelope["name"], "AI Code Review Assistant");
    assert_eq!(envelope["description"], "Reviews PRs");
    assert_eq!(envelope["images"][0]["imageName"], "one.png");
    assert_eq!(envelope["images"][1]["imageName"], "two.png");

    let output = tool_output(&frames);
    assert_eq!(output["title"], "AI Code Review Assistant");
    assert_eq!(output["kind"], "portfolio");
    assert_eq!(output["id"], frames[1].data["data"]);
}

#[tokio::test]
async fn unknown_mention_lists_available_portfolios() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;
    app.create_portfolio(&alice, "ReX", "", vec![]).await;
    app.create_portfolio(&alice, "Weather Bot", "", vec![]).await;

    let (status, frames) = app.display("Quantum Compiler", &alice).await;

    assert_eq!(status, 200);
    assert_eq!(event_names(&frames)[..6], PANEL_ORDER);
    let envelope = envelope(&frames);
    assert_eq!(envelope["error"], true);
    assert_eq!(envelope["attemptedName"], "Quantum Compiler");
    let message = envelope["message"].as_str().unwrap();
    assert!(message.contains("ReX"), "{message}");
    assert!(message.contains("Weather Bot"), "{message}");

    assert_eq!(tool_output(&frames)["title"], "Quantum Compiler");
}

#[tokio::test]
async fn user_without_portfolios_is_told_to_create_one() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;

    let (_, frames) = app.display("ReX", &alice).await;

    let envelope = envelope(&frames);
    assert_eq!(envelope["error"], true);
    assert!(
        envelope["message"]
            .as_str()
            .unwrap()
            .starts_with("No portfolios found")
    );
}

#[tokio::test]
async fn regular_users_cannot_display_other_users_portfolios() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;
    let bob = app.create_authenticated_user("bob", "securepass").await;
    app.create_portfolio(&alice, "ReX", "", vec![]).await;

    let (_, frames) = app.display("ReX", &bob).await;

    assert_eq!(envelope(&frames)["error"], true);
}

#[tokio::test]
async fn guests_can_display_any_portfolio() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;
    app.create_portfolio(&alice, "ReX", "Enterprise AI", vec![]).await;
    let guest = app.create_guest().await;

    let (_, frames) = app.display("rex", &guest).await;

    let envelope = envelope(&frames);
    assert!(envelope.get("error").is_none());
    assert_eq!(envelope["name"], "ReX");
}

#[tokio::test]
async fn mention_is_matched_as_typed() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;
    app.create_portfolio(&alice, "ReX", "older", vec![]).await;
    app.create_portfolio(&alice, "rex", "newer", vec![]).await;

    let (status, frames) = app.display("ReX ", &alice).await;

    assert_eq!(status, 200);
    assert_eq!(frames[2].data["data"], "ReX ");
    let envelope = envelope(&frames);
    assert_eq!(envelope["name"], "rex");
    assert_eq!(envelope["description"], "newer");
    assert_eq!(tool_output(&frames)["title"], "rex");
}

#[tokio::test]
async fn each_display_gets_a_fresh_id() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;
    app.create_portfolio(&alice, "ReX", "", vec![]).await;

    let (_, first) = app.display("ReX", &alice).await;
    let (_, second) = app.display("ReX", &alice).await;

    assert_ne!(first[1].data["data"], second[1].data["data"]);
}

#[tokio::test]
async fn blank_mention_is_rejected_before_streaming() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;

    let res = app
        .post_with_token(
            crate::common::routes::DISPLAY,
            &serde_json::json!({"portfolio_name": "   "}),
            &alice,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}
