use crate::e2e::helpers::{mock_gateway::MockGateway, play_and_finish, TestContext};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use talkback::domain::playback::HistoryItem;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_empty_history_initially(ctx: &TestContext) {
    let response = ctx.client.get("/api/history").await.unwrap();

    response.assert_status(StatusCode::OK);
    let history: Vec<HistoryItem> = response.json().unwrap();
    assert!(history.is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_history_most_recent_first(ctx: &TestContext) {
    play_and_finish(&ctx.client, "One").await;
    play_and_finish(&ctx.client, "Two").await;
    play_and_finish(&ctx.client, "Three").await;
    play_and_finish(&ctx.client, "one").await;

    let history: Vec<HistoryItem> = ctx.client.get("/api/history").await.unwrap().json().unwrap();

    let keys: Vec<&str> = history.iter().map(|item| item.key.as_str()).collect();
    assert_eq!(keys, vec!["one", "three", "two"]);
    assert_eq!(history[0].text, "One");
    assert!(history[0].last_used_at > history[1].last_used_at);
    assert!(history[1].last_used_at > history[2].last_used_at);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_replay_clip_from_history(ctx: &TestContext) {
    play_and_finish(&ctx.client, "Good morning!").await;

    let history: Vec<HistoryItem> = ctx.client.get("/api/history").await.unwrap().json().unwrap();
    let key = history[0].key.as_str().to_string();
    assert_eq!(key, "good morning");

    let response = ctx
        .client
        .post_empty(&format!("/api/history/{}/play", urlencoding::encode(&key)))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("x-cache", "hit")
        .assert_header("x-source-text", "Good%20morning%21");
    assert_eq!(response.body_bytes, MockGateway::audio_for("Good morning!"));
    assert_eq!(ctx.gateway.calls().len(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_404_for_unknown_history_key(ctx: &TestContext) {
    ctx.client
        .post_empty("/api/history/never%20played/play")
        .await
        .unwrap()
        .assert_status(StatusCode::NOT_FOUND);

    assert!(ctx.gateway.calls().is_empty());
    let status = ctx.client.get("/api/status").await.unwrap();
    assert_eq!(status.body.unwrap()["state"], "idle");
}
