use crate::e2e::helpers::TestContext;
use hyper::StatusCode;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ok_for_health_check(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body_bytes, b"OK");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_storage_readiness(ctx: &TestContext) {
    let response = ctx.client.get("/health/ready").await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().expect("Missing readiness body");
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "connected");
    assert_eq!(body["entries"], 0);
    assert_eq!(body["capacity"], 15);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_attach_request_id_header(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_header_exists("x-request-id");
    let request_id = response.header("x-request-id").unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}
