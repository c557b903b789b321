use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xray_engine::{
    AcceptMode, FailureKind, FetchRequest, FetchSettings, Fetcher, ParseOptions, ReqwestFetcher,
};

fn request(url: String) -> FetchRequest {
    ParseOptions::default().fetch_request(&url)
}

async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetcher_decodes_body_and_records_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<p>caf\xe9</p>".to_vec(), "text/html; charset=windows-1252"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/doc", server.uri());
    let document = fetcher.fetch(&request(url.clone())).await.expect("fetch ok");

    assert_eq!(document.url, url);
    assert_eq!(document.final_url, url);
    assert_eq!(document.status, 200);
    assert_eq!(document.redirect_count, 0);
    assert_eq!(document.body, "<p>café</p>");
    assert_eq!(
        document.content_type.as_deref(),
        Some("text/html; charset=windows-1252")
    );
    assert_eq!(
        document.headers.get("content-type").map(String::as_str),
        Some("text/html; charset=windows-1252")
    );
}

#[tokio::test]
async fn auth_statuses_are_errors_and_others_pass_through() {
    let server = MockServer::start().await;
    mount_status(&server, "/private", 401).await;
    mount_status(&server, "/forbidden", 403).await;
    mount_status(&server, "/missing", 404).await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());

    let err = fetcher
        .fetch(&request(format!("{}/private", server.uri())))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Unauthorized);
    assert_eq!(err.status, Some(401));

    let err = fetcher
        .fetch(&request(format!("{}/forbidden", server.uri())))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Forbidden);
    assert_eq!(err.status, Some(403));

    let document = fetcher
        .fetch(&request(format!("{}/missing", server.uri())))
        .await
        .expect("404 is a document");
    assert_eq!(document.status, 404);
}

#[tokio::test]
async fn redirects_are_followed_within_the_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/b"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/c"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200).set_body_string("done"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());

    let document = fetcher
        .fetch(&request(format!("{}/a", server.uri())))
        .await
        .expect("two redirects fit in five");
    assert_eq!(document.final_url, format!("{}/c", server.uri()));
    assert_eq!(document.redirect_count, 2);

    let mut tight = request(format!("{}/a", server.uri()));
    tight.max_redirects = 1;
    let err = fetcher.fetch(&tight).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::TooManyRedirects);
}

#[tokio::test]
async fn oversized_body_is_invalid_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(4096)))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings {
        max_bytes: 1024,
        ..FetchSettings::default()
    });
    let err = fetcher
        .fetch(&request(format!("{}/big", server.uri())))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidContent);
}

#[tokio::test]
async fn accept_header_and_token_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/actor"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let mut request = request(format!("{}/actor", server.uri()));
    request.accept = AcceptMode::ActivityPub;
    request.token = Some("s3cret".into());

    let document = fetcher.fetch(&request).await.expect("token matched");
    assert_eq!(document.body, "{}");

    let received = server.received_requests().await.expect("recording on");
    let accept = received[0].headers.get("accept").and_then(|v| v.to_str().ok());
    assert_eq!(accept, Some(AcceptMode::ActivityPub.header_value()));
}

#[tokio::test]
async fn invalid_urls_fail_before_any_request() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let err = fetcher
        .fetch(&request("ftp://files.example/x".into()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
