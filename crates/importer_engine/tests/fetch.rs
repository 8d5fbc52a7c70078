use std::time::Duration;

use importer_engine::{FailureKind, FetchError, FetchOutput, FetchSettings, Fetcher, ReqwestFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// The fetcher is blocking; keep it off the runtime threads wiremock needs.
async fn fetch(settings: FetchSettings, url: String) -> Result<FetchOutput, FetchError> {
    tokio::task::spawn_blocking(move || ReqwestFetcher::new(settings).fetch(&url))
        .await
        .expect("fetch task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn fetcher_returns_html_and_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/htmlawed/files/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/projects/htmlawed/files/", server.uri());
    let output = fetch(FetchSettings::default(), url.clone()).await.expect("fetch ok");

    assert_eq!(output.metadata.original_url, url);
    assert_eq!(output.metadata.final_url, output.metadata.original_url);
    assert_eq!(output.metadata.redirect_count, 0);
    assert_eq!(output.metadata.byte_len, 15);
    assert!(output
        .metadata
        .content_type
        .unwrap()
        .starts_with("text/html"));
    assert_eq!(output.bytes, b"<html>ok</html>");
}

#[tokio::test(flavor = "multi_thread")]
async fn fetcher_follows_download_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/a.zip/download"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/mirror/a.zip", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mirror/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PK\x05\x06".to_vec(), "application/zip"))
        .mount(&server)
        .await;

    let url = format!("{}/files/a.zip/download", server.uri());
    let output = fetch(FetchSettings::for_archives(), url).await.expect("fetch ok");

    assert_eq!(output.metadata.redirect_count, 1);
    assert!(output.metadata.final_url.ends_with("/mirror/a.zip"));
    assert_eq!(output.bytes, b"PK\x05\x06");
}

#[tokio::test(flavor = "multi_thread")]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let err = fetch(FetchSettings::default(), url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test(flavor = "multi_thread")]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let url = format!("{}/slow", server.uri());
    let err = fetch(settings, url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test(flavor = "multi_thread")]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let url = format!("{}/large", server.uri());
    let err = fetch(settings, url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn page_fetcher_rejects_non_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"{}".to_vec(), "application/json"))
        .mount(&server)
        .await;

    let url = format!("{}/blob", server.uri());
    let err = fetch(FetchSettings::default(), url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "application/json".to_string()
        }
    );
}

#[test]
fn invalid_url_is_rejected_before_any_request() {
    let err = ReqwestFetcher::new(FetchSettings::default())
        .fetch("not a url")
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
