use std::sync::Arc;
use std::time::Duration;

use craigslist_jobs::report::{ReportWriter, WritePolicy};
use craigslist_jobs::{
    Category, ClickTarget, FetchError, Fetcher, FormField, HttpFetcher, HttpFetcherConfig,
    Orchestrator, Region,
};
use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(HttpFetcherConfig {
        timeout: Duration::from_secs(5),
        user_agent: Some("craigslist-jobs-test".to_string()),
        ..Default::default()
    })
    .unwrap()
}

fn html(status: u16, body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("Content-Type", "text/html; charset=utf-8")
        .set_body_string(body.into())
}

const SEARCH_FORM: &str = r#"<html><head><title>sf bay area jobs</title></head><body>
    <form id="searchform" action="search/jjj" method="get">
      <input id="query" name="query" type="text">
      <input type="checkbox" name="addOne" value="telecommuting">
      <input type="submit" value="Search">
    </form></body></html>"#;

#[tokio::test]
async fn load_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html(200, "<title>Moved here</title><p>hi</p>"))
        .mount(&server)
        .await;

    let doc = fetcher().load(&format!("{}/old", server.uri())).await.unwrap();
    assert_eq!(doc.url, format!("{}/new", server.uri()));
    assert_eq!(doc.title, "Moved here");
}

#[tokio::test]
async fn non_success_status_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(html(404, "not here"))
        .mount(&server)
        .await;

    let url = format!("{}/gone", server.uri());
    let err = fetcher().load(&url).await.unwrap_err();
    match err {
        FetchError::Fetch { url: failed, cause } => {
            assert_eq!(failed, url);
            assert!(cause.contains("404"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(200, "<p>late</p>").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(HttpFetcherConfig {
        timeout: Duration::from_millis(200),
        ..Default::default()
    })
    .unwrap();
    let err = fetcher.load(&format!("{}/slow", server.uri())).await.unwrap_err();
    assert!(matches!(err, FetchError::Fetch { .. }));
}

#[tokio::test]
async fn get_form_sends_query_and_checkbox() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jjj/"))
        .respond_with(html(200, SEARCH_FORM))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jjj/search/jjj"))
        .and(query_param("query", "software tester"))
        .and(query_param("addOne", "telecommuting"))
        .respond_with(html(
            200,
            r#"<title>results</title><p><a href="http://example/post/1">QA Engineer</a></p>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let page = fetcher.load(&format!("{}/jjj/", server.uri())).await.unwrap();
    let results = fetcher
        .submit(
            &page,
            &[
                FormField::text("query", "software tester"),
                FormField::toggle("addOne"),
            ],
            &ClickTarget::value("Search"),
        )
        .await
        .unwrap();
    assert_eq!(results.title, "results");
}

#[tokio::test]
async fn post_form_sends_urlencoded_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/form"))
        .respond_with(html(
            200,
            r#"<form method="post" action="/submit">
                 <input type="hidden" name="lang" value="en">
                 <input id="query" name="query">
                 <input type="submit" name="go" value="Search">
               </form>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_string_contains("lang=en&query=rust+jobs&go=Search"))
        .respond_with(html(200, "<title>posted</title>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let page = fetcher.load(&format!("{}/form", server.uri())).await.unwrap();
    let results = fetcher
        .submit(
            &page,
            &[FormField::text("query", "rust jobs")],
            &ClickTarget::value("Search"),
        )
        .await
        .unwrap();
    assert_eq!(results.title, "posted");
}

#[tokio::test]
async fn cookies_are_not_carried_between_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/first"))
        .respond_with(html(200, "<title>first</title>").insert_header("Set-Cookie", "session=abc; Path=/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/second"))
        .and(header_exists("cookie"))
        .respond_with(html(200, "<title>with cookie</title>"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/second"))
        .respond_with(html(200, "<title>fresh</title>"))
        .mount(&server)
        .await;

    let fetcher = fetcher();
    fetcher.load(&format!("{}/first", server.uri())).await.unwrap();
    let doc = fetcher.load(&format!("{}/second", server.uri())).await.unwrap();
    assert_eq!(doc.title, "fresh");
}

#[tokio::test]
async fn unreachable_host_is_a_fetch_error() {
    let err = fetcher().load("http://127.0.0.1:9/").await.unwrap_err();
    assert_eq!(err.url(), "http://127.0.0.1:9/");
}

#[tokio::test]
async fn end_to_end_against_mock_site() {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/iso/us"))
        .respond_with(html(
            200,
            format!(
                r#"<a href="http://www.craigslist.org/">craigslist</a>
                   <a href="{uri}/sfbay/">SF bay area</a>
                   <a href="http://www.craigslist.org/about/sites">w</a>"#
            ),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sfbay/jjj/"))
        .respond_with(html(200, SEARCH_FORM))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sfbay/jjj/search/jjj"))
        .and(query_param("query", "qa"))
        .respond_with(html(
            200,
            r#"<title>sf bay area jobs</title>
               <p class="row"><a href="http://example/post/1">QA Engineer</a></p>
               <p class="row"><a href="http://example/post/2">QA Lead</a></p>"#,
        ))
        .mount(&server)
        .await;

    let out = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(
        Arc::new(fetcher()),
        vec![Region::new("USA", "us")],
        ReportWriter::new(out.path(), WritePolicy::Surface),
    )
    .with_hub_base(format!("{}/iso/", uri));

    let reports = orchestrator
        .run(&["qa".to_string()], Category::AllJobs, true)
        .await
        .into_result()
        .unwrap();

    assert_eq!(reports[0].stats.sites_searched, 1);
    assert_eq!(reports[0].stats.sites_with_results, 1);
    assert_eq!(reports[0].stats.results_found, 2);

    let content = std::fs::read_to_string(out.path().join("USA_qa_job_results.html")).unwrap();
    assert!(content.contains(&format!(
        "Site: sf bay area jobs --> <a href='{}/sfbay/'>results page</a>",
        uri
    )));
    assert!(content.contains("<a href=\"http://example/post/2\">QA Lead</a><br />"));
    assert!(content.contains("Sites seached: 1 | Sites with results: 1 | Results found: 2"));
}
