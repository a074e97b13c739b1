//! HTTP provider clients against a local mock server.

use secrecy::SecretString;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use betvision::data::{ApiFootballClient, FixturesSource, NewsApiClient, NewsQuery, NewsSource};

const TIMEOUT: Duration = Duration::from_secs(5);

fn key(value: &str) -> Option<SecretString> {
    Some(SecretString::new(value.to_string()))
}

fn fixtures_body() -> String {
    serde_json::json!({
        "get": "fixtures",
        "parameters": {"live": "all"},
        "errors": [],
        "results": 1,
        "response": [{
            "fixture": {"id": 1208021, "status": {"short": "2H", "elapsed": 63}},
            "league": {"id": 140, "name": "La Liga"},
            "teams": {
                "home": {"id": 541, "name": "Real Madrid", "logo": "https://media.api-sports.io/football/teams/541.png"},
                "away": {"id": 529, "name": "Barcelona", "logo": "https://media.api-sports.io/football/teams/529.png"}
            },
            "goals": {"home": 2, "away": 1}
        }]
    })
    .to_string()
}

fn articles_body() -> String {
    serde_json::json!({
        "status": "ok",
        "totalResults": 3,
        "articles": [
            {
                "source": {"id": null, "name": "Globo Esporte"},
                "title": "Palmeiras vence e assume a liderança",
                "description": "Resumo da rodada",
                "url": "https://ge.globo.com/palmeiras",
                "urlToImage": "https://ge.globo.com/palmeiras.jpg",
                "publishedAt": "2026-03-01T21:15:00Z"
            },
            {
                "source": {"id": null, "name": "[Removed]"},
                "title": "[Removed]",
                "url": "https://removed.com"
            },
            {
                "source": {"name": "Lance!"},
                "title": "Sem imagem",
                "url": "https://lance.com.br/x",
                "urlToImage": null,
                "publishedAt": "not a date"
            }
        ]
    })
    .to_string()
}

// -- API-Football --

#[tokio::test]
async fn test_live_fixtures_request_and_parse() {
    let server = MockServer::start().await;
    let host = server.uri().trim_start_matches("http://").to_string();

    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .and(query_param("live", "all"))
        .and(header("x-rapidapi-key", "football-key"))
        .and(header("x-rapidapi-host", host.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixtures_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiFootballClient::new(&server.uri(), key("football-key"), TIMEOUT).unwrap();
    let fixtures = client.fetch_live().await.unwrap();

    assert_eq!(fixtures.len(), 1);
    let f = &fixtures[0];
    assert_eq!(f.id, 1208021);
    assert_eq!(f.elapsed, 63);
    assert_eq!(f.home.name, "Real Madrid");
    assert_eq!((f.home_goals, f.away_goals), (2, 1));
    assert_eq!(f.league.id, 140);
}

#[tokio::test]
async fn test_live_fixtures_errors_field_with_200_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"errors": {"requests": "You have reached the request limit for the day"}, "results": 0, "response": []}"#,
        ))
        .mount(&server)
        .await;

    let client = ApiFootballClient::new(&server.uri(), key("k"), TIMEOUT).unwrap();
    let err = client.fetch_live().await.unwrap_err();
    assert!(err.to_string().contains("request limit"));
}

#[tokio::test]
async fn test_live_fixtures_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = ApiFootballClient::new(&server.uri(), key("k"), TIMEOUT).unwrap();
    let err = client.fetch_live().await.unwrap_err();
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_live_fixtures_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fixtures"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(fixtures_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = ApiFootballClient::new(&server.uri(), key("k"), Duration::from_millis(200)).unwrap();
    assert!(client.fetch_live().await.is_err());
}

// -- NewsAPI --

#[tokio::test]
async fn test_search_request_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("language", "pt"))
        .and(query_param("sortBy", "relevancy"))
        .and(query_param("pageSize", "10"))
        .and(query_param("apiKey", "news-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(articles_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = NewsApiClient::new(&server.uri(), key("news-key"), "pt", TIMEOUT).unwrap();
    let articles = client.everything(&NewsQuery::search("Palmeiras", 10)).await.unwrap();

    // "[Removed]" dropped; missing image and bad date defaulted.
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].source, "Globo Esporte");
    assert!(!articles[1].image_url.is_empty());

    let requests = server.received_requests().await.unwrap();
    let q = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert!(q.starts_with("(Palmeiras) AND ("));
    assert!(q.contains("\"Champions League\""));
}

#[tokio::test]
async fn test_featured_request_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("sortBy", "publishedAt"))
        .and(query_param("pageSize", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(articles_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = NewsApiClient::new(&server.uri(), key("news-key"), "pt", TIMEOUT).unwrap();
    let articles = client.everything(&NewsQuery::featured()).await.unwrap();
    assert_eq!(articles[0].title, "Palmeiras vence e assume a liderança");
}

#[tokio::test]
async fn test_upgrade_required_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(426).set_body_string(
            r#"{"status":"error","code":"corsNotAllowed","message":"Requests from the browser are not allowed on the Developer plan"}"#,
        ))
        .mount(&server)
        .await;

    let client = NewsApiClient::new(&server.uri(), key("news-key"), "pt", TIMEOUT).unwrap();
    let err = client.everything(&NewsQuery::featured()).await.unwrap_err();
    assert!(err.to_string().contains("426"));
}

#[tokio::test]
async fn test_error_status_with_200_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"status":"error","code":"rateLimited","message":"You have made too many requests recently"}"#,
        ))
        .mount(&server)
        .await;

    let client = NewsApiClient::new(&server.uri(), key("news-key"), "pt", TIMEOUT).unwrap();
    let err = client.everything(&NewsQuery::featured()).await.unwrap_err();
    assert!(err.to_string().contains("too many requests"));
}

#[tokio::test]
async fn test_missing_key_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = NewsApiClient::new(&server.uri(), None, "pt", TIMEOUT).unwrap();
    assert!(client.everything(&NewsQuery::featured()).await.is_err());
}
