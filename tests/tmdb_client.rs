use cinelist::config::Config;
use cinelist::details::fetch_movie_details;
use cinelist::tmdb::{TmdbApi, TmdbClient};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, timeout: Option<Duration>) -> TmdbClient {
    let config = Config {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        tmdb_api_key: "k3y".to_string(),
        tmdb_base_url: server.uri(),
        tmdb_timeout: timeout,
        session_secret: "unused".to_string(),
        session_ttl_hours: 1,
        bcrypt_cost: 4,
    };
    TmdbClient::new(&config).expect("client")
}

fn page_body(title: &str) -> serde_json::Value {
    json!({
        "page": 1,
        "results": [{ "id": 42, "title": title, "overview": "", "poster_path": null,
                      "backdrop_path": null, "vote_average": 7.5, "release_date": "2020-02-02",
                      "popularity": 99.1 }],
        "total_pages": 1,
        "total_results": 1
    })
}

#[tokio::test]
async fn search_sends_query_page_and_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("query", "blade runner"))
        .and(query_param("page", "3"))
        .and(query_param("api_key", "k3y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body("Blade Runner")))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server, None)
        .search("blade runner", 3)
        .await
        .expect("search");
    assert_eq!(page.results[0].title(), Some("Blade Runner"));
    assert_eq!(page.results[0].extra.get("popularity"), Some(&json!(99.1)));
}

#[tokio::test]
async fn listing_endpoints_hit_expected_paths() {
    let server = MockServer::start().await;
    for (p, title) in [
        ("/movie/popular", "Popular"),
        ("/trending/movie/week", "Trending"),
        ("/movie/42/recommendations", "Recommended"),
    ] {
        Mock::given(method("GET"))
            .and(path(p))
            .and(query_param("api_key", "k3y"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(title)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server, None);
    assert_eq!(client.popular(1).await.unwrap().results[0].title(), Some("Popular"));
    assert_eq!(client.trending_week().await.unwrap().results[0].title(), Some("Trending"));
    assert_eq!(
        client.recommendations(42).await.unwrap().results[0].title(),
        Some("Recommended")
    );
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "status_message": "Invalid API key" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server, None).popular(1).await.unwrap_err();
    assert!(!format!("{err:#}").contains("k3y"));
}

#[tokio::test]
async fn undecodable_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    assert!(client_for(&server, None).movie(5).await.is_err());
}

#[tokio::test]
async fn configured_timeout_fails_slow_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trending/movie/week"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body("Slow"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Some(Duration::from_millis(50)));
    assert!(client.trending_week().await.is_err());
}

#[tokio::test]
async fn aggregate_against_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42, "title": "The Answer", "overview": "", "poster_path": null,
            "backdrop_path": null, "vote_average": 8.0, "release_date": null,
            "runtime": 100, "genres": [{ "id": 1, "name": "Comedy" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/42/credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "cast": [{ "id": 1, "name": "A", "character": "B", "profile_path": null }],
            "crew": [{ "id": 2, "name": "C", "job": "Director", "department": "Directing" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/42/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "results": [{ "key": "k", "site": "YouTube", "type": "Trailer", "name": "T" }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let details = fetch_movie_details(&client, 42).await.expect("details");
    assert_eq!(details.detail.extra["genres"][0]["name"], json!("Comedy"));
    assert_eq!(details.credits.crew[0].job(), Some("Director"));
    assert_eq!(details.videos.trailer().map(|v| v.key.as_str()), Some("k"));
}

#[tokio::test]
async fn aggregate_fails_when_videos_are_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42, "title": "X" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/42/credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cast": [], "crew": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/42/videos"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    assert!(fetch_movie_details(&client, 42).await.is_err());
}
