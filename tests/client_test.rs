//! HTTP-level tests for the Spotify client.
//!
//! These tests run the client against a mock server, so retries, rate
//! limiting and pagination are exercised on real HTTP responses.

use std::{sync::Arc, time::Duration};

use serde_json::json;
use spotviz::{
    Error,
    management::Credentials,
    pipeline::{Pipeline, drain},
    spotify::{RetryPolicy, SpotifyClient, Upstream},
    types::Token,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: "refresh".to_string(),
        scope: "playlist-read-private".to_string(),
        expires_in: 3600,
        obtained_at: chrono::Utc::now().timestamp() as u64,
    }
}

fn client(server: &MockServer) -> SpotifyClient {
    let credentials = Arc::new(Credentials::new(token("test-token")));
    let retry = RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(20),
    };
    SpotifyClient::with_base_url(&server.uri(), credentials, retry).unwrap()
}

fn playlist(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "href": format!("https://api.spotify.com/v1/playlists/{id}"),
        "name": name,
        "public": false,
        "tracks": {"total": 2}
    })
}

fn playlist_entry(id: &str, artist_id: &str) -> serde_json::Value {
    json!({
        "track": {
            "id": id,
            "name": format!("Song {id}"),
            "popularity": 61,
            "album": {"name": format!("Album {id}")},
            "artists": [
                {"id": artist_id, "name": format!("Artist {artist_id}")},
                {"id": "featured", "name": "Featured Artist"}
            ]
        }
    })
}

fn features(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "energy": 0.9,
        "valence": 0.3,
        "acousticness": 0.02,
        "danceability": 0.66,
        "speechiness": 0.04,
        "liveness": 0.11,
        "loudness": -4.2,
        "tempo": 128.0,
        "duration_ms": 201000,
        "type": "audio_features"
    })
}

fn artist(id: &str, genres: &[&str]) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Artist {id}"),
        "genres": genres,
        "images": [{"url": format!("https://i.scdn.co/image/{id}"), "height": 320, "width": 320}],
        "popularity": 50
    })
}

// =============================================================================
// Listings
// =============================================================================

mod listings {
    use super::*;

    #[tokio::test]
    async fn test_playlists_follow_next_cursor() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me/playlists"))
            .and(query_param("limit", "50"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [playlist("p1", "First"), playlist("p2", "Second")],
                "next": format!("{}/me/playlists/more?offset=2&limit=50", server.uri()),
                "total": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/me/playlists/more"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [playlist("p3", "Third"), null],
                "next": null,
                "total": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let playlists = drain(|cursor| client.list_playlists(cursor)).await.unwrap();

        let names: Vec<&str> = playlists.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_tracks_skip_entries_without_ids() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/playlists/p1/tracks"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    playlist_entry("t1", "a1"),
                    {"track": null},
                    {"track": {"id": null, "name": "Local file", "album": {"name": "Local"}, "artists": [{"id": null, "name": "Me"}]}},
                    playlist_entry("t2", "a2")
                ],
                "next": null
            })))
            .mount(&server)
            .await;

        let page = client(&server).list_tracks("p1", None).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].track_id, "t1");
        assert_eq!(page.items[0].artist_id, "a1");
        assert_eq!(page.items[0].artist_name, "Artist a1");
        assert_eq!(page.items[0].album_name, "Album t1");
        assert_eq!(page.items[0].popularity, 61);
        assert_eq!(page.items[1].track_id, "t2");
        assert!(page.next.is_none());
    }
}

// =============================================================================
// Batch lookups
// =============================================================================

mod batches {
    use super::*;

    #[tokio::test]
    async fn test_audio_features_keep_null_slots_and_extra_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/audio-features"))
            .and(query_param("ids", "t1,t2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "audio_features": [features("t1"), null]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids = vec!["t1".to_string(), "t2".to_string()];
        let features = client(&server).audio_features(&ids).await.unwrap();

        assert_eq!(features.len(), 2);
        let first = features[0].as_ref().unwrap();
        assert_eq!(first.id.as_deref(), Some("t1"));
        assert_eq!(first.energy, 0.9);
        assert_eq!(first.extra["tempo"], json!(128.0));
        assert_eq!(first.extra["duration_ms"], json!(201000));
        assert!(features[1].is_none());
    }

    #[tokio::test]
    async fn test_artists_null_entries_pass_through() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/artists"))
            .and(query_param("ids", "a1,gone"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "artists": [artist("a1", &["dream pop"]), null]
            })))
            .mount(&server)
            .await;

        let ids = vec!["a1".to_string(), "gone".to_string()];
        let artists = client(&server).artists(&ids).await.unwrap();

        assert_eq!(artists[0].as_ref().unwrap().genres, vec!["dream pop"]);
        assert!(artists[1].is_none());
    }

    #[tokio::test]
    async fn test_oversized_batches_are_rejected_locally() {
        let server = MockServer::start().await;
        let client = client(&server);

        let track_ids: Vec<String> = (0..101).map(|i| format!("t{i}")).collect();
        let artist_ids: Vec<String> = (0..51).map(|i| format!("a{i}")).collect();

        assert!(matches!(
            client.audio_features(&track_ids).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            client.artists(&artist_ids).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

// =============================================================================
// Error handling
// =============================================================================

mod errors {
    use super::*;

    #[tokio::test]
    async fn test_unauthorized_is_auth_expired_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me/playlists"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"status": 401, "message": "The access token expired"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server).list_playlists(None).await;
        assert!(matches!(result, Err(Error::AuthExpired)));
    }

    #[tokio::test]
    async fn test_rate_limit_honors_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/artists"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(5)
            .expect(5)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/artists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "artists": [artist("a1", &[])]
            })))
            .expect(1)
            .mount(&server)
            .await;

        // more 429s than max_retries: rate limiting is never fatal
        let artists = client(&server).artists(&["a1".to_string()]).await.unwrap();
        assert_eq!(artists.len(), 1);
    }

    #[tokio::test]
    async fn test_server_errors_retried_three_times() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/playlists/p1/tracks"))
            .respond_with(ResponseTemplate::new(503))
            .expect(4)
            .mount(&server)
            .await;

        let result = client(&server).list_tracks("p1", None).await;
        match result {
            Err(Error::UpstreamFailure { scope, reason }) => {
                assert!(scope.contains("p1"));
                assert!(reason.contains("503"));
            }
            other => panic!("Expected UpstreamFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_then_success_recovers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/audio-features"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/audio-features"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "audio_features": [features("t1")]
            })))
            .mount(&server)
            .await;

        let features = client(&server)
            .audio_features(&["t1".to_string()])
            .await
            .unwrap();
        assert_eq!(features.len(), 1);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/playlists/missing/tracks"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server).list_tracks("missing", None).await;
        assert!(matches!(result, Err(Error::UpstreamFailure { .. })));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_upstream_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me/playlists"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client(&server).list_playlists(None).await;
        match result {
            Err(Error::UpstreamFailure { reason, .. }) => assert!(reason.contains("malformed")),
            other => panic!("Expected UpstreamFailure, got {other:?}"),
        }
    }
}

// =============================================================================
// Full pipeline over HTTP
// =============================================================================

mod end_to_end {
    use super::*;

    #[tokio::test]
    async fn test_failing_playlist_does_not_sink_the_run() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/me/playlists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [playlist("good", "Good"), playlist("bad", "Bad")],
                "next": null
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/playlists/good/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [playlist_entry("t1", "a1"), playlist_entry("t2", "a2")],
                "next": null
            })))
            .mount(&server)
            .await;

        // initial attempt plus three retries
        Mock::given(method("GET"))
            .and(path("/playlists/bad/tracks"))
            .respond_with(ResponseTemplate::new(500))
            .expect(4)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/audio-features"))
            .and(query_param("ids", "t1,t2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "audio_features": [features("t2"), features("t1")]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/artists"))
            .and(query_param("ids", "a1,a2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "artists": [artist("a1", &["techno"]), null]
            })))
            .mount(&server)
            .await;

        let report = Pipeline::new(Arc::new(client(&server)), 2)
            .run()
            .await
            .unwrap();

        assert_eq!(report.document.len(), 1);
        let songs = &report.document[0].songs;
        assert_eq!(songs[0].track_id, "t1");
        assert_eq!(
            songs[0].statistics.as_ref().and_then(|s| s.id.as_deref()),
            Some("t1")
        );
        assert_eq!(songs[0].genres, vec!["techno"]);
        assert_eq!(songs[1].genres, vec!["unknown"]);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].playlist_id, "bad");
        assert_eq!(report.failures[0].kind, "upstream_failure");
    }
}
