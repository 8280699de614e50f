use std::{collections::HashMap, path::PathBuf};

use spotviz::{Error, config::*};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_defaults_with_client_id_only() {
    let config = Config::from_lookup(lookup(&[("SPOTIFY_API_AUTH_CLIENT_ID", "abc")])).unwrap();

    assert_eq!(config.client_id, "abc");
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
    assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
    assert_eq!(config.server_addr, DEFAULT_SERVER_ADDRESS);
    assert_eq!(config.concurrency, 5);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.output, PathBuf::from("playlists_data.json"));
}

#[test]
fn test_overrides() {
    let config = Config::from_lookup(lookup(&[
        ("SPOTIFY_API_AUTH_CLIENT_ID", "abc"),
        ("SPOTIFY_API_URL", "http://localhost:9000/v1/"),
        ("SPOTVIZ_CONCURRENCY", " 2 "),
        ("SPOTVIZ_MAX_RETRIES", "0"),
        ("SPOTVIZ_OUTPUT", "web/data.json"),
    ]))
    .unwrap();

    assert_eq!(config.api_url, "http://localhost:9000/v1");
    assert_eq!(config.concurrency, 2);
    assert_eq!(config.max_retries, 0);
    assert_eq!(config.output, PathBuf::from("web/data.json"));
}

#[test]
fn test_missing_client_id() {
    let result = Config::from_lookup(lookup(&[("SPOTIFY_API_AUTH_CLIENT_ID", "  ")]));
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("SPOTIFY_API_AUTH_CLIENT_ID")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_zero_concurrency_rejected() {
    let result = Config::from_lookup(lookup(&[
        ("SPOTIFY_API_AUTH_CLIENT_ID", "abc"),
        ("SPOTVIZ_CONCURRENCY", "0"),
    ]));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_invalid_number_rejected() {
    let result = Config::from_lookup(lookup(&[
        ("SPOTIFY_API_AUTH_CLIENT_ID", "abc"),
        ("SPOTVIZ_MAX_RETRIES", "three"),
    ]));
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("SPOTVIZ_MAX_RETRIES")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_token_path_lives_in_data_dir() {
    let config = Config::from_lookup(lookup(&[("SPOTIFY_API_AUTH_CLIENT_ID", "abc")])).unwrap();
    let path = config.token_path();

    assert!(path.starts_with(data_dir()));
    assert!(path.ends_with("cache/token.json"));
}
