use serde_json::json;
use spotviz::types::*;

fn track_item(value: serde_json::Value) -> PlaylistTrackItem {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_into_track_ref_uses_primary_artist() {
    let item = track_item(json!({
        "track": {
            "id": "t1",
            "name": "Song",
            "popularity": 70,
            "album": {"name": "Album"},
            "artists": [
                {"id": "a1", "name": "Lead"},
                {"id": "a2", "name": "Feature"}
            ]
        }
    }));

    let track = item.into_track_ref().unwrap();
    assert_eq!(track.track_id, "t1");
    assert_eq!(track.artist_id, "a1");
    assert_eq!(track.artist_name, "Lead");
    assert_eq!(track.album_name, "Album");
    assert_eq!(track.popularity, 70);
}

#[test]
fn test_into_track_ref_skips_unresolvable_entries() {
    assert!(track_item(json!({"track": null})).into_track_ref().is_none());
    assert!(
        track_item(json!({"track": {"id": null, "name": "Local", "artists": [{"id": "a", "name": "A"}]}}))
            .into_track_ref()
            .is_none()
    );
    assert!(
        track_item(json!({"track": {"id": "t", "name": "No artist", "artists": []}}))
            .into_track_ref()
            .is_none()
    );
}

#[test]
fn test_audio_features_keep_unknown_attributes() {
    let features: AudioFeatures = serde_json::from_value(json!({
        "id": "t1",
        "energy": 0.5,
        "valence": 0.4,
        "acousticness": 0.3,
        "danceability": 0.2,
        "speechiness": 0.1,
        "liveness": 0.05,
        "loudness": -7.0,
        "tempo": 99.5,
        "mode": 1
    }))
    .unwrap();

    assert_eq!(features.extra.len(), 2);
    let value = serde_json::to_value(&features).unwrap();
    assert_eq!(value["tempo"], json!(99.5));
    assert_eq!(value["mode"], json!(1));
    assert_eq!(value["loudness"], json!(-7.0));
}

#[test]
fn test_unknown_artist_serializes_sentinel() {
    let info = ArtistInfo::unknown();
    assert!(info.is_unknown());
    assert_eq!(
        serde_json::to_value(&info).unwrap(),
        json!({"genres": ["unknown"], "images": "unknown"})
    );
}

#[test]
fn test_known_artist_serializes_images() {
    let info = ArtistInfo::from(Artist {
        id: "a1".to_string(),
        name: "Lead".to_string(),
        genres: vec!["shoegaze".to_string()],
        images: vec![Image {
            url: "https://i.scdn.co/image/a1".to_string(),
            height: Some(64),
            width: None,
        }],
    });

    assert!(!info.is_unknown());
    assert_eq!(
        serde_json::to_value(&info).unwrap()["images"],
        json!([{"url": "https://i.scdn.co/image/a1", "height": 64, "width": null}])
    );
}

#[test]
fn test_song_record_uses_camel_case_keys() {
    let track = TrackRef {
        track_id: "t1".to_string(),
        artist_id: "a1".to_string(),
        artist_name: "Lead".to_string(),
        album_name: "Album".to_string(),
        track_name: "Song".to_string(),
        popularity: 12,
    };
    let song = SongRecord::new(track, None, ArtistInfo::unknown());

    assert_eq!(
        serde_json::to_value(&song).unwrap(),
        json!({
            "trackId": "t1",
            "albumName": "Album",
            "songName": "Song",
            "popularity": 12,
            "artists": {"name": "Lead", "genres": ["unknown"], "image": "unknown"},
            "genres": ["unknown"],
            "statistics": null
        })
    );
}

#[test]
fn test_run_report_counts() {
    let report = RunReport {
        document: vec![
            PlaylistRecord { name: "a".to_string(), songs: vec![] },
        ],
        failures: vec![PlaylistFailure {
            playlist_id: "p2".to_string(),
            name: "b".to_string(),
            kind: "upstream_failure".to_string(),
            message: "HTTP 500".to_string(),
        }],
    };

    assert!(!report.is_complete());
    assert_eq!(report.song_count(), 0);
    assert_eq!(
        serde_json::to_value(&report.failures[0]).unwrap(),
        json!({"playlistId": "p2", "name": "b", "kind": "upstream_failure", "message": "HTTP 500"})
    );
}

#[test]
fn test_token_expiry() {
    let token = Token {
        access_token: "a".to_string(),
        refresh_token: "r".to_string(),
        scope: String::new(),
        expires_in: 3600,
        obtained_at: 100,
    };
    assert_eq!(token.expires_at(), 3700);
    assert_eq!(token.refresh_due_in(100, 240), 3360);
}
