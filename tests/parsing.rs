use std::fs;
use std::path::PathBuf;

use opening_stats::archives::parse_archive_index_json;
use opening_stats::error::AnalysisError;
use opening_stats::games_fetch::parse_monthly_archive_json;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_archive_index_fixture() {
    let raw = read_fixture("archives_alice.json");
    let archives = parse_archive_index_json(&raw, "alice").expect("fixture should parse");
    assert_eq!(archives.len(), 3);
    assert!(archives[0].ends_with("/2024/01"));
    assert!(archives[2].ends_with("/2024/03"));
}

#[test]
fn archive_index_without_archives_is_unknown_user() {
    let raw = read_fixture("unknown_user.json");
    let err = parse_archive_index_json(&raw, "ghost").unwrap_err();
    assert!(matches!(err, AnalysisError::UserNotFound { ref username } if username == "ghost"));
}

#[test]
fn archive_index_garbage_is_transport_error() {
    let err = parse_archive_index_json("<html>oops</html>", "alice").unwrap_err();
    assert!(matches!(err, AnalysisError::Transport(_)));
}

#[test]
fn empty_archive_list_is_not_an_error() {
    let archives = parse_archive_index_json(r#"{"archives":[]}"#, "alice").unwrap();
    assert!(archives.is_empty());
}

#[test]
fn parses_monthly_archive_fixture() {
    let raw = read_fixture("games_2024_01.json");
    let games = parse_monthly_archive_json(&raw).expect("fixture should parse");
    // The entry without players is dropped.
    assert_eq!(games.len(), 6);

    let first = &games[0];
    assert_eq!(first.url, "https://www.test/game/live/1001");
    assert_eq!(first.white_username, "Alice");
    assert_eq!(first.white_rating, 1500);
    assert_eq!(first.white_result, "win");
    assert_eq!(first.black_username, "bob");
    assert_eq!(first.black_rating, 1480);
    assert_eq!(first.black_result, "resigned");
    assert!(first.rated);
    assert_eq!(first.rules, "chess");
    assert_eq!(first.time_class, "blitz");
    assert_eq!(first.end_time, Some(1704100000));
    assert!(first.pgn.contains("[ECO \"C50\"]"));

    assert!(!games[4].rated);
    assert_eq!(games[5].rules, "chess960");
}

#[test]
fn monthly_archive_null_is_empty() {
    assert!(parse_monthly_archive_json("null").unwrap().is_empty());
    assert!(parse_monthly_archive_json("  ").unwrap().is_empty());
}

#[test]
fn game_without_player_rating_is_dropped() {
    let raw = r#"{"games":[
        {"url":"https://www.test/game/live/1","pgn":"","rated":true,"rules":"chess","time_class":"blitz",
         "white":{"username":"alice","rating":1500,"result":"win"},
         "black":{"username":"bob","result":"resigned"}},
        {"url":"https://www.test/game/live/2","pgn":"","rated":true,"rules":"chess","time_class":"blitz",
         "white":{"username":"alice","rating":1500,"result":"win"},
         "black":{"username":"bob","rating":1450,"result":"resigned"}}
    ]}"#;
    let games = parse_monthly_archive_json(raw).expect("archive should parse");
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].url, "https://www.test/game/live/2");
    assert_eq!(games[0].black_rating, 1450);
}

#[test]
fn monthly_archive_without_games_field_is_an_error() {
    assert!(parse_monthly_archive_json(r#"{"message":"gone"}"#).is_err());
}
