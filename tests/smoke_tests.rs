use chrono::NaiveDate;
use meeting_assistant::components::google_calendar::{EventTime, Meeting, TokenFile};
use meeting_assistant::config::{Config, FileOverrides};
use std::collections::HashMap;

/// Smoke test to verify that the config file is picked up
#[test]
fn test_config_file_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assistant.toml");
    std::fs::write(
        &path,
        "timezone = \"Europe/Helsinki\"\ncalendar_id = \"team@example.com\"\nmax_results = 5\n",
    )
    .unwrap();

    let overrides = FileOverrides::load(&path);
    let vars: HashMap<&str, &str> = [("OPENAI_API_KEY", "sk"), ("ELEVENLABS_API_KEY", "el")]
        .into_iter()
        .collect();
    let config =
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()), overrides).unwrap();

    assert_eq!(config.timezone, chrono_tz::Europe::Helsinki);
    assert_eq!(config.calendar_id, "team@example.com");
    assert_eq!(config.max_results, 5);
}

#[test]
fn test_malformed_config_file_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assistant.toml");
    std::fs::write(&path, "max_results = \"many\"").unwrap();

    let overrides = FileOverrides::load(&path);
    assert!(overrides.max_results.is_none());
}

#[test]
fn test_debug_output_hides_keys() {
    let config = Config::from_lookup(
        |key| match key {
            "OPENAI_API_KEY" => Some("sk-secret".to_string()),
            "ELEVENLABS_API_KEY" => Some("el-secret".to_string()),
            _ => None,
        },
        FileOverrides::default(),
    )
    .unwrap();

    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("sk-secret"));
    assert!(!rendered.contains("el-secret"));
}

/// Meetings serialize for the `--json` listing
#[test]
fn test_meeting_json_shape() {
    let meeting = Meeting {
        id: "offsite".to_string(),
        summary: "Offsite".to_string(),
        start: Some(EventTime::Date(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap())),
        end: None,
        description: String::new(),
        attendees: vec!["a@example.com".to_string()],
        meeting_link: None,
    };

    let json = serde_json::to_value(&meeting).unwrap();
    assert_eq!(json["summary"], "Offsite");
    assert_eq!(json["start"]["kind"], "date");
    assert_eq!(json["start"]["value"], "2025-03-05");
    assert!(json["end"].is_null());
    assert_eq!(json["attendees"][0], "a@example.com");
}

#[tokio::test]
async fn test_missing_token_file_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let token_file = TokenFile::new(dir.path().join("nested").join("token.json"));

    assert!(token_file.load().await.unwrap().is_none());
}
