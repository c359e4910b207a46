use super::*;

use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, env(&[]));

    let loaded = load_settings(&dir.path().join("absent.toml")).expect("load");
    assert_eq!(loaded.sections, vec!["Answer", "Explanation", "Why this"]);
    assert_eq!(settings, Settings::default());
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("promptforge.toml");
    fs::write(
        &path,
        r#"
server_url = "http://qa.internal:8080"
sections = ["Answer", "Sources"]
speak_answers = false
request_timeout_seconds = 15
audio_dir = "speech"
"#,
    )
    .expect("write config");

    let mut settings = Settings::default();
    apply_file_settings(&mut settings, &fs::read_to_string(&path).expect("read"))
        .expect("parse");

    assert_eq!(settings.server_url, "http://qa.internal:8080");
    assert_eq!(settings.sections, vec!["Answer", "Sources"]);
    assert!(!settings.speak_answers);
    assert_eq!(settings.request_timeout_seconds, 15);
    assert_eq!(settings.audio_dir, Some(PathBuf::from("speech")));
    assert_eq!(settings.mic_file, None);
}

#[test]
fn malformed_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "sections = \"not a list\"").expect("write config");

    let err = load_settings(&path).expect_err("must fail");
    assert!(err.to_string().contains("invalid config"), "{err:#}");
}

#[test]
fn unknown_keys_are_rejected() {
    let mut settings = Settings::default();
    assert!(apply_file_settings(&mut settings, "server = \"typo\"").is_err());
}

#[test]
fn app_prefixed_env_wins_over_legacy_name() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env(&[
            ("PROMPTFORGE_SERVER_URL", "http://legacy:1"),
            ("APP__SERVER_URL", "http://preferred:2"),
        ]),
    );
    assert_eq!(settings.server_url, "http://preferred:2");
}

#[test]
fn env_sections_and_flags_are_parsed() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env(&[
            ("APP__SECTIONS", " Answer, ,Code sample ,"),
            ("APP__SPEAK_ANSWERS", "off"),
            ("APP__REQUEST_TIMEOUT_SECONDS", "30"),
            ("APP__MIC_FILE", "take.wav"),
        ]),
    );
    assert_eq!(settings.sections, vec!["Answer", "Code sample"]);
    assert!(!settings.speak_answers);
    assert_eq!(settings.request_timeout_seconds, 30);
    assert_eq!(settings.mic_file, Some(PathBuf::from("take.wav")));
}

#[test]
fn unparseable_env_values_are_ignored() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env(&[
            ("APP__SPEAK_ANSWERS", "maybe"),
            ("APP__REQUEST_TIMEOUT_SECONDS", "soon"),
        ]),
    );
    assert!(settings.speak_answers);
    assert_eq!(settings.request_timeout_seconds, 90);
}
