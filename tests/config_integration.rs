use std::path::PathBuf;
use std::time::Duration;

use readme_preview::config::{ConfigFlags, RefreshMode, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".readmepreviewrc");
    let content = r#"
# comment
--perf

--refresh-mode watch
   
--debug-log=preview.log
--ignore target --ignore dist
"#;
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.perf);
    assert_eq!(flags.refresh_mode, Some(RefreshMode::Watch));
    assert_eq!(flags.debug_log, Some(PathBuf::from("preview.log")));
    assert_eq!(flags.ignore, vec!["target".to_string(), "dist".to_string()]);
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".readmepreviewrc");
    let content = "--perf\n--refresh-mode watch\n--debug-log file.log\n--ignore vendor\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "readme-preview".to_string(),
        "--refresh-mode".to_string(),
        "poll".to_string(),
        "--refresh-interval".to_string(),
        "2".to_string(),
        "--ignore".to_string(),
        "build".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.perf, "file flags should remain enabled");
    assert_eq!(effective.refresh_mode, Some(RefreshMode::Poll), "cli should override mode");
    assert_eq!(effective.effective_refresh_interval(), Duration::from_secs(2));
    assert_eq!(
        effective.debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
    let options = effective.discovery_options();
    assert!(options.is_ignored("vendor"));
    assert!(options.is_ignored("build"));
}

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}

#[test]
fn test_invalid_values_are_dropped() {
    let args = vec![
        "readme-preview".to_string(),
        "--refresh-mode=sometimes".to_string(),
        "--refresh-interval=soon".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.refresh_mode, None);
    assert_eq!(flags.refresh_interval, None);
    assert_eq!(flags.effective_refresh_mode(), RefreshMode::Poll);
}
