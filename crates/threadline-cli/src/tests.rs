use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use clap::Parser;
use pretty_assertions::assert_eq;
use threadline_core::config::{ClientConfig, ENV_API_BASE_URL, ENV_AUTH_TOKEN};
use threadline_core::models::{PendingAction, ReportAction, ReportActions};
use threadline_core::screen::{Content, Footer, HeaderKind, Readiness, ScreenView};

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::commands::comment::{comment_outcome, CommentOutcome};
use crate::commands::common::{
    file_name_from_url, format_relative_time, format_summary_lines, normalize_attachment_url,
    normalize_content, normalize_report_id, summarize_view,
};
use crate::commands::config::render_redacted;
use crate::commands::open::is_settled;
use crate::error::CliError;
use crate::settings::{load_client_config_with, resolve_config_path, resolve_download_dir};

fn action(id: &str, message: &str) -> ReportAction {
    ReportAction {
        report_action_id: id.to_string(),
        created: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        message: message.to_string(),
        actor_account_id: Some(7),
        ..ReportAction::default()
    }
}

fn ready_view(content: Content) -> ScreenView {
    ScreenView {
        readiness: Readiness::Ready,
        content,
        footer: Footer::Full {
            show_composer: true,
            is_composer_full_size: false,
        },
        header: HeaderKind::Chat,
        show_task_header: false,
        pending_action: None,
        errors: None,
        fetch_errors: None,
        show_account_manager_banner: false,
        is_loading: false,
        is_loading_initial_history: false,
        access_denied: false,
        should_hide_composer: false,
    }
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn parses_open_with_defaults() {
    let cli = Cli::try_parse_from(["threadline", "open", "42"]).unwrap();
    match cli.command {
        Commands::Open {
            report_id,
            timeout_secs,
            json,
        } => {
            assert_eq!(report_id, "42");
            assert_eq!(timeout_secs, 15);
            assert!(!json);
        }
        _ => panic!("expected open command"),
    }
    assert!(cli.config.is_none());
}

#[test]
fn parses_comment_text_and_global_config() {
    let cli = Cli::try_parse_from([
        "threadline",
        "--config",
        "/tmp/threadline.json",
        "comment",
        "42",
        "hello",
        "there",
    ])
    .unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/threadline.json")));
    match cli.command {
        Commands::Comment {
            report_id, text, ..
        } => {
            assert_eq!(report_id, "42");
            assert_eq!(text, vec!["hello", "there"]);
        }
        _ => panic!("expected comment command"),
    }
}

#[test]
fn parses_download_options() {
    let cli = Cli::try_parse_from([
        "threadline",
        "download",
        "https://example.com/a.pdf",
        "--name",
        "report.pdf",
        "--dir",
        "/tmp/out",
    ])
    .unwrap();
    match cli.command {
        Commands::Download { url, name, dir } => {
            assert_eq!(url, "https://example.com/a.pdf");
            assert_eq!(name.as_deref(), Some("report.pdf"));
            assert_eq!(dir, Some(PathBuf::from("/tmp/out")));
        }
        _ => panic!("expected download command"),
    }
}

#[test]
fn parses_config_path_subcommand() {
    let cli = Cli::try_parse_from(["threadline", "config", "path"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommands::Path
        }
    ));
}

#[test]
fn rejects_missing_report_id() {
    assert!(Cli::try_parse_from(["threadline", "open"]).is_err());
}

#[test]
fn normalize_report_id_trims_and_rejects_empty() {
    assert_eq!(normalize_report_id("  42 ").unwrap(), "42");
    assert!(matches!(
        normalize_report_id("   "),
        Err(CliError::EmptyReportId)
    ));
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hi  "), Some("hi".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn attachment_url_requires_http_scheme() {
    assert_eq!(
        normalize_attachment_url(" https://example.com/a.pdf ").unwrap(),
        "https://example.com/a.pdf"
    );
    assert!(matches!(
        normalize_attachment_url("example.com/a.pdf"),
        Err(CliError::InvalidUrl(_))
    ));
}

#[test]
fn file_name_uses_last_path_segment() {
    assert_eq!(
        file_name_from_url("https://www.example.com/chat-attachments/482/w_abc.pdf?x=1"),
        "w_abc.pdf"
    );
    assert_eq!(
        file_name_from_url("https://example.com/dir/photo.png#preview"),
        "photo.png"
    );
    assert_eq!(file_name_from_url("https://example.com/dir/"), "dir");
}

#[test]
fn file_name_falls_back_without_path() {
    assert_eq!(file_name_from_url("https://example.com"), "attachment");
    assert_eq!(file_name_from_url("https://example.com/"), "attachment");
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 5 * 60_000, now), "5m ago");
    assert_eq!(format_relative_time(now - 3 * 3_600_000, now), "3h ago");
    assert_eq!(format_relative_time(now - 2 * 86_400_000, now), "2d ago");
    assert_eq!(format_relative_time(now + 60_000, now), "just now");
}

#[test]
fn summary_lists_messages_oldest_first() {
    let view = ready_view(Content::Messages(vec![
        action("2", "second"),
        action("1", "first"),
    ]));
    let summary = summarize_view("42", &view);

    assert_eq!(summary.readiness, "ready");
    assert!(summary.can_compose);
    assert_eq!(summary.messages.len(), 2);

    let lines = format_summary_lines(&summary);
    assert_eq!(lines[0], "Report 42 [ready]");
    assert!(lines[1].ends_with("7: first"));
    assert!(lines[2].ends_with("7: second"));
}

#[test]
fn summary_marks_pending_messages_and_errors() {
    let mut pending = action("3", "draft");
    pending.pending_action = Some(PendingAction::Add);
    let mut view = ready_view(Content::Messages(vec![pending]));
    view.errors = Some(BTreeMap::from([(
        "1".to_string(),
        "Could not create the chat".to_string(),
    )]));
    view.footer = Footer::Disabled;

    let summary = summarize_view("42", &view);
    let lines = format_summary_lines(&summary);

    assert_eq!(summary.errors, vec!["Could not create the chat"]);
    assert!(lines.contains(&"  ! Could not create the chat".to_string()));
    assert!(lines.iter().any(|line| line.ends_with("draft (pending)")));
    assert_eq!(lines.last().unwrap(), "  (composer unavailable)");
}

#[test]
fn summary_includes_fetch_errors() {
    let mut view = ready_view(Content::Skeleton { height: 0.0 });
    view.readiness = Readiness::NotReady;
    view.fetch_errors = Some(BTreeMap::from([(
        "1".to_string(),
        "Network request failed".to_string(),
    )]));

    let summary = summarize_view("42", &view);
    assert_eq!(summary.errors, vec!["Network request failed"]);
}

#[test]
fn open_settles_on_fetch_failure_or_loaded_history() {
    let mut view = ready_view(Content::Skeleton { height: 0.0 });
    view.readiness = Readiness::NotReady;
    assert!(!is_settled(&view));

    view.fetch_errors = Some(BTreeMap::from([(
        "1".to_string(),
        "Network request failed".to_string(),
    )]));
    assert!(is_settled(&view));

    let mut view = ready_view(Content::Messages(Vec::new()));
    view.is_loading_initial_history = true;
    assert!(!is_settled(&view));
    view.is_loading_initial_history = false;
    assert!(is_settled(&view));
}

#[test]
fn summary_for_denied_report_is_single_line() {
    let mut view = ready_view(Content::NotFound);
    view.access_denied = true;
    view.footer = Footer::Hidden;

    let summary = summarize_view("99", &view);
    assert!(summary.messages.is_empty());
    assert_eq!(
        format_summary_lines(&summary),
        vec!["Report 99 was not found or you do not have access to it."]
    );
}

#[test]
fn summary_serializes_readiness_label() {
    let mut view = ready_view(Content::Skeleton { height: 120.0 });
    view.readiness = Readiness::Transitioning;
    view.is_loading_initial_history = true;

    let json = serde_json::to_value(summarize_view("42", &view)).unwrap();
    assert_eq!(json["readiness"], "transitioning");
    assert_eq!(json["is_loading_initial_history"], true);
    assert_eq!(json["messages"], serde_json::json!([]));
}

#[test]
fn comment_outcome_tracks_pending_adds() {
    let mut actions = ReportActions::new();
    actions.insert("1".to_string(), action("1", "old"));
    assert_eq!(comment_outcome(&actions), CommentOutcome::Confirmed);

    let mut draft = action("2", "new");
    draft.pending_action = Some(PendingAction::Add);
    actions.insert("2".to_string(), draft.clone());
    assert_eq!(comment_outcome(&actions), CommentOutcome::Pending);

    draft
        .errors
        .insert("1700000000000".to_string(), "Server unreachable".to_string());
    actions.insert("2".to_string(), draft);
    assert_eq!(
        comment_outcome(&actions),
        CommentOutcome::Rejected("Server unreachable".to_string())
    );
}

#[test]
fn explicit_config_path_wins() {
    let path = PathBuf::from("/tmp/explicit.json");
    assert_eq!(resolve_config_path(Some(path.clone())).unwrap(), path);
}

#[test]
fn missing_config_file_uses_environment() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_client_config_with(&dir.path().join("config.json"), |key| match key {
        ENV_API_BASE_URL => Some("https://api.example.com/".to_string()),
        ENV_AUTH_TOKEN => Some(" token ".to_string()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.api_base_url, "https://api.example.com");
    assert_eq!(config.auth_token.as_deref(), Some("token"));
}

#[test]
fn config_file_is_loaded_and_overridden() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"api_base_url":"https://file.example.com","store_capacity":64}"#,
    )
    .unwrap();

    let from_file = load_client_config_with(&path, no_env).unwrap();
    assert_eq!(from_file.api_base_url, "https://file.example.com");
    assert_eq!(from_file.store_capacity, 64);

    let overridden = load_client_config_with(&path, |key| {
        (key == ENV_API_BASE_URL).then(|| "http://localhost:8080".to_string())
    })
    .unwrap();
    assert_eq!(overridden.api_base_url, "http://localhost:8080");
    assert_eq!(overridden.store_capacity, 64);
}

#[test]
fn missing_base_url_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = load_client_config_with(&dir.path().join("config.json"), no_env).unwrap_err();
    assert!(matches!(error, CliError::Config(_)));
    assert!(error.to_string().contains("THREADLINE_API_BASE_URL"));
}

#[test]
fn download_dir_prefers_flag_then_config() {
    let config = ClientConfig {
        download_dir: Some(PathBuf::from("/tmp/configured")),
        ..ClientConfig::default()
    };
    assert_eq!(
        resolve_download_dir(Some(PathBuf::from("/tmp/flag")), &config),
        PathBuf::from("/tmp/flag")
    );
    assert_eq!(
        resolve_download_dir(None, &config),
        PathBuf::from("/tmp/configured")
    );
}

#[test]
fn redacted_config_hides_token() {
    let config = ClientConfig {
        api_base_url: "https://api.example.com".to_string(),
        auth_token: Some("secret".to_string()),
        ..ClientConfig::default()
    };
    let rendered = render_redacted(&config).unwrap();
    assert!(!rendered.contains("secret"));
    assert!(rendered.contains("[REDACTED]"));
}

#[test]
fn completions_name_the_binary() {
    let script = String::from_utf8(crate::commands::completions::render(
        crate::cli::CompletionShell::Bash,
    ))
    .unwrap();
    assert!(script.contains("threadline"));
    assert!(script.contains("download"));
}
