use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use goodnight_core::config::ClientConfig;
use goodnight_core::identity::{FileLabelStore, IdentitySelector};
use goodnight_core::store::{LibSqlLogStore, MemoryLogStore};
use goodnight_core::{GroupedView, LogViewModel, SleepRecord, SpouseLabel, ViewState};
use pretty_assertions::assert_eq;

use crate::cli::{Cli, Commands, CompletionShell, IdentityCommands};
use crate::commands::common::{
    confirm, format_group_lines, is_affirmative, load_view, normalize_record_identifier,
    resolve_record, CliViewModel, LogStore,
};
use crate::commands::completions::render_completions;
use crate::commands::config::{missing_remote_fields, redact};
use crate::commands::watch::render_watch_frame;
use crate::error::CliError;

fn record(id: &str, timestamp: i64, date: &str, label: Option<SpouseLabel>) -> SleepRecord {
    SleepRecord {
        id: id.parse().unwrap(),
        timestamp,
        date_string: date.to_string(),
        time_string: "下午11:30".to_string(),
        user_id: "uid".to_string(),
        user_name: label,
    }
}

fn view_model(store: LogStore, dir: &tempfile::TempDir) -> CliViewModel {
    let identity =
        IdentitySelector::load(FileLabelStore::new(dir.path().join("identity.json"))).unwrap();
    LogViewModel::new(Arc::new(store), Arc::new(identity))
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn bare_invocation_defaults_to_sleep() {
    let cli = Cli::try_parse_from(["goodnight"]).unwrap();
    assert!(cli.command.is_none());
    assert!(!cli.offline);
}

#[test]
fn global_flags_parse_after_subcommand() {
    let cli =
        Cli::try_parse_from(["goodnight", "delete", "0192abc", "--yes", "--offline"]).unwrap();
    assert!(cli.offline);
    match cli.command {
        Some(Commands::Delete { id, yes }) => {
            assert_eq!(id, "0192abc");
            assert!(yes);
        }
        _ => panic!("expected delete command"),
    }
}

#[test]
fn identity_choose_takes_label_argument() {
    let cli = Cli::try_parse_from(["goodnight", "identity", "choose", "spouse-B"]).unwrap();
    match cli.command {
        Some(Commands::Identity {
            command: IdentityCommands::Choose { label },
        }) => assert_eq!(label, "spouse-B"),
        _ => panic!("expected identity choose"),
    }
}

#[test]
fn group_lines_put_headers_before_entries() {
    let records = vec![
        record("0192aaaa-0000-7000-8000-000000000002", 200, "2024/1/6", Some(SpouseLabel::SpouseB)),
        record("0192aaaa-0000-7000-8000-000000000001", 100, "2024/1/5", None),
    ];
    let lines = format_group_lines(&GroupedView::from_sorted(&records));

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "2024/1/6");
    assert!(lines[1].contains("spouse-B"));
    assert!(lines[1].contains("0192aaaa-0000"));
    assert_eq!(lines[2], "2024/1/5");
    assert!(lines[3].contains("  -  "));
}

#[test]
fn resolve_record_accepts_exact_and_unique_prefix() {
    let records = vec![
        record("abc123", 200, "2024/1/5", None),
        record("abd456", 100, "2024/1/5", None),
    ];

    assert_eq!(resolve_record(&records, "abc123").unwrap().id.as_str(), "abc123");
    assert_eq!(resolve_record(&records, "abd").unwrap().id.as_str(), "abd456");
}

#[test]
fn resolve_record_reports_ambiguous_and_missing() {
    let records = vec![
        record("abc123", 200, "2024/1/5", None),
        record("abd456", 100, "2024/1/5", None),
    ];

    assert!(matches!(
        resolve_record(&records, "ab"),
        Err(CliError::AmbiguousRecordId(_))
    ));
    assert!(matches!(
        resolve_record(&records, "zz"),
        Err(CliError::RecordNotFound(_))
    ));
}

#[test]
fn record_identifier_must_not_be_blank() {
    assert!(matches!(
        normalize_record_identifier("  "),
        Err(CliError::EmptyRecordId)
    ));
    assert_eq!(normalize_record_identifier(" abc ").unwrap(), "abc");
}

#[test]
fn confirmation_answers() {
    assert!(is_affirmative("y\n"));
    assert!(is_affirmative(" YES "));
    assert!(!is_affirmative(""));
    assert!(!is_affirmative("nope"));
    assert!(confirm("Delete?", true, "delete").unwrap());
}

#[test]
fn completions_name_the_binary() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("goodnight"));
}

#[test]
fn config_show_redacts_turso_token() {
    let client = ClientConfig {
        turso_database_url: Some("libsql://goodnight.turso.io".to_string()),
        turso_auth_token: Some("secret-token".to_string()),
        ..Default::default()
    };
    let rendered = serde_json::to_string(&redact(&client)).unwrap();
    assert!(!rendered.contains("secret-token"));
    assert!(rendered.contains("[REDACTED]"));
    assert_eq!(
        missing_remote_fields(&client),
        vec!["supabase_url", "supabase_anon_key"]
    );
}

#[test]
fn watch_frame_reflects_view_state() {
    let loading = render_watch_frame(&ViewState::default(), "local");
    assert!(loading[0].starts_with("Goodnight (local)"));
    assert!(loading.iter().any(|line| line == "Loading..."));

    let failed = ViewState {
        loading: false,
        last_error: Some("connection lost".to_string()),
        ..Default::default()
    };
    let lines = render_watch_frame(&failed, "turso replica");
    assert!(lines.iter().any(|line| line == "No bedtimes logged yet."));
    assert!(lines
        .iter()
        .any(|line| line.contains("Live updates failed: connection lost")));
}

#[tokio::test]
async fn offline_store_loads_and_deletes_through_view_model() {
    let dir = tempfile::tempdir().unwrap();
    let memory = MemoryLogStore::with_records(vec![
        record("a1", 200, "2024/1/5", Some(SpouseLabel::SpouseA)),
        record("b2", 100, "2024/1/5", Some(SpouseLabel::SpouseB)),
    ]);
    let store = LogStore::Memory(memory.clone());
    assert_eq!(store.describe(), "offline");
    let vm = view_model(store, &dir);

    let view = load_view(&vm).await.unwrap();
    assert_eq!(view.records.len(), 2);

    let target = resolve_record(&view.records, "a").unwrap();
    vm.remove(&target.id).await.unwrap();
    assert_eq!(memory.records().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn libsql_store_mirrors_appends() {
    let dir = tempfile::tempdir().unwrap();
    let store = LogStore::LibSql(LibSqlLogStore::open_in_memory("sleep_logs").await.unwrap());
    assert_eq!(store.describe(), "local");
    let vm = view_model(store, &dir);
    vm.identity().choose(SpouseLabel::SpouseA).unwrap();
    vm.set_session_user(Some("local-user".to_string()));

    let view = load_view(&vm).await.unwrap();
    assert!(view.records.is_empty());

    let id = vm.append_now().await.unwrap();
    let mut changes = vm.changes();
    let view = tokio::time::timeout(
        Duration::from_secs(5),
        changes.wait_for(|view| view.records.len() == 1),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(view.records[0].id, id);
    assert_eq!(view.records[0].user_name, Some(SpouseLabel::SpouseA));
    vm.stop();
}
