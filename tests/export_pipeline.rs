use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use tempfile::tempdir;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use chatlog::chunk::read_chunk;
use chatlog::projects::ProjectMapping;
use chatlog::{ExportConfig, Pipeline, RunStatus};

fn conversation(id: &str, created_at: &str, text: &str) -> Value {
    json!({
        "uuid": id,
        "name": format!("Conversation {id}"),
        "created_at": created_at,
        "chat_messages": [
            {"sender": "human", "text": format!("question about {text}")},
            {"sender": "assistant", "text": format!("answer about {text}")},
        ],
    })
}

fn export_dir(base: &Path) -> PathBuf {
    let dir = base.join("data/historical_export");
    std::fs::create_dir_all(&dir).expect("create export dir");
    dir
}

fn write_conversations(base: &Path, items: Vec<Value>) {
    let data = serde_json::to_vec_pretty(&Value::Array(items)).expect("encode");
    std::fs::write(export_dir(base).join("conversations.json"), data)
        .expect("write conversations");
}

fn config(base: &Path) -> ExportConfig {
    ExportConfig {
        base_dir: base.to_path_buf(),
        ..ExportConfig::default()
    }
}

fn output_files(base: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(base.join("data/filtered_output"))
        .expect("read output dir")
        .map(|entry| entry.expect("entry").path())
        .collect();
    files.sort();
    files
}

#[test]
fn five_records_over_three_days_make_one_file() {
    let dir = tempdir().expect("tempdir");
    write_conversations(
        dir.path(),
        vec![
            conversation("c3", "2024-05-03T09:00:00Z", "c"),
            conversation("c1", "2024-05-01T09:00:00Z", "a"),
            conversation("c2", "2024-05-02T09:00:00.123456", "b"),
            conversation("c4", "2024-05-03T18:30:00+02:00", "d"),
            conversation("c0", "2024-05-01", "e"),
        ],
    );

    let summary = Pipeline::new(config(dir.path()))
        .with_now(datetime!(2024-06-01 12:00:00))
        .run()
        .expect("run");

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.written.len(), 1);
    let files = output_files(dir.path());
    assert_eq!(
        files,
        vec![dir
            .path()
            .join("data/filtered_output/conversations_2024-05-01_to_2024-05-03.csv")]
    );

    let rows = read_chunk(&files[0]).expect("read chunk");
    assert_eq!(rows.len(), 5);
    let ids: Vec<&str> = rows.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c0", "c2", "c3", "c4"]);
    assert!(rows.iter().all(|r| r.message_count == 2));
    assert!(rows[0].full_text.starts_with("USER MESSAGES:\nquestion about a"));
}

#[test]
fn old_and_undatable_records_are_excluded() {
    let dir = tempdir().expect("tempdir");
    write_conversations(
        dir.path(),
        vec![
            conversation("recent", "2024-05-20T10:00:00Z", "kept"),
            conversation("old", "2023-12-01T10:00:00Z", "dropped"),
            conversation("bad", "not-a-date", "dropped"),
            json!({"uuid": "nodate", "chat_messages": [{"sender": "human", "text": "x"}]}),
        ],
    );

    let summary = Pipeline::new(config(dir.path()))
        .with_now(datetime!(2024-06-01 12:00:00))
        .run()
        .expect("run");

    assert_eq!(summary.stats.examined, 4);
    assert_eq!(summary.stats.accepted, 1);
    assert_eq!(summary.stats.too_old, 1);
    assert_eq!(summary.stats.unparsable, 1);
    assert_eq!(summary.stats.undated, 1);

    let files = output_files(dir.path());
    assert_eq!(files.len(), 1);
    let rows = read_chunk(&files[0]).expect("read chunk");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].identifier, "recent");
}

#[test]
fn empty_or_missing_source_writes_nothing() {
    let dir = tempdir().expect("tempdir");
    let pipeline = Pipeline::new(config(dir.path())).with_now(datetime!(2024-06-01 12:00:00));

    let summary = pipeline.run().expect("run without source");
    assert_eq!(summary.status, RunStatus::NoConversations);
    assert!(output_files(dir.path()).is_empty());

    write_conversations(dir.path(), Vec::new());
    let summary = pipeline.run().expect("run with empty source");
    assert_eq!(summary.status, RunStatus::NoConversations);
    assert!(output_files(dir.path()).is_empty());
}

#[test]
fn truncated_source_writes_nothing() {
    let dir = tempdir().expect("tempdir");
    let valid = serde_json::to_string(&conversation("c1", "2024-05-20T10:00:00Z", "a"))
        .expect("encode");
    std::fs::write(
        export_dir(dir.path()).join("conversations.json"),
        format!("[{valid}, {{\"uuid\": \"c2\", \"created_at\""),
    )
    .expect("write truncated");

    let summary = Pipeline::new(config(dir.path()))
        .with_now(datetime!(2024-06-01 12:00:00))
        .run()
        .expect("run");
    assert_eq!(summary.status, RunStatus::NoConversations);
    assert!(output_files(dir.path()).is_empty());
}

#[test]
fn small_budget_splits_across_files() {
    let dir = tempdir().expect("tempdir");
    let filler = "x".repeat(600);
    let items = (1..=6)
        .map(|day| conversation(&format!("c{day}"), &format!("2024-05-{day:02}T08:00:00Z"), &filler))
        .collect();
    write_conversations(dir.path(), items);

    let mut config = config(dir.path());
    // about 2 KiB, room for one record at a time
    config.max_chunk_mb = 2.0 / 1024.0;
    let summary = Pipeline::new(config)
        .with_now(datetime!(2024-06-01 12:00:00))
        .run()
        .expect("run");

    assert!(summary.written.len() > 1);
    let mut ids = Vec::new();
    for written in &summary.written {
        let rows = read_chunk(&written.path).expect("read chunk");
        assert_eq!(rows.len(), written.rows);
        ids.extend(rows.into_iter().map(|r| r.identifier));
    }
    assert_eq!(ids, vec!["c1", "c2", "c3", "c4", "c5", "c6"]);
}

#[test]
fn same_day_chunks_report_files_on_disk() {
    let dir = tempdir().expect("tempdir");
    let filler = "y".repeat(600);
    let items = (1..=3)
        .map(|i| conversation(&format!("s{i}"), "2024-05-10T08:00:00Z", &filler))
        .collect();
    write_conversations(dir.path(), items);

    let mut config = config(dir.path());
    config.max_chunk_mb = 1.0 / 1024.0;
    let summary = Pipeline::new(config)
        .with_now(datetime!(2024-06-01 12:00:00))
        .run()
        .expect("run");

    let files = output_files(dir.path());
    assert_eq!(files.len(), 1);
    assert_eq!(summary.written.len(), files.len());
    assert_eq!(summary.written[0].path, files[0]);
    let rows = read_chunk(&files[0]).expect("read chunk");
    assert_eq!(rows.len(), summary.written[0].rows);
    assert_eq!(rows[0].identifier, "s3");
}

#[test]
fn gzip_source_is_read() {
    let dir = tempdir().expect("tempdir");
    let data = serde_json::to_vec(&json!([
        conversation("g1", "2024-05-10T08:00:00Z", "gz"),
        conversation("g2", "2024-05-11T08:00:00Z", "gz"),
    ]))
    .expect("encode");
    let file = File::create(export_dir(dir.path()).join("conversations.json.gz"))
        .expect("create gz");
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(&data).expect("write gz");
    encoder.finish().expect("finish gz");

    let summary = Pipeline::new(config(dir.path()))
        .with_now(datetime!(2024-06-01 12:00:00))
        .run()
        .expect("run");
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.written.len(), 1);
    assert_eq!(summary.written[0].rows, 2);
}

#[test]
fn project_mapping_is_recorded() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(
        export_dir(dir.path()).join("projects.json"),
        br#"[{"uuid": "p1", "name": "Research"}, {"uuid": "p2"}]"#,
    )
    .expect("write projects");
    write_conversations(
        dir.path(),
        vec![conversation("c1", "2024-05-20T10:00:00Z", "a")],
    );

    let summary = Pipeline::new(config(dir.path()))
        .with_now(datetime!(2024-06-01 12:00:00))
        .run()
        .expect("run");
    assert_eq!(summary.projects, 2);

    let mapping: ProjectMapping = serde_json::from_slice(
        &std::fs::read(dir.path().join("config/project_mapping.json")).expect("read mapping"),
    )
    .expect("decode mapping");
    assert_eq!(mapping.total_projects, 2);
    assert_eq!(mapping.project_names, vec!["Research", "Unnamed"]);
}

#[test]
fn default_clock_uses_lookback_window() {
    let dir = tempdir().expect("tempdir");
    let now = OffsetDateTime::now_utc();
    let day = |offset: i64| {
        let date = (now - Duration::days(offset)).date();
        format!(
            "{:04}-{:02}-{:02}T12:00:00",
            date.year(),
            date.month() as u8,
            date.day()
        )
    };
    write_conversations(
        dir.path(),
        vec![
            conversation("fresh", &day(2), "a"),
            conversation("stale", &day(120), "b"),
        ],
    );

    let summary = Pipeline::new(config(dir.path())).run().expect("run");
    assert_eq!(summary.stats.accepted, 1);
    assert_eq!(summary.stats.too_old, 1);
    assert_eq!(summary.written.len(), 1);
}
