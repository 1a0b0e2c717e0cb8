use ccg_graph::{CallEdge, CallGraph, GraphNode};
use ccg_indexer::{
    cleanup_repo_dir, clear_repo_cache, load_graph, tmp_path, write_json_atomic, IndexerError,
    OutputsLayout,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn sample_graph(functions: &[&str]) -> CallGraph {
    CallGraph {
        nodes: functions
            .iter()
            .map(|name| GraphNode::function("app.py", name, name, Some(1)))
            .collect(),
        edges: vec![CallEdge::scoped("app.py:main", "helper")],
    }
}

#[tokio::test]
async fn interrupted_write_keeps_the_previous_artifact() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("ccg.json");
    let previous = sample_graph(&["main"]);
    write_json_atomic(&path, &previous).await.expect("first write");
    let before = tokio::fs::read(&path).await.expect("read first");

    // Occupy the temp slot so the write cannot complete.
    let tmp = tmp_path(&path);
    tokio::fs::create_dir(&tmp).await.expect("block tmp");
    let err = write_json_atomic(&path, &sample_graph(&["main", "helper"]))
        .await
        .expect_err("write must fail");
    assert!(matches!(err, IndexerError::Persistence { .. }));
    assert_eq!(tokio::fs::read(&path).await.expect("read after"), before);

    // A stale partial temp file from a crashed writer is simply overwritten.
    tokio::fs::remove_dir(&tmp).await.expect("unblock tmp");
    tokio::fs::write(&tmp, b"{\"nodes\": [{\"id\"")
        .await
        .expect("partial tmp");
    let next = sample_graph(&["main", "helper"]);
    write_json_atomic(&path, &next).await.expect("second write");

    let stored: CallGraph =
        serde_json::from_slice(&tokio::fs::read(&path).await.expect("read")).expect("parse");
    assert_eq!(stored, next);
    assert!(!tmp.exists());
}

#[tokio::test]
async fn cleanup_is_idempotent() {
    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path();
    for name in ["docs.md", "ccg.json", "cached_docs.json", "README.md", "ccg.json.tmp"] {
        tokio::fs::write(dir.join(name), b"x").await.expect("write");
    }
    tokio::fs::create_dir_all(dir.join("src").join("pkg"))
        .await
        .expect("mkdir");
    tokio::fs::write(dir.join("src").join("pkg").join("mod.py"), b"x")
        .await
        .expect("write");

    let first = cleanup_repo_dir(dir).await.expect("first cleanup");
    assert_eq!(first.removed, vec!["README.md", "ccg.json.tmp", "src"]);
    assert!(first.failed.is_empty());

    let second = cleanup_repo_dir(dir).await.expect("second cleanup");
    assert!(second.removed.is_empty());

    let mut left: Vec<String> = std::fs::read_dir(dir)
        .expect("read_dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(left, vec!["cached_docs.json", "ccg.json", "docs.md"]);
}

#[cfg(unix)]
#[tokio::test]
async fn cleanup_reports_entries_it_cannot_remove_and_keeps_going() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().expect("tempdir");
    let dir = temp.path();
    tokio::fs::write(dir.join("a_notes.txt"), b"x").await.expect("write");
    tokio::fs::write(dir.join("docs.md"), b"x").await.expect("write");
    tokio::fs::write(dir.join("z_build.log"), b"x").await.expect("write");
    let locked = dir.join("locked");
    tokio::fs::create_dir(&locked).await.expect("mkdir");
    tokio::fs::write(locked.join("inner.py"), b"x").await.expect("write");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).expect("chmod");

    // Permission bits do not bind root; nothing can fail there.
    if std::fs::write(locked.join("write_check"), b"x").is_ok() {
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        return;
    }

    let report = cleanup_repo_dir(dir).await.expect("cleanup");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).expect("chmod");

    assert_eq!(report.removed, vec!["a_notes.txt", "z_build.log"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "locked");
    assert!(!report.failed[0].error.is_empty());
    assert!(dir.join("docs.md").exists());
    assert!(locked.join("inner.py").exists());
}

#[tokio::test]
async fn cleanup_of_missing_directory_is_not_found() {
    let temp = TempDir::new().expect("tempdir");
    let err = cleanup_repo_dir(&temp.path().join("absent"))
        .await
        .expect_err("missing dir");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn clear_cache_removes_the_whole_repo_dir() {
    let temp = TempDir::new().expect("tempdir");
    let layout = OutputsLayout::new(temp.path());
    let repo = temp.path().join("demo");
    tokio::fs::create_dir_all(repo.join("nested")).await.expect("mkdir");
    tokio::fs::write(repo.join("ccg.json"), b"{}").await.expect("write");
    tokio::fs::write(repo.join("nested").join("a.py"), b"")
        .await
        .expect("write");

    let removed = clear_repo_cache(&layout, "demo").await.expect("clear");
    assert_eq!(removed, repo);
    assert!(!repo.exists());

    let again = clear_repo_cache(&layout, "demo").await.expect_err("gone");
    assert!(again.is_not_found());
}

#[tokio::test]
async fn traversal_names_are_rejected_before_touching_disk() {
    let temp = TempDir::new().expect("tempdir");
    let layout = OutputsLayout::new(temp.path().join("outputs"));
    let err = clear_repo_cache(&layout, "..").await.expect_err("invalid");
    assert!(matches!(err, IndexerError::InvalidRepoName(_)));
    assert!(temp.path().exists());
}

#[tokio::test]
async fn load_graph_reads_the_artifact_back() {
    let temp = TempDir::new().expect("tempdir");
    let layout = OutputsLayout::new(temp.path());
    let graph = sample_graph(&["main", "helper"]);
    write_json_atomic(&layout.graph_path("demo").expect("path"), &graph)
        .await
        .expect("write");

    assert_eq!(load_graph(&layout, "demo").await.expect("load"), graph);
}
