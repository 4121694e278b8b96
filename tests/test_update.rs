//! Integration tests for the per-repository update state machine

mod common;

use common::fixtures::LFS_ATTRIBUTES;
use common::{create_test_commit, git, is_git_available, rev_parse, ForkFixture, OriginFixture};
use gitup::core::SyncConfig;
use gitup::git::{
    select_backend, BackendKind, RepositoryDescriptor, RepositoryUpdater, UpdateError,
    UpdateOutcome, Updater, WarningKind,
};
use tokio_util::sync::CancellationToken;

fn updater() -> RepositoryUpdater {
    RepositoryUpdater::new(&SyncConfig::default())
}

async fn update(descriptor: &RepositoryDescriptor) -> UpdateOutcome {
    updater()
        .update(descriptor, &CancellationToken::new())
        .await
}

#[tokio::test]
async fn test_fast_forward_from_origin_reports_diff_stat() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    let published = fixture
        .publish("notes.txt", "one\ntwo\nthree\n", "Add notes")
        .unwrap();

    let outcome = update(&fixture.descriptor()).await;

    assert_eq!(
        outcome.diff_stat(),
        Some(" notes.txt | 3 +++\n 1 files changed, 3 insertions(+), 0 deletions(-)")
    );
    assert_eq!(rev_parse(&fixture.local(), "HEAD").unwrap(), published);
    assert!(fixture.local().join("notes.txt").exists());
}

#[tokio::test]
async fn test_second_update_has_no_diff_stat() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    fixture.publish("a.txt", "a\n", "Add a").unwrap();

    let first = update(&fixture.descriptor()).await;
    assert!(first.diff_stat().is_some());

    let second = update(&fixture.descriptor()).await;
    assert_eq!(second, UpdateOutcome::success());
}

#[tokio::test]
async fn test_moved_branch_without_file_changes_reports_zero_totals() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    let publisher = fixture.publisher();
    git(&publisher, &["commit", "-q", "--allow-empty", "-m", "Empty"]).unwrap();
    git(&publisher, &["push", "-q", "origin", "main"]).unwrap();

    let outcome = update(&fixture.descriptor()).await;

    assert_eq!(
        outcome.diff_stat(),
        Some(" 0 files changed, 0 insertions(+), 0 deletions(-)")
    );
    assert_eq!(
        rev_parse(&fixture.local(), "HEAD").unwrap(),
        rev_parse(&publisher, "HEAD").unwrap()
    );
}

#[tokio::test]
async fn test_already_synchronized_repository_succeeds_twice() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();

    assert_eq!(update(&fixture.descriptor()).await, UpdateOutcome::success());
    assert_eq!(update(&fixture.descriptor()).await, UpdateOutcome::success());
}

#[tokio::test]
async fn test_tracked_change_warns_without_touching_network() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    std::fs::write(fixture.local().join("README.md"), "# Edited locally\n").unwrap();
    // Any fetch would now fail, so a warning proves no remote was contacted
    git(
        &fixture.local(),
        &["remote", "set-url", "origin", "/nonexistent/remote.git"],
    )
    .unwrap();

    let outcome = update(&fixture.descriptor()).await;
    assert_eq!(
        outcome,
        UpdateOutcome::Warning(WarningKind::UncommittedChanges)
    );
}

#[tokio::test]
async fn test_deleted_tracked_file_warns() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    std::fs::remove_file(fixture.local().join("README.md")).unwrap();

    let outcome = update(&fixture.descriptor()).await;
    assert_eq!(
        outcome,
        UpdateOutcome::Warning(WarningKind::UncommittedChanges)
    );
}

#[tokio::test]
async fn test_untracked_files_do_not_block_update() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    std::fs::write(fixture.local().join("scratch.txt"), "local notes").unwrap();
    fixture.publish("b.txt", "b\nb\n", "Add b").unwrap();

    let outcome = update(&fixture.descriptor()).await;
    assert!(outcome.is_success());
    assert!(outcome.diff_stat().is_some());
    assert!(fixture.local().join("scratch.txt").exists());
}

#[tokio::test]
async fn test_diverged_branch_is_merge_failure() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    create_test_commit(&fixture.local(), "local.txt", "mine\n", "Local work").unwrap();
    fixture.publish("remote.txt", "theirs\n", "Remote work").unwrap();
    let before = rev_parse(&fixture.local(), "HEAD").unwrap();

    let outcome = update(&fixture.descriptor()).await;
    assert!(
        matches!(outcome, UpdateOutcome::Error(UpdateError::MergeFailure { .. })),
        "unexpected outcome: {outcome:?}"
    );
    assert_eq!(rev_parse(&fixture.local(), "HEAD").unwrap(), before);
}

#[tokio::test]
async fn test_unreachable_origin_is_network_failure() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    git(
        &fixture.local(),
        &["remote", "set-url", "origin", "/nonexistent/remote.git"],
    )
    .unwrap();

    let outcome = update(&fixture.descriptor()).await;
    assert!(
        matches!(outcome, UpdateOutcome::Error(UpdateError::NetworkFailure { .. })),
        "unexpected outcome: {outcome:?}"
    );
}

#[tokio::test]
async fn test_missing_origin_remote_is_error() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    git(&fixture.local(), &["remote", "remove", "origin"]).unwrap();

    let outcome = update(&fixture.descriptor()).await;
    assert!(outcome.is_error());
}

#[tokio::test]
async fn test_detached_head_is_reference_error() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    git(&fixture.local(), &["checkout", "-q", "--detach"]).unwrap();

    let outcome = update(&fixture.descriptor()).await;
    assert!(
        matches!(outcome, UpdateOutcome::Error(UpdateError::ReferenceResolution { .. })),
        "unexpected outcome: {outcome:?}"
    );
}

#[tokio::test]
async fn test_fork_update_resets_to_upstream_and_pushes_origin() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = ForkFixture::new().unwrap();
    let upstream_head = fixture
        .publish_upstream("feature.txt", "1\n2\n3\n4\n", "Add feature")
        .unwrap();

    let outcome = update(&fixture.descriptor()).await;

    let stat = outcome.diff_stat().expect("branch should have moved");
    let lines: Vec<&str> = stat.lines().collect();
    assert_eq!(lines.len(), 2, "one file entry plus the summary: {stat}");
    assert!(lines[0].starts_with(" feature.txt | 4"));
    assert_eq!(lines[1], " 1 files changed, 4 insertions(+), 0 deletions(-)");

    assert_eq!(rev_parse(&fixture.local(), "HEAD").unwrap(), upstream_head);
    assert_eq!(rev_parse(&fixture.origin(), "main").unwrap(), upstream_head);
}

#[tokio::test]
async fn test_fork_update_discards_local_commits() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = ForkFixture::new().unwrap();
    create_test_commit(&fixture.local(), "local.txt", "mine\n", "Local only").unwrap();
    let upstream_head = rev_parse(&fixture.upstream(), "main").unwrap();

    let outcome = update(&fixture.descriptor()).await;

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    assert_eq!(rev_parse(&fixture.local(), "HEAD").unwrap(), upstream_head);
    assert!(!fixture.local().join("local.txt").exists());
}

#[tokio::test]
async fn test_fork_with_missing_upstream_remote_is_error() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = ForkFixture::new().unwrap();
    let descriptor = fixture.descriptor().with_upstream_name("parent");

    let outcome = update(&descriptor).await;
    assert!(
        matches!(outcome, UpdateOutcome::Error(UpdateError::ReferenceResolution { .. })),
        "unexpected outcome: {outcome:?}"
    );
}

#[tokio::test]
async fn test_lfs_repository_uses_git_cli() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::with_lfs_attributes().unwrap();
    assert!(std::fs::read_to_string(fixture.local().join(".gitattributes"))
        .unwrap()
        .contains(LFS_ATTRIBUTES.trim()));
    assert_eq!(select_backend(&fixture.descriptor()).kind(), BackendKind::Native);

    fixture
        .publish("docs.txt", "line\nline\n", "Add docs")
        .unwrap();
    let outcome = update(&fixture.descriptor()).await;
    assert_eq!(
        outcome.diff_stat(),
        Some(" docs.txt | 2 ++\n 1 files changed, 2 insertions(+), 0 deletions(-)")
    );

    assert_eq!(update(&fixture.descriptor()).await, UpdateOutcome::success());
}

#[tokio::test]
async fn test_lfs_repository_with_tracked_change_warns() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::with_lfs_attributes().unwrap();
    std::fs::write(fixture.local().join("README.md"), "changed\n").unwrap();

    assert_eq!(
        update(&fixture.descriptor()).await,
        UpdateOutcome::Warning(WarningKind::UncommittedChanges)
    );
}

#[tokio::test]
async fn test_lfs_fork_update_pushes_origin() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = ForkFixture::with_lfs_attributes().unwrap();
    let upstream_head = fixture
        .publish_upstream("guide.txt", "a\nb\nc\n", "Add guide")
        .unwrap();

    let outcome = update(&fixture.descriptor()).await;
    assert!(
        outcome
            .diff_stat()
            .is_some_and(|s| s.ends_with(" 1 files changed, 3 insertions(+), 0 deletions(-)")),
        "unexpected outcome: {outcome:?}"
    );
    assert_eq!(rev_parse(&fixture.origin(), "main").unwrap(), upstream_head);
}

#[tokio::test]
async fn test_cancelled_update_leaves_repository_untouched() {
    if !is_git_available() {
        eprintln!("Git not available, skipping test");
        return;
    }
    let fixture = OriginFixture::new().unwrap();
    fixture.publish("a.txt", "a\n", "Add a").unwrap();
    let before = rev_parse(&fixture.local(), "HEAD").unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = updater().update(&fixture.descriptor(), &cancel).await;

    assert_eq!(outcome, UpdateOutcome::Error(UpdateError::Cancelled));
    assert_eq!(rev_parse(&fixture.local(), "HEAD").unwrap(), before);
}
