//! Ancestor walks, shared loads and the Loaded-ancestor invariant.

mod common;

use std::sync::Arc;

use arbor_core::{NamespaceError, NsPath};
use arbor_events::{InvalidationEvent, InvalidationReason, Scope};
use arbor_test::{MockNamespace, p, sample_namespace};
use arbor_tree::{LoadState, WalkOutcome};
use common::{Stack, names};

fn stack(mock: &MockNamespace) -> Stack {
    Stack::new(Arc::new(mock.clone()))
}

#[tokio::test]
async fn test_walk_from_empty_cache_lists_ancestors_in_order() {
    let mock = sample_namespace();
    let stack = stack(&mock);

    let outcome = stack.expansion.navigate(&p("a/b/c")).await.unwrap();
    assert_eq!(
        outcome,
        WalkOutcome::Completed {
            target: p("a/b/c"),
            is_dir: true,
        }
    );
    assert_eq!(mock.list_order(), vec![NsPath::root(), p("a"), p("a/b")]);

    let expanded: Vec<NsPath> = stack
        .expansion
        .expansion()
        .expanded()
        .iter()
        .cloned()
        .collect();
    assert_eq!(expanded, vec![NsPath::root(), p("a"), p("a/b"), p("a/b/c")]);
}

#[tokio::test]
async fn test_walk_over_cached_ancestors_makes_no_calls() {
    let mock = sample_namespace();
    let stack = stack(&mock);
    stack.expansion.navigate(&p("a/b/c")).await.unwrap();
    mock.clear_calls();

    stack.expansion.navigate(&NsPath::root()).await.unwrap();
    stack.expansion.navigate(&p("a/c")).await.unwrap();
    assert!(mock.calls().is_empty());

    let state = stack.expansion.expansion();
    assert!(state.is_expanded(&p("a/c")));
    assert!(!state.is_expanded(&p("a/b")));
    assert_eq!(state.target(), Some(&p("a/c")));
}

#[tokio::test]
async fn test_loaded_nodes_keep_loaded_ancestors_across_walks() {
    let mock = sample_namespace();
    let stack = stack(&mock);

    for target in ["a/b/c", "docs/report.txt", "a/c", "a/b"] {
        stack.expansion.navigate(&p(target)).await.unwrap();
        assert!(stack.cache.orphaned_loaded().is_empty(), "after {target}");
    }
    stack.expansion.toggle(&p("a/b/c")).await.unwrap();
    assert!(stack.cache.orphaned_loaded().is_empty());
    assert_eq!(
        stack.cache.loaded_paths(),
        vec![NsPath::root(), p("a"), p("a/b"), p("a/b/c"), p("docs")]
    );
}

#[tokio::test]
async fn test_scoped_invalidation_keeps_invariant() {
    let mock = sample_namespace();
    let stack = stack(&mock);
    stack.expansion.navigate(&p("a/b/c")).await.unwrap();
    stack.cache.ensure_loaded(&p("a/c")).await.unwrap();

    stack
        .bus
        .publish(InvalidationEvent::path(p("a"), InvalidationReason::Created));
    assert_eq!(stack.cache.state(&p("a")), Some(LoadState::Unloaded));
    assert_eq!(stack.cache.state(&p("a/b")), Some(LoadState::Unloaded));
    assert_eq!(stack.cache.state(&p("a/c")), Some(LoadState::Unloaded));
    assert!(stack.cache.state(&NsPath::root()).unwrap().is_loaded());
    assert!(stack.cache.orphaned_loaded().is_empty());

    mock.clear_calls();
    stack.expansion.navigate(&p("a/b/c")).await.unwrap();
    assert_eq!(mock.list_order(), vec![p("a"), p("a/b")]);
    assert!(stack.cache.orphaned_loaded().is_empty());
    assert_eq!(stack.cache.state(&p("a/c")), Some(LoadState::Unloaded));
}

#[tokio::test]
async fn test_direct_deep_load_keeps_invariant() {
    let mock = sample_namespace();
    let stack = stack(&mock);

    stack.cache.ensure_loaded(&p("a/b/c")).await.unwrap();
    assert_eq!(
        mock.list_order(),
        vec![NsPath::root(), p("a"), p("a/b"), p("a/b/c")]
    );
    assert!(stack.cache.orphaned_loaded().is_empty());
}

#[tokio::test]
async fn test_concurrent_walks_share_listings() {
    let mock = sample_namespace();
    let gate = mock.gate(&p("a"));
    let stack = stack(&mock);

    let first = tokio::spawn({
        let cache = Arc::clone(&stack.cache);
        async move { cache.ensure_loaded(&p("a")).await }
    });
    let second = tokio::spawn({
        let cache = Arc::clone(&stack.cache);
        async move { cache.ensure_loaded(&p("a")).await }
    });
    mock.wait_for_list_calls(&p("a"), 1).await;
    tokio::task::yield_now().await;
    gate.release();

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(names(&first), ["b", "c"]);
    assert_eq!(mock.list_calls(&p("a")), 1);
}

#[tokio::test]
async fn test_newer_navigation_supersedes_older() {
    let mock = sample_namespace();
    let gate = mock.gate(&p("a"));
    let stack = stack(&mock);

    let slow = tokio::spawn({
        let expansion = Arc::clone(&stack.expansion);
        async move { expansion.navigate(&p("a/b/c")).await }
    });
    mock.wait_for_list_calls(&p("a"), 1).await;

    let fast = stack.expansion.navigate(&p("docs/report.txt")).await.unwrap();
    assert!(matches!(fast, WalkOutcome::Completed { is_dir: false, .. }));
    gate.release();

    assert_eq!(
        slow.await.unwrap().unwrap(),
        WalkOutcome::Superseded { target: p("a/b/c") }
    );
    assert_eq!(mock.list_calls(&p("a/b")), 0);

    let state = stack.expansion.expansion();
    assert_eq!(state.target(), Some(&p("docs/report.txt")));
    assert!(state.is_expanded(&p("docs")));
    assert!(!state.is_expanded(&p("a")));
    // The load that was already running still lands in the cache.
    assert!(stack.cache.state(&p("a")).unwrap().is_loaded());
}

#[tokio::test]
async fn test_failed_walk_leaves_expansion_alone() {
    let mock = sample_namespace();
    let stack = stack(&mock);
    stack.expansion.navigate(&p("docs/report.txt")).await.unwrap();
    let before = stack.expansion.expansion();

    mock.fail_next_list(&p("a"), NamespaceError::Transport("reset".into()));
    let err = stack.expansion.navigate(&p("a/b/c")).await.unwrap_err();
    assert_eq!(err, NamespaceError::Transport("reset".into()));
    assert_eq!(stack.expansion.expansion().expanded(), before.expanded());
    assert!(matches!(
        stack.cache.state(&p("a")),
        Some(LoadState::Error(NamespaceError::Transport(_)))
    ));
    assert_eq!(stack.cache.state(&p("a/b")), None);

    stack.expansion.navigate(&p("a/b/c")).await.unwrap();
    assert!(stack.expansion.expansion().is_expanded(&p("a/b/c")));
}

#[tokio::test]
async fn test_refresh_all_reloads_expanded_directories() {
    let mock = sample_namespace();
    let stack = stack(&mock);
    stack.expansion.navigate(&p("a/b/c")).await.unwrap();

    stack.cache.invalidate(&Scope::All);
    assert!(stack.cache.loaded_paths().is_empty());

    mock.clear_calls();
    let report = stack.expansion.refresh_expanded().await;
    assert!(report.failed.is_empty());
    assert_eq!(mock.list_order(), vec![NsPath::root(), p("a"), p("a/b"), p("a/b/c")]);
    assert!(stack.cache.orphaned_loaded().is_empty());
}
