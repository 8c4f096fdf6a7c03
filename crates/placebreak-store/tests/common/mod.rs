//! Black-box repository contract shared by the backend test suites.
//!
//! Each check uses its own randomly named world so suites can run against a
//! shared database without cleanup between tests.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    dead_code,
    missing_docs
)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use placebreak_store::TagRepository;
use placebreak_types::{Direction, DisplacementPair, DisplacementSet, Location, Tag, TagId};

/// A world name no other test uses.
pub fn fresh_world() -> String {
    format!("world-{}", TagId::new())
}

/// A fixed whole-second instant, exact in every backend's timestamp type.
pub fn instant(second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, second).unwrap()
}

pub async fn put_then_find<R: TagRepository>(store: &R) {
    let location = Location::new(fresh_world(), 10, 64, 10);
    let tag = Tag::new(location.clone(), true, instant(0));

    store.put(&tag).await.unwrap();

    assert_eq!(store.find_by_location(&location).await.unwrap(), Some(tag));
}

pub async fn put_replaces_existing<R: TagRepository>(store: &R) {
    let location = Location::new(fresh_world(), 1, 2, 3);
    store
        .put(&Tag::new(location.clone(), true, instant(0)))
        .await
        .unwrap();
    let replacement = Tag::new(location.clone(), false, instant(5));
    store.put(&replacement).await.unwrap();

    let found = store.find_by_location(&location).await.unwrap().unwrap();
    assert_eq!(found.id(), replacement.id());
    assert!(!found.is_ephemeral());
}

pub async fn find_absent_is_none<R: TagRepository>(store: &R) {
    let location = Location::new(fresh_world(), -5, 0, 7);
    assert_eq!(store.find_by_location(&location).await.unwrap(), None);
}

pub async fn delete_removes_only_target<R: TagRepository>(store: &R) {
    let world = fresh_world();
    let doomed = Location::new(world.as_str(), 0, 0, 0);
    let kept = Location::new(world.as_str(), 0, 0, 1);
    store.put(&Tag::new(doomed.clone(), false, instant(0))).await.unwrap();
    store.put(&Tag::new(kept.clone(), false, instant(0))).await.unwrap();

    store.delete(&doomed).await.unwrap();

    assert_eq!(store.find_by_location(&doomed).await.unwrap(), None);
    assert!(store.find_by_location(&kept).await.unwrap().is_some());
}

pub async fn delete_absent_is_noop<R: TagRepository>(store: &R) {
    let world = fresh_world();
    let tagged = Location::new(world.as_str(), 3, 3, 3);
    let tag = Tag::new(tagged.clone(), true, instant(0));
    store.put(&tag).await.unwrap();

    store.delete(&Location::new(world.as_str(), 4, 4, 4)).await.unwrap();

    assert_eq!(store.find_by_location(&tagged).await.unwrap(), Some(tag));
}

pub async fn move_carries_tag<R: TagRepository>(store: &R) {
    let world = fresh_world();
    let from = Location::new(world.as_str(), 0, 64, 0);
    let to = Location::new(world.as_str(), 0, 64, 1);
    let tag = Tag::new(from.clone(), true, instant(0));
    store.put(&tag).await.unwrap();

    let pair = DisplacementPair::new(from.clone(), to.clone()).unwrap();
    let set = DisplacementSet::new([pair]).unwrap();
    assert_eq!(store.move_tags(&set).await.unwrap(), 1);

    assert_eq!(store.find_by_location(&from).await.unwrap(), None);
    let moved = store.find_by_location(&to).await.unwrap().unwrap();
    assert!(moved.is_ephemeral());
    assert_eq!(moved.created_at(), tag.created_at());
}

pub async fn move_untagged_leaves_target_untagged<R: TagRepository>(store: &R) {
    let world = fresh_world();
    let from = Location::new(world.as_str(), 8, 8, 8);
    let to = Location::new(world.as_str(), 9, 8, 8);

    let pair = DisplacementPair::new(from.clone(), to.clone()).unwrap();
    let set = DisplacementSet::new([pair]).unwrap();
    assert_eq!(store.move_tags(&set).await.unwrap(), 0);

    assert_eq!(store.find_by_location(&from).await.unwrap(), None);
    assert_eq!(store.find_by_location(&to).await.unwrap(), None);
}

pub async fn piston_push_shifts_row<R: TagRepository>(store: &R) {
    let world = fresh_world();
    let row: Vec<Location> = (0..3).map(|x| Location::new(world.as_str(), x, 70, 0)).collect();
    for (i, location) in row.iter().enumerate() {
        let ephemeral = i % 2 == 0;
        store
            .put(&Tag::new(location.clone(), ephemeral, instant(0)))
            .await
            .unwrap();
    }

    let set = DisplacementSet::from_blocks(row.clone(), Direction::EAST).unwrap();
    assert_eq!(store.move_tags(&set).await.unwrap(), 3);

    assert_eq!(store.find_by_location(&row[0]).await.unwrap(), None);
    let flags: Vec<bool> = {
        let mut flags = Vec::new();
        for x in 1..4 {
            let location = Location::new(world.as_str(), x, 70, 0);
            flags.push(store.find_by_location(&location).await.unwrap().unwrap().is_ephemeral());
        }
        flags
    };
    assert_eq!(flags, vec![true, false, true]);
}

/// Put 16 tags at `location` from concurrent tasks.
pub async fn put_concurrently<R: TagRepository + 'static>(store: &Arc<R>, location: &Location) {
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = Arc::clone(store);
            let location = location.clone();
            tokio::spawn(async move {
                store
                    .put(&Tag::new(location, i % 2 == 0, instant(i)))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
}

/// In each world, concurrently and `rounds` times: tag `(0, 0, 0)` and push
/// it up one block. Every call must succeed.
pub async fn put_and_move_concurrently<R: TagRepository + 'static>(
    store: &Arc<R>,
    worlds: &[String],
    rounds: u32,
) {
    let handles: Vec<_> = worlds
        .iter()
        .map(|world| {
            let store = Arc::clone(store);
            let base = Location::new(world.as_str(), 0, 0, 0);
            tokio::spawn(async move {
                for round in 0..rounds {
                    store
                        .put(&Tag::new(base.clone(), false, instant(round % 60)))
                        .await
                        .unwrap();
                    let set = DisplacementSet::from_blocks([base.clone()], Direction::UP).unwrap();
                    assert_eq!(store.move_tags(&set).await.unwrap(), 1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
}

pub async fn concurrent_puts_keep_one_tag<R: TagRepository + 'static>(store: Arc<R>) {
    let location = Location::new(fresh_world(), 0, 0, 0);

    put_concurrently(&store, &location).await;

    assert!(store.find_by_location(&location).await.unwrap().is_some());
    store.delete(&location).await.unwrap();
    assert_eq!(store.find_by_location(&location).await.unwrap(), None);
}

pub async fn concurrent_puts_and_moves_succeed<R: TagRepository + 'static>(store: Arc<R>) {
    let worlds: Vec<String> = (0..4).map(|_| fresh_world()).collect();

    put_and_move_concurrently(&store, &worlds, 10).await;

    for world in &worlds {
        let base = Location::new(world.as_str(), 0, 0, 0);
        let above = Location::new(world.as_str(), 0, 1, 0);
        assert_eq!(store.find_by_location(&base).await.unwrap(), None);
        assert!(store.find_by_location(&above).await.unwrap().is_some());
    }
}

/// Run every check above against `store`.
pub async fn run_contract<R: TagRepository + 'static>(store: Arc<R>) {
    put_then_find(store.as_ref()).await;
    put_replaces_existing(store.as_ref()).await;
    find_absent_is_none(store.as_ref()).await;
    delete_removes_only_target(store.as_ref()).await;
    delete_absent_is_noop(store.as_ref()).await;
    move_carries_tag(store.as_ref()).await;
    move_untagged_leaves_target_untagged(store.as_ref()).await;
    piston_push_shifts_row(store.as_ref()).await;
    concurrent_puts_keep_one_tag(Arc::clone(&store)).await;
    concurrent_puts_and_moves_succeed(store).await;
}
