//! The patch facade used by host event listeners.
//!
//! [`PatchService`] composes the tag store, the clock, the decision rule and
//! the block restrictions into the four operations a host needs: put, remove,
//! move and decide. Location-level operations act unconditionally; the
//! `*_block` variants consult the material restrictions first.
//!
//! Every operation is `async` and suspends only inside the store. Hosts that
//! cannot await on their own thread use [`PatchService::dispatch`].

use std::sync::Arc;

use placebreak_store::{TagRepository, TagStore};
use placebreak_types::{ActionType, Block, Direction, DisplacementSet, Location, Tag};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, PatchConfig};
use crate::decision::{ExploitDecider, Verdict};
use crate::error::PatchError;
use crate::restriction::RestrictedBlocks;

struct Inner<R> {
    store: R,
    clock: Arc<dyn Clock>,
    decider: ExploitDecider,
    restrictions: RestrictedBlocks,
}

/// Shared handle to the patch. Cloning is cheap.
pub struct PatchService<R = TagStore> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for PatchService<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> core::fmt::Debug for PatchService<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PatchService")
            .field("clock", &self.inner.clock)
            .field("decider", &self.inner.decider)
            .field("restrictions", &self.inner.restrictions)
            .finish_non_exhaustive()
    }
}

impl PatchService<TagStore> {
    /// Build the service described by `config` on the system clock.
    ///
    /// The store is created but not connected.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration does not validate.
    pub fn from_config(config: &PatchConfig) -> Result<Self, ConfigError> {
        let store = TagStore::from_config(&config.store_config()?);
        Ok(Self::new(
            store,
            Arc::new(SystemClock),
            ExploitDecider::new(config.ephemeral_window()),
            config.restricted_blocks.clone(),
        ))
    }
}

impl<R: TagRepository> PatchService<R> {
    /// Assemble a service from its parts.
    pub fn new(
        store: R,
        clock: Arc<dyn Clock>,
        decider: ExploitDecider,
        restrictions: RestrictedBlocks,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                clock,
                decider,
                restrictions,
            }),
        }
    }

    /// Return the underlying store.
    pub fn store(&self) -> &R {
        &self.inner.store
    }

    /// Return the material restrictions.
    pub fn restrictions(&self) -> &RestrictedBlocks {
        &self.inner.restrictions
    }

    /// Open the store.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Store`] if the backend cannot be reached.
    pub async fn connect(&self) -> Result<(), PatchError> {
        self.inner.store.connect().await?;
        Ok(())
    }

    /// Close the store.
    pub async fn disconnect(&self) {
        self.inner.store.disconnect().await;
    }

    /// Tag `location`, replacing any existing tag, and return the new tag.
    pub async fn put_tag(&self, location: Location, ephemeral: bool) -> Result<Tag, PatchError> {
        let tag = Tag::new(location, ephemeral, self.inner.clock.now());
        self.inner.store.put(&tag).await?;
        Ok(tag)
    }

    /// Remove any tag at `location`.
    pub async fn remove_tag(&self, location: &Location) -> Result<(), PatchError> {
        self.inner.store.delete(location).await?;
        Ok(())
    }

    /// Return the tag at `location`, if any.
    pub async fn find_tag(&self, location: &Location) -> Result<Option<Tag>, PatchError> {
        Ok(self.inner.store.find_by_location(location).await?)
    }

    /// Relocate tags along `displacements` and return how many moved.
    pub async fn move_tags(&self, displacements: &DisplacementSet) -> Result<usize, PatchError> {
        if displacements.is_empty() {
            return Ok(0);
        }
        Ok(self.inner.store.move_tags(displacements).await?)
    }

    /// Decide `action` at `location` and report why.
    ///
    /// Ineligible actions are answered without touching the store.
    pub async fn verdict(
        &self,
        action: ActionType,
        location: &Location,
    ) -> Result<Verdict, PatchError> {
        let verdict = if action.is_patchable() {
            let tag = self.inner.store.find_by_location(location).await?;
            self.inner
                .decider
                .evaluate(action, tag.as_ref(), self.inner.clock.now())
        } else {
            Verdict::Ineligible
        };
        tracing::trace!(action = %action, location = %location, ?verdict, "Evaluated action");
        Ok(verdict)
    }

    /// Whether `action` at `location` is a patched exploit.
    pub async fn is_exploit(
        &self,
        action: ActionType,
        location: &Location,
    ) -> Result<bool, PatchError> {
        Ok(self.verdict(action, location).await?.is_exploit())
    }

    /// Tag `block` unless its material is restricted.
    ///
    /// Returns the stored tag, or `None` if the block was skipped.
    pub async fn put_block_tag(
        &self,
        block: &Block,
        ephemeral: bool,
    ) -> Result<Option<Tag>, PatchError> {
        if self.inner.restrictions.is_restricted(&block.material) {
            return Ok(None);
        }
        self.put_tag(block.location.clone(), ephemeral).await.map(Some)
    }

    /// Remove the tag at `block` unless its material is restricted.
    ///
    /// Returns whether the removal was attempted.
    pub async fn remove_block_tag(&self, block: &Block) -> Result<bool, PatchError> {
        if self.inner.restrictions.is_restricted(&block.material) {
            return Ok(false);
        }
        self.remove_tag(&block.location).await?;
        Ok(true)
    }

    /// Move the tags of `blocks` one step in `direction`, as a piston does.
    ///
    /// Restricted blocks are left out of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Displacement`] for a zero direction or a block at
    /// the edge of the coordinate range, before anything is written.
    pub async fn move_blocks(
        &self,
        blocks: &[Block],
        direction: Direction,
    ) -> Result<usize, PatchError> {
        let displacements = self.block_displacements(blocks, direction)?;
        self.move_tags(&displacements).await
    }

    /// The displacements a piston moving `blocks` in `direction` produces,
    /// leaving restricted blocks out.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Displacement`] for a zero direction or a block at
    /// the edge of the coordinate range.
    pub fn block_displacements(
        &self,
        blocks: &[Block],
        direction: Direction,
    ) -> Result<DisplacementSet, PatchError> {
        let locations = blocks
            .iter()
            .filter(|block| !self.inner.restrictions.is_restricted(&block.material))
            .map(|block| block.location.clone());
        Ok(DisplacementSet::from_blocks(locations, direction)?)
    }

    /// Whether `action` at `block` is a patched exploit. Restricted blocks
    /// never are.
    pub async fn is_block_exploit(
        &self,
        action: ActionType,
        block: &Block,
    ) -> Result<bool, PatchError> {
        if self.inner.restrictions.is_restricted(&block.material) {
            return Ok(false);
        }
        self.is_exploit(action, &block.location).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use placebreak_store::{MemoryTagStore, StoreError};

    use super::*;
    use crate::clock::ManualClock;
    use crate::restriction::RestrictionMode;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 12, 20, 0, 0).unwrap()
    }

    fn service_with(
        restrictions: RestrictedBlocks,
    ) -> (PatchService<MemoryTagStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let service = PatchService::new(
            MemoryTagStore::new(),
            Arc::clone(&clock) as Arc<dyn Clock>,
            ExploitDecider::default(),
            restrictions,
        );
        (service, clock)
    }

    fn service() -> (PatchService<MemoryTagStore>, Arc<ManualClock>) {
        service_with(RestrictedBlocks::default())
    }

    fn spot() -> Location {
        Location::new("world", 10, 64, 10)
    }

    #[tokio::test]
    async fn ephemeral_tag_follows_time_window() {
        let (service, clock) = service();
        service.put_tag(spot(), true).await.unwrap();

        clock.advance(TimeDelta::seconds(1)).unwrap();
        assert!(service.is_exploit(ActionType::Break, &spot()).await.unwrap());

        clock.advance(TimeDelta::seconds(3)).unwrap();
        assert!(!service.is_exploit(ActionType::Break, &spot()).await.unwrap());
    }

    #[tokio::test]
    async fn persistent_tag_is_always_exploit() {
        let (service, clock) = service();
        service.put_tag(spot(), false).await.unwrap();

        clock.advance(TimeDelta::seconds(1)).unwrap();
        assert!(service.is_exploit(ActionType::Place, &spot()).await.unwrap());
        clock.advance(TimeDelta::seconds(3)).unwrap();
        assert!(service.is_exploit(ActionType::Place, &spot()).await.unwrap());
    }

    #[tokio::test]
    async fn ineligible_actions_are_never_exploits() {
        let (service, _clock) = service();
        service.put_tag(spot(), false).await.unwrap();

        for action in [ActionType::Kill, ActionType::Fish, ActionType::Craft, ActionType::Strip] {
            assert!(!service.is_exploit(action, &spot()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn break_then_delete_scenario() {
        let (service, _clock) = service();
        service.put_tag(spot(), false).await.unwrap();
        assert!(service.is_exploit(ActionType::Break, &spot()).await.unwrap());

        service.remove_tag(&spot()).await.unwrap();
        assert!(!service.is_exploit(ActionType::Break, &spot()).await.unwrap());
    }

    #[tokio::test]
    async fn move_preserves_ephemerality_and_clears_source() {
        let (service, _clock) = service();
        let a = spot();
        let b = Location::new("world", 10, 64, 11);
        let original = service.put_tag(a.clone(), true).await.unwrap();

        let set = DisplacementSet::new([
            placebreak_types::DisplacementPair::new(a.clone(), b.clone()).unwrap(),
        ])
        .unwrap();
        assert_eq!(service.move_tags(&set).await.unwrap(), 1);

        assert_eq!(service.store().find_by_location(&a).await.unwrap(), None);
        let moved = service.store().find_by_location(&b).await.unwrap().unwrap();
        assert!(moved.is_ephemeral());
        assert_eq!(moved.created_at(), original.created_at());
    }

    #[tokio::test]
    async fn moved_tag_keeps_its_window() {
        let (service, clock) = service();
        let a = spot();
        service.put_tag(a.clone(), true).await.unwrap();

        clock.advance(TimeDelta::seconds(2)).unwrap();
        let block = Block::new(a, "STONE");
        service.move_blocks(&[block], Direction::UP).await.unwrap();
        let pushed = Location::new("world", 10, 65, 10);
        assert!(service.is_exploit(ActionType::Break, &pushed).await.unwrap());

        clock.advance(TimeDelta::seconds(2)).unwrap();
        assert!(!service.is_exploit(ActionType::Break, &pushed).await.unwrap());
    }

    #[tokio::test]
    async fn untagged_move_leaves_target_untagged() {
        let (service, _clock) = service();
        let block = Block::new(spot(), "STONE");
        assert_eq!(service.move_blocks(&[block], Direction::EAST).await.unwrap(), 0);
        let target = Location::new("world", 11, 64, 10);
        assert!(!service.is_exploit(ActionType::Break, &target).await.unwrap());
    }

    #[tokio::test]
    async fn zero_direction_is_rejected_before_writing() {
        let (service, _clock) = service();
        service.put_tag(spot(), false).await.unwrap();
        let block = Block::new(spot(), "STONE");

        let err = service
            .move_blocks(&[block], Direction::new(0, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, PatchError::Displacement(_)));
        assert!(service.is_exploit(ActionType::Break, &spot()).await.unwrap());
    }

    #[tokio::test]
    async fn restricted_blocks_are_skipped() {
        let restrictions = RestrictedBlocks::new(RestrictionMode::Blacklist, ["BEDROCK"]);
        let (service, _clock) = service_with(restrictions);
        let bedrock = Block::new(spot(), "BEDROCK");
        let stone = Block::new(Location::new("world", 0, 64, 0), "STONE");

        assert_eq!(service.put_block_tag(&bedrock, false).await.unwrap(), None);
        assert!(service.put_block_tag(&stone, false).await.unwrap().is_some());
        assert!(!service.is_exploit(ActionType::Break, &spot()).await.unwrap());
        assert!(service.is_block_exploit(ActionType::Break, &stone).await.unwrap());

        // A tag placed directly at a restricted block is still ignored by the
        // block-level check and survives a block-level removal.
        service.put_tag(spot(), false).await.unwrap();
        assert!(!service.is_block_exploit(ActionType::Break, &bedrock).await.unwrap());
        assert!(!service.remove_block_tag(&bedrock).await.unwrap());
        assert!(service.is_exploit(ActionType::Break, &spot()).await.unwrap());
    }

    #[tokio::test]
    async fn restricted_blocks_are_left_out_of_moves() {
        let restrictions = RestrictedBlocks::new(RestrictionMode::Whitelist, ["STONE"]);
        let (service, _clock) = service_with(restrictions);
        let stone = Block::new(Location::new("world", 0, 64, 0), "STONE");
        let dirt = Block::new(Location::new("world", 1, 64, 0), "DIRT");
        service.put_tag(stone.location.clone(), false).await.unwrap();
        service.put_tag(dirt.location.clone(), false).await.unwrap();

        let moved = service
            .move_blocks(&[stone, dirt], Direction::NORTH)
            .await
            .unwrap();

        assert_eq!(moved, 1);
        let north = Location::new("world", 0, 64, -1);
        let east = Location::new("world", 1, 64, 0);
        assert!(service.is_exploit(ActionType::Break, &north).await.unwrap());
        assert!(service.is_exploit(ActionType::Break, &east).await.unwrap());
    }

    /// A repository whose lookups always fail and that counts calls.
    #[derive(Debug, Default)]
    struct FailingStore {
        lookups: AtomicUsize,
    }

    impl TagRepository for FailingStore {
        async fn put(&self, _tag: &Tag) -> Result<(), StoreError> {
            Err(StoreError::NotInitialized { backend: "failing" })
        }

        async fn find_by_location(&self, _location: &Location) -> Result<Option<Tag>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::NotInitialized { backend: "failing" })
        }

        async fn delete(&self, _location: &Location) -> Result<(), StoreError> {
            Err(StoreError::NotInitialized { backend: "failing" })
        }

        async fn move_tags(&self, _displacements: &DisplacementSet) -> Result<usize, StoreError> {
            Err(StoreError::NotInitialized { backend: "failing" })
        }
    }

    fn failing_service() -> PatchService<FailingStore> {
        PatchService::new(
            FailingStore::default(),
            Arc::new(ManualClock::new(t0())),
            ExploitDecider::default(),
            RestrictedBlocks::default(),
        )
    }

    #[tokio::test]
    async fn store_failures_surface_as_errors() {
        let service = failing_service();
        let err = service.is_exploit(ActionType::Break, &spot()).await.unwrap_err();
        assert!(matches!(err, PatchError::Store(StoreError::NotInitialized { .. })));
        assert!(service.put_tag(spot(), true).await.is_err());
        assert!(service.remove_tag(&spot()).await.is_err());
    }

    #[tokio::test]
    async fn ineligible_action_skips_lookup() {
        let service = failing_service();
        assert!(!service.is_exploit(ActionType::Fish, &spot()).await.unwrap());
        assert_eq!(service.store().lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_move_skips_store() {
        let service = failing_service();
        assert_eq!(service.move_tags(&DisplacementSet::empty()).await.unwrap(), 0);
    }

    #[test]
    fn from_config_builds_memory_service() {
        let config: PatchConfig = serde_yml::from_str("data_source:\n  type: memory\n").unwrap();
        let service = PatchService::from_config(&config).unwrap();
        assert_eq!(service.store().kind(), placebreak_store::BackendKind::Memory);
    }
}
