//! Relationship saga coordinator.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use common::{MemberId, PairKey};
use domain::{
    AcceptFriend, ApplyFriend, BlockMember, DeleteFriend, DomainError, FriendView, MarkFriend,
    MemberIdRange, Operation, PendingApplication, RejectFriend, RelationCommand, RelationView,
    Relationship, ResultCode, UnblockMember, Validator,
};
use relation_store::{KeyedCache, Persistor};
use serde::Serialize;

use crate::dispatcher::NotificationDispatcher;
use crate::error::{Result, SagaError};
use crate::orchestrator::{CallChain, PeerCall};
use crate::scheduler::AffinityScheduler;
use crate::services::{
    ChatService, Notice, PeerRequest, ProfileCache, ProfileSnapshot, PushChannel, RemoteCaller,
};
use crate::store::RelationStore;

/// Default text of the first chat message between new friends.
pub const DEFAULT_FIRST_MESSAGE: &str = "We are friends now. Let's chat!";

/// Coordinator settings.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Member ids accepted as request targets.
    pub member_ids: MemberIdRange,
    /// Text sent from the accepting member once a friendship is established.
    pub first_message: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            member_ids: MemberIdRange::default(),
            first_message: DEFAULT_FIRST_MESSAGE.to_string(),
        }
    }
}

/// External services the coordinator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub remote: Arc<dyn RemoteCaller>,
    pub profiles: Arc<dyn ProfileCache>,
    pub push: Arc<dyn PushChannel>,
    pub chat: Arc<dyn ChatService>,
}

/// Result of a successful block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockOutcome {
    pub target_id: MemberId,
    /// The blocked member's profile, if the profile cache knows it.
    pub profile: Option<ProfileSnapshot>,
}

/// Result of a successful mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkOutcome {
    pub friend_id: MemberId,
    pub tag: String,
}

/// Runs the relationship operations.
///
/// Each operation validates against the stored records, confirms with the
/// peer services, then mutates the records on the pair's affinity lane and
/// finally notifies. Validation and peer calls happen before the lane, so
/// two racing requests for one pair can both pass validation; their store
/// mutations are still applied one after the other.
pub struct RelationCoordinator<P, C> {
    store: RelationStore<P, C>,
    scheduler: AffinityScheduler,
    remote: Arc<dyn RemoteCaller>,
    profiles: Arc<dyn ProfileCache>,
    dispatcher: NotificationDispatcher,
    chat: Arc<dyn ChatService>,
    validator: Validator,
    first_message: String,
}

impl<P, C> RelationCoordinator<P, C>
where
    P: Persistor + Clone + 'static,
    C: KeyedCache + Clone + 'static,
{
    /// Creates a new coordinator.
    pub fn new(
        store: RelationStore<P, C>,
        scheduler: AffinityScheduler,
        collaborators: Collaborators,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            scheduler,
            remote: collaborators.remote,
            profiles: collaborators.profiles,
            dispatcher: NotificationDispatcher::new(collaborators.push),
            chat: collaborators.chat,
            validator: Validator::new(config.member_ids),
            first_message: config.first_message,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &RelationStore<P, C> {
        &self.store
    }

    /// Returns the scheduler serializing store mutations.
    pub fn scheduler(&self) -> &AffinityScheduler {
        &self.scheduler
    }

    /// `user_id` applies to become a friend of `friend_id`.
    ///
    /// Creates or refreshes the pending application and notifies the target.
    #[tracing::instrument(skip(self, cmd), fields(operation = "apply", user_id = %cmd.user_id, friend_id = %cmd.friend_id))]
    pub async fn apply(&self, caller: MemberId, cmd: ApplyFriend) -> Result<()> {
        self.observed(Operation::Apply, self.run_apply(caller, cmd))
            .await
    }

    /// `user_id` accepts the pending application from `friend_id`.
    ///
    /// Both members' owning services must confirm, requester first. Only then
    /// is the pair connected and the application removed.
    #[tracing::instrument(skip(self, cmd), fields(operation = "accept", user_id = %cmd.user_id, friend_id = %cmd.friend_id))]
    pub async fn accept(&self, caller: MemberId, cmd: AcceptFriend) -> Result<()> {
        self.observed(Operation::Accept, self.run_accept(caller, cmd))
            .await
    }

    /// `user_id` rejects the pending application from `friend_id`.
    ///
    /// Returns the rejected member.
    #[tracing::instrument(skip(self, cmd), fields(operation = "reject", user_id = %cmd.user_id, friend_id = %cmd.friend_id))]
    pub async fn reject(&self, caller: MemberId, cmd: RejectFriend) -> Result<MemberId> {
        self.observed(Operation::Reject, self.run_reject(caller, cmd))
            .await
    }

    /// `user_id` ends the friendship with `friend_id`.
    ///
    /// The relationship record is kept with `connected` cleared. Returns the
    /// former friend.
    #[tracing::instrument(skip(self, cmd), fields(operation = "delete", user_id = %cmd.user_id, friend_id = %cmd.friend_id))]
    pub async fn delete(&self, caller: MemberId, cmd: DeleteFriend) -> Result<MemberId> {
        self.observed(Operation::Delete, self.run_delete(caller, cmd))
            .await
    }

    /// `user_id` blocks `target_id`, from any relationship state.
    #[tracing::instrument(skip(self, cmd), fields(operation = "block", user_id = %cmd.user_id, target_id = %cmd.target_id))]
    pub async fn block(&self, caller: MemberId, cmd: BlockMember) -> Result<BlockOutcome> {
        self.observed(Operation::Block, self.run_block(caller, cmd))
            .await
    }

    /// `user_id` lifts its block on `target_id`. Returns the target.
    #[tracing::instrument(skip(self, cmd), fields(operation = "unblock", user_id = %cmd.user_id, target_id = %cmd.target_id))]
    pub async fn unblock(&self, caller: MemberId, cmd: UnblockMember) -> Result<MemberId> {
        self.observed(Operation::Unblock, self.run_unblock(caller, cmd))
            .await
    }

    /// `user_id` labels its friend `friend_id` with a tag.
    #[tracing::instrument(skip(self, cmd), fields(operation = "mark", user_id = %cmd.user_id, friend_id = %cmd.friend_id))]
    pub async fn mark(&self, caller: MemberId, cmd: MarkFriend) -> Result<MarkOutcome> {
        self.observed(Operation::Mark, self.run_mark(caller, cmd))
            .await
    }

    /// Lists the friends of `member` with the tag `member` gave each.
    pub async fn friends(&self, member: MemberId) -> Result<Vec<FriendView>> {
        let relationships = self
            .store
            .relationships()
            .list_for_member(member, None)
            .await?;
        Ok(relationships
            .iter()
            .filter_map(|rel| FriendView::of(rel, member))
            .collect())
    }

    /// Lists the applications waiting for `member` to answer.
    pub async fn applications(&self, member: MemberId) -> Result<Vec<PendingApplication>> {
        let applications = self
            .store
            .applications()
            .list_for_member(member, None)
            .await?;
        Ok(applications
            .into_iter()
            .filter(|app| app.target() == member)
            .collect())
    }

    /// Returns the relationship between `member` and `other` as `member` sees it.
    pub async fn relation(&self, member: MemberId, other: MemberId) -> Result<RelationView> {
        let relationship = self
            .store
            .relationships()
            .load(PairKey::new(member, other))
            .await?;
        Ok(relationship
            .and_then(|rel| RelationView::of(&rel, member))
            .unwrap_or_else(|| RelationView::empty(member, other)))
    }

    async fn run_apply(&self, caller: MemberId, cmd: ApplyFriend) -> Result<()> {
        let key = cmd.pair_key();
        let (relationship, application) = self.store.load_pair(key).await?;
        self.validator
            .validate_apply(caller, &cmd, relationship.as_ref(), application.as_ref())?;

        let (requester, target) = (cmd.user_id, cmd.friend_id);
        tracing::info!(step = "confirm_eligibility", "saga step started");
        let eligibility = PeerCall::new(PeerRequest::ApplyEligibility { requester, target }, target);
        let members = [requester, target];
        let (_, mut profiles) = futures_util::try_join!(
            eligibility.send(self.remote.as_ref()),
            self.profiles.get_profiles(&members)
        )?;

        if !profiles.contains_key(&target) {
            return Err(DomainError::NotFound(ResultCode::UserNotExist).into());
        }
        let requester_profile = profiles.remove(&requester);

        tracing::info!(step = "record_application", "saga step started");
        let store = self.store.clone();
        self.on_lane(key, async move {
            match store.applications().load(key).await? {
                Some(mut app) => {
                    app.refresh(requester, target);
                    store.applications().update(&app).await?;
                }
                None => {
                    store
                        .applications()
                        .insert(&PendingApplication::new(requester, target))
                        .await?;
                }
            }
            Ok::<_, SagaError>(())
        })
        .await?;

        let notice = Notice::NewApplication {
            requester,
            profile: requester_profile,
        };
        self.dispatcher.notify(key, target, notice).await;
        Ok(())
    }

    async fn run_accept(&self, caller: MemberId, cmd: AcceptFriend) -> Result<()> {
        let key = cmd.pair_key();
        let (relationship, application) = self.store.load_pair(key).await?;
        let application = self.validator.validate_accept(
            caller,
            &cmd,
            relationship.as_ref(),
            application.as_ref(),
        )?;
        let (requester, target) = (application.requester(), application.target());

        tracing::info!(step = "confirm_friendship", "saga step started");
        CallChain::new(self.remote.as_ref())
            .then(PeerCall::new(
                PeerRequest::AcceptFriend {
                    member: requester,
                    friend: target,
                },
                requester,
            ))
            .then(
                PeerCall::new(
                    PeerRequest::AcceptFriend {
                        member: target,
                        friend: requester,
                    },
                    target,
                )
                .with_generic_failure(),
            )
            .run()
            .await?;

        tracing::info!(step = "connect", "saga step started");
        let store = self.store.clone();
        self.on_lane(key, async move {
            // A reject or a reverse apply may have committed since validation
            store
                .applications()
                .load(key)
                .await?
                .filter(|app| app.requester() == requester)
                .ok_or(DomainError::NotFound(ResultCode::ParameterErrorOne))?;

            let mut relationship = store
                .relationships()
                .load(key)
                .await?
                .unwrap_or_else(|| Relationship::new(requester, target));
            relationship.connect();
            store.relationships().upsert(&relationship).await?;
            store.applications().delete(key).await?;
            Ok::<_, SagaError>(())
        })
        .await?;

        self.announce_friendship(key, requester, target).await;
        Ok(())
    }

    async fn run_reject(&self, caller: MemberId, cmd: RejectFriend) -> Result<MemberId> {
        let key = cmd.pair_key();
        let application = self.store.applications().load(key).await?;
        self.validator
            .validate_reject(caller, &cmd, application.as_ref())?;

        let store = self.store.clone();
        self.on_lane(key, async move {
            store.applications().delete(key).await?;
            Ok::<_, SagaError>(())
        })
        .await?;

        Ok(cmd.friend_id)
    }

    async fn run_delete(&self, caller: MemberId, cmd: DeleteFriend) -> Result<MemberId> {
        let key = cmd.pair_key();
        let relationship = self.store.relationships().load(key).await?;
        self.validator
            .validate_delete(caller, &cmd, relationship.as_ref())?;

        tracing::info!(step = "confirm_deletion", "saga step started");
        PeerCall::new(
            PeerRequest::DeleteFriend {
                member: cmd.user_id,
                friend: cmd.friend_id,
            },
            cmd.user_id,
        )
        .send(self.remote.as_ref())
        .await?;

        let store = self.store.clone();
        self.on_lane(key, async move {
            let mut relationship = Self::existing_relationship(&store, key).await?;
            relationship.disconnect();
            store.relationships().update(&relationship).await?;
            Ok::<_, SagaError>(())
        })
        .await?;

        Ok(cmd.friend_id)
    }

    async fn run_block(&self, caller: MemberId, cmd: BlockMember) -> Result<BlockOutcome> {
        let key = cmd.pair_key();
        self.validator.validate_block(caller, &cmd)?;

        let (user, target) = (cmd.user_id, cmd.target_id);
        tracing::info!(step = "confirm_block", "saga step started");
        PeerCall::new(
            PeerRequest::BlockMember {
                member: user,
                target,
            },
            user,
        )
        .send(self.remote.as_ref())
        .await?;

        let store = self.store.clone();
        self.on_lane(key, async move {
            let mut relationship = store
                .relationships()
                .load(key)
                .await?
                .unwrap_or_else(|| Relationship::new(user, target));
            relationship.block(user)?;
            store.relationships().upsert(&relationship).await?;
            Ok::<_, SagaError>(())
        })
        .await?;

        let profile = self.lookup_profiles(&[target]).await.remove(&target);
        Ok(BlockOutcome {
            target_id: target,
            profile,
        })
    }

    async fn run_unblock(&self, caller: MemberId, cmd: UnblockMember) -> Result<MemberId> {
        let key = cmd.pair_key();
        let relationship = self.store.relationships().load(key).await?;
        self.validator
            .validate_unblock(caller, &cmd, relationship.as_ref())?;

        let user = cmd.user_id;
        tracing::info!(step = "confirm_unblock", "saga step started");
        PeerCall::new(
            PeerRequest::UnblockMember {
                member: user,
                target: cmd.target_id,
            },
            user,
        )
        .send(self.remote.as_ref())
        .await?;

        let store = self.store.clone();
        self.on_lane(key, async move {
            let mut relationship = Self::existing_relationship(&store, key).await?;
            relationship.unblock(user)?;
            store.relationships().update(&relationship).await?;
            Ok::<_, SagaError>(())
        })
        .await?;

        Ok(cmd.target_id)
    }

    async fn run_mark(&self, caller: MemberId, cmd: MarkFriend) -> Result<MarkOutcome> {
        let key = cmd.pair_key();
        let relationship = self.store.relationships().load(key).await?;
        self.validator
            .validate_mark(caller, &cmd, relationship.as_ref())?;

        let store = self.store.clone();
        let user = cmd.user_id;
        let tag = cmd.tag.clone();
        self.on_lane(key, async move {
            let mut relationship = Self::existing_relationship(&store, key).await?;
            if !relationship.is_connected() {
                return Err(DomainError::StateConflict(ResultCode::FriendNotAdded).into());
            }
            relationship.mark_tag(user, tag)?;
            store.relationships().update(&relationship).await?;
            Ok::<_, SagaError>(())
        })
        .await?;

        Ok(MarkOutcome {
            friend_id: cmd.friend_id,
            tag: cmd.tag,
        })
    }

    /// Runs a store mutation on the lane of `key`.
    async fn on_lane<F, T>(&self, key: PairKey, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.scheduler.run_serialized(key, task).await?
    }

    /// Re-reads the relationship on the lane; it may have changed since
    /// validation.
    async fn existing_relationship(
        store: &RelationStore<P, C>,
        key: PairKey,
    ) -> Result<Relationship> {
        store
            .relationships()
            .load(key)
            .await?
            .ok_or_else(|| DomainError::NotFound(ResultCode::ParameterErrorOne).into())
    }

    /// Best-effort fan-out once a friendship is committed.
    async fn announce_friendship(&self, key: PairKey, requester: MemberId, target: MemberId) {
        let mut profiles = self.lookup_profiles(&[requester, target]).await;
        let notices = vec![
            (
                requester,
                Notice::NewFriend {
                    friend: target,
                    profile: profiles.remove(&target),
                },
            ),
            (
                target,
                Notice::NewFriend {
                    friend: requester,
                    profile: profiles.remove(&requester),
                },
            ),
        ];
        self.dispatcher.dispatch(key, notices).await;

        if let Err(err) = self
            .chat
            .send_first_message(target, requester, &self.first_message)
            .await
        {
            metrics::counter!("relation_notifications_dropped").increment(1);
            tracing::warn!(error = %err, "first chat message not sent");
        }
    }

    /// Profile lookup for data that only decorates a committed result.
    async fn lookup_profiles(&self, members: &[MemberId]) -> HashMap<MemberId, ProfileSnapshot> {
        match self.profiles.get_profiles(members).await {
            Ok(profiles) => profiles,
            Err(err) => {
                tracing::warn!(error = %err, "profile lookup failed");
                HashMap::new()
            }
        }
    }

    async fn observed<T>(
        &self,
        operation: Operation,
        run: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let name = operation.as_str();
        metrics::counter!("relation_operations_total", "operation" => name).increment(1);
        let start = std::time::Instant::now();

        let result = run.await;

        let duration = start.elapsed().as_secs_f64();
        metrics::histogram!("relation_operation_duration_seconds", "operation" => name)
            .record(duration);

        match &result {
            Ok(_) => tracing::info!(duration, "operation completed"),
            Err(err) => {
                let code = err.code();
                metrics::counter!(
                    "relation_operations_failed",
                    "operation" => name,
                    "code" => code.to_string()
                )
                .increment(1);
                match err {
                    SagaError::Domain(_) => tracing::debug!(code, error = %err, "request rejected"),
                    _ => tracing::warn!(code, error = %err, "operation failed"),
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        InMemoryChatService, InMemoryPeerService, InMemoryProfileCache, InMemoryPushChannel,
        PeerReply,
    };
    use relation_store::{InMemoryCache, InMemoryPersistor};

    struct Harness {
        coordinator: RelationCoordinator<InMemoryPersistor, InMemoryCache>,
        persistor: InMemoryPersistor,
        peer: InMemoryPeerService,
        profiles: InMemoryProfileCache,
        push: InMemoryPushChannel,
        chat: InMemoryChatService,
    }

    fn m(id: i64) -> MemberId {
        MemberId::new(id)
    }

    fn setup() -> Harness {
        let persistor = InMemoryPersistor::new();
        let peer = InMemoryPeerService::new();
        let profiles = InMemoryProfileCache::new();
        let push = InMemoryPushChannel::new();
        let chat = InMemoryChatService::new();

        for id in [10, 20, 30] {
            profiles.insert(ProfileSnapshot::new(m(id), format!("user{id}")));
        }

        let coordinator = RelationCoordinator::new(
            RelationStore::new(persistor.clone(), InMemoryCache::new()),
            AffinityScheduler::new(4),
            Collaborators {
                remote: Arc::new(peer.clone()),
                profiles: Arc::new(profiles.clone()),
                push: Arc::new(push.clone()),
                chat: Arc::new(chat.clone()),
            },
            CoordinatorConfig::default(),
        );

        Harness {
            coordinator,
            persistor,
            peer,
            profiles,
            push,
            chat,
        }
    }

    async fn befriend(h: &Harness, a: i64, b: i64) {
        h.coordinator
            .apply(m(a), ApplyFriend::new(m(a), m(b)))
            .await
            .unwrap();
        h.coordinator
            .accept(m(b), AcceptFriend::new(m(b), m(a)))
            .await
            .unwrap();
    }

    async fn stored_relationship(h: &Harness, a: i64, b: i64) -> Option<Relationship> {
        h.coordinator
            .store()
            .relationships()
            .load(PairKey::new(m(a), m(b)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_apply_records_application_and_notifies_target() {
        let h = setup();

        h.coordinator
            .apply(m(10), ApplyFriend::new(m(10), m(20)))
            .await
            .unwrap();

        let pending = h.coordinator.applications(m(20)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].requester(), m(10));
        assert_eq!(pending[0].status().as_i32(), 0);

        let notices = h.push.notices_for(m(20));
        assert_eq!(notices.len(), 1);
        match &notices[0] {
            Notice::NewApplication { requester, profile } => {
                assert_eq!(*requester, m(10));
                assert_eq!(profile.as_ref().unwrap().nickname, "user10");
            }
            other => panic!("unexpected notice {other:?}"),
        }

        let calls = h.peer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].routing, m(20));
    }

    #[tokio::test]
    async fn test_apply_to_unknown_member() {
        let h = setup();

        let err = h
            .coordinator
            .apply(m(10), ApplyFriend::new(m(10), m(99)))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ResultCode::UserNotExist.as_i32());
        assert_eq!(h.persistor.record_count().await, 0);
        assert_eq!(h.push.delivery_count(), 0);
    }

    #[tokio::test]
    async fn test_apply_eligibility_refused() {
        let h = setup();
        h.peer.set_fail_on("apply_eligibility", 302);

        let err = h
            .coordinator
            .apply(m(10), ApplyFriend::new(m(10), m(20)))
            .await
            .unwrap_err();

        assert_eq!(err.code(), 302);
        assert!(h.coordinator.applications(m(20)).await.unwrap().is_empty());
        assert_eq!(h.push.delivery_count(), 0);
    }

    #[tokio::test]
    async fn test_reverse_apply_flips_direction() {
        let h = setup();
        h.coordinator
            .apply(m(10), ApplyFriend::new(m(10), m(20)))
            .await
            .unwrap();
        h.coordinator
            .apply(m(20), ApplyFriend::new(m(20), m(10)))
            .await
            .unwrap();

        assert!(h.coordinator.applications(m(20)).await.unwrap().is_empty());
        let pending = h.coordinator.applications(m(10)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].requester(), m(20));
        assert_eq!(h.persistor.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_accept_connects_and_fans_out() {
        let h = setup();
        befriend(&h, 10, 20).await;

        let rel = stored_relationship(&h, 10, 20).await.unwrap();
        assert!(rel.is_connected());
        assert!(h.coordinator.applications(m(20)).await.unwrap().is_empty());

        let accept_routes: Vec<_> = h
            .peer
            .calls()
            .into_iter()
            .filter(|c| c.request.name() == "accept_friend")
            .map(|c| c.routing)
            .collect();
        assert_eq!(accept_routes, vec![m(10), m(20)]);

        assert_eq!(h.push.notices_for(m(10)).len(), 1);
        // application notice plus friend notice
        assert_eq!(h.push.notices_for(m(20)).len(), 2);

        let messages = h.chat.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, m(20));
        assert_eq!(messages[0].to, m(10));
        assert_eq!(messages[0].text, DEFAULT_FIRST_MESSAGE);
    }

    #[tokio::test]
    async fn test_accept_first_confirmation_failure_keeps_peer_code() {
        let h = setup();
        h.coordinator
            .apply(m(10), ApplyFriend::new(m(10), m(20)))
            .await
            .unwrap();
        h.peer.set_fail_on_member("accept_friend", m(10), 777);

        let err = h
            .coordinator
            .accept(m(20), AcceptFriend::new(m(20), m(10)))
            .await
            .unwrap_err();

        assert_eq!(err.code(), 777);
        assert_eq!(h.peer.call_count("accept_friend"), 1);
        assert!(stored_relationship(&h, 10, 20).await.is_none());
    }

    #[tokio::test]
    async fn test_fan_out_failures_do_not_fail_accept() {
        let h = setup();
        h.coordinator
            .apply(m(10), ApplyFriend::new(m(10), m(20)))
            .await
            .unwrap();
        h.push.set_fail_on_push(true);
        h.chat.set_fail_on_send(true);
        h.profiles.set_unavailable(true);

        h.coordinator
            .accept(m(20), AcceptFriend::new(m(20), m(10)))
            .await
            .unwrap();

        assert!(stored_relationship(&h, 10, 20).await.unwrap().is_connected());
    }

    #[tokio::test]
    async fn test_reject_removes_application() {
        let h = setup();
        h.coordinator
            .apply(m(10), ApplyFriend::new(m(10), m(20)))
            .await
            .unwrap();

        let rejected = h
            .coordinator
            .reject(m(20), RejectFriend::new(m(20), m(10)))
            .await
            .unwrap();

        assert_eq!(rejected, m(10));
        assert!(h.coordinator.applications(m(20)).await.unwrap().is_empty());
        assert!(stored_relationship(&h, 10, 20).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_keeps_record_and_tags() {
        let h = setup();
        befriend(&h, 10, 20).await;
        h.coordinator
            .mark(m(10), MarkFriend::new(m(10), m(20), "climbing"))
            .await
            .unwrap();

        let deleted = h
            .coordinator
            .delete(m(10), DeleteFriend::new(m(10), m(20)))
            .await
            .unwrap();
        assert_eq!(deleted, m(20));

        let rel = stored_relationship(&h, 10, 20).await.unwrap();
        assert!(!rel.is_connected());
        assert_eq!(rel.tag_of(m(10)), Some("climbing"));
        assert!(h.coordinator.friends(m(10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_peer_failure_leaves_connection() {
        let h = setup();
        befriend(&h, 10, 20).await;
        h.peer.set_fail_on("delete_friend", 1);

        let err = h
            .coordinator
            .delete(m(10), DeleteFriend::new(m(10), m(20)))
            .await
            .unwrap_err();

        assert!(matches!(err, SagaError::RemoteFailure { .. }));
        assert!(stored_relationship(&h, 10, 20).await.unwrap().is_connected());
    }

    #[tokio::test]
    async fn test_block_returns_profile() {
        let h = setup();

        let outcome = h
            .coordinator
            .block(m(10), BlockMember::new(m(10), m(20)))
            .await
            .unwrap();

        assert_eq!(outcome.target_id, m(20));
        assert_eq!(outcome.profile.unwrap().nickname, "user20");
        let rel = stored_relationship(&h, 10, 20).await.unwrap();
        assert!(rel.is_blocked_by(m(10)));
        assert!(!rel.is_connected());
    }

    #[tokio::test]
    async fn test_unblock_clears_only_own_flag() {
        let h = setup();
        h.coordinator
            .block(m(10), BlockMember::new(m(10), m(20)))
            .await
            .unwrap();
        h.coordinator
            .block(m(20), BlockMember::new(m(20), m(10)))
            .await
            .unwrap();

        let target = h
            .coordinator
            .unblock(m(10), UnblockMember::new(m(10), m(20)))
            .await
            .unwrap();
        assert_eq!(target, m(20));

        let view = h.coordinator.relation(m(10), m(20)).await.unwrap();
        assert!(!view.blocked_by_me);
        assert!(view.blocked_by_other);
    }

    #[tokio::test]
    async fn test_unblock_without_record() {
        let h = setup();
        let err = h
            .coordinator
            .unblock(m(10), UnblockMember::new(m(10), m(20)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ResultCode::ParameterErrorOne.as_i32());
        assert!(h.peer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mark_and_friends_listing() {
        let h = setup();
        befriend(&h, 10, 20).await;
        befriend(&h, 30, 10).await;

        let outcome = h
            .coordinator
            .mark(m(10), MarkFriend::new(m(10), m(20), "colleague"))
            .await
            .unwrap();
        assert_eq!(outcome.tag, "colleague");

        let mut friends = h.coordinator.friends(m(10)).await.unwrap();
        friends.sort_by_key(|f| f.friend_id);
        assert_eq!(friends.len(), 2);
        assert_eq!(friends[0].friend_id, m(20));
        assert_eq!(friends[0].tag.as_deref(), Some("colleague"));
        assert_eq!(friends[1].tag, None);
    }

    #[tokio::test]
    async fn test_mark_requires_friendship() {
        let h = setup();
        let err = h
            .coordinator
            .mark(m(10), MarkFriend::new(m(10), m(20), "x"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ResultCode::FriendNotAdded.as_i32());
    }

    #[tokio::test]
    async fn test_store_failure_reports_fail() {
        let h = setup();
        h.persistor.set_fail_writes(true);

        let err = h
            .coordinator
            .block(m(10), BlockMember::new(m(10), m(20)))
            .await
            .unwrap_err();

        assert!(matches!(err, SagaError::Store(_)));
        assert_eq!(err.code(), ResultCode::Fail.as_i32());
    }

    #[tokio::test]
    async fn test_relation_view_for_strangers() {
        let h = setup();
        let view = h.coordinator.relation(m(10), m(20)).await.unwrap();
        assert_eq!(view, RelationView::empty(m(10), m(20)));
    }

    /// Answers every call, rejecting the pending application while the
    /// target's confirmation is in flight.
    struct RejectingPeer {
        store: RelationStore<InMemoryPersistor, InMemoryCache>,
    }

    #[async_trait::async_trait]
    impl RemoteCaller for RejectingPeer {
        async fn ask(&self, request: PeerRequest, routing: MemberId) -> Result<PeerReply> {
            if let PeerRequest::AcceptFriend { member, friend } = request {
                if member == routing && member == m(20) {
                    self.store
                        .applications()
                        .delete(PairKey::new(member, friend))
                        .await?;
                }
            }
            Ok(PeerReply::ok())
        }
    }

    #[tokio::test]
    async fn test_accept_after_concurrent_reject_does_not_connect() {
        let persistor = InMemoryPersistor::new();
        let store = RelationStore::new(persistor, InMemoryCache::new());
        let profiles = InMemoryProfileCache::generating();
        let push = InMemoryPushChannel::new();
        let chat = InMemoryChatService::new();
        let coordinator = RelationCoordinator::new(
            store.clone(),
            AffinityScheduler::new(2),
            Collaborators {
                remote: Arc::new(RejectingPeer {
                    store: store.clone(),
                }),
                profiles: Arc::new(profiles),
                push: Arc::new(push.clone()),
                chat: Arc::new(chat.clone()),
            },
            CoordinatorConfig::default(),
        );
        coordinator
            .apply(m(10), ApplyFriend::new(m(10), m(20)))
            .await
            .unwrap();

        let err = coordinator
            .accept(m(20), AcceptFriend::new(m(20), m(10)))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ResultCode::ParameterErrorOne.as_i32());
        let key = PairKey::new(m(10), m(20));
        assert!(store.relationships().load(key).await.unwrap().is_none());
        assert!(store.applications().load(key).await.unwrap().is_none());
        assert!(chat.messages().is_empty());
        assert!(
            push.deliveries()
                .iter()
                .all(|d| !matches!(d.notice, Notice::NewFriend { .. }))
        );
    }
}
