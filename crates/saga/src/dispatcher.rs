//! Notification fan-out.

use std::sync::Arc;

use common::{MemberId, PairKey};

use crate::services::{Notice, PushChannel};

/// Delivers notices through the push channel, at most once.
///
/// Delivery errors are logged and counted, never returned: a notice is sent
/// only after the store mutation it reports has committed, so the operation
/// has already succeeded.
#[derive(Clone)]
pub struct NotificationDispatcher {
    channel: Arc<dyn PushChannel>,
}

impl NotificationDispatcher {
    pub fn new(channel: Arc<dyn PushChannel>) -> Self {
        Self { channel }
    }

    /// Pushes one notice to a single recipient. Returns true if delivered.
    pub async fn notify(&self, routing: PairKey, recipient: MemberId, notice: Notice) -> bool {
        let name = notice.name();
        match self.channel.push(routing, recipient, notice).await {
            Ok(()) => {
                tracing::debug!(notice = name, %recipient, %routing, "notice delivered");
                true
            }
            Err(err) => {
                metrics::counter!("relation_notifications_dropped").increment(1);
                tracing::warn!(notice = name, %recipient, %routing, error = %err, "notice dropped");
                false
            }
        }
    }

    /// Pushes each `(recipient, notice)` in order. Returns how many were delivered.
    pub async fn dispatch(&self, routing: PairKey, notices: Vec<(MemberId, Notice)>) -> usize {
        let mut delivered = 0;
        for (recipient, notice) in notices {
            if self.notify(routing, recipient, notice).await {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryPushChannel;

    fn friend_notice(friend: i64) -> Notice {
        Notice::NewFriend {
            friend: MemberId::new(friend),
            profile: None,
        }
    }

    #[tokio::test]
    async fn test_dispatch_to_both_members() {
        let channel = InMemoryPushChannel::new();
        let dispatcher = NotificationDispatcher::new(Arc::new(channel.clone()));
        let routing = PairKey::new(MemberId::new(10), MemberId::new(20));

        let delivered = dispatcher
            .dispatch(
                routing,
                vec![
                    (MemberId::new(10), friend_notice(20)),
                    (MemberId::new(20), friend_notice(10)),
                ],
            )
            .await;

        assert_eq!(delivered, 2);
        let deliveries = channel.deliveries();
        assert!(deliveries.iter().all(|d| d.routing == routing));
        assert_eq!(deliveries[0].recipient, MemberId::new(10));
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let channel = InMemoryPushChannel::new();
        channel.set_fail_on_push(true);
        let dispatcher = NotificationDispatcher::new(Arc::new(channel.clone()));
        let routing = PairKey::new(MemberId::new(10), MemberId::new(20));

        let delivered = dispatcher
            .dispatch(routing, vec![(MemberId::new(20), friend_notice(10))])
            .await;

        assert_eq!(delivered, 0);
        assert_eq!(channel.delivery_count(), 0);
    }
}
