//! Remote call orchestration.
//!
//! A [`CallChain`] is a linear list of peer calls issued one after another.
//! The first call that fails ends the chain; later calls are never issued
//! and earlier ones are not undone. Calls that do not depend on each other
//! are awaited concurrently by the caller instead (see `futures_util::try_join!`
//! in the coordinator).

use common::MemberId;
use domain::ResultCode;

use crate::error::{Result, SagaError};
use crate::services::{PeerReply, PeerRequest, RemoteCaller};

/// Which code a failing call reports to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureCode {
    /// The peer's code, or `FAIL` if the peer sent none.
    Peer,
    /// Always `FAIL`.
    Generic,
}

/// One peer call: the request and the member whose owning service handles it.
#[derive(Debug, Clone)]
pub struct PeerCall {
    request: PeerRequest,
    routing: MemberId,
    failure_code: FailureCode,
}

impl PeerCall {
    pub fn new(request: PeerRequest, routing: MemberId) -> Self {
        Self {
            request,
            routing,
            failure_code: FailureCode::Peer,
        }
    }

    /// Reports `FAIL` instead of the peer's code when this call fails.
    pub fn with_generic_failure(mut self) -> Self {
        self.failure_code = FailureCode::Generic;
        self
    }

    pub fn name(&self) -> &'static str {
        self.request.name()
    }

    pub fn routing(&self) -> MemberId {
        self.routing
    }

    /// Issues the call once and turns a failing reply into
    /// [`SagaError::RemoteFailure`].
    pub async fn send<R: RemoteCaller + ?Sized>(self, remote: &R) -> Result<PeerReply> {
        let call = self.name();
        metrics::counter!("relation_remote_calls_total", "call" => call).increment(1);
        tracing::debug!(call, routing = %self.routing, "remote call issued");

        let reply = match remote.ask(self.request, self.routing).await {
            Ok(reply) if reply.success => return Ok(reply),
            Ok(reply) => reply,
            Err(err) => PeerReply {
                success: false,
                code: ResultCode::Fail.as_i32(),
                message: Some(err.to_string()),
            },
        };

        metrics::counter!("relation_remote_failures", "call" => call).increment(1);
        tracing::warn!(call, code = reply.code, message = ?reply.message, "remote call failed");

        let code = match self.failure_code {
            FailureCode::Peer if reply.code != ResultCode::Ok.as_i32() => reply.code,
            _ => ResultCode::Fail.as_i32(),
        };
        Err(SagaError::RemoteFailure {
            call,
            code,
            message: reply.message,
        })
    }
}

/// Sequential chain of dependent peer calls.
pub struct CallChain<'a, R: ?Sized> {
    remote: &'a R,
    calls: Vec<PeerCall>,
}

impl<'a, R: RemoteCaller + ?Sized> CallChain<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self {
            remote,
            calls: Vec::new(),
        }
    }

    /// Appends a call issued only if every earlier call succeeded.
    pub fn then(mut self, call: PeerCall) -> Self {
        self.calls.push(call);
        self
    }

    /// Runs the calls in order, stopping at the first failure.
    ///
    /// Returns the replies of all calls on success.
    pub async fn run(self) -> Result<Vec<PeerReply>> {
        let mut replies = Vec::with_capacity(self.calls.len());
        for call in self.calls {
            replies.push(call.send(self.remote).await?);
        }
        Ok(replies)
    }
}
