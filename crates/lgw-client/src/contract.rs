use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use lgw_network::{NetworkResult, PeerClient, Session};
use lgw_protocol::{CommitStatus, Proposal};
use lgw_types::TransactionId;

use crate::error::{InvokeError, InvokeResult, Phase};
use crate::outcome::{CommitOutcome, PendingOutcomes, Submitted};

/// Runs transactions of one contract over a session.
///
/// Cheap to clone; clones share the session and the pending-outcome
/// registry. Nothing is retried automatically.
#[derive(Clone)]
pub struct Contract {
    session: Arc<Session>,
    pending: Arc<PendingOutcomes>,
}

impl Contract {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            pending: Arc::new(PendingOutcomes::default()),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn name(&self) -> &str {
        self.session.contract()
    }

    /// Query one peer. Nothing is ordered or recorded, so the result may
    /// not yet reflect submits that are still in flight.
    pub async fn evaluate(&self, tx_name: &str, args: &[&str]) -> InvokeResult<Vec<u8>> {
        self.evaluate_within(tx_name, args, self.session.options().evaluate_timeout)
            .await
    }

    pub async fn evaluate_within(
        &self,
        tx_name: &str,
        args: &[&str],
        limit: Duration,
    ) -> InvokeResult<Vec<u8>> {
        let peer = self.peer()?;
        let proposal = self.proposal(tx_name, args);
        let tx_id = proposal.tx_id;
        debug!(tx = %tx_id.short_id(), function = tx_name, "evaluate");

        let deadline = Instant::now() + limit;
        run_phase(Phase::Evaluate, tx_id, deadline, peer.evaluate(&proposal)).await
    }

    /// Endorse, order, and wait for the commit, with the session's default
    /// per-phase timeouts.
    pub async fn submit(&self, tx_name: &str, args: &[&str]) -> InvokeResult<Submitted> {
        self.submit_inner(tx_name, args, None).await
    }

    /// Like [`Contract::submit`], with one deadline covering every phase.
    pub async fn submit_within(
        &self,
        tx_name: &str,
        args: &[&str],
        limit: Duration,
    ) -> InvokeResult<Submitted> {
        self.submit_inner(tx_name, args, Some(Instant::now() + limit))
            .await
    }

    async fn submit_inner(
        &self,
        tx_name: &str,
        args: &[&str],
        overall: Option<Instant>,
    ) -> InvokeResult<Submitted> {
        let peer = self.peer()?;
        let proposal = self.proposal(tx_name, args);
        let tx_id = proposal.tx_id;
        debug!(tx = %tx_id.short_id(), function = tx_name, "submit");

        let result = self.drive_submit(&peer, &proposal, overall).await;
        match &result {
            Ok(done) => info!(
                tx = %tx_id.short_id(),
                function = tx_name,
                block = done.block,
                "transaction committed"
            ),
            Err(e) if e.requires_requery() => {
                warn!(tx = %tx_id, function = tx_name, error = %e, "commit outcome unknown");
                self.pending.record(tx_id);
            }
            Err(e) => debug!(tx = %tx_id.short_id(), function = tx_name, error = %e, "submit failed"),
        }
        result
    }

    async fn drive_submit(
        &self,
        peer: &PeerClient<'_>,
        proposal: &Proposal,
        overall: Option<Instant>,
    ) -> InvokeResult<Submitted> {
        let options = self.session.options();
        let tx_id = proposal.tx_id;
        let deadline = |default: Duration| overall.unwrap_or_else(|| Instant::now() + default);

        let endorsement = run_phase(
            Phase::Endorse,
            tx_id,
            deadline(options.endorse_timeout),
            peer.endorse(proposal),
        )
        .await?;
        debug!(tx = %tx_id.short_id(), endorsers = ?endorsement.endorsers, "endorsed");

        run_phase(
            Phase::Order,
            tx_id,
            deadline(options.order_timeout),
            peer.order(&endorsement),
        )
        .await?;
        debug!(tx = %tx_id.short_id(), "ordered");

        let status = run_phase(
            Phase::Commit,
            tx_id,
            deadline(options.commit_timeout),
            peer.commit_status(self.session.channel(), &tx_id, true),
        )
        .await?;

        match status {
            CommitStatus::Valid { block } => Ok(Submitted {
                tx_id,
                block,
                result: endorsement.payload,
            }),
            CommitStatus::Invalid { code, .. } => Err(InvokeError::CommitRejected { tx_id, code }),
            CommitStatus::Unknown => Err(InvokeError::CommitStatusUnavailable {
                tx_id,
                reason: "peer stopped waiting before the transaction was committed".into(),
            }),
        }
    }

    /// Ask for the commit status of a transaction without waiting for it.
    ///
    /// A resolved outcome removes `tx_id` from [`Contract::pending_outcomes`].
    pub async fn commit_status(
        &self,
        tx_id: &TransactionId,
        limit: Duration,
    ) -> InvokeResult<CommitOutcome> {
        let peer = self.peer()?;
        let deadline = Instant::now() + limit;
        let status = run_phase(
            Phase::Status,
            *tx_id,
            deadline,
            peer.commit_status(self.session.channel(), tx_id, false),
        )
        .await?;

        let outcome = CommitOutcome::from(status);
        if outcome.is_resolved() && self.pending.resolve(tx_id) {
            info!(tx = %tx_id.short_id(), ?outcome, "pending outcome resolved");
        }
        Ok(outcome)
    }

    /// Transactions whose submit ended ambiguously and that have not been
    /// resolved through [`Contract::commit_status`] since.
    ///
    /// An endorse-phase timeout is recorded too, although such a
    /// transaction may never reach ordering and then stays `Unknown`.
    /// Drop those with [`Contract::forget`] once the caller gives up on them.
    pub fn pending_outcomes(&self) -> Vec<TransactionId> {
        self.pending.snapshot()
    }

    /// Stop tracking `tx_id` as pending. Returns whether it was tracked.
    pub fn forget(&self, tx_id: &TransactionId) -> bool {
        let tracked = self.pending.resolve(tx_id);
        if tracked {
            debug!(tx = %tx_id.short_id(), "pending outcome dropped");
        }
        tracked
    }

    fn peer(&self) -> InvokeResult<PeerClient<'_>> {
        self.session.peer().map_err(|_| InvokeError::SessionClosed)
    }

    fn proposal(&self, tx_name: &str, args: &[&str]) -> Proposal {
        Proposal::new(
            self.session.creator().clone(),
            self.session.channel(),
            self.session.contract(),
            tx_name,
            args.iter().map(|a| a.to_string()).collect(),
        )
    }
}

async fn run_phase<T>(
    phase: Phase,
    tx_id: TransactionId,
    deadline: Instant,
    fut: impl Future<Output = NetworkResult<T>>,
) -> InvokeResult<T> {
    let started = Instant::now();
    match timeout_at(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(InvokeError::from_network(e, tx_id, phase)),
        Err(_) => Err(InvokeError::Timeout {
            tx_id,
            phase,
            after: started.elapsed(),
        }),
    }
}
