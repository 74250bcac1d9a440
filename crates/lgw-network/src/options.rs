use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeouts and discovery behavior for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    /// Upper bound for the whole connect sequence.
    pub connect_timeout: Duration,
    /// Upper bound for a single endpoint dial (further capped by what is
    /// left of `connect_timeout`).
    pub dial_timeout: Duration,
    /// Default deadline for an evaluate call.
    pub evaluate_timeout: Duration,
    /// Default deadline for collecting endorsements.
    pub endorse_timeout: Duration,
    /// Default deadline for handing an endorsed transaction to ordering.
    pub order_timeout: Duration,
    /// Default deadline for waiting on the commit status.
    pub commit_timeout: Duration,
    /// Rewrite every discovered host to `localhost`, keeping the port.
    ///
    /// For development networks running in containers. Never inferred.
    /// Only the topology recorded on the session changes: endorsement and
    /// ordering go through the connected gateway peer, so nothing dials the
    /// discovered addresses.
    pub discovery_as_localhost: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            dial_timeout: Duration::from_secs(3),
            evaluate_timeout: Duration::from_secs(5),
            endorse_timeout: Duration::from_secs(15),
            order_timeout: Duration::from_secs(5),
            commit_timeout: Duration::from_secs(60),
            discovery_as_localhost: false,
        }
    }
}

impl ConnectOptions {
    /// Defaults with `discovery_as_localhost` switched on.
    pub fn local_development() -> Self {
        Self {
            discovery_as_localhost: true,
            ..Default::default()
        }
    }

    /// Total default budget of a submit: endorse + order + commit.
    pub fn submit_budget(&self) -> Duration {
        self.endorse_timeout + self.order_timeout + self.commit_timeout
    }
}
