use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

use lgw_protocol::{
    CommitStatus, DiscoveredEndpoint, Endorsement, EndpointRole, ErrorCode, GatewayMessage,
    Proposal, ValidationCode, PROTOCOL_VERSION,
};
use lgw_network::{ConnectionProfile, EndpointConfig, TlsMaterial};
use lgw_types::{Creator, TransactionId};

use crate::chaincode::{AssetTransfer, Chaincode};
use crate::config::{DevnetConfig, OrderingFault};
use crate::error::DevnetResult;
use crate::state::{RwSet, TxContext, WorldState};

const ORDERER_NAME: &str = "orderer.example.com";
const ORDERER_MSP: &str = "OrdererMSP";

/// Per-connection state: the creator presented at the handshake.
#[derive(Debug, Default)]
pub struct Connection {
    creator: Mutex<Option<Creator>>,
}

impl Connection {
    pub fn new() -> Self {
        Self::default()
    }

    fn creator(&self) -> Option<Creator> {
        self.creator.lock().expect("lock poisoned").clone()
    }
}

/// The endorsed transaction handed to the orderer.
#[derive(Debug, Serialize, Deserialize)]
struct Prepared {
    tx_id: TransactionId,
    rw_set: RwSet,
}

#[derive(Default)]
struct Ledger {
    state: WorldState,
    height: u64,
    statuses: HashMap<TransactionId, CommitStatus>,
}

struct Inner {
    config: DevnetConfig,
    peers: Vec<String>,
    contracts: HashMap<String, Arc<dyn Chaincode>>,
    ledger: Mutex<Ledger>,
    committed: Notify,
}

/// A single-channel ledger network simulated in process.
///
/// Endorsing peers simulate proposals against committed state, the
/// orderer cuts one block per transaction, and commit validates each read
/// set against the versions it saw. Cloning shares the same ledger.
#[derive(Clone)]
pub struct DevNetwork {
    inner: Arc<Inner>,
}

impl DevNetwork {
    /// A network serving the asset contract under every configured
    /// contract name.
    pub fn new(config: DevnetConfig) -> DevnetResult<Self> {
        let contracts = config
            .contracts
            .iter()
            .map(|name| (name.clone(), Arc::new(AssetTransfer) as Arc<dyn Chaincode>))
            .collect();
        Self::with_contracts(config, contracts)
    }

    pub fn with_contracts(
        config: DevnetConfig,
        contracts: HashMap<String, Arc<dyn Chaincode>>,
    ) -> DevnetResult<Self> {
        config.validate()?;
        let peers = config.peer_names();
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                peers,
                contracts,
                ledger: Mutex::new(Ledger::default()),
                committed: Notify::new(),
            }),
        })
    }

    pub fn config(&self) -> &DevnetConfig {
        &self.inner.config
    }

    /// A profile that reaches this network's gateway peer at `address`,
    /// bound to the configured channel and first contract.
    pub fn connection_profile(
        &self,
        address: impl Into<String>,
        tls: Option<TlsMaterial>,
    ) -> ConnectionProfile {
        let config = &self.inner.config;
        let mut endpoint = EndpointConfig::peer(self.inner.peers[0].clone(), address);
        endpoint.tls = tls;
        ConnectionProfile {
            name: "devnet".into(),
            channel: config.channel.clone(),
            contract: config.contracts[0].clone(),
            endpoints: vec![endpoint],
        }
    }

    /// Number of blocks cut so far.
    pub fn height(&self) -> u64 {
        self.inner.ledger.lock().expect("lock poisoned").height
    }

    /// Committed value of `key`.
    pub fn committed_value(&self, key: &str) -> Option<Vec<u8>> {
        let ledger = self.inner.ledger.lock().expect("lock poisoned");
        ledger.state.get(key).map(<[u8]>::to_vec)
    }

    pub fn status(&self, tx_id: &TransactionId) -> CommitStatus {
        let ledger = self.inner.ledger.lock().expect("lock poisoned");
        ledger
            .statuses
            .get(tx_id)
            .cloned()
            .unwrap_or(CommitStatus::Unknown)
    }

    /// Answer one request arriving on `conn`.
    pub async fn handle(&self, conn: &Connection, message: GatewayMessage) -> GatewayMessage {
        let name = message.type_name();
        let reply = match message {
            GatewayMessage::Hello { version, creator } => self.hello(conn, version, creator),
            other => match conn.creator() {
                None => GatewayMessage::error(
                    ErrorCode::AuthenticationRejected,
                    "handshake required before other requests",
                ),
                Some(creator) => self.dispatch(&creator, other).await,
            },
        };
        if let GatewayMessage::Error { code, message } = &reply {
            debug!(request = name, %code, %message, "request failed");
        }
        reply
    }

    async fn dispatch(&self, creator: &Creator, message: GatewayMessage) -> GatewayMessage {
        match message {
            GatewayMessage::DiscoverRequest { channel } => self.discover(&channel),
            GatewayMessage::ContractRequest { channel, contract } => {
                self.resolve_contract(&channel, &contract)
            }
            GatewayMessage::EvaluateRequest { proposal } => self.evaluate(creator, &proposal),
            GatewayMessage::EndorseRequest { proposal } => self.endorse(creator, &proposal),
            GatewayMessage::OrderRequest { endorsement } => self.order(endorsement).await,
            GatewayMessage::CommitStatusRequest {
                channel,
                tx_id,
                wait,
            } => self.commit_status(&channel, tx_id, wait).await,
            other => GatewayMessage::error(
                ErrorCode::BadRequest,
                format!("{} is not a request", other.type_name()),
            ),
        }
    }

    fn hello(&self, conn: &Connection, version: u32, creator: Creator) -> GatewayMessage {
        if version != PROTOCOL_VERSION {
            return GatewayMessage::error(
                ErrorCode::UnsupportedVersion,
                format!("protocol version {version} not supported, expected {PROTOCOL_VERSION}"),
            );
        }
        let faults = &self.inner.config.faults;
        let allowed = &self.inner.config.allowed_msps;
        if faults.rejected_msps.contains(&creator.msp_id)
            || (!allowed.is_empty() && !allowed.contains(&creator.msp_id))
        {
            warn!(msp_id = %creator.msp_id, "creator rejected");
            return GatewayMessage::error(
                ErrorCode::AuthenticationRejected,
                format!("MSP {} is not a member of this network", creator.msp_id),
            );
        }
        if creator.certificate.trim().is_empty() {
            return GatewayMessage::error(
                ErrorCode::AuthenticationRejected,
                "creator presented no certificate",
            );
        }
        debug!(msp_id = %creator.msp_id, "creator accepted");
        *conn.creator.lock().expect("lock poisoned") = Some(creator);
        GatewayMessage::HelloAck {
            version: PROTOCOL_VERSION,
            peer: self.inner.peers[0].clone(),
        }
    }

    fn check_channel(&self, channel: &str) -> Result<(), GatewayMessage> {
        if channel == self.inner.config.channel {
            Ok(())
        } else {
            Err(GatewayMessage::error(
                ErrorCode::ChannelNotFound,
                format!("channel {channel} does not exist"),
            ))
        }
    }

    fn contract(&self, channel: &str, name: &str) -> Result<Arc<dyn Chaincode>, GatewayMessage> {
        self.check_channel(channel)?;
        self.inner.contracts.get(name).cloned().ok_or_else(|| {
            GatewayMessage::error(
                ErrorCode::ContractNotFound,
                format!("contract {name} is not deployed on channel {channel}"),
            )
        })
    }

    fn discover(&self, channel: &str) -> GatewayMessage {
        if let Err(reply) = self.check_channel(channel) {
            return reply;
        }
        let port = self.inner.config.bind_addr.port();
        let mut endpoints: Vec<DiscoveredEndpoint> = self
            .inner
            .peers
            .iter()
            .map(|name| DiscoveredEndpoint {
                name: name.clone(),
                address: format!("{name}:{port}"),
                role: EndpointRole::Peer,
                msp_id: "Org1MSP".into(),
            })
            .collect();
        endpoints.push(DiscoveredEndpoint {
            name: ORDERER_NAME.into(),
            address: format!("{ORDERER_NAME}:7050"),
            role: EndpointRole::Orderer,
            msp_id: ORDERER_MSP.into(),
        });
        GatewayMessage::DiscoverResponse { endpoints }
    }

    fn resolve_contract(&self, channel: &str, contract: &str) -> GatewayMessage {
        match self.contract(channel, contract) {
            Ok(_) => GatewayMessage::ContractResponse {
                contract: contract.to_string(),
            },
            Err(reply) => reply,
        }
    }

    /// Checks shared by evaluate and endorse.
    fn admit(
        &self,
        creator: &Creator,
        proposal: &Proposal,
    ) -> Result<Arc<dyn Chaincode>, GatewayMessage> {
        if &proposal.creator != creator {
            return Err(GatewayMessage::error(
                ErrorCode::AuthenticationRejected,
                "proposal creator does not match the connection identity",
            ));
        }
        if !proposal.tx_id_is_consistent() {
            return Err(GatewayMessage::error(
                ErrorCode::BadRequest,
                "transaction id does not match nonce and creator",
            ));
        }
        self.contract(&proposal.channel, &proposal.contract)
    }

    fn simulate(
        &self,
        chaincode: &dyn Chaincode,
        state: &WorldState,
        proposal: &Proposal,
    ) -> Result<(Vec<u8>, RwSet), String> {
        let mut ctx = TxContext::new(state);
        let payload = chaincode.invoke(&mut ctx, &proposal.function, &proposal.args)?;
        Ok((payload, ctx.into_rw_set()))
    }

    fn evaluate(&self, creator: &Creator, proposal: &Proposal) -> GatewayMessage {
        let chaincode = match self.admit(creator, proposal) {
            Ok(c) => c,
            Err(reply) => return reply,
        };
        let ledger = self.inner.ledger.lock().expect("lock poisoned");
        match self.simulate(chaincode.as_ref(), &ledger.state, proposal) {
            Ok((payload, _)) => GatewayMessage::EvaluateResponse { payload },
            Err(message) => GatewayMessage::error(ErrorCode::ContractError, message),
        }
    }

    fn endorse(&self, creator: &Creator, proposal: &Proposal) -> GatewayMessage {
        let chaincode = match self.admit(creator, proposal) {
            Ok(c) => c,
            Err(reply) => return reply,
        };
        let ledger = self.inner.ledger.lock().expect("lock poisoned");
        if ledger.statuses.contains_key(&proposal.tx_id) {
            return GatewayMessage::error(
                ErrorCode::EndorsementFailed,
                format!("duplicate transaction id {}", proposal.tx_id.short_id()),
            );
        }

        let mut results = Vec::with_capacity(self.inner.peers.len());
        for (i, peer) in self.inner.peers.iter().enumerate() {
            let (mut payload, rw_set) =
                match self.simulate(chaincode.as_ref(), &ledger.state, proposal) {
                    Ok(out) => out,
                    Err(message) => {
                        return GatewayMessage::error(ErrorCode::ContractError, message)
                    }
                };
            if self.inner.config.faults.divergent_endorser && i == self.inner.peers.len() - 1 {
                payload.extend_from_slice(b"~");
            }
            results.push((peer.clone(), payload, rw_set));
        }
        drop(ledger);

        let payload = results[0].1.clone();
        let rw_set = results[0].2.clone();
        if let Some((peer, _, _)) = results
            .iter()
            .find(|(_, p, rw)| *p != payload || *rw != rw_set)
        {
            warn!(tx_id = %proposal.tx_id.short_id(), %peer, "endorsement results differ");
            return GatewayMessage::error(
                ErrorCode::EndorsementFailed,
                format!("peer {peer} returned a different result than the other endorsers"),
            );
        }

        let prepared = Prepared {
            tx_id: proposal.tx_id,
            rw_set,
        };
        let prepared = match serde_json::to_vec(&prepared) {
            Ok(bytes) => bytes,
            Err(e) => return GatewayMessage::error(ErrorCode::Internal, e.to_string()),
        };
        debug!(tx_id = %proposal.tx_id.short_id(), function = %proposal.function, "endorsed");
        GatewayMessage::EndorseResponse {
            endorsement: Endorsement {
                tx_id: proposal.tx_id,
                channel: proposal.channel.clone(),
                payload,
                prepared,
                endorsers: results.into_iter().map(|(peer, _, _)| peer).collect(),
            },
        }
    }

    async fn order(&self, endorsement: Endorsement) -> GatewayMessage {
        if let Err(reply) = self.check_channel(&endorsement.channel) {
            return reply;
        }
        let prepared: Prepared = match serde_json::from_slice(&endorsement.prepared) {
            Ok(p) => p,
            Err(e) => {
                return GatewayMessage::error(
                    ErrorCode::BadRequest,
                    format!("malformed endorsed transaction: {e}"),
                )
            }
        };
        if prepared.tx_id != endorsement.tx_id {
            return GatewayMessage::error(
                ErrorCode::BadRequest,
                "endorsed transaction does not match its id",
            );
        }

        let faults = &self.inner.config.faults;
        if !faults.ordering_delay.is_zero() {
            sleep(faults.ordering_delay).await;
        }
        if faults.ordering == OrderingFault::Reject {
            warn!(tx_id = %prepared.tx_id.short_id(), "ordering refused");
            return GatewayMessage::error(ErrorCode::OrderingFailed, "ordering service unavailable");
        }

        let tx_id = prepared.tx_id;
        if faults.commit_delay.is_zero() {
            self.commit(prepared);
        } else {
            let network = self.clone();
            let delay = faults.commit_delay;
            tokio::spawn(async move {
                sleep(delay).await;
                network.commit(prepared);
            });
        }

        if faults.ordering == OrderingFault::FailAfterOrdering {
            warn!(tx_id = %tx_id.short_id(), "reporting ordering failure for an ordered transaction");
            return GatewayMessage::error(
                ErrorCode::OrderingFailed,
                "lost contact with the ordering service",
            );
        }
        GatewayMessage::OrderResponse { tx_id }
    }

    /// Cut a block for one transaction and validate it into the state.
    fn commit(&self, prepared: Prepared) {
        let mut ledger = self.inner.ledger.lock().expect("lock poisoned");
        ledger.height += 1;
        let block = ledger.height;
        let tx = prepared.tx_id.short_id();

        if ledger.statuses.contains_key(&prepared.tx_id) {
            warn!(%tx, block, "duplicate transaction id, keeping the first outcome");
        } else {
            let status = if ledger.state.validate(&prepared.rw_set) {
                ledger.state.apply(&prepared.rw_set, block);
                info!(%tx, block, writes = prepared.rw_set.writes.len(), "committed");
                CommitStatus::Valid { block }
            } else {
                let code = ValidationCode::MvccReadConflict;
                info!(%tx, block, %code, "committed as invalid");
                CommitStatus::Invalid { block, code }
            };
            ledger.statuses.insert(prepared.tx_id, status);
        }
        drop(ledger);
        self.inner.committed.notify_waiters();
    }

    async fn commit_status(
        &self,
        channel: &str,
        tx_id: TransactionId,
        wait: bool,
    ) -> GatewayMessage {
        if let Err(reply) = self.check_channel(channel) {
            return reply;
        }
        let reply = |status: CommitStatus| GatewayMessage::CommitStatusResponse { tx_id, status };
        if !wait {
            return reply(self.status(&tx_id));
        }

        let deadline = Instant::now() + self.inner.config.max_commit_wait;
        loop {
            let notified = self.inner.committed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let status = self.status(&tx_id);
            if status != CommitStatus::Unknown {
                return reply(status);
            }
            if timeout_at(deadline, notified).await.is_err() {
                debug!(tx = %tx_id.short_id(), "commit wait expired");
                return reply(CommitStatus::Unknown);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FaultConfig;
    use lgw_asset::AssetCodec;
    use std::time::Duration;

    fn creator() -> Creator {
        Creator {
            msp_id: "Org1MSP".into(),
            certificate: "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n".into(),
        }
    }

    async fn connected(network: &DevNetwork) -> Connection {
        let conn = Connection::new();
        let reply = network
            .handle(
                &conn,
                GatewayMessage::Hello {
                    version: PROTOCOL_VERSION,
                    creator: creator(),
                },
            )
            .await;
        assert!(matches!(reply, GatewayMessage::HelloAck { .. }));
        conn
    }

    fn proposal(function: &str, args: &[&str]) -> Proposal {
        Proposal::new(
            creator(),
            "mychannel",
            "basic",
            function,
            args.iter().map(|a| a.to_string()).collect(),
        )
    }

    async fn endorse(network: &DevNetwork, conn: &Connection, p: &Proposal) -> Endorsement {
        match network
            .handle(conn, GatewayMessage::EndorseRequest { proposal: p.clone() })
            .await
        {
            GatewayMessage::EndorseResponse { endorsement } => endorsement,
            other => panic!("unexpected {other:?}"),
        }
    }

    async fn order(network: &DevNetwork, conn: &Connection, e: Endorsement) -> GatewayMessage {
        network
            .handle(conn, GatewayMessage::OrderRequest { endorsement: e })
            .await
    }

    fn error_code(reply: &GatewayMessage) -> Option<ErrorCode> {
        match reply {
            GatewayMessage::Error { code, .. } => Some(*code),
            _ => None,
        }
    }

    #[tokio::test]
    async fn requests_before_hello_are_rejected() {
        let network = DevNetwork::new(DevnetConfig::default()).unwrap();
        let reply = network
            .handle(
                &Connection::new(),
                GatewayMessage::DiscoverRequest {
                    channel: "mychannel".into(),
                },
            )
            .await;
        assert_eq!(error_code(&reply), Some(ErrorCode::AuthenticationRejected));
    }

    #[tokio::test]
    async fn unknown_msp_and_old_version_are_rejected() {
        let network = DevNetwork::new(DevnetConfig::default()).unwrap();
        let mut stranger = creator();
        stranger.msp_id = "Org9MSP".into();
        let reply = network
            .handle(
                &Connection::new(),
                GatewayMessage::Hello {
                    version: PROTOCOL_VERSION,
                    creator: stranger,
                },
            )
            .await;
        assert_eq!(error_code(&reply), Some(ErrorCode::AuthenticationRejected));

        let reply = network
            .handle(
                &Connection::new(),
                GatewayMessage::Hello {
                    version: PROTOCOL_VERSION + 1,
                    creator: creator(),
                },
            )
            .await;
        assert_eq!(error_code(&reply), Some(ErrorCode::UnsupportedVersion));
    }

    #[tokio::test]
    async fn discovery_and_contract_resolution() {
        let network = DevNetwork::new(DevnetConfig::default()).unwrap();
        let conn = connected(&network).await;

        match network
            .handle(&conn, GatewayMessage::DiscoverRequest { channel: "mychannel".into() })
            .await
        {
            GatewayMessage::DiscoverResponse { endpoints } => {
                assert_eq!(endpoints.len(), 3);
                assert_eq!(endpoints[0].address, "peer0.org1.example.com:7051");
                assert_eq!(endpoints[2].role, EndpointRole::Orderer);
            }
            other => panic!("unexpected {other:?}"),
        }

        let reply = network
            .handle(&conn, GatewayMessage::DiscoverRequest { channel: "other".into() })
            .await;
        assert_eq!(error_code(&reply), Some(ErrorCode::ChannelNotFound));

        let reply = network
            .handle(
                &conn,
                GatewayMessage::ContractRequest {
                    channel: "mychannel".into(),
                    contract: "missing".into(),
                },
            )
            .await;
        assert_eq!(error_code(&reply), Some(ErrorCode::ContractNotFound));
    }

    #[tokio::test]
    async fn endorse_order_commit() {
        let network = DevNetwork::new(DevnetConfig::default()).unwrap();
        let conn = connected(&network).await;
        let p = proposal("CreateAsset", &["asset9", "blue", "5", "Tomoko", "300"]);

        let endorsement = endorse(&network, &conn, &p).await;
        assert_eq!(endorsement.endorsers.len(), 2);
        assert!(network.committed_value("asset9").is_none());

        let reply = order(&network, &conn, endorsement).await;
        assert!(matches!(reply, GatewayMessage::OrderResponse { tx_id } if tx_id == p.tx_id));
        assert_eq!(network.status(&p.tx_id), CommitStatus::Valid { block: 1 });
        let stored = AssetCodec::decode(&network.committed_value("asset9").unwrap()).unwrap();
        assert_eq!(stored.owner, "Tomoko");

        let again = endorse_error(&network, &conn, &p).await;
        assert_eq!(again, ErrorCode::EndorsementFailed);
    }

    async fn endorse_error(network: &DevNetwork, conn: &Connection, p: &Proposal) -> ErrorCode {
        let reply = network
            .handle(conn, GatewayMessage::EndorseRequest { proposal: p.clone() })
            .await;
        error_code(&reply).unwrap()
    }

    #[tokio::test]
    async fn conflicting_transactions_commit_one_invalid() {
        let network = DevNetwork::new(DevnetConfig::default()).unwrap();
        let conn = connected(&network).await;
        let first = proposal("CreateAsset", &["asset9", "blue", "5", "Tomoko", "300"]);
        let second = proposal("CreateAsset", &["asset9", "red", "5", "Brad", "400"]);

        let e1 = endorse(&network, &conn, &first).await;
        let e2 = endorse(&network, &conn, &second).await;
        order(&network, &conn, e1).await;
        order(&network, &conn, e2).await;

        assert_eq!(network.status(&first.tx_id), CommitStatus::Valid { block: 1 });
        assert_eq!(
            network.status(&second.tx_id),
            CommitStatus::Invalid {
                block: 2,
                code: ValidationCode::MvccReadConflict
            }
        );
        let stored = AssetCodec::decode(&network.committed_value("asset9").unwrap()).unwrap();
        assert_eq!(stored.color, "blue");
    }

    #[tokio::test]
    async fn contract_errors_and_divergent_endorsers() {
        let network = DevNetwork::new(DevnetConfig::default().with_faults(FaultConfig {
            divergent_endorser: true,
            ..Default::default()
        }))
        .unwrap();
        let conn = connected(&network).await;

        let missing = proposal("ReadAsset", &["asset70"]);
        assert_eq!(endorse_error(&network, &conn, &missing).await, ErrorCode::ContractError);

        let create = proposal("CreateAsset", &["asset9", "blue", "5", "Tomoko", "300"]);
        assert_eq!(endorse_error(&network, &conn, &create).await, ErrorCode::EndorsementFailed);
    }

    #[tokio::test]
    async fn foreign_creator_in_proposal_is_rejected() {
        let network = DevNetwork::new(DevnetConfig::default()).unwrap();
        let conn = connected(&network).await;
        let mut other = creator();
        other.certificate = "someone else".into();
        let p = Proposal::new(other, "mychannel", "basic", "GetAllAssets", vec![]);
        let reply = network
            .handle(&conn, GatewayMessage::EvaluateRequest { proposal: p })
            .await;
        assert_eq!(error_code(&reply), Some(ErrorCode::AuthenticationRejected));
    }

    #[tokio::test]
    async fn rejected_ordering_commits_nothing() {
        let network = DevNetwork::new(DevnetConfig::default().with_faults(FaultConfig {
            ordering: OrderingFault::Reject,
            ..Default::default()
        }))
        .unwrap();
        let conn = connected(&network).await;
        let p = proposal("InitLedger", &[]);
        let reply = order(&network, &conn, endorse(&network, &conn, &p).await).await;
        assert_eq!(error_code(&reply), Some(ErrorCode::OrderingFailed));
        assert_eq!(network.height(), 0);
        assert_eq!(network.status(&p.tx_id), CommitStatus::Unknown);
    }

    #[tokio::test]
    async fn failure_after_ordering_still_commits() {
        let network = DevNetwork::new(DevnetConfig::default().with_faults(FaultConfig {
            ordering: OrderingFault::FailAfterOrdering,
            ..Default::default()
        }))
        .unwrap();
        let conn = connected(&network).await;
        let p = proposal("InitLedger", &[]);
        let reply = order(&network, &conn, endorse(&network, &conn, &p).await).await;
        assert_eq!(error_code(&reply), Some(ErrorCode::OrderingFailed));
        assert_eq!(network.status(&p.tx_id), CommitStatus::Valid { block: 1 });
    }

    #[tokio::test]
    async fn commit_status_waits_for_delayed_commit() {
        let network = DevNetwork::new(DevnetConfig::default().with_faults(FaultConfig {
            commit_delay: Duration::from_millis(100),
            ..Default::default()
        }))
        .unwrap();
        let conn = connected(&network).await;
        let p = proposal("InitLedger", &[]);
        let reply = order(&network, &conn, endorse(&network, &conn, &p).await).await;
        assert!(matches!(reply, GatewayMessage::OrderResponse { .. }));

        let status_request = |wait| GatewayMessage::CommitStatusRequest {
            channel: "mychannel".into(),
            tx_id: p.tx_id,
            wait,
        };
        match network.handle(&conn, status_request(false)).await {
            GatewayMessage::CommitStatusResponse { status, .. } => {
                assert_eq!(status, CommitStatus::Unknown)
            }
            other => panic!("unexpected {other:?}"),
        }
        match network.handle(&conn, status_request(true)).await {
            GatewayMessage::CommitStatusResponse { status, .. } => {
                assert_eq!(status, CommitStatus::Valid { block: 1 })
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn commit_wait_is_bounded() {
        let network = DevNetwork::new(DevnetConfig {
            max_commit_wait: Duration::from_millis(50),
            ..Default::default()
        })
        .unwrap();
        let conn = connected(&network).await;
        let never = proposal("InitLedger", &[]).tx_id;
        let reply = network
            .handle(
                &conn,
                GatewayMessage::CommitStatusRequest {
                    channel: "mychannel".into(),
                    tx_id: never,
                    wait: true,
                },
            )
            .await;
        assert!(matches!(
            reply,
            GatewayMessage::CommitStatusResponse {
                status: CommitStatus::Unknown,
                ..
            }
        ));
    }
}
