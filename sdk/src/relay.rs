// ============ Two-Chain Relay ============
// In-process stand-in for two test processes, one per chain, exchanging
// messages. Each side owns a `ChainLink`; messages travel as JSON text over
// std channels so what crosses the link is exactly what a real relayer sees.
// A receiver blocks until its peer has sent, which gives the one ordering
// guarantee cross-chain tests depend on: a payload is decoded only after
// the source chain emitted it.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use catalyst_math::U256;
use catalyst_types::primitive_types::H160;
use catalyst_types::{Payload, PayloadError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("peer chain hung up")]
    Disconnected,
    #[error("timed out waiting for peer chain")]
    Timeout,
    #[error("bad relay message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad payload: {0}")]
    Payload(#[from] PayloadError),
    #[error("expected {expected}, got {got}")]
    UnexpectedMessage { expected: &'static str, got: String },
    #[error("chain {0} panicked")]
    ChainPanicked(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelayMessage {
    #[serde(rename_all = "camelCase")]
    PoolAnnouncement {
        chain: String,
        pool: H160,
        asset_count: usize,
    },
    /// Hex of a payload emitted by a vault.
    Payload { hex: String },
    #[serde(rename_all = "camelCase")]
    BalanceReport {
        chain: String,
        pool: H160,
        balances: Vec<U256>,
    },
    Done,
}

impl RelayMessage {
    pub fn payload(payload: &Payload) -> Result<Self, PayloadError> {
        Ok(Self::Payload {
            hex: payload.to_hex()?,
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::PoolAnnouncement { .. } => "pool announcement",
            Self::Payload { .. } => "payload",
            Self::BalanceReport { .. } => "balance report",
            Self::Done => "done",
        }
    }
}

pub struct ChainLink {
    name: String,
    outgoing: Sender<String>,
    incoming: Receiver<String>,
}

/// Two connected ends; whatever one sends the other receives in order.
pub fn link_pair(a: &str, b: &str) -> (ChainLink, ChainLink) {
    let (a_tx, b_rx) = mpsc::channel();
    let (b_tx, a_rx) = mpsc::channel();
    (
        ChainLink {
            name: a.to_string(),
            outgoing: a_tx,
            incoming: a_rx,
        },
        ChainLink {
            name: b.to_string(),
            outgoing: b_tx,
            incoming: b_rx,
        },
    )
}

impl ChainLink {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn send(&self, message: &RelayMessage) -> Result<(), RelayError> {
        let text = serde_json::to_string(message)?;
        debug!(chain = %self.name, kind = message.kind(), "relay send");
        self.outgoing
            .send(text)
            .map_err(|_| RelayError::Disconnected)
    }

    pub fn recv(&self) -> Result<RelayMessage, RelayError> {
        let text = self.incoming.recv().map_err(|_| RelayError::Disconnected)?;
        self.parse(&text)
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<RelayMessage, RelayError> {
        let text = self.incoming.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => RelayError::Timeout,
            RecvTimeoutError::Disconnected => RelayError::Disconnected,
        })?;
        self.parse(&text)
    }

    pub fn send_payload(&self, payload: &Payload) -> Result<(), RelayError> {
        self.send(&RelayMessage::payload(payload)?)
    }

    /// Block until the next message, which must be a payload.
    pub fn recv_payload(&self) -> Result<Payload, RelayError> {
        match self.recv()? {
            RelayMessage::Payload { hex } => Ok(Payload::from_hex(&hex)?),
            other => Err(RelayError::UnexpectedMessage {
                expected: "payload",
                got: other.kind().to_string(),
            }),
        }
    }

    fn parse(&self, text: &str) -> Result<RelayMessage, RelayError> {
        let message: RelayMessage = serde_json::from_str(text)?;
        debug!(chain = %self.name, kind = message.kind(), "relay recv");
        Ok(message)
    }
}

/// Run both chains on their own threads until each returns.
pub fn simulate<A, B, RA, RB>(
    source: (&str, A),
    destination: (&str, B),
) -> Result<(RA, RB), RelayError>
where
    A: FnOnce(ChainLink) -> Result<RA, RelayError> + Send,
    B: FnOnce(ChainLink) -> Result<RB, RelayError> + Send,
    RA: Send,
    RB: Send,
{
    let (source_name, run_source) = source;
    let (destination_name, run_destination) = destination;
    let (source_link, destination_link) = link_pair(source_name, destination_name);

    thread::scope(|scope| {
        let source = scope.spawn(move || run_source(source_link));
        let destination = scope.spawn(move || run_destination(destination_link));

        let source = source
            .join()
            .map_err(|_| RelayError::ChainPanicked(source_name.to_string()))?;
        let destination = destination
            .join()
            .map_err(|_| RelayError::ChainPanicked(destination_name.to_string()))?;
        Ok((source?, destination?))
    })
}
