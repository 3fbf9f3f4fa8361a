//! # Elastic Node Service
//!
//! The dissemination engine: outbound broadcast (`send_all`), single-hop
//! relay with failover (`relay_step`) and inbound relay/delivery decisions
//! (`on_receive`).
//!
//! ## Architecture
//!
//! Implements the inbound port [`TransportEvents`] and depends on three
//! injected collaborators:
//! - [`PeerDirectory`]: who exists and where they sit in the grid
//! - [`Transport`]: framed delivery to one peer
//! - [`MessageHandler`]: the application
//!
//! ## Concurrency
//!
//! The service holds no mutable state of its own. Fan-out branches of one
//! round run concurrently, so one unreachable peer does not hold up its
//! siblings.

use futures::future::{join_all, BoxFuture, FutureExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

use crate::domain::{
    next_step, outbound_round, plan_relay, BroadcastMode, BroadcastReport, ElasticConfig,
    NextStep, ReceiveOutcome, RelayOutcome, RelayPlan,
};
use crate::events::DisseminationError;
use crate::ports::inbound::TransportEvents;
use crate::ports::outbound::{MessageHandler, Transport};
use eg_01_elastic_grid::{define_layout, ElasticLayout};
use eg_02_peer_directory::{PeerDirectory, PeerEntry};
use eg_03_messages::Message;
use shared_crypto::NodeKey;
use shared_types::Address;

/// Elastic grid dissemination engine for one node.
///
/// ## Dependencies
///
/// - `D: PeerDirectory` - shared peer registry
/// - `T: Transport` - framed sends
/// - `H: MessageHandler` - receives authenticated direct messages
pub struct ElasticNode<D, T, H>
where
    D: PeerDirectory,
    T: Transport,
    H: MessageHandler,
{
    config: ElasticConfig,
    /// Signs relay hops as router.
    key: NodeKey,
    peers: Arc<D>,
    transport: Arc<T>,
    handler: Arc<H>,
}

impl<D, T, H> ElasticNode<D, T, H>
where
    D: PeerDirectory,
    T: Transport,
    H: MessageHandler,
{
    pub fn new(
        config: ElasticConfig,
        key: NodeKey,
        peers: Arc<D>,
        transport: Arc<T>,
        handler: Arc<H>,
    ) -> Result<Self, DisseminationError> {
        config.validate().map_err(DisseminationError::InvalidConfig)?;

        Ok(Self {
            config,
            key,
            peers,
            transport,
            handler,
        })
    }

    /// This node's address.
    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn config(&self) -> &ElasticConfig {
        &self.config
    }

    pub fn peers(&self) -> &Arc<D> {
        &self.peers
    }

    /// Layout a broadcast started now would use.
    pub fn current_layout(&self) -> ElasticLayout {
        define_layout(self.peers.count(), self.config.fan_out)
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    /// Broadcast `message` to every peer in the directory.
    ///
    /// Single-cell layouts send the message unmodified to every peer.
    /// Otherwise one relay step is issued per slice of the outermost
    /// non-unit axis.
    pub async fn send_all(&self, message: &Message) -> Result<BroadcastReport, DisseminationError> {
        let layout = self.current_layout();

        let Some(round) = outbound_round(&layout) else {
            let peers = self.peers.snapshot();
            let delivered = self.send_to_many(&peers, message).await?;
            debug!(
                message_id = %message.id(),
                peers = peers.len(),
                delivered,
                "Direct broadcast"
            );
            return Ok(BroadcastReport {
                layout,
                mode: BroadcastMode::Direct,
                attempts: peers.len(),
                delivered,
            });
        };

        let hops = round
            .destinations
            .iter()
            .map(|to| message.route_to(round.ttl, *to, layout, &self.key))
            .collect::<Result<Vec<_>, _>>()?;

        let attempts = hops.len();
        let outcomes = join_all(hops.into_iter().map(|hop| self.relay_step(hop))).await;
        let delivered = self.tally(&message.id(), outcomes);

        debug!(
            message_id = %message.id(),
            %layout,
            ttl = round.ttl,
            attempts,
            delivered,
            "Routed broadcast"
        );

        Ok(BroadcastReport {
            layout,
            mode: BroadcastMode::Routed,
            attempts,
            delivered,
        })
    }

    /// Deliver one routed hop to a single peer of its destination.
    ///
    /// Candidates are the directory entries inside the hop's `to` under its
    /// `layout`. If this node is one of them it handles the hop itself;
    /// otherwise candidates are tried in random order until one send
    /// succeeds.
    pub fn relay_step(
        &self,
        message: Message,
    ) -> BoxFuture<'_, Result<RelayOutcome, DisseminationError>> {
        async move {
            let (to, layout) = match message.routing() {
                Some(routing) => (routing.to, routing.layout),
                None => {
                    return Err(DisseminationError::ProtocolViolation(
                        "relay step without routing header".to_string(),
                    ))
                }
            };

            let candidates = self.peers.query_by_coordinate(&to, &layout);
            let plan = plan_relay(candidates, &self.address(), &mut rand::thread_rng());

            match plan {
                RelayPlan::Empty => {
                    debug!(message_id = %message.id(), %to, "No relay candidates");
                    Ok(RelayOutcome::NoCandidates)
                }
                RelayPlan::Local => {
                    trace!(message_id = %message.id(), %to, "Relaying locally");
                    self.receive_message(message).await?;
                    Ok(RelayOutcome::Local)
                }
                RelayPlan::Failover(order) => {
                    let frame = message.encode()?;
                    for peer in order {
                        match self.transport.send(&peer, frame.clone()).await {
                            Ok(()) => {
                                trace!(
                                    message_id = %message.id(),
                                    %to,
                                    peer = %peer.address.short(),
                                    "Relayed"
                                );
                                return Ok(RelayOutcome::Relayed(peer.address));
                            }
                            Err(err) => {
                                debug!(
                                    message_id = %message.id(),
                                    peer = %peer.address.short(),
                                    error = %err,
                                    "Relay candidate failed"
                                );
                            }
                        }
                    }
                    debug!(message_id = %message.id(), %to, "Relay candidates exhausted");
                    Ok(RelayOutcome::Exhausted)
                }
            }
        }
        .boxed()
    }

    /// Send `message` unmodified to one peer.
    pub async fn send_to(&self, peer: &PeerEntry, message: &Message) -> Result<(), DisseminationError> {
        let frame = message.encode()?;
        self.transport.send(peer, frame).await?;
        Ok(())
    }

    /// Send `message` unmodified to each peer concurrently. This node, if
    /// listed, is served locally. Returns how many deliveries succeeded.
    pub async fn send_to_many(
        &self,
        peers: &[PeerEntry],
        message: &Message,
    ) -> Result<usize, DisseminationError> {
        let frame = message.encode()?;
        let me = self.address();

        let sends = peers.iter().map(|peer| {
            let frame = frame.clone();
            async move {
                if peer.address == me {
                    return self.dispatch(message).map(|_| ());
                }
                self.transport
                    .send(peer, frame)
                    .await
                    .map_err(DisseminationError::from)
            }
        });

        let mut delivered = 0;
        for result in join_all(sends).await {
            match result {
                Ok(()) => delivered += 1,
                Err(err) => self.report(&message.id(), &err),
            }
        }
        Ok(delivered)
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    /// Handle one received frame.
    pub async fn on_receive(&self, frame: &[u8]) -> Result<ReceiveOutcome, DisseminationError> {
        let message = Message::decode(frame).map_err(DisseminationError::Malformed)?;
        self.receive_message(message).await
    }

    /// Handle a decoded message: dispatch, relay one axis down, or deliver
    /// to the destination cell.
    pub async fn receive_message(
        &self,
        message: Message,
    ) -> Result<ReceiveOutcome, DisseminationError> {
        let routing = match message.routing() {
            Some(routing) if message.should_route() => routing.clone(),
            _ => {
                let sender = self.dispatch(&message)?;
                return Ok(ReceiveOutcome::Dispatched { sender });
            }
        };

        if !self.peers.exists(&routing.router) {
            return Err(DisseminationError::UnauthorizedRouter(routing.router));
        }
        if self.config.verify_router && !message.verify_router() {
            return Err(DisseminationError::InvalidRouterSignature {
                router: routing.router,
            });
        }

        let layout = routing.layout;
        let step = next_step(routing.ttl, routing.to, &layout)
            .map_err(DisseminationError::ProtocolViolation)?;

        match step {
            NextStep::Deliver(cell) => {
                let members = self.peers.query_by_coordinate(&cell, &layout);
                let last = message.route_to(0, cell, layout, &self.key)?;
                let recipients = self.send_to_many(&members, &last).await?;
                debug!(
                    message_id = %message.id(),
                    %cell,
                    members = members.len(),
                    recipients,
                    "Delivered to cell"
                );
                Ok(ReceiveOutcome::Delivered { recipients })
            }
            NextStep::Fan(round) => {
                let hops = round
                    .destinations
                    .iter()
                    .map(|to| message.route_to(round.ttl, *to, layout, &self.key))
                    .collect::<Result<Vec<_>, _>>()?;

                let branches = hops.len();
                let outcomes = join_all(hops.into_iter().map(|hop| self.relay_step(hop))).await;
                let delivered = self.tally(&message.id(), outcomes);

                debug!(
                    message_id = %message.id(),
                    from = %routing.to,
                    ttl = round.ttl,
                    branches,
                    delivered,
                    "Relayed down one axis"
                );
                Ok(ReceiveOutcome::Relayed {
                    ttl: round.ttl,
                    branches,
                })
            }
        }
    }

    /// Authenticate a direct message and hand it to the application.
    fn dispatch(&self, message: &Message) -> Result<Address, DisseminationError> {
        let claimed = message
            .claimed_sender()
            .map_err(DisseminationError::Malformed)?;

        let Some(peer) = self.peers.find(&claimed) else {
            return Err(DisseminationError::UnknownSender(claimed));
        };
        if !message.verify(&claimed) {
            return Err(DisseminationError::InvalidSignature { claimed });
        }

        self.handler.on_message(&peer, message);
        Ok(claimed)
    }

    /// Count delivered relay outcomes, logging failures.
    fn tally(
        &self,
        message_id: &str,
        outcomes: Vec<Result<RelayOutcome, DisseminationError>>,
    ) -> usize {
        outcomes
            .into_iter()
            .filter(|outcome| match outcome {
                Ok(outcome) => outcome.is_delivered(),
                Err(err) => {
                    self.report(message_id, err);
                    false
                }
            })
            .count()
    }

    /// Log a dropped message at the level its error class calls for.
    fn report(&self, message_id: &str, err: &DisseminationError) {
        match err {
            DisseminationError::Malformed(_) => {
                warn!(message_id, error = %err, "Dropping malformed message")
            }
            err if err.is_security_event() => {
                warn!(message_id, error = %err, "Dropping unauthenticated message")
            }
            DisseminationError::Transport(_) => {
                debug!(message_id, error = %err, "Send failed")
            }
            _ => error!(message_id, error = %err, "Dropping message"),
        }
    }
}

#[async_trait::async_trait]
impl<D, T, H> TransportEvents for ElasticNode<D, T, H>
where
    D: PeerDirectory + 'static,
    T: Transport + 'static,
    H: MessageHandler + 'static,
{
    async fn on_message(&self, remote: SocketAddr, frame: Vec<u8>) {
        match self.on_receive(&frame).await {
            Ok(outcome) => trace!(%remote, ?outcome, "Frame handled"),
            Err(err) => self.report("-", &err),
        }
    }
}
