//! Destination planning and relay candidate selection.

use eg_01_elastic_grid::{Elastic3D, ElasticLayout};
use eg_02_peer_directory::PeerEntry;
use rand::seq::SliceRandom;
use rand::Rng;
use shared_types::Address;

/// One level of the relay tree: a ttl and the destinations it is sent to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxisRound {
    pub ttl: u8,
    pub destinations: Vec<Elastic3D>,
}

/// First round of a broadcast under `layout`, or `None` for a single-cell
/// layout (direct delivery).
///
/// The outermost non-unit axis is fanned, Z before Y before X. Unit axes
/// outside the fanned one are pinned to 1.
pub fn outbound_round(layout: &ElasticLayout) -> Option<AxisRound> {
    if layout.cell_count() <= 1 {
        return None;
    }

    let destinations: Vec<Elastic3D> = if layout.z() > 1 {
        (1..=layout.z()).map(|z| Elastic3D::new(0, 0, z)).collect()
    } else if layout.y() > 1 {
        (1..=layout.y()).map(|y| Elastic3D::new(0, y, 1)).collect()
    } else {
        (1..=layout.x()).map(|x| Elastic3D::new(x, 1, 1)).collect()
    };

    let ttl = destinations.first().map(Elastic3D::round_ttl).unwrap_or(0);
    Some(AxisRound { ttl, destinations })
}

/// What a relay does with a hop it accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NextStep {
    /// Terminal hop: push to every peer in this cell.
    Deliver(Elastic3D),
    /// Fan out one axis further.
    Fan(AxisRound),
}

/// Decide the next step for a hop tagged `ttl` / `to` under `layout`.
///
/// Errors describe the protocol violation.
pub fn next_step(ttl: u8, to: Elastic3D, layout: &ElasticLayout) -> Result<NextStep, String> {
    if ttl == 1 && to.is_solid() {
        return Ok(NextStep::Deliver(to));
    }

    if to.z == 0 {
        return Err(format!("unresolved z axis in {to} at ttl {ttl}"));
    }

    match ttl {
        3 => Ok(NextStep::Fan(AxisRound {
            ttl: 2,
            destinations: (1..=layout.y()).map(|y| to.with_y(y)).collect(),
        })),
        2 if to.y != 0 => Ok(NextStep::Fan(AxisRound {
            ttl: 1,
            destinations: (1..=layout.x()).map(|x| to.with_x(x)).collect(),
        })),
        _ => Err(format!("no relay rule for ttl {ttl} to {to}")),
    }
}

/// Where a relay step goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayPlan {
    /// The local node is a candidate; handle the hop here.
    Local,
    /// Try these peers in order until one send succeeds.
    Failover(Vec<PeerEntry>),
    /// Nobody lives in the destination.
    Empty,
}

/// Shuffle `candidates` and choose between local handling and remote failover.
pub fn plan_relay<R: Rng + ?Sized>(
    mut candidates: Vec<PeerEntry>,
    local: &Address,
    rng: &mut R,
) -> RelayPlan {
    if candidates.is_empty() {
        return RelayPlan::Empty;
    }
    if candidates.iter().any(|peer| peer.address == *local) {
        return RelayPlan::Local;
    }

    candidates.shuffle(rng);
    RelayPlan::Failover(candidates)
}
