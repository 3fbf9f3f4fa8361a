//! Layout sizing and address-to-cell mapping.

use super::{Elastic3D, ElasticLayout};
use shared_crypto::keccak256;
use shared_types::Address;

/// Size a grid for `peer_count` peers with fan-out `n`.
///
/// Searches `z`, then `y`, then `x` over `1..=n` (x fastest) and returns the
/// first layout with `n * x * y * z >= peer_count`, so the grid grows along X
/// first and average cell occupancy stays near `n`.
///
/// Above `n^4` peers no layout fits and the saturated `(n, n, n)` is returned.
/// `n == 0` is treated as `1`.
pub fn define_layout(peer_count: usize, n: u8) -> ElasticLayout {
    let n = n.max(1);
    let need = peer_count as u64;
    let fan_out = u64::from(n);

    for z in 1..=n {
        for y in 1..=n {
            for x in 1..=n {
                if fan_out * u64::from(x) * u64::from(y) * u64::from(z) >= need {
                    return layout_of(x, y, z);
                }
            }
        }
    }

    layout_of(n, n, n)
}

/// Cell of `address` under `layout`.
///
/// Reads three little-endian `u32` windows of keccak256(address) at byte
/// offsets 0, 2 and 4, reduces each modulo its axis, and shifts to 1-based.
pub fn define_coordinates(layout: &ElasticLayout, address: &Address) -> Elastic3D {
    let digest = keccak256(address.as_bytes());
    let window = |offset: usize| {
        u32::from_le_bytes([
            digest[offset],
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ])
    };

    let axis = |value: u32, size: u8| (value % u32::from(size)) as u8 + 1;

    Elastic3D::new(
        axis(window(0), layout.x()),
        axis(window(2), layout.y()),
        axis(window(4), layout.z()),
    )
}

// Axes produced by the search loops are always within 1..=n.
fn layout_of(x: u8, y: u8, z: u8) -> ElasticLayout {
    ElasticLayout::new(x, y, z).unwrap_or(ElasticLayout::UNIT)
}
