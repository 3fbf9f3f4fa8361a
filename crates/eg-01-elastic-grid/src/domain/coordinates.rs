//! Grid coordinate and layout value types.

use crate::GridError;
use std::fmt;

/// A point (or wildcarded region) in the elastic grid.
///
/// Each axis is 1-indexed; `0` means "any position on this axis".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Elastic3D {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl Elastic3D {
    /// Fully wildcarded coordinate; contains every cell.
    pub const ANY: Elastic3D = Elastic3D { x: 0, y: 0, z: 0 };

    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        Self { x, y, z }
    }

    /// True when every axis is resolved (non-zero).
    pub fn is_solid(&self) -> bool {
        self.x != 0 && self.y != 0 && self.z != 0
    }

    /// Product of the three axes.
    pub fn cell_count(&self) -> u32 {
        u32::from(self.x) * u32::from(self.y) * u32::from(self.z)
    }

    /// Wildcard-aware match: every non-zero axis of `self` must equal the
    /// same axis of `point`.
    pub fn contains(&self, point: &Elastic3D) -> bool {
        (self.x == 0 || self.x == point.x)
            && (self.y == 0 || self.y == point.y)
            && (self.z == 0 || self.z == point.z)
    }

    /// The ttl of the axis round that produces a destination of this shape:
    /// `(0,0,z)` is a Z round (3), `(0,y,z)` a Y round (2), `(x,y,z)` an
    /// X round (1). A coordinate with nothing resolved maps to 0.
    pub fn round_ttl(&self) -> u8 {
        if self.x != 0 {
            1
        } else if self.y != 0 {
            2
        } else if self.z != 0 {
            3
        } else {
            0
        }
    }

    pub fn with_x(self, x: u8) -> Self {
        Self { x, ..self }
    }

    pub fn with_y(self, y: u8) -> Self {
        Self { y, ..self }
    }

    pub fn with_z(self, z: u8) -> Self {
        Self { z, ..self }
    }

    /// Wire form: `[x, y, z]`.
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GridError> {
        match bytes {
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            _ => Err(GridError::InvalidLength(bytes.len())),
        }
    }
}

impl fmt::Display for Elastic3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = |v: u8| {
            if v == 0 {
                "?".to_string()
            } else {
                v.to_string()
            }
        };
        write!(f, "({},{},{})", axis(self.x), axis(self.y), axis(self.z))
    }
}

/// Grid dimensions in force for one broadcast.
///
/// Invariant: every axis is at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElasticLayout(Elastic3D);

impl ElasticLayout {
    /// The single-cell layout used for small peer sets.
    pub const UNIT: ElasticLayout = ElasticLayout(Elastic3D { x: 1, y: 1, z: 1 });

    pub fn new(x: u8, y: u8, z: u8) -> Result<Self, GridError> {
        for (axis, value) in [('x', x), ('y', y), ('z', z)] {
            if value == 0 {
                return Err(GridError::ZeroAxis { axis });
            }
        }
        Ok(Self(Elastic3D::new(x, y, z)))
    }

    pub fn x(&self) -> u8 {
        self.0.x
    }

    pub fn y(&self) -> u8 {
        self.0.y
    }

    pub fn z(&self) -> u8 {
        self.0.z
    }

    /// `X * Y * Z`.
    pub fn cell_count(&self) -> u32 {
        self.0.cell_count()
    }

    pub fn as_coordinate(&self) -> Elastic3D {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        self.0.to_bytes()
    }

    /// Decode and validate a layout received on the wire.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GridError> {
        let raw = Elastic3D::from_bytes(bytes)?;
        Self::new(raw.x, raw.y, raw.z)
    }

    /// Every solid cell of the layout, Z outermost and X fastest.
    pub fn cells(&self) -> impl Iterator<Item = Elastic3D> {
        let (xs, ys, zs) = (self.x(), self.y(), self.z());
        (1..=zs).flat_map(move |z| {
            (1..=ys).flat_map(move |y| (1..=xs).map(move |x| Elastic3D::new(x, y, z)))
        })
    }
}

impl TryFrom<Elastic3D> for ElasticLayout {
    type Error = GridError;

    fn try_from(value: Elastic3D) -> Result<Self, Self::Error> {
        Self::new(value.x, value.y, value.z)
    }
}

impl fmt::Display for ElasticLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
