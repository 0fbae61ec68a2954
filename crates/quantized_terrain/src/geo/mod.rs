//! Globe geometry: ellipsoid, geographic rectangles, tiling scheme and
//! bounding volumes.
//!
//! All angles are radians. Cartesian positions are Earth-centered,
//! Earth-fixed (x through lon 0 / lat 0, z through the north pole).

pub mod bounds;
pub mod ellipsoid;
pub mod rectangle;
pub mod tiling;

pub use bounds::{BoundingSphere, OrientedBoundingBox};
pub use ellipsoid::Ellipsoid;
pub use rectangle::{Cartographic, Rectangle};
pub use tiling::{TilingScheme, WebMercatorTilingScheme};
