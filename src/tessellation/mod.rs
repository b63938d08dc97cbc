//! Footprint tessellation
//!
//! Turns a polygon ring into geometry on the sphere:
//! - [`fan`]: triangle fan from a shared apex to the ring
//! - [`subdivide`]: adaptive 1-to-4 splitting with slerp midpoints
//! - [`cap`]: triangulated, subdivided footprint with rim tracking
//! - [`cone`]: the caps of a region closed into a solid at the globe centre

pub mod cap;
pub mod cone;
pub mod fan;
pub mod subdivide;

pub use cap::{build_cap, Cap};
pub use cone::{build_cone, CONE_REACH_MARGIN};
pub use fan::build_fan;
pub use subdivide::{
    slerp, subdivide, subdivide_leaves, Leaf, SubdivisionBudget, MAX_SUBDIVISION_DEPTH,
};
