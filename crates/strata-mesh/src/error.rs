//! Mesh building error types.

/// Errors raised when chunk build inputs violate their preconditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    /// A chunk dimension was zero.
    #[error("chunk {axis} must be greater than zero")]
    ZeroDimension {
        /// Which dimension (`width`, `length`, or `height`).
        axis: &'static str,
    },

    /// The chunk has more cubes than a `u32` index buffer can address.
    #[error("chunk of {cubes} cubes exceeds the limit of {max} per chunk")]
    TooManyCubes {
        /// Requested `width * length * height`.
        cubes: u64,
        /// Largest supported cube count.
        max: u64,
    },
}
