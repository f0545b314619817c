/// The error taxonomy surfaced by this crate.
///
/// All errors are synchronous and returned at the call site; none are
/// recovered internally, and a failing batch query never yields partial
/// data. Internal invariant violations (bugs, not caller misuse) panic
/// instead of returning one of these variants.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A 1-NN query was issued against an index that has never been
    /// populated, or was populated with a zero-row matrix.
    #[error("1-NN query issued against an empty index")]
    EmptyIndex,

    /// Query width didn't match the index's built width, or a
    /// fixed-width variant received a mismatched width at `set`.
    #[error("dimension mismatch: expected {expected}, got {received}")]
    DimensionMismatch { expected: usize, received: usize },

    /// Input element type doesn't match the index's metric domain.
    #[error("type mismatch: input element type does not match the index's metric domain")]
    TypeMismatch,

    /// Input was not a 2-D matrix (ragged rows, or some other shape
    /// violation).
    #[error("shape error: {0}")]
    ShapeError(String),

    /// `from_bytes` received an unknown magic/version, a bad CRC, or a
    /// truncated payload.
    #[error("corrupt input: {0}")]
    CorruptInput(String),

    /// `k < 1`, `T < 0`, or some other out-of-range parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
