//! Error types for invoice-mill.

use thiserror::Error;

/// Errors surfaced by the invoice pipeline.
///
/// Numeric parse failures are deliberately absent: user-entered numbers that
/// fail to parse are coerced to 0 at the reducer boundary instead of being
/// rejected (see [`crate::state::coerce_number`]). A corrupt snapshot is also
/// not an error: the store logs it and reports "no saved invoice".
#[derive(Debug, Error)]
pub enum MillError {
    /// The preview raster could not be produced.
    #[error("Preview capture failed: {0}")]
    Capture(String),

    /// Pagination or PDF serialization failed.
    #[error("PDF export failed: {0}")]
    Export(String),

    /// A new export was requested while one is already in flight.
    #[error("An export is already in progress")]
    ExportInFlight,

    /// The snapshot could not be written.
    #[error("Snapshot save failed: {0}")]
    Store(String),

    /// Identity-provider failure, displayed inline on the sign-in surface.
    #[error("Sign-in failed: {0}")]
    Auth(String),

    /// Filesystem error while writing a snapshot or PDF.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
