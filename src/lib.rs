//! # invoice-mill – Invoice editor state → themed preview → A4 PDF
//!
//! This crate models a single invoice being edited and turns it into a
//! printable document. The pipeline stages are:
//!
//! 1. **Edit** – pure reducer over [`model::InvoiceState`] ([`state`])
//! 2. **Compute** – derived totals from items, discount and tax ([`totals`])
//! 3. **Preview** – draw the invoice onto an RGBA raster ([`preview`])
//! 4. **Paginate** – fit the raster onto fixed-size pages ([`paginate`])
//! 5. **Export** – emit PDF bytes via printpdf ([`export`])
//!
//! Snapshots persist through [`store`]; sign-in state lives in [`session`].

pub mod error;
pub mod export;
pub mod fonts;
pub mod model;
pub mod paginate;
pub mod preview;
pub mod session;
pub mod state;
pub mod store;
pub mod theme;
pub mod totals;

// Re-exports for convenience
pub use error::MillError;
pub use export::{export_invoice, Exporter};
pub use model::{ActiveFields, FieldKey, InvoiceState, LineItem};
pub use state::{reduce, Action};
pub use totals::Totals;
