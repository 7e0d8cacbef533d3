//! Data model shared by every stage of the extraction pipeline
//!
//! Categories come in from configuration, raw documents come out of an
//! acquisition attempt, and records are what every strategy ultimately
//! produces. `ExtractionResult` is the unit that gets persisted and cached.

pub mod category;
pub mod document;
pub mod record;
pub mod result;

pub use category::Category;
pub use document::{ContentKind, RawDocument};
pub use record::{HeaderSet, LINK_SUFFIX, Record, Scalar, link_key, placeholder_header};
pub use result::{
    AcquisitionMethod, ExtractionMetadata, ExtractionResult, StrategyDiagnostic, StrategyOutcome,
};
