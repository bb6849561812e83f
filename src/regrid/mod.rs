//! Parcel record extraction and validation against the Regrid map viewer.

pub mod error;
pub mod jurisdiction;
pub mod mapper;
pub mod models;
pub mod orchestrator;
pub mod panel;
pub mod quality;
pub mod selectors;
pub mod session;
pub mod snapshot;
pub mod strategy;
pub mod validator;

pub use error::ExtractionFailure;
pub use jurisdiction::{BoundingBox, BoundsEntry, BoundsTable, Jurisdiction};
pub use mapper::FieldMapper;
pub use models::{
    AttemptOutcome, AttemptRecord, LocationDiagnostics, PropertyRecord, QualityMode, RawFieldMap,
    SearchInput, SearchStrategy,
};
pub use orchestrator::{extract_property, ExtractionSettings, ExtractionState, Extractor};
pub use session::{BrowserSession, ScrollDirection};
pub use snapshot::SnapshotSession;
pub use validator::{LocationCheck, LocationValidator};
