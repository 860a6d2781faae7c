//! Domain model (ids, status, records, errors, drain report).

pub mod errors;
pub mod ids;
pub mod record;
pub mod report;
pub mod status;

pub use errors::{ConfigError, StoreError, TransportError};
pub use ids::RecordId;
pub use record::{NewRecord, OutboundRequest, RequestDescriptor, RequestRecord};
pub use report::{DrainOutcome, DrainReport};
pub use status::RequestStatus;
