//! Zadarma API integration.
//!
//! This crate provides:
//!
//! - **Operations**: the fixed table of provider endpoints and their parameters
//! - **Dispatcher**: signs operations and sends them over a pluggable transport
//! - **Connector**: the uniform interface the workflow host drives
//! - **Batch runner**: many input items with abort or continue-on-failure policy

pub mod batch;
pub mod connector;
pub mod credential;
pub mod dispatcher;
pub mod error;
pub mod operation;
pub mod transport;
pub mod zadarma;

pub use batch::{ApiResult, BatchOptions, FailurePolicy, execute_batch};
pub use connector::{
    Connector, ConnectorCapability, ConnectorInfo, OperationInfo, OperationMetadata,
    OperationRequest, OperationResult,
};
pub use credential::{ApiEnvironment, Credentials};
pub use dispatcher::{ApiHosts, Dispatcher, PRODUCTION_HOST, SANDBOX_HOST, SignedRequest};
pub use error::{BatchError, ConnectorError, ErrorKind};
pub use operation::{ApiOperation, NaiveDateTimeConvention, format_provider_datetime};
pub use transport::{HttpTransport, Transport};
pub use zadarma::ZadarmaConnector;
