//! Signed access to the search service.
//!
//! Contains the SigV4 request signer, the form payload encoder used by the
//! configuration API, and clients for the configuration, document and search
//! services.

mod config_client;
mod document_client;
mod payload;
mod signer;

pub use config_client::CloudSearchConfigClient;
pub use document_client::CloudSearchDocumentClient;
pub use payload::{strict_encode, FormPayload};
pub use signer::{content_md5, Credentials, RequestParts, RequestSigner, SignedRequest};
