//! # fedhub-metadata
//!
//! Trust anchors and counterparty metadata for the fedhub identity hub:
//!
//! - **Trust anchors** - JWK-shaped trust statements with defensive
//!   validation and expiry-aware chain handling
//! - **Metadata filtering** - certificate-chain validation over fetched
//!   metadata, with cascading removal of unvalidated key material
//! - **Resolvers** - per-counterparty filtered metadata access behind
//!   narrow transport ports
//! - **The repository** - the background-refreshed, atomically swapped
//!   map of counterparty → (resolver, trust engine) that the validation
//!   layer reads
//!
//! Transport (how anchors and metadata documents are fetched) is a port;
//! this crate owns what happens to them once fetched.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod filter;
pub mod repository;
pub mod resolver;
pub mod trust_anchor;
pub mod types;

pub use error::{MetadataError, MetadataResult};
pub use filter::CertificateChainValidationFilter;
pub use repository::{RefreshHandle, TrustAnchorRepository, TrustAnchorSource};
pub use resolver::{
    FilteringMetadataResolver, FilteringResolverFactory, MetadataResolver,
    MetadataResolverFactory, MetadataSource, MetadataSourceFactory,
};
pub use trust_anchor::{AnchorCertificate, AnchorError, TrustAnchor, TrustAnchorDocument};
pub use types::{EntitiesDescriptor, EntityDescriptor, KeyDescriptor, RoleDescriptor};
