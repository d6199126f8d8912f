//! Metadata resolvers.
//!
//! A resolver answers queries about one counterparty's published metadata.
//! Transport is a port; the provided resolver fetches a document once at
//! construction and applies the certificate chain filter before anything
//! becomes visible, so unfiltered metadata is never observable.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use fedhub_crypto::{CertificateChainValidator, Credential, KeyUsage, TrustStore};
use fedhub_saml::Role;
use parking_lot::RwLock;

use crate::error::{MetadataError, MetadataResult};
use crate::filter::CertificateChainValidationFilter;
use crate::trust_anchor::TrustAnchor;
use crate::types::{EntitiesDescriptor, EntityDescriptor};

/// Transport port: fetches a counterparty's raw metadata document.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetches the current metadata document.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Fetch`] when the document cannot be
    /// retrieved.
    async fn fetch(&self) -> MetadataResult<EntitiesDescriptor>;
}

/// Read access to one counterparty's filtered metadata.
pub trait MetadataResolver: Send + Sync {
    /// Returns the entity descriptor for `entity_id`, if published.
    fn entity_descriptor(&self, entity_id: &str) -> Option<EntityDescriptor>;

    /// Returns the credentials published for `entity_id` in `role` that
    /// may verify signatures.
    fn signing_credentials(&self, entity_id: &str, role: Role) -> Vec<Credential>;

    /// Releases the resolver's resources. Queries after shutdown answer
    /// "absent".
    fn shutdown(&self);
}

/// Builds a resolver for one trust anchor.
#[async_trait]
pub trait MetadataResolverFactory: Send + Sync {
    /// Creates a resolver whose trust store is derived from `anchor`.
    ///
    /// # Errors
    ///
    /// Returns an error when the metadata cannot be fetched, is filtered
    /// out entirely, or the anchor's chain cannot be decoded.
    async fn create(&self, anchor: &TrustAnchor) -> MetadataResult<Arc<dyn MetadataResolver>>;
}

/// Resolver that loads a document once and filters it before publication.
pub struct FilteringMetadataResolver {
    document: RwLock<Option<EntitiesDescriptor>>,
}

impl FilteringMetadataResolver {
    /// Fetches from `source`, applies `filter`, and publishes the result.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::FilteredOut`] when nothing in the
    /// document survives filtering, or the source's fetch error.
    pub async fn initialize(
        source: Arc<dyn MetadataSource>,
        filter: &CertificateChainValidationFilter,
    ) -> MetadataResult<Self> {
        let document = source.fetch().await?;
        let group = document.group_name().to_string();
        let filtered = filter
            .filter(document)
            .ok_or(MetadataError::FilteredOut(group))?;

        Ok(Self {
            document: RwLock::new(Some(filtered)),
        })
    }
}

impl MetadataResolver for FilteringMetadataResolver {
    fn entity_descriptor(&self, entity_id: &str) -> Option<EntityDescriptor> {
        self.document
            .read()
            .as_ref()
            .and_then(|document| document.entity(entity_id).cloned())
    }

    fn signing_credentials(&self, entity_id: &str, role: Role) -> Vec<Credential> {
        let guard = self.document.read();
        let Some(document) = guard.as_ref() else {
            return Vec::new();
        };
        let Some(entity) = document.entity(entity_id) else {
            return Vec::new();
        };
        let Some(role_descriptor) = entity.role(role) else {
            return Vec::new();
        };

        let mut credentials = Vec::new();
        for key_descriptor in &role_descriptor.key_descriptors {
            if !key_descriptor.supports(KeyUsage::Signing) {
                continue;
            }
            for certificate_b64 in &key_descriptor.certificates {
                let Ok(der) =
                    base64::engine::general_purpose::STANDARD.decode(certificate_b64.trim())
                else {
                    continue;
                };
                match Credential::from_certificate_der(entity_id, KeyUsage::Signing, &der) {
                    Ok(credential) => credentials.push(credential),
                    Err(e) => {
                        // The filter ran before publication, so this
                        // certificate already chain-validated.
                        tracing::warn!(entity_id, error = %e, "skipping unusable metadata certificate");
                    }
                }
            }
        }
        credentials
    }

    fn shutdown(&self) {
        *self.document.write() = None;
    }
}

/// Resolver factory that derives a trust store from the anchor's chain and
/// filters fetched metadata through it.
pub struct FilteringResolverFactory {
    source_factory: Arc<dyn MetadataSourceFactory>,
    chain_validator: Arc<dyn CertificateChainValidator>,
    role: Role,
}

/// Produces the transport source for one trust anchor.
pub trait MetadataSourceFactory: Send + Sync {
    /// Returns the source serving `anchor`'s counterparty metadata.
    fn source_for(&self, anchor: &TrustAnchor) -> Arc<dyn MetadataSource>;
}

impl FilteringResolverFactory {
    /// Creates a factory for the given role.
    #[must_use]
    pub fn new(
        source_factory: Arc<dyn MetadataSourceFactory>,
        chain_validator: Arc<dyn CertificateChainValidator>,
        role: Role,
    ) -> Self {
        Self {
            source_factory,
            chain_validator,
            role,
        }
    }
}

#[async_trait]
impl MetadataResolverFactory for FilteringResolverFactory {
    async fn create(&self, anchor: &TrustAnchor) -> MetadataResult<Arc<dyn MetadataResolver>> {
        let trust_store = TrustStore::from_certificates(anchor.certificates_der()?);
        let filter = CertificateChainValidationFilter::new(
            self.role,
            self.chain_validator.clone(),
            trust_store,
        );
        let source = self.source_factory.source_for(anchor);
        let resolver = FilteringMetadataResolver::initialize(source, &filter).await?;
        Ok(Arc::new(resolver))
    }
}
