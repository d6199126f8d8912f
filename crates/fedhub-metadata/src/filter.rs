//! Certificate chain metadata filtering.
//!
//! Federation metadata is only trusted after every piece of key material
//! in it has been chained back to the counterparty's trust store. Key
//! descriptors with invalid certificates are dropped, and emptiness
//! cascades upward: a role with no valid keys is dropped, an entity with
//! no surviving roles is dropped, and a group with no surviving entities
//! is rejected outright rather than published as an empty shell.

use std::sync::Arc;

use base64::Engine;
use fedhub_crypto::{CertificateChainValidator, CryptoError, TrustStore};
use fedhub_saml::Role;

use crate::types::{EntitiesDescriptor, EntityDescriptor, KeyDescriptor, RoleDescriptor};

/// Metadata filter that validates certificate chains against a trust
/// store.
///
/// Only key material for the configured role is chain-checked; other
/// roles pass through untouched.
pub struct CertificateChainValidationFilter {
    role: Role,
    validator: Arc<dyn CertificateChainValidator>,
    trust_store: TrustStore,
}

enum FilterError {
    /// Every key descriptor of a matching role failed validation.
    KeyDescriptorsEmpty,
    /// Every role of an entity was dropped.
    RoleDescriptorsEmpty { entity_id: String },
    /// Every entity of the group was dropped.
    EntityDescriptorsEmpty { group: String },
    /// A certificate could not be decoded; fatal for the whole pass.
    CertificateConversion(String),
}

impl CertificateChainValidationFilter {
    /// Creates a filter for the given role, validator and trust store.
    #[must_use]
    pub fn new(
        role: Role,
        validator: Arc<dyn CertificateChainValidator>,
        trust_store: TrustStore,
    ) -> Self {
        Self {
            role,
            validator,
            trust_store,
        }
    }

    /// Returns the role this filter checks.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Filters an entity group, returning `None` when nothing survives.
    ///
    /// Any unexpected certificate conversion error is fatal for the pass:
    /// the metadata is filtered out entirely rather than partially
    /// trusted.
    #[must_use]
    pub fn filter(&self, metadata: EntitiesDescriptor) -> Option<EntitiesDescriptor> {
        let group = metadata.group_name().to_string();
        match self.validated_entities_descriptor(metadata) {
            Ok(validated) => Some(validated),
            Err(FilterError::EntityDescriptorsEmpty { group }) => {
                tracing::error!(group, "validated entity descriptor list is empty");
                None
            }
            Err(FilterError::CertificateConversion(error)) => {
                tracing::error!(
                    group,
                    error,
                    "fatal error validating certificate chain, metadata will be filtered out"
                );
                None
            }
            Err(_) => {
                tracing::error!(group, "metadata will be filtered out");
                None
            }
        }
    }

    /// Filters a single-entity metadata document.
    #[must_use]
    pub fn filter_entity(&self, metadata: EntityDescriptor) -> Option<EntityDescriptor> {
        let entity_id = metadata.entity_id.clone();
        match self.validated_entity_descriptor(metadata) {
            Ok(validated) => Some(validated),
            Err(FilterError::CertificateConversion(error)) => {
                tracing::error!(
                    entity_id,
                    error,
                    "fatal error validating certificate chain, metadata will be filtered out"
                );
                None
            }
            Err(_) => {
                tracing::warn!(
                    entity_id,
                    "entity has no validated key material, removing from metadata provider"
                );
                None
            }
        }
    }

    fn validated_entities_descriptor(
        &self,
        metadata: EntitiesDescriptor,
    ) -> Result<EntitiesDescriptor, FilterError> {
        let group = metadata.group_name().to_string();
        tracing::trace!(group, "processing entities descriptor group");

        let mut validated_entities = Vec::new();
        for entity in metadata.entities {
            let entity_id = entity.entity_id.clone();
            match self.validated_entity_descriptor(entity) {
                Ok(validated) => validated_entities.push(validated),
                Err(FilterError::RoleDescriptorsEmpty { .. }) => {
                    tracing::warn!(
                        entity_id,
                        "entity has empty validated role descriptor list, removing from metadata provider"
                    );
                }
                Err(fatal) => return Err(fatal),
            }
        }

        if validated_entities.is_empty() {
            return Err(FilterError::EntityDescriptorsEmpty { group });
        }

        Ok(EntitiesDescriptor {
            name: metadata.name,
            id: metadata.id,
            entities: validated_entities,
        })
    }

    fn validated_entity_descriptor(
        &self,
        entity: EntityDescriptor,
    ) -> Result<EntityDescriptor, FilterError> {
        tracing::trace!(entity_id = entity.entity_id, "validating entity descriptor");

        let mut validated_roles = Vec::new();
        for role_descriptor in entity.roles {
            if role_descriptor.role != self.role {
                // Not the role this filter is scoped to; pass through.
                validated_roles.push(role_descriptor);
                continue;
            }
            match self.validated_key_descriptors(&role_descriptor) {
                Ok(key_descriptors) => validated_roles.push(RoleDescriptor {
                    role: role_descriptor.role,
                    key_descriptors,
                }),
                Err(FilterError::KeyDescriptorsEmpty) => {
                    tracing::warn!(
                        entity_id = entity.entity_id,
                        role = role_descriptor.role.element_name(),
                        "role has empty validated key descriptor list, removing from metadata provider"
                    );
                }
                Err(fatal) => return Err(fatal),
            }
        }

        if validated_roles.is_empty() {
            return Err(FilterError::RoleDescriptorsEmpty {
                entity_id: entity.entity_id,
            });
        }

        Ok(EntityDescriptor {
            entity_id: entity.entity_id,
            roles: validated_roles,
        })
    }

    fn validated_key_descriptors(
        &self,
        role_descriptor: &RoleDescriptor,
    ) -> Result<Vec<KeyDescriptor>, FilterError> {
        let mut validated = Vec::new();

        for key_descriptor in &role_descriptor.key_descriptors {
            let mut valid_certificate = true;
            for certificate_b64 in &key_descriptor.certificates {
                let der = base64::engine::general_purpose::STANDARD
                    .decode(certificate_b64.trim())
                    .map_err(|e| FilterError::CertificateConversion(e.to_string()))?;
                match self.validator.validate(&der, &self.trust_store) {
                    Ok(validity) if validity.is_valid() => {}
                    Ok(_) => {
                        tracing::error!(
                            "certificate chain validation failed for metadata entry"
                        );
                        valid_certificate = false;
                    }
                    Err(CryptoError::CertificateConversion(e)) => {
                        return Err(FilterError::CertificateConversion(e));
                    }
                    Err(e) => {
                        return Err(FilterError::CertificateConversion(e.to_string()));
                    }
                }
            }
            if valid_certificate {
                validated.push(key_descriptor.clone());
            }
        }

        if validated.is_empty() {
            return Err(FilterError::KeyDescriptorsEmpty);
        }
        Ok(validated)
    }
}
