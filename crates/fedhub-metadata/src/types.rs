//! Federation metadata document model.
//!
//! The object graph the metadata filter walks: an entity group holds
//! entities, an entity holds role descriptors, a role descriptor holds key
//! descriptors, and a key descriptor carries the certificates that key
//! material must chain from.

use fedhub_crypto::KeyUsage;
use fedhub_saml::Role;
use serde::{Deserialize, Serialize};

/// A named group of entity descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitiesDescriptor {
    /// Group name, when the publisher sets one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Group document ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The member entities.
    pub entities: Vec<EntityDescriptor>,
}

impl EntitiesDescriptor {
    /// Creates a group over the given entities.
    #[must_use]
    pub fn new(entities: Vec<EntityDescriptor>) -> Self {
        Self {
            name: None,
            id: None,
            entities,
        }
    }

    /// Sets the group name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the best available identifier for logging: the name, the
    /// document ID, or `(unnamed)`.
    #[must_use]
    pub fn group_name(&self) -> &str {
        if let Some(name) = self.name.as_deref() {
            return name;
        }
        if let Some(id) = self.id.as_deref() {
            return id;
        }
        "(unnamed)"
    }

    /// Finds a member entity by entity identifier.
    #[must_use]
    pub fn entity(&self, entity_id: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|e| e.entity_id == entity_id)
    }
}

/// Published metadata for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// The entity identifier.
    pub entity_id: String,

    /// The entity's role descriptors.
    pub roles: Vec<RoleDescriptor>,
}

impl EntityDescriptor {
    /// Creates an entity descriptor.
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            roles: Vec::new(),
        }
    }

    /// Adds a role descriptor.
    #[must_use]
    pub fn with_role(mut self, role: RoleDescriptor) -> Self {
        self.roles.push(role);
        self
    }

    /// Returns the descriptor for the given role, if the entity has one.
    #[must_use]
    pub fn role(&self, role: Role) -> Option<&RoleDescriptor> {
        self.roles.iter().find(|r| r.role == role)
    }
}

/// One role an entity plays, with the key material published for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDescriptor {
    /// The role.
    pub role: Role,

    /// The published key descriptors.
    pub key_descriptors: Vec<KeyDescriptor>,
}

impl RoleDescriptor {
    /// Creates a role descriptor.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            key_descriptors: Vec::new(),
        }
    }

    /// Adds a key descriptor.
    #[must_use]
    pub fn with_key_descriptor(mut self, key_descriptor: KeyDescriptor) -> Self {
        self.key_descriptors.push(key_descriptor);
        self
    }
}

/// Published key material with its usage and certificate chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    /// The declared usage. Absent means the key serves both usages.
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<KeyUsage>,

    /// The certificates carrying the key (base64 DER).
    pub certificates: Vec<String>,
}

impl KeyDescriptor {
    /// Creates a key descriptor with the given usage.
    #[must_use]
    pub fn new(key_use: Option<KeyUsage>) -> Self {
        Self {
            key_use,
            certificates: Vec::new(),
        }
    }

    /// Adds a certificate (base64 DER).
    #[must_use]
    pub fn with_certificate(mut self, certificate_b64: impl Into<String>) -> Self {
        self.certificates.push(certificate_b64.into());
        self
    }

    /// Returns true if this key may be used for the given usage.
    #[must_use]
    pub fn supports(&self, usage: KeyUsage) -> bool {
        self.key_use.is_none() || self.key_use == Some(usage)
    }
}
