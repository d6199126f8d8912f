//! The trust-anchor metadata repository.
//!
//! Owns the current map of counterparty → (metadata resolver, signature
//! trust engine) and keeps it fresh from a periodically fetched
//! trust-anchor set. Publication is generational: a refresh builds a
//! complete new generation and swaps it in atomically, so concurrent
//! readers always observe a self-consistent map, and old resolvers are
//! released only after the swap.
//!
//! The refresh loop never goes silent: whatever happens during a cycle,
//! the next one is scheduled. A healthy cycle sleeps for the configured
//! maximum delay; a failed cycle, or one that saw a trusted certificate
//! approaching expiry, sleeps for the minimum.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use fedhub_core::config::MetadataConfig;
use fedhub_core::metrics::SignatureMetrics;
use fedhub_saml::{ExplicitKeyTrustEngine, Role, TrustEngineSource};
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{MetadataError, MetadataResult};
use crate::resolver::{MetadataResolver, MetadataResolverFactory};
use crate::trust_anchor::{AnchorError, TrustAnchor};

/// Source of the current trust-anchor set.
#[async_trait]
pub trait TrustAnchorSource: Send + Sync {
    /// Fetches the trust anchors.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Fetch`] when the source is unreachable or
    /// the document is unusable.
    async fn fetch_trust_anchors(&self) -> MetadataResult<Vec<TrustAnchor>>;
}

/// Per-counterparty pairing of metadata resolver and trust engine.
///
/// Both halves are always built from the same trust-anchor generation.
struct MetadataResolverContainer {
    metadata_resolver: Arc<dyn MetadataResolver>,
    signature_trust_engine: ExplicitKeyTrustEngine,
}

/// One published generation of repository state.
struct Generation {
    trust_anchors: Vec<TrustAnchor>,
    containers: HashMap<String, MetadataResolverContainer>,
}

impl Generation {
    fn empty() -> Self {
        Self {
            trust_anchors: Vec::new(),
            containers: HashMap::new(),
        }
    }
}

/// The trust-anchor metadata repository.
pub struct TrustAnchorRepository {
    config: MetadataConfig,
    role: Role,
    trust_anchor_source: Arc<dyn TrustAnchorSource>,
    resolver_factory: Arc<dyn MetadataResolverFactory>,
    metrics: Arc<dyn SignatureMetrics>,
    state: RwLock<Arc<Generation>>,
}

impl TrustAnchorRepository {
    /// Creates a repository with an empty initial generation.
    ///
    /// Call [`refresh_once`](Self::refresh_once) or spawn the refresh
    /// task to load the first generation.
    #[must_use]
    pub fn new(
        config: MetadataConfig,
        role: Role,
        trust_anchor_source: Arc<dyn TrustAnchorSource>,
        resolver_factory: Arc<dyn MetadataResolverFactory>,
        metrics: Arc<dyn SignatureMetrics>,
    ) -> Self {
        Self {
            config,
            role,
            trust_anchor_source,
            resolver_factory,
            metrics,
            state: RwLock::new(Arc::new(Generation::empty())),
        }
    }

    /// Returns the metadata resolver published for `entity_id`, if any.
    #[must_use]
    pub fn metadata_resolver(&self, entity_id: &str) -> Option<Arc<dyn MetadataResolver>> {
        self.state
            .read()
            .containers
            .get(entity_id)
            .map(|container| container.metadata_resolver.clone())
    }

    /// Returns the signature trust engine published for `entity_id`, if
    /// any.
    #[must_use]
    pub fn signature_trust_engine(&self, entity_id: &str) -> Option<ExplicitKeyTrustEngine> {
        self.state
            .read()
            .containers
            .get(entity_id)
            .map(|container| container.signature_trust_engine.clone())
    }

    /// Lists the entity identifiers with a published container.
    #[must_use]
    pub fn resolver_entity_ids(&self) -> Vec<String> {
        self.state.read().containers.keys().cloned().collect()
    }

    /// Lists the entity identifiers of the current trust-anchor set.
    #[must_use]
    pub fn trust_anchor_entity_ids(&self) -> Vec<String> {
        self.state
            .read()
            .trust_anchors
            .iter()
            .map(|anchor| anchor.entity_id().to_string())
            .collect()
    }

    /// Runs one refresh cycle and returns the delay before the next.
    ///
    /// Never fails: a cycle that cannot complete leaves the current
    /// generation untouched and answers with the minimum delay so the
    /// next attempt comes soon.
    pub async fn refresh_once(&self) -> Duration {
        let mut delay = self.config.max_refresh_delay();
        match self.try_refresh(&mut delay).await {
            Ok(()) => delay,
            Err(e) => {
                tracing::error!(error = %e, "error fetching trust anchor or validating it");
                self.config.min_refresh_delay()
            }
        }
    }

    async fn try_refresh(&self, delay: &mut Duration) -> MetadataResult<()> {
        let new_anchors = self.trust_anchor_source.fetch_trust_anchors().await?;

        let current = self.state.read().clone();
        if !trust_anchors_differ(&current.trust_anchors, &new_anchors) {
            return Ok(());
        }
        tracing::info!("trust anchors have changed, refreshing metadata resolvers");

        let mut containers = HashMap::new();
        for anchor in &new_anchors {
            match self.create_container(anchor, delay).await {
                Ok(container) => {
                    containers.insert(anchor.entity_id().to_string(), container);
                }
                Err(e) => {
                    tracing::error!(
                        entity_id = anchor.entity_id(),
                        error = %e,
                        "error creating metadata resolver"
                    );
                }
            }
        }

        let new_generation = Arc::new(Generation {
            trust_anchors: new_anchors,
            containers,
        });
        let old_generation = {
            let mut guard = self.state.write();
            std::mem::replace(&mut *guard, new_generation)
        };
        // Release strictly after the swap so in-flight readers of the old
        // generation were never left without a resolver to read.
        for container in old_generation.containers.values() {
            container.metadata_resolver.shutdown();
        }

        Ok(())
    }

    async fn create_container(
        &self,
        anchor: &TrustAnchor,
        delay: &mut Duration,
    ) -> MetadataResult<MetadataResolverContainer> {
        let errors = anchor.find_errors();
        if !errors.is_empty() {
            if let Some(expired) = errors
                .iter()
                .find(|e| matches!(e, AnchorError::CertificateExpired(_)))
            {
                return Err(MetadataError::AnchorCertificateExpired {
                    key_id: anchor.entity_id().to_string(),
                    detail: expired.to_string(),
                });
            }
            let reasons = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(MetadataError::InvalidAnchor {
                key_id: anchor.entity_id().to_string(),
                reasons,
            });
        }

        // The earliest-expiring chain certificate governs this anchor's
        // remaining lifetime; re-check promptly once it falls inside the
        // planned refresh window.
        let certificates = anchor.certificates_by_expiry()?;
        if let Some(earliest) = certificates.first() {
            let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
            let next_run = Utc::now() + chrono::Duration::milliseconds(delay_ms);
            if earliest.not_after < next_run {
                tracing::info!(
                    entity_id = anchor.entity_id(),
                    subject = earliest.subject,
                    "trust anchor certificate approaches expiry, accelerating refresh"
                );
                *delay = self.config.min_refresh_delay();
            }
        }

        let metadata_resolver = self.resolver_factory.create(anchor).await?;
        let credentials = metadata_resolver.signing_credentials(anchor.entity_id(), self.role);
        let signature_trust_engine =
            ExplicitKeyTrustEngine::new(credentials, self.metrics.clone());

        Ok(MetadataResolverContainer {
            metadata_resolver,
            signature_trust_engine,
        })
    }

    /// Spawns the recurring refresh task.
    ///
    /// The task refreshes immediately, then sleeps for whatever delay the
    /// cycle decided, forever, until the handle is shut down. Scheduling
    /// is unconditional: a failed cycle reschedules like any other.
    #[must_use]
    pub fn spawn_refresh_task(self: Arc<Self>) -> RefreshHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let repository = self;

        let task = tokio::spawn(async move {
            loop {
                let delay = repository.refresh_once().await;
                tracing::debug!(delay_ms = delay.as_millis() as u64, "scheduling refresh");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown_rx.changed() => {
                        tracing::info!("trust anchor refresh task shutting down");
                        return;
                    }
                }
            }
        });

        RefreshHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

impl TrustEngineSource for TrustAnchorRepository {
    fn signature_trust_engine(&self, entity_id: &str) -> Option<ExplicitKeyTrustEngine> {
        Self::signature_trust_engine(self, entity_id)
    }
}

/// Handle for the background refresh task.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signals the task to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Order- and duplicate-insensitive comparison of trust-anchor sets.
fn trust_anchors_differ(current: &[TrustAnchor], fetched: &[TrustAnchor]) -> bool {
    let current: HashSet<&TrustAnchor> = current.iter().collect();
    let fetched: HashSet<&TrustAnchor> = fetched.iter().collect();
    current != fetched
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use base64::Engine;
    use fedhub_core::metrics::NoopMetrics;
    use fedhub_crypto::Credential;
    use fedhub_saml::Role;
    use parking_lot::Mutex;

    use super::*;
    use crate::types::EntityDescriptor;

    struct StubAnchorSource {
        /// `None` makes the next fetch fail.
        anchors: Mutex<Option<Vec<TrustAnchor>>>,
        fetches: AtomicUsize,
    }

    impl StubAnchorSource {
        fn serving(anchors: Vec<TrustAnchor>) -> Arc<Self> {
            Arc::new(Self {
                anchors: Mutex::new(Some(anchors)),
                fetches: AtomicUsize::new(0),
            })
        }

        fn set(&self, anchors: Option<Vec<TrustAnchor>>) {
            *self.anchors.lock() = anchors;
        }
    }

    #[async_trait]
    impl TrustAnchorSource for StubAnchorSource {
        async fn fetch_trust_anchors(&self) -> MetadataResult<Vec<TrustAnchor>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.anchors
                .lock()
                .clone()
                .ok_or_else(|| MetadataError::Fetch("trust anchor source unreachable".to_string()))
        }
    }

    struct TestResolver {
        shutdowns: Arc<AtomicUsize>,
    }

    impl MetadataResolver for TestResolver {
        fn entity_descriptor(&self, _entity_id: &str) -> Option<EntityDescriptor> {
            None
        }

        fn signing_credentials(&self, _entity_id: &str, _role: Role) -> Vec<Credential> {
            Vec::new()
        }

        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct TestResolverFactory {
        created: AtomicUsize,
        shutdowns: Arc<AtomicUsize>,
    }

    impl TestResolverFactory {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                created: AtomicUsize::new(0),
                shutdowns: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    #[async_trait]
    impl MetadataResolverFactory for TestResolverFactory {
        async fn create(
            &self,
            _anchor: &TrustAnchor,
        ) -> MetadataResult<Arc<dyn MetadataResolver>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(TestResolver {
                shutdowns: self.shutdowns.clone(),
            }))
        }
    }

    fn certificate_b64(not_after: time::OffsetDateTime) -> String {
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let mut params =
            rcgen::CertificateParams::new(vec!["anchor.example.com".to_string()]).unwrap();
        params.not_before = time::OffsetDateTime::now_utc() - time::Duration::days(1);
        params.not_after = not_after;
        let certificate = params.self_signed(&key_pair).unwrap();
        base64::engine::general_purpose::STANDARD.encode(certificate.der())
    }

    fn healthy_anchor(entity_id: &str) -> TrustAnchor {
        TrustAnchor::new(entity_id, "EC").with_certificate(certificate_b64(
            time::OffsetDateTime::now_utc() + time::Duration::days(3650),
        ))
    }

    fn soon_expiring_anchor(entity_id: &str) -> TrustAnchor {
        TrustAnchor::new(entity_id, "EC").with_certificate(certificate_b64(
            time::OffsetDateTime::now_utc() + time::Duration::hours(1),
        ))
    }

    fn expired_anchor(entity_id: &str) -> TrustAnchor {
        TrustAnchor::new(entity_id, "EC").with_certificate(certificate_b64(
            time::OffsetDateTime::now_utc() - time::Duration::days(1),
        ))
    }

    fn repository(
        source: Arc<StubAnchorSource>,
        factory: Arc<TestResolverFactory>,
    ) -> TrustAnchorRepository {
        TrustAnchorRepository::new(
            MetadataConfig::default(),
            Role::IdentityProvider,
            source,
            factory,
            Arc::new(NoopMetrics),
        )
    }

    #[tokio::test]
    async fn refresh_publishes_containers_for_each_anchor() {
        let source = StubAnchorSource::serving(vec![
            healthy_anchor("https://one.example.com"),
            healthy_anchor("https://two.example.com"),
        ]);
        let factory = TestResolverFactory::new();
        let repository = repository(source, factory.clone());

        let delay = repository.refresh_once().await;

        assert_eq!(delay, MetadataConfig::default().max_refresh_delay());
        let mut ids = repository.resolver_entity_ids();
        ids.sort();
        assert_eq!(ids, vec!["https://one.example.com", "https://two.example.com"]);
        assert!(repository
            .metadata_resolver("https://one.example.com")
            .is_some());
        assert!(TrustAnchorRepository::signature_trust_engine(
            &repository,
            "https://two.example.com"
        )
        .is_some());
        assert!(repository
            .metadata_resolver("https://unknown.example.com")
            .is_none());
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn identical_anchor_set_skips_the_rebuild() {
        let first = healthy_anchor("https://one.example.com");
        let second = healthy_anchor("https://two.example.com");
        let source = StubAnchorSource::serving(vec![first.clone(), second.clone()]);
        let factory = TestResolverFactory::new();
        let repository = repository(source.clone(), factory.clone());

        repository.refresh_once().await;
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);

        // Same set, reordered and with a duplicate: still no rebuild.
        source.set(Some(vec![second, first.clone(), first]));
        repository.refresh_once().await;

        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
        assert_eq!(factory.shutdowns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn changed_anchor_set_rebuilds_and_releases_old_resolvers() {
        let anchor_one = healthy_anchor("https://one.example.com");
        let source = StubAnchorSource::serving(vec![anchor_one.clone()]);
        let factory = TestResolverFactory::new();
        let repository = repository(source.clone(), factory.clone());

        repository.refresh_once().await;
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);

        source.set(Some(vec![anchor_one, healthy_anchor("https://two.example.com")]));
        repository.refresh_once().await;

        assert_eq!(factory.created.load(Ordering::SeqCst), 3);
        // The replaced generation's single resolver was released once.
        assert_eq!(factory.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(repository.resolver_entity_ids().len(), 2);
    }

    #[tokio::test]
    async fn source_failure_backs_off_and_preserves_state() {
        let source = StubAnchorSource::serving(vec![healthy_anchor("https://one.example.com")]);
        let factory = TestResolverFactory::new();
        let repository = repository(source.clone(), factory.clone());

        repository.refresh_once().await;
        source.set(None);

        let delay = repository.refresh_once().await;

        assert_eq!(delay, MetadataConfig::default().min_refresh_delay());
        assert_eq!(
            repository.resolver_entity_ids(),
            vec!["https://one.example.com"]
        );
        assert_eq!(factory.shutdowns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn soon_expiring_certificate_selects_the_min_delay() {
        let source =
            StubAnchorSource::serving(vec![soon_expiring_anchor("https://one.example.com")]);
        let repository = repository(source, TestResolverFactory::new());

        let delay = repository.refresh_once().await;

        assert_eq!(delay, MetadataConfig::default().min_refresh_delay());
        // The container itself is still published.
        assert_eq!(repository.resolver_entity_ids().len(), 1);
    }

    #[tokio::test]
    async fn expired_anchor_is_isolated_from_the_rest() {
        let source = StubAnchorSource::serving(vec![
            expired_anchor("https://expired.example.com"),
            healthy_anchor("https://healthy.example.com"),
        ]);
        let repository = repository(source, TestResolverFactory::new());

        repository.refresh_once().await;

        assert_eq!(
            repository.resolver_entity_ids(),
            vec!["https://healthy.example.com"]
        );
        // The anchor set itself reflects what was fetched.
        assert_eq!(repository.trust_anchor_entity_ids().len(), 2);
    }

    #[tokio::test]
    async fn invalid_anchor_is_isolated_from_the_rest() {
        let empty_chain = TrustAnchor::new("https://invalid.example.com", "EC");
        let source = StubAnchorSource::serving(vec![
            empty_chain,
            healthy_anchor("https://healthy.example.com"),
        ]);
        let repository = repository(source, TestResolverFactory::new());

        repository.refresh_once().await;

        assert_eq!(
            repository.resolver_entity_ids(),
            vec!["https://healthy.example.com"]
        );
    }

    #[tokio::test]
    async fn refresh_task_keeps_rescheduling_after_failures() {
        let source = StubAnchorSource::serving(vec![]);
        source.set(None);
        let repository = Arc::new(TrustAnchorRepository::new(
            MetadataConfig::for_testing(),
            Role::IdentityProvider,
            source.clone(),
            TestResolverFactory::new(),
            Arc::new(NoopMetrics),
        ));

        let handle = repository.spawn_refresh_task();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        // Failures back off to the 10ms test delay, so several fetch
        // attempts fit into the window; the loop never went dark.
        assert!(source.fetches.load(Ordering::SeqCst) >= 2);
    }
}
