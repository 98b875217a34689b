//! Migration service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    diagnostics::ErrorReporter,
    migration::MigrationError,
    objects::{ObjectKey, Scope},
    secrets::{CandidateSecret, MigrationSource, SecretsRepository, TOKEN_SECRET_LABEL},
    storage::TokenStorage,
    tokens::{AccessToken, AccessTokensRepository, TokenMatcher, TokenProvisioner},
};

/// When a candidate secret is deleted relative to storing its payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionOrder {
    /// Delete before anything else. A later failure loses the credentials;
    /// only the diagnostic record remains.
    Eager,

    /// Delete once the payload is stored. A failed candidate stays in place
    /// and is retried on the next trigger.
    #[default]
    Deferred,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Secrets whose payload was stored.
    pub migrated: Vec<ObjectKey>,

    /// Secrets that failed and were diagnosed.
    pub failed: Vec<ObjectKey>,

    /// The batch stopped early on cancellation. Unprocessed secrets are untouched.
    pub interrupted: bool,
}

impl MigrationReport {
    /// Whether every candidate in the batch was migrated.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Collaborators of [`TokenMigrationService`].
#[derive(Clone)]
pub struct MigrationParts {
    /// Source of candidate secrets.
    pub secrets: Arc<dyn SecretsRepository>,
    /// Access tokens, read by name.
    pub tokens: Arc<dyn AccessTokensRepository>,
    /// Finds access tokens by provider URL.
    pub matcher: Arc<dyn TokenMatcher>,
    /// Creates access tokens.
    pub provisioner: Arc<dyn TokenProvisioner>,
    /// Destination of the credentials.
    pub storage: Arc<dyn TokenStorage>,
    /// Records per-secret failures.
    pub reporter: Arc<dyn ErrorReporter>,
}

/// Moves credentials from token secrets into token storage.
#[derive(Clone)]
pub struct TokenMigrationService {
    parts: MigrationParts,
    deletion: DeletionOrder,
}

impl TokenMigrationService {
    /// Creates a service over `parts`, deleting secrets in `deletion` order.
    #[must_use]
    pub fn new(parts: MigrationParts, deletion: DeletionOrder) -> Self {
        Self { parts, deletion }
    }

    async fn migrate(&self, candidate: &CandidateSecret) -> Result<AccessToken, MigrationError> {
        // Credentials that can not be read are never deleted, whatever the order.
        let payload = candidate
            .payload()
            .map_err(|source| MigrationError::MalformedCandidate {
                key: candidate.key.clone(),
                source,
            })?;

        if self.deletion == DeletionOrder::Eager {
            self.retire(candidate).await?;
        }

        let token = self.resolve(candidate).await?;

        self.parts
            .storage
            .store(&token, &payload)
            .await
            .map_err(|source| MigrationError::StoreFailure {
                owner: token.key.clone(),
                source,
            })?;

        if self.deletion == DeletionOrder::Deferred {
            self.retire(candidate).await?;
        }

        self.parts.reporter.clear(&candidate.key).await;

        Ok(token)
    }

    async fn retire(&self, candidate: &CandidateSecret) -> Result<(), MigrationError> {
        self.parts
            .secrets
            .delete(&candidate.key)
            .await
            .map_err(|source| MigrationError::DeleteFailure {
                key: candidate.key.clone(),
                source,
            })
    }

    async fn resolve(&self, candidate: &CandidateSecret) -> Result<AccessToken, MigrationError> {
        let namespace = &candidate.key.namespace;

        let source = candidate
            .source()
            .map_err(|source| MigrationError::MalformedCandidate {
                key: candidate.key.clone(),
                source,
            })?;

        match source {
            MigrationSource::TokenReference(name) => {
                let key = ObjectKey::new(namespace.as_str(), name);

                let token = self
                    .parts
                    .tokens
                    .get(&key)
                    .await
                    .map_err(|source| MigrationError::LookupFailure {
                        namespace: namespace.clone(),
                        source,
                    })?
                    .ok_or(MigrationError::UnresolvedReference(key))?;

                debug!(access_token = %token.key, "access token found by name");

                Ok(token)
            }
            MigrationSource::ProviderUrl(provider_url) => {
                let matched = self
                    .parts
                    .matcher
                    .find_by_provider(namespace, &provider_url)
                    .await
                    .map_err(|source| MigrationError::LookupFailure {
                        namespace: namespace.clone(),
                        source,
                    })?;

                if let Some(token) = matched {
                    debug!(access_token = %token.key, "access token found by provider url");

                    return Ok(token);
                }

                info!(
                    secret = %candidate.key,
                    provider_url = %provider_url,
                    "no access token for provider, creating one"
                );

                self.parts
                    .provisioner
                    .create_for(&provider_url, namespace)
                    .await
                    .map_err(|source| MigrationError::ProvisionFailure {
                        provider_url: provider_url.clone(),
                        source,
                    })
            }
        }
    }

    async fn run_batch(
        &self,
        candidates: Vec<CandidateSecret>,
        cancel: &CancellationToken,
    ) -> Result<MigrationReport, MigrationError> {
        let mut report = MigrationReport::default();
        let total = candidates.len();

        for candidate in candidates {
            // A started secret always runs to completion.
            if cancel.is_cancelled() {
                info!(
                    remaining = total - report.migrated.len() - report.failed.len(),
                    "migration cancelled, leaving remaining secrets for the next pass"
                );

                report.interrupted = true;
                break;
            }

            match self.migrate(&candidate).await {
                Ok(token) => {
                    info!(
                        secret = %candidate.key,
                        access_token = %token.key,
                        "token secret migrated"
                    );

                    report.migrated.push(candidate.key);
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    let message = error.diagnostic_message();

                    warn!(secret = %candidate.key, "token secret migration failed: {message}");

                    self.parts.reporter.report(&candidate, &message).await;
                    report.failed.push(candidate.key);
                }
            }
        }

        Ok(report)
    }
}

#[async_trait]
impl MigrationService for TokenMigrationService {
    async fn reconcile(&self, scope: &Scope) -> Result<MigrationReport, MigrationError> {
        self.reconcile_until(scope, &CancellationToken::new()).await
    }

    async fn reconcile_until(
        &self,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> Result<MigrationReport, MigrationError> {
        let candidates = self
            .parts
            .secrets
            .list_labeled(scope, TOKEN_SECRET_LABEL)
            .await
            .map_err(MigrationError::ListingFailure)?;

        debug!(count = candidates.len(), "token secrets listed");

        self.run_batch(candidates, cancel).await
    }

    async fn migrate_batch(
        &self,
        candidates: Vec<CandidateSecret>,
    ) -> Result<MigrationReport, MigrationError> {
        self.run_batch(candidates, &CancellationToken::new()).await
    }
}

#[automock]
#[async_trait]
/// Migrates token secrets into access tokens and token storage.
pub trait MigrationService: Send + Sync {
    /// Lists the labeled token secrets in `scope` and migrates them.
    async fn reconcile(&self, scope: &Scope) -> Result<MigrationReport, MigrationError>;

    /// Like [`MigrationService::reconcile`], but checks `cancel` before each
    /// secret and stops there. The secret in progress is always finished.
    async fn reconcile_until(
        &self,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> Result<MigrationReport, MigrationError>;

    /// Migrates `candidates` in order.
    ///
    /// Per-secret failures are recorded as diagnostics and the batch moves on;
    /// a secret that cannot be deleted ends the batch with the error.
    async fn migrate_batch(
        &self,
        candidates: Vec<CandidateSecret>,
    ) -> Result<MigrationReport, MigrationError>;
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;
    use testresult::TestResult;

    use crate::{
        context::{AppContext, MigrationSettings},
        diagnostics::{DiagnosticRecord, MockErrorReporter},
        objects::{RepositoryError, memory::InMemoryCluster},
        secrets::{MockSecretsRepository, PROVIDER_URL_KEY, TOKEN_DATA_KEY},
        storage::{MemoryTokenStorage, MockTokenStorage, TokenStorageError},
        test::{
            TestContext,
            helpers::{
                NAMESPACE, PROVIDER_URL, access_token, labeled_secret, provider_secret,
                reference_secret,
            },
        },
        tokens::{
            MockAccessTokensRepository, MockTokenMatcher, MockTokenProvisioner, ProvisionError,
            RepositoryTokenProvisioner, TokenNaming, TokenPayload,
        },
    };

    use super::*;

    fn key(name: &str) -> ObjectKey {
        ObjectKey::new(NAMESPACE, name)
    }

    #[tokio::test]
    async fn provider_url_without_token_creates_one_and_stores_payload() -> TestResult {
        let ctx = TestContext::eager();
        ctx.cluster
            .insert_secret(provider_secret("git-credentials", PROVIDER_URL))
            .await;

        let report = ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        let tokens = ctx.cluster.tokens().await;
        assert_eq!(report.migrated, vec![key("git-credentials")]);
        assert_eq!(tokens.len(), 1, "exactly one access token should be created");

        let token = tokens.first().ok_or("missing token")?;
        assert_eq!(token.service_provider_url, PROVIDER_URL);
        assert_eq!(ctx.storage.writes().await, 1);
        assert_eq!(
            ctx.storage.payload(&token.key).await,
            Some(TokenPayload::new("bot", "abc123"))
        );
        assert!(ctx.cluster.secret(&key("git-credentials")).await.is_none());
        assert!(ctx.cluster.diagnostic(&key("git-credentials")).await.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn provider_url_matching_existing_token_reuses_it() -> TestResult {
        let ctx = TestContext::new();
        let existing = access_token("hand-made", PROVIDER_URL);
        ctx.cluster.insert_token(existing.clone()).await;
        ctx.cluster
            .insert_secret(provider_secret("git-credentials", PROVIDER_URL))
            .await;

        ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        assert_eq!(ctx.cluster.tokens().await, vec![existing.clone()]);
        assert_eq!(
            ctx.storage.payload(&existing.key).await,
            Some(TokenPayload::new("bot", "abc123"))
        );

        Ok(())
    }

    #[tokio::test]
    async fn token_reference_stores_payload_for_named_token() -> TestResult {
        let ctx = TestContext::new();
        let existing = access_token("github", "https://github.com");
        ctx.cluster.insert_token(existing.clone()).await;
        ctx.cluster
            .insert_secret(reference_secret("git-credentials", "github"))
            .await;

        let report = ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        assert!(report.is_clean());
        assert_eq!(ctx.cluster.tokens().await.len(), 1);
        assert!(ctx.storage.payload(&existing.key).await.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn unresolved_reference_is_diagnosed_and_nothing_is_stored() -> TestResult {
        let ctx = TestContext::eager();
        ctx.cluster
            .insert_secret(reference_secret("git-credentials", "missing-token"))
            .await;

        let report = ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        let record = ctx
            .cluster
            .diagnostic(&key("git-credentials"))
            .await
            .ok_or("expected a diagnostic record")?;

        assert_eq!(report.failed, vec![key("git-credentials")]);
        assert!(record.message.contains("missing-token"), "{}", record.message);
        assert_eq!(record.involved_object.name, "git-credentials");
        assert_eq!(ctx.storage.writes().await, 0);
        assert!(ctx.cluster.tokens().await.is_empty());
        assert!(
            ctx.cluster.secret(&key("git-credentials")).await.is_none(),
            "eager deletion removes the secret even on failure"
        );

        Ok(())
    }

    #[tokio::test]
    async fn malformed_candidate_is_diagnosed() -> TestResult {
        let ctx = TestContext::eager();
        ctx.cluster
            .insert_secret(labeled_secret("git-credentials"))
            .await;

        let report = ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        let record = ctx
            .cluster
            .diagnostic(&key("git-credentials"))
            .await
            .ok_or("expected a diagnostic record")?;

        assert_eq!(report.failed, vec![key("git-credentials")]);
        assert!(record.message.contains("neither spiTokenName nor providerUrl"));

        Ok(())
    }

    #[tokio::test]
    async fn success_clears_previous_diagnostic() -> TestResult {
        let ctx = TestContext::new();
        let secret = provider_secret("git-credentials", PROVIDER_URL);
        ctx.cluster
            .insert_diagnostic(DiagnosticRecord::for_secret(&secret, "store failed"))
            .await;
        ctx.cluster.insert_secret(secret).await;

        ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        assert!(ctx.cluster.diagnostic(&key("git-credentials")).await.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn retriggering_after_success_does_nothing() -> TestResult {
        let ctx = TestContext::new();
        ctx.cluster
            .insert_secret(provider_secret("git-credentials", PROVIDER_URL))
            .await;

        ctx.migration.reconcile(&Scope::AllNamespaces).await?;
        let second = ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        assert_eq!(second, MigrationReport::default());
        assert_eq!(ctx.cluster.tokens().await.len(), 1);
        assert_eq!(ctx.storage.writes().await, 1);

        Ok(())
    }

    #[tokio::test]
    async fn batch_continues_past_diagnosed_failures() -> TestResult {
        let ctx = TestContext::new();
        ctx.cluster.insert_secret(labeled_secret("broken")).await;
        ctx.cluster
            .insert_secret(provider_secret("git-credentials", PROVIDER_URL))
            .await;

        let report = ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        assert_eq!(report.failed, vec![key("broken")]);
        assert_eq!(report.migrated, vec![key("git-credentials")]);
        assert!(!report.is_clean());

        Ok(())
    }

    #[tokio::test]
    async fn deferred_deletion_keeps_failed_candidates() -> TestResult {
        let ctx = TestContext::new();
        ctx.cluster
            .insert_secret(reference_secret("git-credentials", "missing-token"))
            .await;

        ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        assert!(ctx.cluster.secret(&key("git-credentials")).await.is_some());
        assert!(ctx.cluster.diagnostic(&key("git-credentials")).await.is_some());

        ctx.cluster
            .insert_token(access_token("missing-token", PROVIDER_URL))
            .await;

        let report = ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        assert_eq!(report.migrated, vec![key("git-credentials")]);
        assert!(ctx.cluster.secret(&key("git-credentials")).await.is_none());
        assert!(ctx.cluster.diagnostic(&key("git-credentials")).await.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn reconcile_is_scoped_to_namespace() -> TestResult {
        let ctx = TestContext::new();
        let other = CandidateSecret::new(ObjectKey::new("team-b", "git-credentials"))
            .with_label(TOKEN_SECRET_LABEL, "true");
        ctx.cluster.insert_secret(other.clone()).await;
        ctx.cluster
            .insert_secret(provider_secret("git-credentials", PROVIDER_URL))
            .await;

        let report = ctx
            .migration
            .reconcile(&Scope::Namespace(NAMESPACE.to_string()))
            .await?;

        assert_eq!(report.migrated, vec![key("git-credentials")]);
        assert_eq!(ctx.cluster.secret(&other.key).await, Some(other));

        Ok(())
    }

    #[tokio::test]
    async fn store_failure_is_diagnosed() -> TestResult {
        let cluster = InMemoryCluster::new();
        let mut storage = MockTokenStorage::new();

        storage.expect_store().times(1).returning(|_, _| {
            Err(TokenStorageError::UnexpectedResponse(
                "store request failed with status 403".to_string(),
            ))
        });

        let app = AppContext::from_parts(
            Arc::new(cluster.clone()),
            Arc::new(storage),
            MigrationSettings::default(),
        );
        cluster
            .insert_secret(provider_secret("git-credentials", PROVIDER_URL))
            .await;

        let report = app.migration.reconcile(&Scope::AllNamespaces).await?;

        let record = cluster
            .diagnostic(&key("git-credentials"))
            .await
            .ok_or("expected a diagnostic record")?;

        assert_eq!(report.failed, vec![key("git-credentials")]);
        assert!(record.message.starts_with("can not store token"), "{}", record.message);
        assert!(record.message.contains("403"), "{}", record.message);
        assert!(cluster.secret(&key("git-credentials")).await.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let mut secrets = MockSecretsRepository::new();

        secrets
            .expect_list_labeled()
            .withf(|_, label| label == TOKEN_SECRET_LABEL)
            .returning(|_, _| Err(RepositoryError::UnexpectedResponse("503".to_string())));

        let service = TokenMigrationService::new(
            MigrationParts {
                secrets: Arc::new(secrets),
                tokens: Arc::new(MockAccessTokensRepository::new()),
                matcher: Arc::new(MockTokenMatcher::new()),
                provisioner: Arc::new(MockTokenProvisioner::new()),
                storage: Arc::new(MockTokenStorage::new()),
                reporter: Arc::new(MockErrorReporter::new()),
            },
            DeletionOrder::Eager,
        );

        let result = service.reconcile(&Scope::AllNamespaces).await;

        assert!(
            matches!(result, Err(MigrationError::ListingFailure(_))),
            "expected ListingFailure, got {result:?}"
        );
    }

    #[tokio::test]
    async fn eager_delete_failure_stops_the_batch() {
        let mut secrets = MockSecretsRepository::new();
        let mut reporter = MockErrorReporter::new();
        let mut storage = MockTokenStorage::new();

        secrets
            .expect_delete()
            .times(1)
            .returning(|_| Err(RepositoryError::UnexpectedResponse("403".to_string())));
        reporter.expect_report().never();
        storage.expect_store().never();

        let service = TokenMigrationService::new(
            MigrationParts {
                secrets: Arc::new(secrets),
                tokens: Arc::new(MockAccessTokensRepository::new()),
                matcher: Arc::new(MockTokenMatcher::new()),
                provisioner: Arc::new(MockTokenProvisioner::new()),
                storage: Arc::new(storage),
                reporter: Arc::new(reporter),
            },
            DeletionOrder::Eager,
        );

        let result = service
            .migrate_batch(vec![
                provider_secret("first", PROVIDER_URL),
                provider_secret("second", PROVIDER_URL),
            ])
            .await;

        assert!(
            matches!(
                result,
                Err(MigrationError::DeleteFailure { key: ref failed, .. }) if failed.name == "first"
            ),
            "expected DeleteFailure for the first secret, got {result:?}"
        );
    }

    #[tokio::test]
    async fn eager_order_deletes_before_provisioning_and_storing() -> TestResult {
        let mut sequence = Sequence::new();
        let mut secrets = MockSecretsRepository::new();
        let mut matcher = MockTokenMatcher::new();
        let mut provisioner = MockTokenProvisioner::new();
        let mut storage = MockTokenStorage::new();
        let mut reporter = MockErrorReporter::new();

        secrets
            .expect_delete()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        matcher
            .expect_find_by_provider()
            .withf(|namespace, url| namespace == NAMESPACE && url == PROVIDER_URL)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(None));
        provisioner
            .expect_create_for()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|url, _| Ok(access_token("generated-spi-access-token-x", url)));
        storage
            .expect_store()
            .withf(|owner, payload| {
                owner.key.name == "generated-spi-access-token-x"
                    && *payload == TokenPayload::new("bot", "abc123")
            })
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(()));
        reporter
            .expect_clear()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| ());

        let service = TokenMigrationService::new(
            MigrationParts {
                secrets: Arc::new(secrets),
                tokens: Arc::new(MockAccessTokensRepository::new()),
                matcher: Arc::new(matcher),
                provisioner: Arc::new(provisioner),
                storage: Arc::new(storage),
                reporter: Arc::new(reporter),
            },
            DeletionOrder::Eager,
        );

        let report = service
            .migrate_batch(vec![provider_secret("git-credentials", PROVIDER_URL)])
            .await?;

        assert_eq!(report.migrated, vec![key("git-credentials")]);

        Ok(())
    }

    #[tokio::test]
    async fn deferred_order_stores_before_deleting() -> TestResult {
        let mut sequence = Sequence::new();
        let mut secrets = MockSecretsRepository::new();
        let mut tokens = MockAccessTokensRepository::new();
        let mut storage = MockTokenStorage::new();
        let mut reporter = MockErrorReporter::new();

        tokens
            .expect_get()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|key| Ok(Some(access_token(&key.name, PROVIDER_URL))));
        storage
            .expect_store()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(()));
        secrets
            .expect_delete()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        reporter
            .expect_clear()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| ());

        let service = TokenMigrationService::new(
            MigrationParts {
                secrets: Arc::new(secrets),
                tokens: Arc::new(tokens),
                matcher: Arc::new(MockTokenMatcher::new()),
                provisioner: Arc::new(MockTokenProvisioner::new()),
                storage: Arc::new(storage),
                reporter: Arc::new(reporter),
            },
            DeletionOrder::Deferred,
        );

        service
            .migrate_batch(vec![reference_secret("git-credentials", "github")])
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn derived_naming_converges_when_matcher_misses_a_concurrent_create() -> TestResult {
        let cluster = Arc::new(InMemoryCluster::new());
        let storage = MemoryTokenStorage::new();
        let mut matcher = MockTokenMatcher::new();

        // A stale listing: the token created for the first secret is never seen.
        matcher.expect_find_by_provider().returning(|_, _| Ok(None));

        let service = TokenMigrationService::new(
            MigrationParts {
                secrets: cluster.clone(),
                tokens: cluster.clone(),
                matcher: Arc::new(matcher),
                provisioner: Arc::new(RepositoryTokenProvisioner::new(
                    cluster.clone(),
                    TokenNaming::Derived,
                )),
                storage: Arc::new(storage.clone()),
                reporter: Arc::new(crate::diagnostics::RecordErrorReporter::new(
                    cluster.clone(),
                )),
            },
            DeletionOrder::Deferred,
        );

        cluster
            .insert_secret(provider_secret("first", PROVIDER_URL))
            .await;
        cluster
            .insert_secret(provider_secret("second", PROVIDER_URL))
            .await;

        let report = service.reconcile(&Scope::AllNamespaces).await?;

        assert_eq!(report.migrated.len(), 2);
        assert_eq!(cluster.tokens().await.len(), 1, "both secrets share one token");
        assert_eq!(storage.writes().await, 2);

        Ok(())
    }

    #[tokio::test]
    async fn non_utf8_credentials_are_diagnosed_and_kept() -> TestResult {
        let ctx = TestContext::new();
        ctx.cluster
            .insert_secret(
                provider_secret("git-credentials", PROVIDER_URL)
                    .with_data(TOKEN_DATA_KEY, vec![97, 255, 98]),
            )
            .await;

        let report = ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        let record = ctx
            .cluster
            .diagnostic(&key("git-credentials"))
            .await
            .ok_or("expected a diagnostic record")?;

        assert_eq!(report.failed, vec![key("git-credentials")]);
        assert!(report.migrated.is_empty());
        assert!(record.message.contains("not valid UTF-8"), "{}", record.message);
        assert_eq!(ctx.storage.writes().await, 0, "altered credentials must not be stored");
        assert!(ctx.cluster.tokens().await.is_empty());
        assert!(ctx.cluster.secret(&key("git-credentials")).await.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn unreadable_credentials_survive_eager_deletion() -> TestResult {
        let ctx = TestContext::eager();
        ctx.cluster
            .insert_secret(
                provider_secret("git-credentials", PROVIDER_URL)
                    .with_data(TOKEN_DATA_KEY, vec![97, 255, 98]),
            )
            .await;

        let report = ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        assert_eq!(report.failed, vec![key("git-credentials")]);
        assert!(ctx.cluster.secret(&key("git-credentials")).await.is_some());
        assert_eq!(ctx.storage.writes().await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn undecodable_secret_data_is_diagnosed() -> TestResult {
        let ctx = TestContext::new();
        let mut secret = labeled_secret("git-credentials");
        secret.undecodable.insert(PROVIDER_URL_KEY.to_string());
        ctx.cluster.insert_secret(secret).await;

        let report = ctx.migration.reconcile(&Scope::AllNamespaces).await?;

        let record = ctx
            .cluster
            .diagnostic(&key("git-credentials"))
            .await
            .ok_or("expected a diagnostic record")?;

        assert_eq!(report.failed, vec![key("git-credentials")]);
        assert!(record.message.contains("not valid base64"), "{}", record.message);

        Ok(())
    }

    #[tokio::test]
    async fn provision_failure_is_diagnosed_and_batch_continues() -> TestResult {
        let mut secrets = MockSecretsRepository::new();
        let mut tokens = MockAccessTokensRepository::new();
        let mut matcher = MockTokenMatcher::new();
        let mut provisioner = MockTokenProvisioner::new();
        let mut storage = MockTokenStorage::new();
        let mut reporter = MockErrorReporter::new();

        matcher
            .expect_find_by_provider()
            .times(1)
            .returning(|_, _| Ok(None));
        provisioner.expect_create_for().times(1).returning(|_, namespace| {
            Err(ProvisionError::Rejected(
                ObjectKey::new(namespace, "generated-spi-access-token-x"),
                RepositoryError::UnexpectedResponse("403 forbidden".to_string()),
            ))
        });
        reporter
            .expect_report()
            .withf(|secret, message| {
                secret.key.name == "first"
                    && message.starts_with("can not create SPI access token for https://git.example.com")
                    && message.contains("403 forbidden")
            })
            .times(1)
            .returning(|_, _| ());
        tokens
            .expect_get()
            .times(1)
            .returning(|key| Ok(Some(access_token(&key.name, PROVIDER_URL))));
        storage.expect_store().times(1).returning(|_, _| Ok(()));
        secrets
            .expect_delete()
            .withf(|key| key.name == "second")
            .times(1)
            .returning(|_| Ok(()));
        reporter.expect_clear().times(1).returning(|_| ());

        let service = TokenMigrationService::new(
            MigrationParts {
                secrets: Arc::new(secrets),
                tokens: Arc::new(tokens),
                matcher: Arc::new(matcher),
                provisioner: Arc::new(provisioner),
                storage: Arc::new(storage),
                reporter: Arc::new(reporter),
            },
            DeletionOrder::Deferred,
        );

        let report = service
            .migrate_batch(vec![
                provider_secret("first", PROVIDER_URL),
                reference_secret("second", "github"),
            ])
            .await?;

        assert_eq!(report.failed, vec![key("first")]);
        assert_eq!(report.migrated, vec![key("second")]);

        Ok(())
    }

    #[tokio::test]
    async fn lookup_failures_are_diagnosed_for_both_sources() -> TestResult {
        let mut tokens = MockAccessTokensRepository::new();
        let mut matcher = MockTokenMatcher::new();
        let mut storage = MockTokenStorage::new();
        let mut reporter = MockErrorReporter::new();

        tokens
            .expect_get()
            .times(1)
            .returning(|_| Err(RepositoryError::UnexpectedResponse("503".to_string())));
        matcher
            .expect_find_by_provider()
            .times(1)
            .returning(|_, _| Err(RepositoryError::UnexpectedResponse("503".to_string())));
        storage.expect_store().never();
        reporter
            .expect_report()
            .withf(|_, message| {
                message.starts_with("can not look up SPI access tokens in namespace team-a")
                    && message.contains("503")
            })
            .times(2)
            .returning(|_, _| ());

        let service = TokenMigrationService::new(
            MigrationParts {
                secrets: Arc::new(MockSecretsRepository::new()),
                tokens: Arc::new(tokens),
                matcher: Arc::new(matcher),
                provisioner: Arc::new(MockTokenProvisioner::new()),
                storage: Arc::new(storage),
                reporter: Arc::new(reporter),
            },
            DeletionOrder::Deferred,
        );

        let report = service
            .migrate_batch(vec![
                reference_secret("by-name", "github"),
                provider_secret("by-provider", PROVIDER_URL),
            ])
            .await?;

        assert_eq!(report.failed, vec![key("by-name"), key("by-provider")]);
        assert!(report.migrated.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn cancellation_finishes_the_current_secret_and_stops() -> TestResult {
        let cluster = InMemoryCluster::new();
        let cancel = CancellationToken::new();
        let mut storage = MockTokenStorage::new();

        let stop = cancel.clone();
        storage.expect_store().times(1).returning(move |_, _| {
            stop.cancel();
            Ok(())
        });

        let app = AppContext::from_parts(
            Arc::new(cluster.clone()),
            Arc::new(storage),
            MigrationSettings {
                deletion: DeletionOrder::Eager,
                naming: TokenNaming::Random,
            },
        );
        cluster
            .insert_secret(provider_secret("first", PROVIDER_URL))
            .await;
        cluster
            .insert_secret(provider_secret("second", PROVIDER_URL))
            .await;

        let report = app
            .migration
            .reconcile_until(&Scope::AllNamespaces, &cancel)
            .await?;

        assert!(report.interrupted);
        assert_eq!(report.migrated, vec![key("first")]);
        assert!(report.failed.is_empty());
        assert!(cluster.secret(&key("first")).await.is_none());
        assert!(
            cluster.secret(&key("second")).await.is_some(),
            "the unstarted secret must survive for the next pass"
        );
        assert!(cluster.diagnostic(&key("second")).await.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_before_start_touches_nothing() -> TestResult {
        let ctx = TestContext::eager();
        ctx.cluster
            .insert_secret(provider_secret("git-credentials", PROVIDER_URL))
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = ctx
            .migration
            .reconcile_until(&Scope::AllNamespaces, &cancel)
            .await?;

        assert!(report.interrupted);
        assert!(report.migrated.is_empty());
        assert!(ctx.cluster.secret(&key("git-credentials")).await.is_some());
        assert_eq!(ctx.storage.writes().await, 0);

        Ok(())
    }
}
