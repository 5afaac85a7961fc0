use anyhow::Context;
use serde::Serialize;

use crate::error::SeedError;
use crate::provisioner::Provisioner;
use crate::seed::{Fixture, SeedRequest, Variant};

/// Ordered seed requests plus the variant that decides whether fixtures run
#[derive(Debug, Clone, Serialize)]
pub struct SeedPlan {
    pub variant: Variant,
    pub requests: Vec<SeedRequest>,
}

/// What a single request produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub database: String,
    pub username: String,
    pub fixture_collection: Option<String>,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub backend: &'static str,
    pub variant: Variant,
    pub outcomes: Vec<SeedOutcome>,
}

impl SeedPlan {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            requests: Vec::new(),
        }
    }

    /// Append a request; requests run in insertion order
    pub fn request(mut self, request: SeedRequest) -> Self {
        self.requests.push(request);
        self
    }

    /// Plan with every password masked
    pub fn redacted(&self) -> Self {
        Self {
            variant: self.variant,
            requests: self.requests.iter().map(SeedRequest::redacted).collect(),
        }
    }

    /// Run every request in order, stopping at the first failure.
    ///
    /// Nothing is checked up front: seeding an environment that already has
    /// one of the users fails with [`SeedError::UserExists`].
    pub async fn run(&self, provisioner: &dyn Provisioner) -> anyhow::Result<SeedReport> {
        tracing::info!(
            backend = provisioner.name(),
            variant = ?self.variant,
            requests = self.requests.len(),
            "running seed plan"
        );

        let fixture = self.variant.fixture();
        let mut outcomes = Vec::with_capacity(self.requests.len());

        for request in &self.requests {
            let outcome = seed_one(provisioner, request, fixture.as_ref())
                .await
                .with_context(|| {
                    format!(
                        "failed to seed user '{}' on database '{}'",
                        request.username, request.database
                    )
                })?;
            outcomes.push(outcome);
        }

        tracing::info!(seeded = outcomes.len(), "seed plan complete");

        Ok(SeedReport {
            backend: provisioner.name(),
            variant: self.variant,
            outcomes,
        })
    }

    /// Check that a previous run left the expected users and fixtures behind
    pub async fn verify(&self, provisioner: &dyn Provisioner) -> anyhow::Result<()> {
        let fixture = self.variant.fixture();

        for request in &self.requests {
            verify_one(provisioner, request, fixture.as_ref())
                .await
                .with_context(|| {
                    format!(
                        "checking user '{}' on database '{}'",
                        request.username, request.database
                    )
                })?;
            tracing::info!(
                database = %request.database,
                user = %request.username,
                "seed state verified"
            );
        }

        Ok(())
    }
}

async fn seed_one(
    provisioner: &dyn Provisioner,
    request: &SeedRequest,
    fixture: Option<&Fixture>,
) -> Result<SeedOutcome, SeedError> {
    tracing::info!(database = %request.database, user = %request.username, "creating user");
    provisioner
        .create_user(
            &request.database,
            &request.username,
            &request.password,
            &[request.role()],
        )
        .await?;

    let fixture_collection = match fixture {
        Some(fixture) => {
            tracing::info!(
                database = %request.database,
                collection = %fixture.collection,
                "inserting fixture document"
            );
            provisioner
                .create_collection(&request.database, &fixture.collection)
                .await?;
            provisioner
                .insert_document(&request.database, &fixture.collection, &fixture.document)
                .await?;
            Some(fixture.collection.clone())
        }
        None => None,
    };

    Ok(SeedOutcome {
        database: request.database.clone(),
        username: request.username.clone(),
        fixture_collection,
    })
}

async fn verify_one(
    provisioner: &dyn Provisioner,
    request: &SeedRequest,
    fixture: Option<&Fixture>,
) -> Result<(), SeedError> {
    let user = provisioner
        .user_info(&request.database, &request.username)
        .await?
        .ok_or_else(|| SeedError::verification("user does not exist"))?;

    if user.roles != [request.role()] {
        return Err(SeedError::verification(format!(
            "expected exactly one role readWrite@{}, found {:?}",
            request.database, user.roles
        )));
    }

    if let Some(fixture) = fixture {
        let documents = provisioner
            .documents(&request.database, &fixture.collection)
            .await?;
        if documents != [fixture.document.clone()] {
            return Err(SeedError::verification(format!(
                "collection '{}' should hold exactly the fixture document, found {} document(s)",
                fixture.collection,
                documents.len()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryProvisioner;
    use crate::seed::RoleGrant;

    fn plan(variant: Variant) -> SeedPlan {
        SeedPlan::new(variant)
            .request(SeedRequest::new("one", "one-user", "pw"))
            .request(SeedRequest::new("two", "two-user", "pw"))
    }

    #[tokio::test]
    async fn test_run_reports_each_request_in_order() {
        let provisioner = MemoryProvisioner::new();
        let report = plan(Variant::WithFixture).run(&provisioner).await.unwrap();

        assert_eq!(report.backend, "memory");
        let databases: Vec<_> = report.outcomes.iter().map(|o| o.database.as_str()).collect();
        assert_eq!(databases, ["one", "two"]);
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.fixture_collection.as_deref() == Some("dummy")));
    }

    #[tokio::test]
    async fn test_first_failure_stops_the_run() {
        let provisioner = MemoryProvisioner::new();
        provisioner
            .create_user("one", "one-user", "pw", &[RoleGrant::read_write("one")])
            .await
            .unwrap();

        let err = plan(Variant::UsersOnly).run(&provisioner).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeedError>(),
            Some(SeedError::UserExists { .. })
        ));
        assert!(provisioner
            .user_info("two", "two-user")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_verify_rejects_extra_roles() {
        let provisioner = MemoryProvisioner::new();
        let roles = [RoleGrant::read_write("one"), RoleGrant::read_write("two")];
        provisioner
            .create_user("one", "one-user", "pw", &roles)
            .await
            .unwrap();

        let single = SeedPlan::new(Variant::UsersOnly)
            .request(SeedRequest::new("one", "one-user", "pw"));
        let err = single.verify(&provisioner).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeedError>(),
            Some(SeedError::Verification { .. })
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_missing_fixture() {
        let provisioner = MemoryProvisioner::new();
        plan(Variant::UsersOnly).run(&provisioner).await.unwrap();

        assert!(plan(Variant::UsersOnly).verify(&provisioner).await.is_ok());
        assert!(plan(Variant::WithFixture).verify(&provisioner).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_rejects_missing_user() {
        let provisioner = MemoryProvisioner::new();

        let err = plan(Variant::UsersOnly).verify(&provisioner).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeedError>(),
            Some(SeedError::Verification { message }) if message == "user does not exist"
        ));
        assert_eq!(
            format!("{err:#}"),
            "checking user 'one-user' on database 'one': verification failed: user does not exist"
        );
    }

    #[tokio::test]
    async fn test_verify_rejects_duplicate_fixture_documents() {
        let provisioner = MemoryProvisioner::new();
        let plan = plan(Variant::WithFixture);
        plan.run(&provisioner).await.unwrap();

        let fixture = Fixture::dummy();
        provisioner
            .insert_document("one", &fixture.collection, &fixture.document)
            .await
            .unwrap();

        let err = plan.verify(&provisioner).await.unwrap_err();
        match err.downcast_ref::<SeedError>() {
            Some(SeedError::Verification { message }) => {
                assert!(message.contains("found 2 document(s)"), "{message}");
            }
            other => panic!("expected Verification, got {other:?}"),
        }
    }

    #[test]
    fn test_redacted_plan_keeps_order() {
        let redacted = plan(Variant::UsersOnly).redacted();
        assert_eq!(redacted.requests[0].username, "one-user");
        assert!(redacted.requests.iter().all(|r| r.password != "pw"));
    }
}
