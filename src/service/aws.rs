use super::ServiceProvider;
use crate::error::{BmxError, Result};
use crate::models::{Role, RoleCredentials};
use crate::saml;
use aws_sdk_sts::Client as StsClient;
use aws_types::region::Region;
use chrono::{DateTime, TimeZone, Utc};
use tokio::runtime::Runtime;

const DEFAULT_AWS_REGION: &str = "us-east-1";

/// AWS STS `AssumeRoleWithSAML` credential exchange.
///
/// The SDK is async; the provider owns a current-thread runtime and blocks
/// on each call so callers stay synchronous.
pub struct AwsServiceProvider {
    runtime: Runtime,
    client: StsClient,
    duration_seconds: i32,
}

impl AwsServiceProvider {
    pub fn new(duration_minutes: u32) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let config = runtime.block_on(async {
            let loaded = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .load()
                .await;

            match loaded.region() {
                Some(region) => {
                    tracing::debug!("Using region: {}", region);
                    loaded
                }
                None => {
                    tracing::debug!(
                        "No region configured, using default {} for STS",
                        DEFAULT_AWS_REGION
                    );
                    aws_config::defaults(aws_config::BehaviorVersion::latest())
                        .region(Region::new(DEFAULT_AWS_REGION))
                        .load()
                        .await
                }
            }
        });

        let duration_seconds = i32::try_from(u64::from(duration_minutes) * 60).map_err(|_| {
            BmxError::ConfigError(format!("Duration of {} minutes is too long", duration_minutes))
        })?;

        Ok(Self {
            runtime,
            client: StsClient::new(&config),
            duration_seconds,
        })
    }
}

fn to_chrono(expiration: &aws_smithy_types::DateTime) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(expiration.secs(), expiration.subsec_nanos())
        .single()
        .ok_or_else(|| BmxError::ServiceProvider("Invalid expiration timestamp".to_string()))
}

impl ServiceProvider for AwsServiceProvider {
    fn list_roles(&self, assertion: &str) -> Result<Vec<Role>> {
        saml::roles(assertion)
    }

    fn credentials(&self, role: &Role, assertion: &str) -> Result<RoleCredentials> {
        tracing::debug!("Role ARN: {}", role.arn);
        tracing::debug!("Principal ARN: {}", role.principal_arn);
        tracing::debug!("Duration: {} seconds", self.duration_seconds);

        let response = self
            .runtime
            .block_on(
                self.client
                    .assume_role_with_saml()
                    .role_arn(&role.arn)
                    .principal_arn(&role.principal_arn)
                    .saml_assertion(assertion)
                    .duration_seconds(self.duration_seconds)
                    .send(),
            )
            .map_err(|e| {
                BmxError::ServiceProvider(format!(
                    "Failed to assume role with SAML: {}",
                    aws_sdk_sts::error::DisplayErrorContext(&e)
                ))
            })?;

        let creds = response
            .credentials()
            .ok_or_else(|| BmxError::ServiceProvider("AWS STS returned no credentials".to_string()))?;

        tracing::info!("Assumed role {}", role.name);

        Ok(RoleCredentials {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().to_string(),
            expiration: to_chrono(creds.expiration())?,
        })
    }
}
