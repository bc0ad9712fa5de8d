//! Service account operations.

use reqwest::Method;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::lookup::{self, Filter};
use crate::models::{ServiceAccount, ServiceAccountRequest};
use crate::operation::{run_mutation, Mutation, Outcome};
use crate::session::Session;

const PATH: &str = "serviceaccounts";

/// A service account to register.
#[derive(Clone)]
pub struct NewServiceAccount {
    pub alias: String,
    pub username: String,
    password: String,
}

impl NewServiceAccount {
    pub fn new(
        alias: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> ApiResult<Self> {
        let account = Self {
            alias: alias.into(),
            username: username.into(),
            password: password.into(),
        };
        if account.alias.trim().is_empty() {
            return Err(ApiError::usage("service account alias is required (--sa-alias)"));
        }
        if account.username.is_empty() || account.password.is_empty() {
            return Err(ApiError::usage(
                "service account username and password are required",
            ));
        }
        Ok(account)
    }
}

impl std::fmt::Debug for NewServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewServiceAccount")
            .field("alias", &self.alias)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Register a service account unless one with the same alias exists.
pub async fn register(session: &Session, account: &NewServiceAccount) -> ApiResult<Outcome> {
    let existing = lookup::search_service_accounts(session.client(), &account.alias).await?;
    if existing.iter().any(|sa| sa.alias == account.alias) {
        info!(alias = %account.alias, "Service Account already exists");
        return Ok(Outcome::Unchanged {
            reason: format!("Service Account '{}' already exists", account.alias),
        });
    }

    let url = session.client().url(&format!("{PATH}?action=register"))?;
    let request = ServiceAccountRequest {
        username: &account.username,
        password: &account.password,
        alias: &account.alias,
    };

    let action = "register the Service Account";
    let response = session
        .client()
        .request(Method::POST, url, Some(&request))
        .await?;
    let created: ServiceAccount = response.success_json(action)?;
    if created.uuid.is_empty() {
        return Err(ApiError::remote(response.status.as_u16(), action));
    }

    info!(alias = %created.alias, uuid = %created.uuid, "Service Account created");
    Ok(Outcome::Created { id: created.uuid })
}

/// Remove the service account with this alias.
pub async fn unregister(session: &Session, alias: &str) -> ApiResult<Outcome> {
    let account = lookup::find_service_account(session.client(), alias).await?;
    let url = session.client().url(&format!("{PATH}/{}", account.uuid))?;

    run_mutation(
        session,
        Mutation::new(Method::DELETE, url, format!("delete Service Account '{alias}'")),
    )
    .await
}

/// List service accounts, optionally filtered by alias.
pub async fn list(session: &Session, alias: Option<&str>) -> ApiResult<Vec<ServiceAccount>> {
    let filter = Filter::new().with_opt("alias", alias);
    lookup::find_by_filter(session.client(), &filter).await
}
