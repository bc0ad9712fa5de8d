//! Global default service accounts.
//!
//! The appliance uses a default service account per resource class when a
//! scan does not name one explicitly.

use reqwest::Method;

use crate::error::ApiResult;
use crate::lookup;
use crate::models::{GlobalDefaultRequest, ServiceAccountType};
use crate::operation::{run_mutation, Mutation, Outcome};
use crate::session::Session;

const PATH: &str = "serviceaccounts/defaults";

/// Make the service account with `alias` the default for `kind`.
pub async fn assign(
    session: &Session,
    alias: &str,
    kind: ServiceAccountType,
) -> ApiResult<Outcome> {
    let account = lookup::find_service_account(session.client(), alias).await?;
    let action = format!("assign '{alias}' as the default {kind} Service Account");
    put_default(session, &account.uuid, kind, action).await
}

/// Clear the default service account for `kind`.
pub async fn reset(session: &Session, kind: ServiceAccountType) -> ApiResult<Outcome> {
    let action = format!("reset the default {kind} Service Account");
    put_default(session, "", kind, action).await
}

async fn put_default(
    session: &Session,
    uuid: &str,
    kind: ServiceAccountType,
    action: String,
) -> ApiResult<Outcome> {
    let url = session.client().url(PATH)?;
    let request = GlobalDefaultRequest {
        service_account_uuid: uuid,
        service_account_type: kind,
    };

    run_mutation(session, Mutation::new(Method::PUT, url, action).json(&request)).await
}
