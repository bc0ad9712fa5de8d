//! Discovered applications.

use crate::error::ApiResult;
use crate::lookup::{self, Filter};
use crate::models::{Application, ApplicationComponentRow};
use crate::session::Session;

pub async fn list(session: &Session) -> ApiResult<Vec<Application>> {
    lookup::find_by_filter(session.client(), &Filter::new()).await
}

/// Applications flattened to one row per component.
pub fn component_rows(applications: &[Application]) -> Vec<ApplicationComponentRow> {
    applications
        .iter()
        .flat_map(Application::component_rows)
        .collect()
}
