//! Discovered components.

use crate::error::ApiResult;
use crate::lookup::{self, Filter};
use crate::models::Component;
use crate::session::Session;

pub async fn list(session: &Session) -> ApiResult<Vec<Component>> {
    lookup::find_by_filter(session.client(), &Filter::new()).await
}
