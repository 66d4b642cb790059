use serde::{Deserialize, Serialize};

use crate::TenantId;

/// Authenticated tenant attached to one inbound call.
///
/// Built once at the request boundary after a credential was verified and
/// passed by value into every application call. It never carries the
/// credential itself, only the resolved tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    tenant_id: TenantId,
}

impl TenantContext {
    /// Creates a context for an already authenticated tenant.
    #[must_use]
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    /// Returns the tenant every storage call of this request is scoped to.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
