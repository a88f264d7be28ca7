// src/services/rbac_service.rs

use std::sync::Arc;

use crate::{
    common::{context::RequestContext, error::AppError},
    db::PrincipalStore,
    models::auth::Role,
};

/// Responde "o principal X tem o papel Y?" lendo sempre o estado atual do banco.
#[derive(Clone)]
pub struct RbacService {
    principals: Arc<dyn PrincipalStore>,
}

impl RbacService {
    pub fn new(principals: Arc<dyn PrincipalStore>) -> Self {
        Self { principals }
    }

    /// Nunca falha: erro de banco, principal inexistente ou bloqueado contam como "não tem".
    pub async fn has_role(&self, ctx: &RequestContext, principal_id: i64, role: Role) -> bool {
        match ctx.bound(self.principals.find_by_id(principal_id)).await {
            Ok(Some(principal)) => principal.active && principal.role_set().contains(&role),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(principal_id, role = role.as_str(), "Falha ao verificar papel: {:?}", e);
                false
            }
        }
    }

    pub async fn require_role(
        &self,
        ctx: &RequestContext,
        principal_id: i64,
        role: Role,
    ) -> Result<(), AppError> {
        if self.has_role(ctx, principal_id, role).await {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }
}
