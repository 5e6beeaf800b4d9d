use std::future::{Ready, ready};

use actix_session::SessionExt;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::session;
use crate::errors::AppError;
use crate::models::account::Account;

/// The signed-in operator, passed explicitly to every handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub account_id: Uuid,
    pub email: String,
    pub association_id: String,
    pub association_name: String,
    pub is_superadmin: bool,
}

impl SessionContext {
    pub fn require_superadmin(&self) -> Result<(), AppError> {
        if self.is_superadmin {
            Ok(())
        } else {
            Err(AppError::PermissionDenied("superadmin".to_string()))
        }
    }
}

impl From<&Account> for SessionContext {
    fn from(a: &Account) -> Self {
        Self {
            account_id: a.id,
            email: a.email.clone(),
            association_id: a.association_id.clone(),
            association_name: a.association_name.clone(),
            is_superadmin: a.is_superadmin,
        }
    }
}

impl FromRequest for SessionContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = session::load_operator(&req.get_session()).and_then(|ctx| ctx.ok_or(AppError::Unauthorized));
        ready(result)
    }
}
