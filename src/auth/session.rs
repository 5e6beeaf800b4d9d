use actix_session::Session;

use crate::context::SessionContext;
use crate::errors::AppError;

/// Session key holding the serialized [`SessionContext`].
pub const OPERATOR_KEY: &str = "operator";

pub fn store_operator(session: &Session, ctx: &SessionContext) -> Result<(), AppError> {
    session
        .insert(OPERATOR_KEY, ctx)
        .map_err(|e| AppError::Session(format!("Failed to store operator: {}", e)))
}

pub fn load_operator(session: &Session) -> Result<Option<SessionContext>, AppError> {
    session
        .get::<SessionContext>(OPERATOR_KEY)
        .map_err(|e| AppError::Session(format!("Failed to read operator: {}", e)))
}

pub fn has_operator(session: &Session) -> bool {
    session.entries().contains_key(OPERATOR_KEY)
}
