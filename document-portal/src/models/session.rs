use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use service_core::error::AppError;
use tower_sessions::Session;
use uuid::Uuid;

pub const ADMIN_FLAG_KEY: &str = "is_admin_logged_in";
pub const LIST_VIEW_KEY: &str = "list_view_id";
pub const UPLOAD_DRAFT_KEY: &str = "upload_draft_id";

fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::InternalError(anyhow::Error::new(err))
}

/// Per-browser context handed to every handler: the admin flag plus the ids
/// of the list view and upload draft this browser owns.
#[derive(Debug, Clone)]
pub struct PortalSession {
    session: Session,
    is_admin: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for PortalSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::InternalError(anyhow::anyhow!(msg)))?;

        let is_admin = session
            .get::<bool>(ADMIN_FLAG_KEY)
            .await
            .map_err(session_error)?
            .unwrap_or(false);

        Ok(Self { session, is_admin })
    }
}

impl PortalSession {
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub async fn sign_in_admin(&mut self) -> Result<(), AppError> {
        // New id on privilege change
        self.session.cycle_id().await.map_err(session_error)?;
        self.session
            .insert(ADMIN_FLAG_KEY, true)
            .await
            .map_err(session_error)?;
        self.is_admin = true;
        Ok(())
    }

    /// Forget everything this browser held: admin flag, list view, draft.
    pub async fn sign_out(&mut self) -> Result<(), AppError> {
        self.session.flush().await.map_err(session_error)?;
        self.is_admin = false;
        Ok(())
    }

    pub async fn list_view_id(&self) -> Result<Option<Uuid>, AppError> {
        self.session.get(LIST_VIEW_KEY).await.map_err(session_error)
    }

    pub async fn set_list_view_id(&self, id: Uuid) -> Result<(), AppError> {
        self.session
            .insert(LIST_VIEW_KEY, id)
            .await
            .map_err(session_error)
    }

    pub async fn upload_draft_id(&self) -> Result<Option<Uuid>, AppError> {
        self.session
            .get(UPLOAD_DRAFT_KEY)
            .await
            .map_err(session_error)
    }

    pub async fn set_upload_draft_id(&self, id: Uuid) -> Result<(), AppError> {
        self.session
            .insert(UPLOAD_DRAFT_KEY, id)
            .await
            .map_err(session_error)
    }

    pub async fn clear_upload_draft_id(&self) -> Result<(), AppError> {
        self.session
            .remove::<Uuid>(UPLOAD_DRAFT_KEY)
            .await
            .map(|_| ())
            .map_err(session_error)
    }
}

/// A [`PortalSession`] that has passed the admin gate. Visitors are
/// rejected with `403 Forbidden`.
#[derive(Debug, Clone)]
pub struct AdminSession(pub PortalSession);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = PortalSession::from_request_parts(parts, state).await?;
        if !session.is_admin() {
            tracing::warn!(path = %parts.uri.path(), "Admin action attempted without admin session");
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Admin sign-in required"
            )));
        }
        Ok(AdminSession(session))
    }
}
