use crate::models::PortalSession;
use crate::AppState;
use axum::{extract::State, response::Redirect, Form};
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::error::AppError;
use subtle::ConstantTimeEq;

#[derive(Deserialize)]
pub struct SignInForm {
    pub access_key: String,
}

/// `POST /admin/signin`. A wrong key, or no key configured at all, sends the
/// browser back home with `?error=signin`.
pub async fn sign_in_handler(
    State(state): State<AppState>,
    mut session: PortalSession,
    Form(form): Form<SignInForm>,
) -> Result<Redirect, AppError> {
    let admin = &state.settings.admin;
    let expected = admin.access_key.expose_secret();
    let matches: bool = form.access_key.as_bytes().ct_eq(expected.as_bytes()).into();

    if !admin.is_enabled() {
        tracing::warn!("Admin sign-in rejected: no access key configured");
        return Ok(Redirect::to("/?error=signin"));
    }
    if !matches {
        tracing::warn!("Admin sign-in rejected");
        return Ok(Redirect::to("/?error=signin"));
    }

    session.sign_in_admin().await?;
    tracing::info!("Admin signed in");
    Ok(Redirect::to("/"))
}

/// `POST /admin/signout`: drop this browser's views, clear the session, and
/// send it back to a fresh page.
pub async fn sign_out_handler(
    State(state): State<AppState>,
    mut session: PortalSession,
) -> Result<Redirect, AppError> {
    if let Some(view_id) = session.list_view_id().await? {
        state.list_views.remove(&view_id);
    }
    if let Some(draft_id) = session.upload_draft_id().await? {
        state.upload_drafts.remove(&draft_id);
    }

    session.sign_out().await?;
    tracing::info!("Admin signed out");
    Ok(Redirect::to("/"))
}
