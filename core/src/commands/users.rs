//! Account and session commands

use crate::app::AppState;
use crate::database::{PlanTier, User, UserPatch};
use crate::error::Result;

/// Create an account, log it in and open its workspace
pub async fn register(state: &AppState, name: &str, email: &str, password: &str) -> Result<User> {
    let user = state.users.register(name, email, password).await?;
    state.open_workspace(user.clone()).await?;
    Ok(user)
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<User> {
    let user = state.users.login(email, password).await?;
    state.open_workspace(user.clone()).await?;
    Ok(user)
}

/// Save the workspace and end the session
pub async fn logout(state: &AppState) -> Result<()> {
    state.close_workspace().await?;
    state.users.end_session().await
}

/// The logged-in user, if any
pub async fn current_user(state: &AppState) -> Result<Option<User>> {
    state.users.active_session().await
}

pub async fn update_profile(state: &AppState, patch: UserPatch) -> Result<User> {
    let mut ws = state.workspace().await?;
    let updated = state.users.update_user(&ws.user.id, patch).await?;
    ws.user = updated.clone();
    Ok(updated)
}

/// Switch the active user's plan tier
pub async fn change_plan(state: &AppState, plan: PlanTier) -> Result<User> {
    tracing::info!("Changing plan to {:?}", plan);
    update_profile(
        state,
        UserPatch {
            plan: Some(plan),
            ..UserPatch::default()
        },
    )
    .await
}

pub async fn complete_onboarding(state: &AppState) -> Result<User> {
    update_profile(
        state,
        UserPatch {
            has_seen_onboarding: Some(true),
            ..UserPatch::default()
        },
    )
    .await
}

pub async fn list_users(state: &AppState) -> Result<Vec<User>> {
    state.users.list_users().await
}
