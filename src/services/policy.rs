//! Visitor authorization policy
//!
//! Pure decisions over an actor and an action. Actions that concern an
//! existing visitor carry it, so ownership is checked against `staff_id`.

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{Identity, Role},
        visitor::Visitor,
    },
};

/// Who is making the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// No credentials; only self-service check-in and code lookup
    Anonymous,
    Authenticated(Identity),
}

impl From<Option<Identity>> for Actor {
    fn from(identity: Option<Identity>) -> Self {
        identity.map_or(Actor::Anonymous, Actor::Authenticated)
    }
}

impl From<Identity> for Actor {
    fn from(identity: Identity) -> Self {
        Actor::Authenticated(identity)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum VisitorAction<'a> {
    Create,
    ViewAny,
    Update(&'a Visitor),
    Delete(&'a Visitor),
    CheckIn(&'a Visitor),
    ShowByCode,
}

fn owns(identity: &Identity, visitor: &Visitor) -> bool {
    identity.id == visitor.staff_id
}

/// Whether `actor` may perform `action`
pub fn allows(actor: &Actor, action: VisitorAction<'_>) -> bool {
    use VisitorAction::*;

    match (actor, action) {
        (_, ShowByCode) => true,
        (Actor::Anonymous, CheckIn(_)) => true,
        (Actor::Anonymous, Create | ViewAny | Update(_) | Delete(_)) => false,
        (Actor::Authenticated(identity), action) => match (identity.role, action) {
            (Role::Admin, _) => true,
            (Role::Staff, Create | ViewAny | ShowByCode) => true,
            (Role::Staff, Update(v) | Delete(v) | CheckIn(v)) => owns(identity, v),
        },
    }
}

/// Like [`allows`], failing with an authorization error on denial
pub fn authorize(actor: &Actor, action: VisitorAction<'_>) -> AppResult<()> {
    if allows(actor, action) {
        Ok(())
    } else {
        tracing::debug!("Policy denied {} for {:?}", action_name(&action), actor);
        Err(AppError::Authorization(
            "This action is unauthorized.".to_string(),
        ))
    }
}

fn action_name(action: &VisitorAction<'_>) -> &'static str {
    match action {
        VisitorAction::Create => "create",
        VisitorAction::ViewAny => "view-any",
        VisitorAction::Update(_) => "update",
        VisitorAction::Delete(_) => "delete",
        VisitorAction::CheckIn(_) => "check-in",
        VisitorAction::ShowByCode => "show",
    }
}
