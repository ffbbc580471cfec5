use crate::error::CmsError;
use crate::AppState;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use std::str::FromStr;

/// Capability levels, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    User,
    Editor,
    Moderator,
    Admin,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "editor" => Ok(Role::Editor),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub role: Role,
}

impl Identity {
    pub fn can_moderate(&self) -> bool {
        self.role >= Role::Moderator
    }

    pub fn can_edit_pages(&self) -> bool {
        self.role >= Role::Editor
    }

    pub fn require_moderator(&self) -> Result<(), CmsError> {
        if self.can_moderate() {
            Ok(())
        } else {
            Err(CmsError::Forbidden)
        }
    }

    pub fn require_editor(&self) -> Result<(), CmsError> {
        if self.can_edit_pages() {
            Ok(())
        } else {
            Err(CmsError::Forbidden)
        }
    }
}

/// Works out who is making a request. Authentication itself happens in
/// front of this service.
pub trait IdentityProvider: Send + Sync {
    fn identify(&self, req: &HttpRequest) -> Option<Identity>;
}

/// Trusts the `X-User-Id` and `X-User-Role` headers set by the auth proxy.
/// A missing or unknown role falls back to [`Role::User`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderIdentity;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

impl IdentityProvider for HeaderIdentity {
    fn identify(&self, req: &HttpRequest) -> Option<Identity> {
        let user_id = header(req, USER_ID_HEADER)?.trim().parse().ok()?;
        let role = header(req, USER_ROLE_HEADER)
            .and_then(|role| role.parse().ok())
            .unwrap_or(Role::User);

        Some(Identity { user_id, role })
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

impl FromRequest for Identity {
    type Error = CmsError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let identity = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.identity.identify(req));

        ready(identity.ok_or(CmsError::Unauthenticated))
    }
}
