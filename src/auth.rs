//! Caller identity as asserted by the fronting auth gateway.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};
use std::ops::Deref;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const LODGE_ID_HEADER: &str = "x-lodge-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Guide,
    Admin,
}

impl Role {
    fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::Guide,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub lodge_id: Option<Uuid>,
    pub role: Role,
}

impl CurrentUser {
    fn from_headers(req: &HttpRequest) -> Result<Self, ApiError> {
        let id = header(req, USER_ID_HEADER)
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(|| ApiError::Unauthorized("Unauthorised".to_string()))?;
        let lodge_id = header(req, LODGE_ID_HEADER).and_then(|v| Uuid::parse_str(v.trim()).ok());
        let role = Role::from_header(header(req, USER_ROLE_HEADER));

        Ok(Self { id, lodge_id, role })
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(CurrentUser::from_headers(req))
    }
}

/// A `CurrentUser` whose role is `Admin`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl Deref for AdminUser {
    type Target = CurrentUser;

    fn deref(&self) -> &CurrentUser {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = CurrentUser::from_headers(req).and_then(|user| match user.role {
            Role::Admin => Ok(AdminUser(user)),
            Role::Guide => Err(ApiError::Forbidden("Admin access required".to_string())),
        });
        ready(result)
    }
}
