use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    Admin,
    SalesManager,
    Agent,
    KioskMember,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::SalesManager => "sales-manager",
            UserRole::Agent => "agent",
            UserRole::KioskMember => "kiosk-member",
        }
    }

    /// Roles that can have leads assigned to them.
    pub fn can_work_leads(&self) -> bool {
        matches!(self, UserRole::Agent | UserRole::SalesManager)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "sales-manager" => Ok(UserRole::SalesManager),
            "agent" => Ok(UserRole::Agent),
            "kiosk-member" => Ok(UserRole::KioskMember),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

/// Dashboard user: admins, sales managers, agents and kiosk members.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub branch_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub branch_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub branch_id: Option<i64>,
    pub password: Option<String>,
}
