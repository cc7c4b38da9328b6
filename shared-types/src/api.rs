use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Uniform response envelope. Failures carry `success: false` and a message;
/// an expired or missing session additionally sets `requiresAuth`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            requires_auth: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            requires_auth: None,
        }
    }

    pub fn session_expired(message: impl Into<String>) -> Self {
        Self {
            requires_auth: Some(true),
            ..Self::failure(message)
        }
    }
}

/// Query parameters shared by every list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub param_page: Option<u32>,
    pub param_limit: Option<u32>,
    /// Inclusive `YYYY-MM-DD`.
    pub from_date: Option<String>,
    /// Inclusive `YYYY-MM-DD`.
    pub to_date: Option<String>,
    /// Tab path such as `Contacted > Interested`.
    pub tab: Option<String>,
    pub search: Option<String>,
    pub branch_id: Option<i64>,
    pub role: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> u32 {
        self.param_page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> u32 {
        self.param_limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit)) as u32
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// Body of every `.../delete/en` call. Deletion is soft.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeleteRequest {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults_and_clamping() {
        let query = ListQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(query.offset(), 0);

        let query = ListQuery {
            param_page: Some(3),
            param_limit: Some(500),
            ..Default::default()
        };
        assert_eq!(query.limit(), MAX_PAGE_LIMIT);
        assert_eq!(query.offset(), 200);
    }

    #[test]
    fn test_paginated_total_pages() {
        let page: Paginated<i32> = Paginated::new(vec![], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        let empty: Paginated<i32> = Paginated::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_session_expired_envelope() {
        let response: ApiResponse<()> = ApiResponse::session_expired("Session expired");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["requiresAuth"], true);
        assert!(value.get("data").is_none());
    }
}
