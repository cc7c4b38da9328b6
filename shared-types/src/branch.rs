use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub manager_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchRequest {
    pub name: String,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub manager_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBranchRequest {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub manager_id: Option<i64>,
}
