use actix_web::{web, HttpResponse};
use serde::Deserialize;
use shared_types::{
    pipeline_labels, AssignLeadRequest, CreateLeadRequest, DeleteRequest, Lead, LeadFilter,
    LeadHistoryResponse, LeadRoute, ListQuery, Paginated, PipelineStage, StatusError, TabPath,
    UpdateLeadRequest, UpdateLeadStatusRequest, UserRole, MAX_REMARKS_CHARS,
};
use std::sync::Arc;

use super::ok;
use crate::database::leads::{self as leads_db, LeadScope};
use crate::database::{users, Database};
use crate::error::{ApiError, ApiResult};
use crate::helpers::auth::AuthenticatedUser;
use crate::helpers::dates::created_between;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub lead_id: i64,
}

/// Scope and date bounds run in SQL; tab path, search and paging run over the
/// resulting rows with the same predicates the dashboard uses.
async fn list_page(
    db: &Database,
    scope: LeadScope,
    route: LeadRoute,
    query: &ListQuery,
) -> ApiResult<Paginated<Lead>> {
    let created = created_between(query)?;

    let mut filter = LeadFilter::new(route);
    if let Some(tab) = query.tab.as_deref().filter(|t| !t.trim().is_empty()) {
        filter.path = TabPath::parse(route, tab)?;
    }
    filter.search = query.search.clone().unwrap_or_default();

    let leads = leads_db::list_leads(db.async_connection.clone(), scope, created).await?;
    let matched: Vec<Lead> = leads.into_iter().filter(|lead| filter.matches(lead)).collect();

    let total = matched.len() as u64;
    let items = matched
        .into_iter()
        .skip(query.offset() as usize)
        .take(query.limit() as usize)
        .collect();

    tracing::debug!(
        "Listed {} leads for {} (scope {:?}, path '{}')",
        total,
        route.as_str(),
        scope,
        filter.path
    );

    Ok(Paginated::new(items, total, query.page(), query.limit()))
}

/// Fetches a lead the caller is allowed to see. Leads outside the caller's
/// scope are reported as missing.
async fn visible_lead(db: &Database, auth: &AuthenticatedUser, id: i64) -> ApiResult<Lead> {
    let lead = leads_db::get_lead(db.async_connection.clone(), id)
        .await?
        .ok_or(ApiError::NotFound("Lead"))?;

    if LeadScope::for_user(&auth.user).allows(&lead) {
        Ok(lead)
    } else {
        Err(ApiError::NotFound("Lead"))
    }
}

fn require_manager(auth: &AuthenticatedUser) -> ApiResult<()> {
    match auth.role() {
        UserRole::Admin | UserRole::SalesManager => Ok(()),
        _ => Err(ApiError::Forbidden(
            "Only administrators and sales managers can perform this action".to_string(),
        )),
    }
}

pub async fn get_all(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    let route = if auth.role() == UserRole::Admin {
        LeadRoute::LeadsAdmin
    } else {
        LeadRoute::Leads
    };
    let page = list_page(&db, LeadScope::for_user(&auth.user), route, &query).await?;
    Ok(ok("Leads fetched", page))
}

pub async fn branch_leads(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    require_manager(&auth)?;

    let branch_id = query
        .branch_id
        .or(auth.user.branch_id)
        .ok_or_else(|| ApiError::Validation("branchId is required".to_string()))?;

    if auth.role() == UserRole::SalesManager && auth.user.branch_id != Some(branch_id) {
        return Err(ApiError::Forbidden(
            "You can only view leads of your own branch".to_string(),
        ));
    }

    let page = list_page(&db, LeadScope::Branch(branch_id), LeadRoute::BranchLeads, &query).await?;
    Ok(ok("Branch leads fetched", page))
}

pub async fn sales_leads(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    let scope = match auth.role() {
        UserRole::SalesManager => LeadScope::for_user(&auth.user),
        UserRole::Admin => query.branch_id.map(LeadScope::Branch).unwrap_or(LeadScope::All),
        _ => {
            return Err(ApiError::Forbidden(
                "Only sales managers can view sales leads".to_string(),
            ))
        }
    };

    let page = list_page(&db, scope, LeadRoute::SalesManagerLeads, &query).await?;
    Ok(ok("Sales leads fetched", page))
}

async fn check_assignee(
    db: &Database,
    auth: &AuthenticatedUser,
    agent_id: i64,
    lead_branch: Option<i64>,
) -> ApiResult<()> {
    let agent = users::get_user(db.async_connection.clone(), agent_id)
        .await?
        .ok_or(ApiError::NotFound("Agent"))?;

    if !agent.role.can_work_leads() {
        return Err(ApiError::Validation(format!(
            "{} cannot be assigned leads",
            agent.name
        )));
    }

    if auth.role() == UserRole::SalesManager
        && lead_branch.is_some()
        && agent.branch_id != lead_branch
    {
        return Err(ApiError::Validation(format!(
            "{} does not belong to this lead's branch",
            agent.name
        )));
    }

    Ok(())
}

pub async fn create_lead(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<CreateLeadRequest>,
) -> ApiResult<HttpResponse> {
    let mut req = request.into_inner();

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Lead name is required".to_string()));
    }

    if auth.role() != UserRole::Admin {
        req.branch_id = auth.user.branch_id.or(req.branch_id);
    }

    if let Some(agent_id) = req.lead_agent_id {
        require_manager(&auth)?;
        check_assignee(&db, &auth, agent_id, req.branch_id).await?;
    }

    let lead = leads_db::insert_lead(db.async_connection.clone(), &req, auth.id()).await?;

    tracing::info!("User {} created lead {}", auth.id(), lead.id);
    Ok(ok("Lead created", lead))
}

pub async fn update_lead(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<UpdateLeadRequest>,
) -> ApiResult<HttpResponse> {
    let req = request.into_inner();
    visible_lead(&db, &auth, req.id).await?;

    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::Validation("Lead name cannot be empty".to_string()));
    }

    let lead = leads_db::update_lead(db.async_connection.clone(), &req)
        .await?
        .ok_or(ApiError::NotFound("Lead"))?;

    tracing::info!("User {} updated lead {}", auth.id(), lead.id);
    Ok(ok("Lead updated", lead))
}

/// `currentStatus` to store for `stage`. Blank means the stage's deepest
/// label; anything else must name one of the stage's own labels.
fn status_label(stage: &PipelineStage, requested: &str) -> ApiResult<String> {
    let labels = pipeline_labels(stage);
    let requested = requested.trim();

    if requested.is_empty() {
        return Ok(labels
            .last()
            .map(|label| label.as_str().to_string())
            .unwrap_or_default());
    }

    labels
        .iter()
        .find(|label| label.as_str().eq_ignore_ascii_case(requested))
        .map(|label| label.as_str().to_string())
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "Status '{requested}' does not match the selected pipeline flags"
            ))
        })
}

/// Full replacement of the flag vector. The vector must satisfy the pipeline
/// dependency chain and describe a contacted lead. `leadAgentId` and
/// `lastUpdatedAt` in the body are informational: the acting user comes from
/// the session and the timestamp from the server clock.
pub async fn update_status(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<UpdateLeadStatusRequest>,
) -> ApiResult<HttpResponse> {
    let req = request.into_inner();

    if auth.role() == UserRole::KioskMember {
        return Err(ApiError::Forbidden(
            "Kiosk members cannot change a lead's status".to_string(),
        ));
    }

    let remarks_len = req.latest_remarks.chars().count();
    if remarks_len > MAX_REMARKS_CHARS {
        return Err(StatusError::RemarksTooLong { len: remarks_len }.into());
    }

    let stage = match PipelineStage::try_from_flags(&req.flags) {
        Ok(stage) => stage,
        Err(e) => {
            tracing::warn!("Rejected status update for lead {}: {}", req.id, e);
            return Err(e.into());
        }
    };
    if stage == PipelineStage::Uncontacted {
        return Err(StatusError::NoStatusSelected.into());
    }

    let current_status = status_label(&stage, &req.current_status)?;
    visible_lead(&db, &auth, req.id).await?;

    let now = chrono::Utc::now().timestamp();
    let lead = leads_db::update_status(
        db.async_connection.clone(),
        req.id,
        stage,
        &current_status,
        req.latest_remarks.trim(),
        auth.id(),
        now,
    )
    .await?
    .ok_or(ApiError::NotFound("Lead"))?;

    tracing::info!(
        "User {} set lead {} to '{}' ({})",
        auth.id(),
        lead.id,
        current_status,
        lead.status.as_str()
    );
    Ok(ok("Status updated", lead))
}

pub async fn assign_to_agent(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<AssignLeadRequest>,
) -> ApiResult<HttpResponse> {
    let req = request.into_inner();
    require_manager(&auth)?;

    let lead = visible_lead(&db, &auth, req.lead_id).await?;
    check_assignee(&db, &auth, req.agent_id, lead.branch_id).await?;

    let lead = leads_db::assign_agent(db.async_connection.clone(), req.lead_id, req.agent_id)
        .await?
        .ok_or(ApiError::NotFound("Lead"))?;

    tracing::info!("User {} assigned lead {} to {}", auth.id(), lead.id, req.agent_id);
    Ok(ok("Lead assigned", lead))
}

pub async fn delete_lead(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<DeleteRequest>,
) -> ApiResult<HttpResponse> {
    require_manager(&auth)?;
    let id = request.id;
    visible_lead(&db, &auth, id).await?;

    if !leads_db::delete_lead(db.async_connection.clone(), id).await? {
        return Err(ApiError::NotFound("Lead"));
    }

    tracing::info!("User {} deleted lead {}", auth.id(), id);
    Ok(ok("Lead deleted", ()))
}

pub async fn history(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    query: web::Query<HistoryQuery>,
) -> ApiResult<HttpResponse> {
    visible_lead(&db, &auth, query.lead_id).await?;
    let history = leads_db::list_history(db.async_connection.clone(), query.lead_id).await?;
    Ok(ok("History fetched", LeadHistoryResponse { history }))
}
