use crate::database::{bool_from_row, AsyncDbConnection};
use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use shared_types::{
    CreateLeadRequest, DepositStatus, FlagVector, Lead, LeadHistoryEntry, LeadStatus,
    PipelineStage, UpdateLeadRequest, User, UserRole,
};

const LEAD_COLUMNS: &str = "id, name, phone, email, nationality, language, source, branch_id,
     lead_agent_id, created_by, contacted, answered, interested, hot, cold, real_account,
     demo_account, deposited, latest_remarks, current_status, created_at, last_updated_at";

/// Which leads a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadScope {
    All,
    Branch(i64),
    AssignedTo(i64),
    CreatedBy(i64),
    /// Caller has no visible leads, e.g. a sales manager without a branch.
    Nothing,
}

impl LeadScope {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            UserRole::Admin => LeadScope::All,
            UserRole::SalesManager => match user.branch_id {
                Some(branch_id) => LeadScope::Branch(branch_id),
                None => LeadScope::Nothing,
            },
            UserRole::Agent => LeadScope::AssignedTo(user.id),
            UserRole::KioskMember => LeadScope::CreatedBy(user.id),
        }
    }

    fn sql(&self) -> (&'static str, Option<i64>) {
        match self {
            LeadScope::All => ("1 = 1", None),
            LeadScope::Branch(id) => ("branch_id = ?3", Some(*id)),
            LeadScope::AssignedTo(id) => ("lead_agent_id = ?3", Some(*id)),
            LeadScope::CreatedBy(id) => ("created_by = ?3", Some(*id)),
            LeadScope::Nothing => ("0 = 1", None),
        }
    }

    pub fn allows(&self, lead: &Lead) -> bool {
        match self {
            LeadScope::All => true,
            LeadScope::Branch(id) => lead.branch_id == Some(*id),
            LeadScope::AssignedTo(id) => lead.lead_agent_id == Some(*id),
            LeadScope::CreatedBy(id) => lead.created_by == Some(*id),
            LeadScope::Nothing => false,
        }
    }
}

/// `created_at` bounds in unix seconds, both inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreatedBetween {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

fn lead_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    let flags = FlagVector {
        contacted: bool_from_row(row, 10)?,
        answered: bool_from_row(row, 11)?,
        interested: bool_from_row(row, 12)?,
        hot: bool_from_row(row, 13)?,
        cold: bool_from_row(row, 14)?,
        real: bool_from_row(row, 15)?,
        demo: bool_from_row(row, 16)?,
        deposited: bool_from_row(row, 17)?,
    };

    let mut lead = Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        nationality: row.get(4)?,
        language: row.get(5)?,
        source: row.get(6)?,
        branch_id: row.get(7)?,
        lead_agent_id: row.get(8)?,
        created_by: row.get(9)?,
        flags,
        deposit_status: DepositStatus::Unknown,
        status: LeadStatus::Lead,
        latest_remarks: row.get(18)?,
        current_status: row.get(19)?,
        created_at: row.get(20)?,
        last_updated_at: row.get(21)?,
    };
    lead.refresh_derived();
    Ok(lead)
}

pub async fn insert_lead(
    conn: AsyncDbConnection,
    request: &CreateLeadRequest,
    created_by: i64,
) -> Result<Lead> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let lead = conn.query_row(
        &format!(
            "INSERT INTO leads
             (name, phone, email, nationality, language, source, branch_id, lead_agent_id,
              created_by, created_at, last_updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {LEAD_COLUMNS}"
        ),
        params![
            request.name.trim(),
            request.phone.as_ref(),
            request.email.as_ref(),
            request.nationality.as_ref(),
            request.language.as_ref(),
            request.source.as_ref(),
            request.branch_id,
            request.lead_agent_id,
            created_by,
            now,
            now
        ],
        lead_from_row,
    )?;

    Ok(lead)
}

pub async fn get_lead(conn: AsyncDbConnection, id: i64) -> Result<Option<Lead>> {
    let conn = conn.lock().await?;

    let lead = conn
        .query_row(
            &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ? AND deleted = 0"),
            [id],
            lead_from_row,
        )
        .optional()?;

    Ok(lead)
}

/// All non-deleted leads in `scope` created within `created`, newest first.
/// Tab, search and pagination are applied by the caller.
pub async fn list_leads(
    conn: AsyncDbConnection,
    scope: LeadScope,
    created: CreatedBetween,
) -> Result<Vec<Lead>> {
    let conn = conn.lock().await?;
    let (scope_sql, scope_param) = scope.sql();

    let sql = format!(
        "SELECT {LEAD_COLUMNS} FROM leads
         WHERE deleted = 0
           AND {scope_sql}
           AND (?1 IS NULL OR created_at >= ?1)
           AND (?2 IS NULL OR created_at <= ?2)
         ORDER BY created_at DESC, id DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let leads = match scope_param {
        Some(value) => stmt
            .query_map(params![created.from, created.to, value], lead_from_row)?
            .collect::<Result<Vec<_>, _>>()?,
        None => stmt
            .query_map(params![created.from, created.to], lead_from_row)?
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(leads)
}

pub async fn update_lead(conn: AsyncDbConnection, request: &UpdateLeadRequest) -> Result<Option<Lead>> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let lead = conn
        .query_row(
            &format!(
                "UPDATE leads SET
                    name = COALESCE(?1, name),
                    phone = COALESCE(?2, phone),
                    email = COALESCE(?3, email),
                    nationality = COALESCE(?4, nationality),
                    language = COALESCE(?5, language),
                    source = COALESCE(?6, source),
                    branch_id = COALESCE(?7, branch_id),
                    last_updated_at = ?8
                 WHERE id = ?9 AND deleted = 0
                 RETURNING {LEAD_COLUMNS}"
            ),
            params![
                request.name.as_ref().map(|n| n.trim()),
                request.phone.as_ref(),
                request.email.as_ref(),
                request.nationality.as_ref(),
                request.language.as_ref(),
                request.source.as_ref(),
                request.branch_id,
                now,
                request.id
            ],
            lead_from_row,
        )
        .optional()?;

    Ok(lead)
}

/// Replaces the lead's whole flag vector with the one `stage` maps to and
/// records the change in the status history. Both writes share a transaction.
pub async fn update_status(
    conn: AsyncDbConnection,
    id: i64,
    stage: PipelineStage,
    current_status: &str,
    latest_remarks: &str,
    changed_by: i64,
    now: i64,
) -> Result<Option<Lead>> {
    let mut conn = conn.lock().await?;
    let flags = stage.to_flags();
    let tx = conn.transaction()?;

    let lead = tx
        .query_row(
            &format!(
                "UPDATE leads SET
                    contacted = ?1, answered = ?2, interested = ?3, hot = ?4, cold = ?5,
                    real_account = ?6, demo_account = ?7, deposited = ?8,
                    current_status = ?9, latest_remarks = ?10, last_updated_at = ?11
                 WHERE id = ?12 AND deleted = 0
                 RETURNING {LEAD_COLUMNS}"
            ),
            params![
                flags.contacted,
                flags.answered,
                flags.interested,
                flags.hot,
                flags.cold,
                flags.real,
                flags.demo,
                flags.deposited,
                current_status,
                latest_remarks,
                now,
                id
            ],
            lead_from_row,
        )
        .optional()?;

    let Some(lead) = lead else {
        return Ok(None);
    };

    tx.execute(
        "INSERT INTO lead_status_history
         (lead_id, current_status, latest_remarks, contacted, answered, interested, hot, cold,
          real_account, demo_account, deposited, changed_by, changed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            id,
            current_status,
            latest_remarks,
            flags.contacted,
            flags.answered,
            flags.interested,
            flags.hot,
            flags.cold,
            flags.real,
            flags.demo,
            flags.deposited,
            changed_by,
            now
        ],
    )?;

    tx.commit()?;
    Ok(Some(lead))
}

pub async fn assign_agent(conn: AsyncDbConnection, lead_id: i64, agent_id: i64) -> Result<Option<Lead>> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let lead = conn
        .query_row(
            &format!(
                "UPDATE leads SET lead_agent_id = ?1, last_updated_at = ?2
                 WHERE id = ?3 AND deleted = 0
                 RETURNING {LEAD_COLUMNS}"
            ),
            params![agent_id, now, lead_id],
            lead_from_row,
        )
        .optional()?;

    Ok(lead)
}

pub async fn delete_lead(conn: AsyncDbConnection, id: i64) -> Result<bool> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let updated = conn.execute(
        "UPDATE leads SET deleted = 1, last_updated_at = ?1 WHERE id = ?2 AND deleted = 0",
        params![now, id],
    )?;

    Ok(updated > 0)
}

pub async fn list_history(conn: AsyncDbConnection, lead_id: i64) -> Result<Vec<LeadHistoryEntry>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(
        "SELECT id, lead_id, current_status, latest_remarks, contacted, answered, interested,
                hot, cold, real_account, demo_account, deposited, changed_by, changed_at
         FROM lead_status_history
         WHERE lead_id = ?
         ORDER BY changed_at DESC, id DESC",
    )?;

    let history = stmt
        .query_map([lead_id], |row| {
            Ok(LeadHistoryEntry {
                id: row.get(0)?,
                lead_id: row.get(1)?,
                current_status: row.get(2)?,
                latest_remarks: row.get(3)?,
                flags: FlagVector {
                    contacted: bool_from_row(row, 4)?,
                    answered: bool_from_row(row, 5)?,
                    interested: bool_from_row(row, 6)?,
                    hot: bool_from_row(row, 7)?,
                    cold: bool_from_row(row, 8)?,
                    real: bool_from_row(row, 9)?,
                    demo: bool_from_row(row, 10)?,
                    deposited: bool_from_row(row, 11)?,
                },
                changed_by: row.get(12)?,
                changed_at: row.get(13)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{seed_branch, seed_user, temp_database};
    use shared_types::{ContactOutcome, HotAccount, Interest, Temperature};

    fn create(name: &str, branch_id: Option<i64>) -> CreateLeadRequest {
        CreateLeadRequest {
            name: name.to_string(),
            phone: Some("+971501234567".to_string()),
            email: None,
            nationality: None,
            language: None,
            source: Some("Kiosk".to_string()),
            branch_id,
            lead_agent_id: None,
        }
    }

    fn real_deposited() -> PipelineStage {
        PipelineStage::Contacted(ContactOutcome::Answered(Interest::Interested(
            Temperature::Hot(HotAccount::Real { deposited: true }),
        )))
    }

    #[tokio::test]
    async fn test_new_lead_starts_uncontacted() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();
        let kiosk = seed_user(&conn, "kiosk@example.com", "kiosk-member", None).await;

        let lead = insert_lead(conn, &create("Huda", None), kiosk).await.unwrap();

        assert_eq!(lead.flags, FlagVector::default());
        assert_eq!(lead.stage(), PipelineStage::Uncontacted);
        assert_eq!(lead.status, LeadStatus::Lead);
        assert_eq!(lead.created_by, Some(kiosk));
    }

    #[tokio::test]
    async fn test_update_status_writes_flags_and_history() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();
        let agent = seed_user(&conn, "agent@example.com", "agent", None).await;
        let lead = insert_lead(conn.clone(), &create("Huda", None), agent)
            .await
            .unwrap();

        let updated = update_status(
            conn.clone(),
            lead.id,
            real_deposited(),
            "Deposit",
            "Funded",
            agent,
            1_700_000_000,
        )
        .await
        .unwrap()
        .unwrap();

        assert!(updated.flags.deposited && updated.flags.real && updated.flags.contacted);
        assert!(!updated.flags.demo);
        assert_eq!(updated.status, LeadStatus::Real);
        assert_eq!(updated.deposit_status, DepositStatus::Deposited);
        assert_eq!(updated.current_status.as_deref(), Some("Deposit"));
        assert_eq!(updated.last_updated_at, 1_700_000_000);

        let history = list_history(conn.clone(), lead.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].current_status, "Deposit");
        assert_eq!(history[0].changed_by, Some(agent));
        assert_eq!(history[0].flags, updated.flags);

        assert!(update_status(conn, 9999, real_deposited(), "Deposit", "", agent, 0)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_scope_and_date_bounds() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();
        let dubai = seed_branch(&conn, "Dubai").await;
        let sharjah = seed_branch(&conn, "Sharjah").await;
        let kiosk = seed_user(&conn, "kiosk@example.com", "kiosk-member", Some(dubai)).await;
        let other_kiosk = seed_user(&conn, "kiosk2@example.com", "kiosk-member", None).await;
        let agent = seed_user(&conn, "agent@example.com", "agent", Some(sharjah)).await;

        let a = insert_lead(conn.clone(), &create("A", Some(dubai)), kiosk)
            .await
            .unwrap();
        let b = insert_lead(conn.clone(), &create("B", Some(sharjah)), other_kiosk)
            .await
            .unwrap();
        assign_agent(conn.clone(), b.id, agent).await.unwrap();

        let all = list_leads(conn.clone(), LeadScope::All, CreatedBetween::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let branch = list_leads(conn.clone(), LeadScope::Branch(dubai), CreatedBetween::default())
            .await
            .unwrap();
        assert_eq!(branch.len(), 1);
        assert_eq!(branch[0].id, a.id);

        let mine = list_leads(conn.clone(), LeadScope::AssignedTo(agent), CreatedBetween::default())
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, b.id);
        assert!(LeadScope::AssignedTo(agent).allows(&mine[0]));

        let created = list_leads(conn.clone(), LeadScope::CreatedBy(kiosk), CreatedBetween::default())
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, a.id);

        assert!(list_leads(conn.clone(), LeadScope::Nothing, CreatedBetween::default())
            .await
            .unwrap()
            .is_empty());

        let future = CreatedBetween {
            from: Some(a.created_at + 86_400),
            to: None,
        };
        assert!(list_leads(conn.clone(), LeadScope::All, future)
            .await
            .unwrap()
            .is_empty());

        let past = CreatedBetween {
            from: None,
            to: Some(a.created_at - 86_400),
        };
        assert!(list_leads(conn, LeadScope::All, past).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();
        let kiosk = seed_user(&conn, "kiosk@example.com", "kiosk-member", None).await;
        let lead = insert_lead(conn.clone(), &create("Old", None), kiosk)
            .await
            .unwrap();

        let updated = update_lead(
            conn.clone(),
            &UpdateLeadRequest {
                id: lead.id,
                name: Some("New".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.name, "New");
        assert_eq!(updated.phone, lead.phone);
        assert_eq!(updated.flags, lead.flags);

        assert!(delete_lead(conn.clone(), lead.id).await.unwrap());
        assert!(!delete_lead(conn.clone(), lead.id).await.unwrap());
        assert!(get_lead(conn.clone(), lead.id).await.unwrap().is_none());
        assert!(list_leads(conn, LeadScope::All, CreatedBetween::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_scope_for_user_roles() {
        let mut user = User {
            id: 5,
            name: "U".to_string(),
            email: "u@example.com".to_string(),
            phone: None,
            role: UserRole::Admin,
            branch_id: Some(3),
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(LeadScope::for_user(&user), LeadScope::All);
        user.role = UserRole::SalesManager;
        assert_eq!(LeadScope::for_user(&user), LeadScope::Branch(3));
        user.role = UserRole::Agent;
        assert_eq!(LeadScope::for_user(&user), LeadScope::AssignedTo(5));
        user.role = UserRole::KioskMember;
        assert_eq!(LeadScope::for_user(&user), LeadScope::CreatedBy(5));
        user.role = UserRole::SalesManager;
        user.branch_id = None;
        assert_eq!(LeadScope::for_user(&user), LeadScope::Nothing);
    }
}
