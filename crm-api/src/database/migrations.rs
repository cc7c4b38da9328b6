use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    // Create branches table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS branches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR NOT NULL,
            location VARCHAR,
            phone VARCHAR,
            manager_id INTEGER,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    // Create users table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR NOT NULL,
            email VARCHAR NOT NULL UNIQUE,
            phone VARCHAR,
            role VARCHAR NOT NULL CHECK (role IN ('admin', 'sales-manager', 'agent', 'kiosk-member')),
            branch_id INTEGER,
            password_salt VARCHAR NOT NULL,
            password_hash VARCHAR NOT NULL,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (branch_id) REFERENCES branches (id)
        )",
        [],
    )?;

    // Create sessions table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            token_hash BLOB NOT NULL UNIQUE,
            created_at BIGINT NOT NULL,
            expires_at BIGINT NOT NULL,
            revoked_at BIGINT,
            FOREIGN KEY (user_id) REFERENCES users (id)
        )",
        [],
    )?;

    // Create leads table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS leads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR NOT NULL,
            phone VARCHAR,
            email VARCHAR,
            nationality VARCHAR,
            language VARCHAR,
            source VARCHAR,
            branch_id INTEGER,
            lead_agent_id INTEGER,
            created_by INTEGER,
            contacted INTEGER NOT NULL DEFAULT 0,
            answered INTEGER NOT NULL DEFAULT 0,
            interested INTEGER NOT NULL DEFAULT 0,
            hot INTEGER NOT NULL DEFAULT 0,
            cold INTEGER NOT NULL DEFAULT 0,
            real_account INTEGER NOT NULL DEFAULT 0,
            demo_account INTEGER NOT NULL DEFAULT 0,
            deposited INTEGER NOT NULL DEFAULT 0,
            latest_remarks VARCHAR,
            current_status VARCHAR,
            created_at BIGINT NOT NULL,
            last_updated_at BIGINT NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (branch_id) REFERENCES branches (id),
            FOREIGN KEY (lead_agent_id) REFERENCES users (id),
            FOREIGN KEY (created_by) REFERENCES users (id)
        )",
        [],
    )?;

    // Create lead status history table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS lead_status_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lead_id INTEGER NOT NULL,
            current_status VARCHAR NOT NULL,
            latest_remarks VARCHAR NOT NULL,
            contacted INTEGER NOT NULL,
            answered INTEGER NOT NULL,
            interested INTEGER NOT NULL,
            hot INTEGER NOT NULL,
            cold INTEGER NOT NULL,
            real_account INTEGER NOT NULL,
            demo_account INTEGER NOT NULL,
            deposited INTEGER NOT NULL,
            changed_by INTEGER,
            changed_at BIGINT NOT NULL,
            FOREIGN KEY (lead_id) REFERENCES leads (id),
            FOREIGN KEY (changed_by) REFERENCES users (id)
        )",
        [],
    )?;

    // Create tasks table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title VARCHAR NOT NULL,
            description VARCHAR,
            lead_id INTEGER,
            assigned_to INTEGER,
            created_by INTEGER,
            status VARCHAR NOT NULL DEFAULT 'todo' CHECK (status IN ('todo', 'in-progress', 'done', 'cancelled')),
            priority VARCHAR NOT NULL DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high')),
            due_date VARCHAR,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (lead_id) REFERENCES leads (id),
            FOREIGN KEY (assigned_to) REFERENCES users (id),
            FOREIGN KEY (created_by) REFERENCES users (id)
        )",
        [],
    )?;

    // Create indexes for performance
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_leads_branch_created
            ON leads(branch_id, created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_leads_agent
            ON leads(lead_agent_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lead_status_history_lead
            ON lead_status_history(lead_id, changed_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_user
            ON sessions(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tasks_assigned
            ON tasks(assigned_to, status)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('branches', 'users', 'sessions', 'leads', 'lead_status_history', 'tasks')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 6);
    }

    #[test]
    fn test_lead_statuses_are_not_stored() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('leads')").unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(columns.contains(&"deposited".to_string()));
        assert!(!columns.contains(&"deposit_status".to_string()));
        assert!(!columns.contains(&"status".to_string()));
    }
}
