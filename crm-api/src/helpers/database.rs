use std::path::PathBuf;
use std::sync::Arc;

use shared_types::{CreateUserRequest, UserRole};

use crate::config::{ApiConfig, BootstrapConfig};
use crate::database::{users, Database};

/// Returns the default path of the CRM database based on the operating system
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/crm/crm.sqlite`
/// - **Linux**: `~/.local/share/crm/crm.sqlite`
/// - **Windows**: `%LOCALAPPDATA%\crm\crm.sqlite`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("crm").join("crm.sqlite"))
}

/// Opens (and migrates) the database named in the config, falling back to
/// [`get_db_path`].
pub fn initialize_database(config: &ApiConfig) -> anyhow::Result<(Arc<Database>, PathBuf)> {
    let db_path = match config.database_path() {
        Some(path) => path,
        None => get_db_path()?,
    };

    let db = Database::new(&db_path)?;
    Ok((Arc::new(db), db_path))
}

/// Creates the configured admin account when no users exist yet. Returns
/// whether an account was created.
pub async fn bootstrap_admin(db: &Database, bootstrap: Option<&BootstrapConfig>) -> anyhow::Result<bool> {
    let Some(bootstrap) = bootstrap else {
        return Ok(false);
    };

    if users::count_users(db.async_connection.clone()).await? > 0 {
        tracing::debug!("Users already exist, skipping admin bootstrap");
        return Ok(false);
    }

    if bootstrap.admin_password.trim().is_empty() {
        anyhow::bail!("Bootstrap admin password must not be empty");
    }

    let admin = users::insert_user(
        db.async_connection.clone(),
        &CreateUserRequest {
            name: bootstrap
                .admin_name
                .clone()
                .unwrap_or_else(|| "Administrator".to_string()),
            email: bootstrap.admin_email.clone(),
            password: bootstrap.admin_password.clone(),
            phone: None,
            role: UserRole::Admin,
            branch_id: None,
        },
    )
    .await?;

    tracing::info!("Created bootstrap admin {}", admin.email);
    Ok(true)
}
