use std::path::PathBuf;

/// Returns the path to the paytally database based on the operating system
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/paytally/db.sqlite`
/// - **Linux**: `~/.local/share/paytally/db.sqlite`
/// - **Windows**: `%LOCALAPPDATA%\paytally\db.sqlite`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("paytally").join("db.sqlite"))
}

/// Initialize the database at `override_path`, or at the platform default
pub fn initialize_database(
    override_path: Option<PathBuf>,
) -> anyhow::Result<(std::sync::Arc<crate::database::Database>, PathBuf)> {
    let db_path = match override_path {
        Some(path) => path,
        None => get_db_path()?,
    };

    let db = crate::database::Database::new(&db_path)?;
    Ok((std::sync::Arc::new(db), db_path))
}
