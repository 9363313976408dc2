use crate::db::*;
use tempfile::NamedTempFile;

mod migrations;

/// Open a fresh database in a temp file; keep the file alive for the test's duration
async fn open_db() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    (db, temp_file)
}

/// Register a user directly in the store
async fn insert_user(db: &Database, email: &str) -> crate::types::UserId {
    db.insert_user(&NewUser {
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: "$2b$04$storedhash".to_string(),
    })
    .await
    .unwrap()
}

fn new_job(owner: crate::types::UserId, locator: &str) -> NewJob {
    NewJob {
        owner,
        source_locator: locator.to_string(),
        display_name: "test image".to_string(),
    }
}
