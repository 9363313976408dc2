use super::*;

#[tokio::test]
async fn test_database_creation() {
    let (db, _temp_file) = open_db().await;

    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(db.pool())
            .await
            .unwrap();

    for table in ["jobs", "schema_version", "sessions", "users"] {
        assert!(tables.contains(&table.to_string()), "missing table {table}");
    }

    let indexes: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='jobs'")
            .fetch_all(db.pool())
            .await
            .unwrap();
    for index in [
        "idx_jobs_user_status",
        "idx_jobs_created",
        "idx_jobs_active_locator",
    ] {
        assert!(indexes.contains(&index.to_string()), "missing index {index}");
    }

    assert_eq!(db.schema_version().await.unwrap(), 1);

    db.close().await;
}

#[tokio::test]
async fn test_reopen_does_not_rerun_migrations() {
    let temp_file = NamedTempFile::new().unwrap();

    let db = Database::new(temp_file.path()).await.unwrap();
    let owner = insert_user(&db, "a@example.com").await;
    db.insert_job(&new_job(owner, "https://www.freepik.com/a_1.htm"))
        .await
        .unwrap();
    db.close().await;

    let db = Database::new(temp_file.path()).await.unwrap();
    assert_eq!(db.schema_version().await.unwrap(), 1);
    assert_eq!(db.list_jobs_by_owner(owner).await.unwrap().len(), 1);

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(versions, 1);

    db.close().await;
}

#[tokio::test]
async fn test_creates_missing_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tracker.db");

    let db = Database::new(&path).await.unwrap();
    assert!(path.exists());

    db.close().await;
}

#[tokio::test]
async fn test_deleting_user_cascades_to_jobs_and_sessions() {
    let (db, _temp_file) = open_db().await;
    let owner = insert_user(&db, "a@example.com").await;
    db.insert_job(&new_job(owner, "https://www.freepik.com/a_1.htm"))
        .await
        .unwrap();
    db.insert_session("h", owner, i64::MAX).await.unwrap();

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(owner)
        .execute(db.pool())
        .await
        .unwrap();

    assert!(db.list_jobs_by_owner(owner).await.unwrap().is_empty());
    assert!(db.find_session("h", 0).await.unwrap().is_none());

    db.close().await;
}
