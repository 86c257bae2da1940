use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

use filevault::config::DatabaseConfig;
use filevault::db::Database;
use filevault::error::{AppError, ErrorKind, Result};
use filevault::models::{ContentHash, CreateUserRequest};
use filevault::services::{
    AuthService, ContentLedger, QuotaLedger, Reconciler, UserService, VaultEngine, VaultLimits,
};
use filevault::storage::{BlobReader, BlobStore, LocalBlobStore, StagingArea};

const MB: usize = 1024 * 1024;

/// Local store that counts physical puts and can be told to fail
struct CountingStore {
    inner: LocalBlobStore,
    puts: AtomicUsize,
    fail_puts: AtomicBool,
    fail_delete_of: Mutex<Option<String>>,
}

#[async_trait]
impl BlobStore for CountingStore {
    fn locate(&self, hash: &ContentHash) -> String {
        self.inner.locate(hash)
    }

    async fn put(&self, hash: &ContentHash, staged: &Path) -> Result<String> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(AppError::Storage("disk full".to_string()));
        }
        self.inner.put(hash, staged).await
    }

    async fn open(&self, location: &str) -> Result<BlobReader> {
        self.inner.open(location).await
    }

    async fn delete(&self, location: &str) -> Result<bool> {
        if self.fail_delete_of.lock().unwrap().as_deref() == Some(location) {
            return Err(AppError::Storage("permission denied".to_string()));
        }
        self.inner.delete(location).await
    }

    async fn exists(&self, location: &str) -> Result<bool> {
        self.inner.exists(location).await
    }

    fn storage_type(&self) -> &'static str {
        "counting"
    }
}

struct Harness {
    dir: TempDir,
    engine: VaultEngine,
    store: Arc<CountingStore>,
}

impl Harness {
    async fn new() -> Self {
        Self::with_limits(VaultLimits {
            max_upload_bytes: 64 * MB as u64,
            default_quota_bytes: 1024 * MB as i64,
        })
        .await
    }

    async fn with_limits(limits: VaultLimits) -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::new(&DatabaseConfig {
            path: dir.path().join("meta.db").to_string_lossy().into_owned(),
            max_connections: 5,
            busy_timeout_ms: 30_000,
        })
        .await
        .unwrap();
        db.run_migrations().await.unwrap();

        let blob_root = dir.path().join("blobs");
        let store = Arc::new(CountingStore {
            inner: LocalBlobStore::new(&blob_root),
            puts: AtomicUsize::new(0),
            fail_puts: AtomicBool::new(false),
            fail_delete_of: Mutex::new(None),
        });
        let staging = StagingArea::new(blob_root.join(".staging")).await.unwrap();
        let engine = VaultEngine::new(db, store.clone(), staging, limits);

        Self {
            dir,
            engine,
            store,
        }
    }

    async fn user(&self, id: &str) -> String {
        sqlx::query("INSERT INTO users (id, email, name, password_hash) VALUES (?, ?, ?, 'x')")
            .bind(id)
            .bind(format!("{}@example.com", id))
            .bind(id)
            .execute(self.engine.db().pool())
            .await
            .unwrap();
        id.to_string()
    }

    async fn user_with_limit(&self, id: &str, limit: usize) -> String {
        let id = self.user(id).await;
        self.engine.set_quota_limit(&id, limit as i64).await.unwrap();
        id
    }

    fn puts(&self) -> usize {
        self.store.puts.load(Ordering::SeqCst)
    }

    async fn ref_count(&self, data: &[u8]) -> Option<i64> {
        ContentLedger::get(self.engine.db().pool(), &ContentHash::of(data))
            .await
            .unwrap()
            .map(|c| c.ref_count)
    }

    async fn blob_present(&self, data: &[u8]) -> bool {
        let location = self.store.locate(&ContentHash::of(data));
        self.store.exists(&location).await.unwrap()
    }

    async fn used(&self, user: &str) -> i64 {
        self.engine.usage(user).await.unwrap().used
    }

    async fn live_bytes(&self, user: &str) -> i64 {
        sqlx::query_scalar("SELECT COALESCE(SUM(size), 0) FROM files WHERE owner_id = ?")
            .bind(user)
            .fetch_one(self.engine.db().pool())
            .await
            .unwrap()
    }

    async fn read_all(&self, user: &str, file_id: &str) -> Result<Vec<u8>> {
        let (_, mut reader) = self.engine.fetch(user, file_id).await?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        Ok(data)
    }

    /// Leave content at zero references with its blob in place, as a crash
    /// between the revoke commit and the reap would
    async fn orphan_all(&self) {
        let pool = self.engine.db().pool();
        sqlx::query("DELETE FROM files").execute(pool).await.unwrap();
        sqlx::query("UPDATE contents SET ref_count = 0")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("UPDATE quotas SET used_bytes = 0")
            .execute(pool)
            .await
            .unwrap();
    }

    fn staging_entries(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("blobs").join(".staging"))
            .unwrap()
            .count()
    }
}

fn payload(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

#[tokio::test]
async fn test_dedup_lifecycle_across_two_users() {
    let h = Harness::new().await;
    let a = h.user_with_limit("alice", 10 * MB).await;
    let b = h.user_with_limit("bob", 10 * MB).await;
    let p = payload(1, 3 * MB);

    let fa = h.engine.ingest(&a, "p.bin", p.as_slice()).await.unwrap();
    assert_eq!(h.used(&a).await, 3 * MB as i64);

    let fb = h.engine.ingest(&b, "copy.bin", p.as_slice()).await.unwrap();
    assert_eq!(fa.content_hash, fb.content_hash);
    assert_eq!(h.ref_count(&p).await, Some(2));
    assert_eq!(h.puts(), 1);
    assert_eq!(h.used(&b).await, 3 * MB as i64);
    assert_eq!(h.used(&a).await, 3 * MB as i64);

    h.engine.revoke(&a, &fa.id).await.unwrap();
    assert_eq!(h.ref_count(&p).await, Some(1));
    assert!(h.blob_present(&p).await);
    assert_eq!(h.used(&a).await, 0);
    assert_eq!(h.read_all(&b, &fb.id).await.unwrap(), p);

    h.engine.revoke(&b, &fb.id).await.unwrap();
    assert_eq!(h.ref_count(&p).await, None);
    assert!(!h.blob_present(&p).await);
    assert_eq!(h.used(&b).await, 0);
}

#[tokio::test]
async fn test_quota_exceeded_leaves_no_trace() {
    let h = Harness::new().await;
    let u = h.user_with_limit("carol", 10 * MB).await;

    let big = payload(2, 9 * MB);
    h.engine.ingest(&u, "big.bin", big.as_slice()).await.unwrap();

    let extra = payload(3, 2 * MB);
    let err = h
        .engine
        .ingest(&u, "extra.bin", extra.as_slice())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    assert_eq!(h.ref_count(&extra).await, None);
    assert!(!h.blob_present(&extra).await);
    assert_eq!(h.used(&u).await, 9 * MB as i64);
    assert_eq!(h.engine.list_files(&u).await.unwrap().len(), 1);
    assert_eq!(h.puts(), 1);
}

#[tokio::test]
async fn test_concurrent_identical_ingests_write_once() {
    let h = Harness::new().await;
    let users = [h.user("u1").await, h.user("u2").await, h.user("u3").await];
    let p = payload(4, 256 * 1024);

    let mut tasks = Vec::new();
    for i in 0..12 {
        let engine = h.engine.clone();
        let user = users[i % users.len()].clone();
        let data = p.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .ingest(&user, &format!("copy-{}.bin", i), data.as_slice())
                .await
        }));
    }

    let mut ok = 0;
    for task in tasks {
        task.await.unwrap().unwrap();
        ok += 1;
    }

    assert_eq!(ok, 12);
    assert_eq!(h.puts(), 1);
    assert_eq!(h.ref_count(&p).await, Some(12));
    for user in &users {
        assert_eq!(h.used(user).await, h.live_bytes(user).await);
        assert_eq!(h.used(user).await, 4 * 256 * 1024);
    }
}

#[tokio::test]
async fn test_concurrent_ingests_cannot_overshoot_quota() {
    let h = Harness::new().await;
    let u = h.user_with_limit("dave", 5 * MB).await;

    let mut tasks = Vec::new();
    for i in 0..8u8 {
        let engine = h.engine.clone();
        let user = u.clone();
        tasks.push(tokio::spawn(async move {
            let data = payload(10 + i, MB);
            engine.ingest(&user, "chunk.bin", data.as_slice()).await
        }));
    }

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::QuotaExceeded),
        }
    }

    assert_eq!(accepted, 5);
    assert_eq!(h.used(&u).await, 5 * MB as i64);
    assert_eq!(h.live_bytes(&u).await, 5 * MB as i64);
    assert_eq!(h.puts(), 5);
}

#[tokio::test]
async fn test_revoke_unknown_file_is_not_found() {
    let h = Harness::new().await;
    let u = h.user("erin").await;
    let p = payload(5, 1000);
    h.engine.ingest(&u, "a.txt", p.as_slice()).await.unwrap();

    let err = h.engine.revoke(&u, "no-such-file").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(h.ref_count(&p).await, Some(1));
    assert_eq!(h.used(&u).await, 1000);
}

#[tokio::test]
async fn test_share_grants_read_until_owner_revokes() {
    let h = Harness::new().await;
    let a = h.user("owner").await;
    let b = h.user("reader").await;
    let p = payload(6, 4096);
    let f = h.engine.ingest(&a, "notes.txt", p.as_slice()).await.unwrap();

    let err = h.read_all(&b, &f.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    h.engine.share(&a, &f.id, &b).await.unwrap();
    assert_eq!(h.read_all(&b, &f.id).await.unwrap(), p);
    assert_eq!(h.engine.list_shared_with(&b).await.unwrap().len(), 1);

    let err = h.engine.revoke(&b, &f.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(h.ref_count(&p).await, Some(1));

    h.engine.revoke(&a, &f.id).await.unwrap();
    let err = h.read_all(&b, &f.id).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::NotFound | ErrorKind::Forbidden));
    assert!(h.engine.list_shared_with(&b).await.unwrap().is_empty());
    let grants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shares")
        .fetch_one(h.engine.db().pool())
        .await
        .unwrap();
    assert_eq!(grants, 0);
}

#[tokio::test]
async fn test_share_rules() {
    let h = Harness::new().await;
    let a = h.user("ann").await;
    let b = h.user("ben").await;
    let c = h.user("cat").await;
    let f = h.engine.ingest(&a, "x.txt", &b"shared"[..]).await.unwrap();

    let first = h.engine.share(&a, &f.id, &b).await.unwrap();
    let again = h.engine.share(&a, &f.id, &b).await.unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(first.mode, "read");
    assert_eq!(h.engine.list_grants(&a, &f.id).await.unwrap().len(), 1);

    let err = h.engine.share(&a, &f.id, &a).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    // A grantee cannot re-share
    let err = h.engine.share(&b, &f.id, &c).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // Non-owners learn nothing about targets
    let err = h.engine.share(&c, &f.id, "ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = h.engine.share(&c, &f.id, &c).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = h.engine.share(&a, &f.id, "ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h.engine.share(&a, "missing", &b).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h.engine.list_grants(&b, &f.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_unshare_removes_access() {
    let h = Harness::new().await;
    let a = h.user("amy").await;
    let b = h.user("bo").await;
    let f = h.engine.ingest(&a, "doc.md", &b"# doc"[..]).await.unwrap();

    h.engine.share(&a, &f.id, &b).await.unwrap();
    assert!(h.engine.stat(&b, &f.id).await.is_ok());

    let err = h.engine.unshare(&b, &f.id, &b).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    h.engine.unshare(&a, &f.id, &b).await.unwrap();
    let err = h.engine.stat(&b, &f.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = h.engine.unshare(&a, &f.id, &b).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_oversized_payload_is_rejected() {
    let h = Harness::with_limits(VaultLimits {
        max_upload_bytes: 16,
        default_quota_bytes: 1024,
    })
    .await;
    let u = h.user("fay").await;

    let err = h
        .engine
        .ingest(&u, "big.bin", &[0u8; 17][..])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PayloadTooLarge);
    assert_eq!(h.puts(), 0);
    assert_eq!(h.used(&u).await, 0);

    h.engine.ingest(&u, "ok.bin", &[0u8; 16][..]).await.unwrap();
    assert_eq!(h.used(&u).await, 16);
}

#[tokio::test]
async fn test_invalid_display_name_is_rejected() {
    let h = Harness::new().await;
    let u = h.user("gus").await;

    let err = h
        .engine
        .ingest(&u, "../etc/passwd", &b"data"[..])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(h.ref_count(b"data").await, None);
}

#[tokio::test]
async fn test_quota_is_created_lazily_with_default_limit() {
    let h = Harness::with_limits(VaultLimits {
        max_upload_bytes: 1024,
        default_quota_bytes: 100,
    })
    .await;

    assert!(QuotaLedger::get(h.engine.db().pool(), "lazy").await.unwrap().is_none());
    h.engine.ingest("lazy", "a.bin", &[1u8; 60][..]).await.unwrap();

    let quota = QuotaLedger::get(h.engine.db().pool(), "lazy").await.unwrap().unwrap();
    assert_eq!(quota.used_bytes, 60);
    assert_eq!(quota.limit_bytes, 100);

    let err = h
        .engine
        .ingest("lazy", "b.bin", &[2u8; 60][..])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
}

#[tokio::test]
async fn test_limit_cannot_drop_below_usage() {
    let h = Harness::new().await;
    let u = h.user_with_limit("hal", 1000).await;
    h.engine.ingest(&u, "a.bin", &[3u8; 600][..]).await.unwrap();

    let err = h.engine.set_quota_limit(&u, 500).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let usage = h.engine.set_quota_limit(&u, 600).await.unwrap();
    assert_eq!(usage.limit, 600);
    assert_eq!(usage.percentage, 100);
    assert_eq!(usage.file_count, 1);
}

#[tokio::test]
async fn test_same_user_duplicate_uploads_are_charged_separately() {
    let h = Harness::new().await;
    let u = h.user("ivy").await;
    let p = payload(7, 5000);

    let f1 = h.engine.ingest(&u, "one.bin", p.as_slice()).await.unwrap();
    let f2 = h.engine.ingest(&u, "two.bin", p.as_slice()).await.unwrap();
    assert_ne!(f1.id, f2.id);
    assert_eq!(h.used(&u).await, 10_000);

    let listed = h.engine.list_files(&u).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|f| f.ref_count == 2));

    h.engine.revoke(&u, &f1.id).await.unwrap();
    assert_eq!(h.used(&u).await, 5000);
    assert_eq!(h.used(&u).await, h.live_bytes(&u).await);
    assert!(h.blob_present(&p).await);
}

#[tokio::test]
async fn test_reingest_after_removal_stores_again() {
    let h = Harness::new().await;
    let u = h.user("jo").await;
    let p = payload(8, 2048);

    let f = h.engine.ingest(&u, "a.bin", p.as_slice()).await.unwrap();
    h.engine.revoke(&u, &f.id).await.unwrap();
    assert!(!h.blob_present(&p).await);

    let f = h.engine.ingest(&u, "a.bin", p.as_slice()).await.unwrap();
    assert_eq!(h.puts(), 2);
    assert_eq!(h.ref_count(&p).await, Some(1));
    assert_eq!(h.read_all(&u, &f.id).await.unwrap(), p);
}

#[tokio::test]
async fn test_sweep_reaps_content_orphaned_by_a_crash() {
    let h = Harness::new().await;
    let u = h.user("kim").await;
    let p = payload(9, 3000);
    let f = h.engine.ingest(&u, "a.bin", p.as_slice()).await.unwrap();

    // State left by a crash after the revoke transaction committed but
    // before the blob was removed.
    let pool = h.engine.db().pool();
    sqlx::query("DELETE FROM files WHERE id = ?")
        .bind(&f.id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("UPDATE contents SET ref_count = 0")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("UPDATE quotas SET used_bytes = 0")
        .execute(pool)
        .await
        .unwrap();
    assert!(h.blob_present(&p).await);

    let reconciler = Reconciler::new(h.engine.clone());
    let report = reconciler.sweep().await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.reaped, 1);
    assert!(!h.blob_present(&p).await);
    assert_eq!(h.ref_count(&p).await, None);

    let again = reconciler.sweep().await.unwrap();
    assert_eq!(again.examined, 0);
    assert_eq!(again.reaped, 0);
}

#[tokio::test]
async fn test_reap_leaves_referenced_content_alone() {
    let h = Harness::new().await;
    let u = h.user("lee").await;
    let p = payload(11, 100);
    h.engine.ingest(&u, "a.bin", p.as_slice()).await.unwrap();

    assert!(!h.engine.reap(&ContentHash::of(&p)).await.unwrap());
    assert!(h.blob_present(&p).await);
    assert_eq!(h.ref_count(&p).await, Some(1));
}

#[tokio::test]
async fn test_register_opens_quota_and_first_user_is_admin() {
    let h = Harness::with_limits(VaultLimits {
        max_upload_bytes: 1024,
        default_quota_bytes: 4242,
    })
    .await;

    let first = AuthService::register(
        h.engine.db(),
        CreateUserRequest {
            email: "root@example.com".to_string(),
            name: "Root".to_string(),
            password: "password1".to_string(),
        },
        4242,
    )
    .await
    .unwrap();
    let second = AuthService::register(
        h.engine.db(),
        CreateUserRequest {
            email: "user@example.com".to_string(),
            name: "User".to_string(),
            password: "password2".to_string(),
        },
        4242,
    )
    .await
    .unwrap();

    assert_eq!(first.role, "admin");
    assert_eq!(second.role, "user");
    let quota = QuotaLedger::get(h.engine.db().pool(), &second.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!((quota.used_bytes, quota.limit_bytes), (0, 4242));

    let err = AuthService::register(
        h.engine.db(),
        CreateUserRequest {
            email: "user@example.com".to_string(),
            name: "Dup".to_string(),
            password: "password3".to_string(),
        },
        4242,
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_failed_blob_write_aborts_ingest() {
    let h = Harness::new().await;
    let u = h.user("mia").await;
    let p = payload(12, 4096);
    h.store.fail_puts.store(true, Ordering::SeqCst);

    let err = h.engine.ingest(&u, "a.bin", p.as_slice()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StorageFailure);
    assert_eq!(h.ref_count(&p).await, None);
    assert!(QuotaLedger::get(h.engine.db().pool(), &u).await.unwrap().is_none());
    assert!(h.engine.list_files(&u).await.unwrap().is_empty());
    assert!(!h.blob_present(&p).await);
    assert_eq!(h.staging_entries(), 0);

    h.store.fail_puts.store(false, Ordering::SeqCst);
    h.engine.ingest(&u, "a.bin", p.as_slice()).await.unwrap();
    assert_eq!(h.ref_count(&p).await, Some(1));
    assert_eq!(h.used(&u).await, 4096);
}

#[tokio::test]
async fn test_sweep_continues_past_undeletable_blob() {
    let h = Harness::new().await;
    let u = h.user("ned").await;
    let payloads: Vec<Vec<u8>> = (0..5u8).map(|i| payload(20 + i, 512)).collect();
    for (i, p) in payloads.iter().enumerate() {
        h.engine
            .ingest(&u, &format!("{}.bin", i), p.as_slice())
            .await
            .unwrap();
    }
    h.orphan_all().await;

    let stuck = h.store.locate(&ContentHash::of(&payloads[2]));
    *h.store.fail_delete_of.lock().unwrap() = Some(stuck);

    let reconciler = Reconciler::new(h.engine.clone());
    let report = reconciler.sweep().await.unwrap();
    assert_eq!(report.examined, 5);
    assert_eq!(report.reaped, 4);
    assert_eq!(report.failed, 1);
    for (i, p) in payloads.iter().enumerate() {
        let expected = if i == 2 { Some(0) } else { None };
        assert_eq!(h.ref_count(p).await, expected);
        assert_eq!(h.blob_present(p).await, i == 2);
    }

    let again = reconciler.sweep().await.unwrap();
    assert_eq!((again.examined, again.reaped, again.failed), (1, 0, 1));

    *h.store.fail_delete_of.lock().unwrap() = None;
    let last = reconciler.sweep().await.unwrap();
    assert_eq!((last.examined, last.reaped, last.failed), (1, 1, 0));
    assert_eq!(h.ref_count(&payloads[2]).await, None);
    assert!(!h.blob_present(&payloads[2]).await);
}

#[tokio::test]
async fn test_user_directory_lists_others_without_secrets() {
    let h = Harness::new().await;
    let me = h.user("pat").await;
    h.user("quinn").await;
    h.user("rae").await;

    let users = UserService::list_users(h.engine.db().pool(), &me).await.unwrap();

    let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["quinn", "rae"]);
    assert_eq!(users[0].email, "quinn@example.com");

    let json = serde_json::to_value(&users).unwrap();
    assert!(json[0].get("password_hash").is_none());

    // The listed id is what sharing takes
    let f = h.engine.ingest(&me, "x.txt", &b"hi"[..]).await.unwrap();
    h.engine.share(&me, &f.id, &users[1].id).await.unwrap();
    assert_eq!(h.engine.list_shared_with("rae").await.unwrap().len(), 1);
}
