use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use roster_core::{
    Anonymous, CredentialHasher, HashError, Identity, ImageError, ImageRef, ImageService,
    MembershipSync, Password, PhotoUpload, ProfileInput, ProfileUpdate, ResizeOptions,
    RoleAssigner, RoleSet, RoleSync, StoreError, StoreResult, StoredCredential, User,
    UserChanges, UserId, UserInput, UserStore, UserTransaction, UserWriteError, UserWrites,
};

use super::service::{ImagePolicy, UserWriteService};

type Journal = Arc<Mutex<Vec<String>>>;
type StateHook = Arc<dyn Fn(&mut MemoryState) + Send + Sync>;

fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().expect("journal").push(entry.into());
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    roles: HashMap<UserId, RoleSet>,
    next_id: UserId,
}

#[derive(Clone)]
struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    journal: Journal,
    fail_on: Option<&'static str>,
    before_begin: Option<StateHook>,
}

impl MemoryStore {
    fn new(journal: &Journal) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                next_id: 100,
                ..MemoryState::default()
            })),
            journal: Arc::clone(journal),
            fail_on: None,
            before_begin: None,
        }
    }

    /// Applies `hook` to the committed state right before a transaction takes its snapshot.
    fn changing_before_begin(mut self, hook: impl Fn(&mut MemoryState) + Send + Sync + 'static) -> Self {
        self.before_begin = Some(Arc::new(hook));
        self
    }

    fn failing_on(mut self, op: &'static str) -> Self {
        self.fail_on = Some(op);
        self
    }

    fn seed(
        &self,
        id: UserId,
        name: &str,
        password: Option<&str>,
        image: Option<&str>,
        roles: &[i64],
    ) -> User {
        let now = Utc::now();
        let user = User {
            id,
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            phone: None,
            password: password.map(StoredCredential::new),
            image_path: image.map(ImageRef::new),
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.lock().expect("state");
        state.users.insert(id, user.clone());
        state.roles.insert(id, roles.iter().copied().collect());
        user
    }

    fn user(&self, id: UserId) -> Option<User> {
        self.state.lock().expect("state").users.get(&id).cloned()
    }

    fn user_count(&self) -> usize {
        self.state.lock().expect("state").users.len()
    }

    fn roles_of(&self, id: UserId) -> RoleSet {
        self.state
            .lock()
            .expect("state")
            .roles
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    fn writes(&self, state: Arc<Mutex<MemoryState>>) -> MemoryWrites {
        MemoryWrites {
            state,
            shared: Arc::clone(&self.state),
            journal: Arc::clone(&self.journal),
            fail_on: self.fail_on,
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> StoreResult<User> {
        self.user(id).ok_or(StoreError::NotFound(id))
    }

    async fn writer(&self) -> StoreResult<Box<dyn UserWrites + '_>> {
        Ok(Box::new(self.writes(Arc::clone(&self.state))))
    }

    async fn begin(&self) -> StoreResult<Box<dyn UserTransaction + '_>> {
        record(&self.journal, "begin");
        if self.fail_on == Some("begin") {
            return Err(StoreError::Db("begin failed".to_string()));
        }
        let mut shared = self.state.lock().expect("state");
        if let Some(hook) = &self.before_begin {
            hook(&mut *shared);
        }
        let snapshot = shared.clone();
        drop(shared);
        Ok(Box::new(self.writes(Arc::new(Mutex::new(snapshot)))))
    }
}

/// Writes go to `state`; for a transaction that is a private copy of `shared`.
struct MemoryWrites {
    state: Arc<Mutex<MemoryState>>,
    shared: Arc<Mutex<MemoryState>>,
    journal: Journal,
    fail_on: Option<&'static str>,
}

impl MemoryWrites {
    fn check(&self, op: &'static str) -> StoreResult<()> {
        record(&self.journal, op);
        if self.fail_on == Some(op) {
            return Err(StoreError::Db(format!("{op} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl UserWrites for MemoryWrites {
    async fn find_user(&mut self, id: UserId) -> StoreResult<User> {
        self.check("find_user")?;
        let state = self.state.lock().expect("state");
        state.users.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn insert_user(&mut self, changes: &UserChanges) -> StoreResult<User> {
        self.check("insert_user")?;
        let Some(name) = changes.name.clone() else {
            return Err(StoreError::Db(
                "NOT NULL constraint failed: users.name".to_string(),
            ));
        };
        let mut state = self.state.lock().expect("state");
        state.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_id,
            name,
            email: changes.email.clone(),
            phone: changes.phone.clone(),
            password: changes.password.clone(),
            image_path: changes.image_path.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&mut self, id: UserId, changes: &UserChanges) -> StoreResult<User> {
        self.check("update_user")?;
        let mut state = self.state.lock().expect("state");
        let user = state.users.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        changes.apply_to(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn save_user(&mut self, user: &User) -> StoreResult<User> {
        self.check("save_user")?;
        let mut state = self.state.lock().expect("state");
        let stored = state
            .users
            .get_mut(&user.id)
            .ok_or(StoreError::NotFound(user.id))?;
        *stored = user.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn role_ids(&mut self, user_id: UserId) -> StoreResult<RoleSet> {
        self.check("role_ids")?;
        let state = self.state.lock().expect("state");
        Ok(state.roles.get(&user_id).cloned().unwrap_or_default())
    }

    async fn attach_roles(&mut self, user_id: UserId, roles: &RoleSet) -> StoreResult<()> {
        self.check("attach_roles")?;
        let mut state = self.state.lock().expect("state");
        state
            .roles
            .entry(user_id)
            .or_default()
            .extend(roles.iter().copied());
        Ok(())
    }

    async fn detach_roles(&mut self, user_id: UserId, roles: &RoleSet) -> StoreResult<()> {
        self.check("detach_roles")?;
        let mut state = self.state.lock().expect("state");
        if let Some(current) = state.roles.get_mut(&user_id) {
            current.retain(|role| !roles.contains(role));
        }
        Ok(())
    }
}

#[async_trait]
impl UserTransaction for MemoryWrites {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.check("commit")?;
        let working = self.state.lock().expect("state").clone();
        *self.shared.lock().expect("shared") = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        record(&self.journal, "rollback");
        Ok(())
    }
}

#[derive(Clone)]
struct MemoryImages {
    blobs: Arc<Mutex<BTreeSet<String>>>,
    journal: Journal,
    counter: Arc<AtomicUsize>,
    fail_store: bool,
    fail_delete_of: Option<String>,
}

impl MemoryImages {
    fn new(journal: &Journal) -> Self {
        Self {
            blobs: Arc::new(Mutex::new(BTreeSet::new())),
            journal: Arc::clone(journal),
            counter: Arc::new(AtomicUsize::new(0)),
            fail_store: false,
            fail_delete_of: None,
        }
    }

    fn put(&self, reference: &str) {
        self.blobs
            .lock()
            .expect("blobs")
            .insert(reference.to_string());
    }

    fn blobs(&self) -> Vec<String> {
        self.blobs.lock().expect("blobs").iter().cloned().collect()
    }
}

#[async_trait]
impl ImageService for MemoryImages {
    async fn store(
        &self,
        photo: &PhotoUpload,
        prefix: &str,
        resize: Option<ResizeOptions>,
    ) -> Result<ImageRef, ImageError> {
        record(&self.journal, "image_store");
        if self.fail_store || photo.is_empty() {
            return Err(ImageError::Store("disk full".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = match resize {
            Some(size) => format!("{prefix}/img-{n}-{size}"),
            None => format!("{prefix}/img-{n}"),
        };
        self.put(&reference);
        Ok(ImageRef::new(reference))
    }

    async fn delete(&self, image: &ImageRef) -> Result<(), ImageError> {
        record(&self.journal, format!("image_delete:{image}"));
        if self.fail_delete_of.as_deref() == Some(image.as_str()) {
            return Err(ImageError::Delete("permission denied".to_string()));
        }
        self.blobs.lock().expect("blobs").remove(image.as_str());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakeHasher {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl CredentialHasher for FakeHasher {
    async fn hash(&self, plaintext: &Password) -> Result<StoredCredential, HashError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(HashError("invalid kdf params".to_string()));
        }
        Ok(StoredCredential::new(format!(
            "$fake${}",
            plaintext.as_str().chars().rev().collect::<String>()
        )))
    }
}

#[derive(Clone, Default)]
struct RecordingSync {
    calls: Arc<Mutex<Vec<(UserId, RoleSet)>>>,
}

impl RecordingSync {
    fn calls(&self) -> Vec<(UserId, RoleSet)> {
        self.calls.lock().expect("calls").clone()
    }
}

#[async_trait]
impl RoleAssigner for RecordingSync {
    async fn sync<W>(&self, writes: &mut W, user_id: UserId, roles: &RoleSet) -> StoreResult<RoleSync>
    where
        W: UserWrites + ?Sized,
    {
        self.calls
            .lock()
            .expect("calls")
            .push((user_id, roles.clone()));
        MembershipSync.sync(writes, user_id, roles).await
    }
}

struct Harness {
    journal: Journal,
    store: MemoryStore,
    images: MemoryImages,
    hasher: FakeHasher,
    roles: RecordingSync,
}

impl Harness {
    fn new() -> Self {
        let journal = Journal::default();
        Self {
            store: MemoryStore::new(&journal),
            images: MemoryImages::new(&journal),
            hasher: FakeHasher::default(),
            roles: RecordingSync::default(),
            journal,
        }
    }

    fn service(&self) -> UserWriteService<MemoryStore, MemoryImages, FakeHasher, RecordingSync> {
        UserWriteService::new(
            self.store.clone(),
            self.images.clone(),
            self.hasher.clone(),
            self.roles.clone(),
        )
    }

    fn journal(&self) -> Vec<String> {
        self.journal.lock().expect("journal").clone()
    }

    fn clear_journal(&self) {
        self.journal.lock().expect("journal").clear();
    }

    fn hash_calls(&self) -> usize {
        self.hasher.calls.load(Ordering::SeqCst)
    }
}

fn photo() -> PhotoUpload {
    PhotoUpload::new(b"\x89PNG\r\n\x1a\nbody".to_vec())
}

#[tokio::test]
async fn update_applies_fields_and_exact_role_set() {
    let h = Harness::new();
    h.store.seed(7, "Annie", Some("$stored$"), Some("users/old"), &[1, 2]);
    h.images.put("users/old");

    let input = UserInput {
        name: Some("Ann".to_string()),
        role_ids: Some(vec![2, 3]),
        ..UserInput::default()
    };
    let updated = h.service().update(7, &input).await.expect("update");

    assert_eq!(updated.name, "Ann");
    assert_eq!(updated.image_path, Some(ImageRef::new("users/old")));
    assert_eq!(updated.password, Some(StoredCredential::new("$stored$")));
    assert_eq!(h.store.roles_of(7), RoleSet::from([2, 3]));
    assert_eq!(h.roles.calls(), vec![(7, RoleSet::from([2, 3]))]);
    assert_eq!(h.images.blobs(), vec!["users/old".to_string()]);
    assert_eq!(h.hash_calls(), 0);
}

#[tokio::test]
async fn update_without_role_ids_clears_membership() {
    let h = Harness::new();
    h.store.seed(7, "Ann", None, None, &[1, 2]);

    h.service()
        .update(7, &UserInput::default())
        .await
        .expect("update");

    assert!(h.store.roles_of(7).is_empty());
    assert_eq!(h.roles.calls(), vec![(7, RoleSet::new())]);
}

#[tokio::test]
async fn update_with_empty_password_keeps_credential() {
    let h = Harness::new();
    h.store.seed(7, "Ann", Some("$stored$"), None, &[]);

    let input = UserInput {
        password: Some(Password::from("")),
        ..UserInput::default()
    };
    let updated = h.service().update(7, &input).await.expect("update");

    assert_eq!(updated.password, Some(StoredCredential::new("$stored$")));
    assert_eq!(h.hash_calls(), 0);
}

#[tokio::test]
async fn update_with_password_stores_hashed_form() {
    let h = Harness::new();
    h.store.seed(7, "Ann", Some("$stored$"), None, &[]);

    let input = UserInput {
        password: Some(Password::from("s3cret")),
        ..UserInput::default()
    };
    h.service().update(7, &input).await.expect("update");

    let stored = h.store.user(7).expect("user").password.expect("credential");
    assert_eq!(stored, StoredCredential::new("$fake$terc3s"));
    assert!(!stored.as_str().contains("s3cret"));
    assert_eq!(h.hash_calls(), 1);
}

#[tokio::test]
async fn update_missing_user_fails_before_any_write() {
    let h = Harness::new();

    let input = UserInput {
        name: Some("Ghost".to_string()),
        password: Some(Password::from("secret")),
        role_ids: Some(vec![1]),
        photo: Some(photo()),
        ..UserInput::default()
    };
    let err = h.service().update(42, &input).await.expect_err("missing");

    assert_eq!(err, UserWriteError::NotFound(42));
    assert!(h.journal().is_empty());
    assert!(h.images.blobs().is_empty());
    assert!(h.roles.calls().is_empty());
    assert_eq!(h.hash_calls(), 0);
}

#[tokio::test]
async fn update_with_photo_stores_new_then_releases_old_before_commit() {
    let h = Harness::new();
    h.store.seed(7, "Ann", None, Some("users/old"), &[1]);
    h.images.put("users/old");

    let input = UserInput {
        role_ids: Some(vec![1]),
        photo: Some(photo()),
        ..UserInput::default()
    };
    let updated = h.service().update(7, &input).await.expect("update");

    assert_eq!(updated.image_path, Some(ImageRef::new("users/img-1")));
    assert_eq!(h.images.blobs(), vec!["users/img-1".to_string()]);
    assert_eq!(
        h.journal(),
        vec![
            "image_store",
            "begin",
            "find_user",
            "update_user",
            "role_ids",
            "image_delete:users/old",
            "commit",
        ]
    );
}

#[tokio::test]
async fn update_releases_image_committed_after_the_initial_read() {
    let h = Harness::new();
    h.store.seed(7, "Ann", None, Some("users/a"), &[]);
    h.images.put("users/a");
    h.images.put("users/b");
    let store = h.store.clone().changing_before_begin(|state| {
        if let Some(user) = state.users.get_mut(&7) {
            user.image_path = Some(ImageRef::new("users/b"));
        }
    });
    let service = UserWriteService::new(
        store,
        h.images.clone(),
        h.hasher.clone(),
        h.roles.clone(),
    );

    let input = UserInput {
        photo: Some(photo()),
        ..UserInput::default()
    };
    let updated = service.update(7, &input).await.expect("update");

    assert_eq!(updated.image_path, Some(ImageRef::new("users/img-1")));
    assert_eq!(
        h.images.blobs(),
        vec!["users/a".to_string(), "users/img-1".to_string()]
    );
    let journal = h.journal();
    assert!(journal.contains(&"image_delete:users/b".to_string()));
    assert!(!journal.contains(&"image_delete:users/a".to_string()));
}

#[tokio::test]
async fn update_without_field_changes_only_syncs_roles() {
    let h = Harness::new();
    h.store.seed(7, "Ann", Some("$stored$"), Some("users/old"), &[1]);

    let input = UserInput {
        role_ids: Some(vec![2]),
        ..UserInput::default()
    };
    let updated = h.service().update(7, &input).await.expect("update");

    assert_eq!(updated.name, "Ann");
    assert_eq!(updated.image_path, Some(ImageRef::new("users/old")));
    assert_eq!(h.store.roles_of(7), RoleSet::from([2]));
    assert!(!h.journal().contains(&"update_user".to_string()));
}

#[tokio::test]
async fn update_uses_configured_default_size() {
    let h = Harness::new();
    h.store.seed(7, "Ann", None, None, &[]);
    let service = h.service().with_image_policy(ImagePolicy {
        default_size: Some(ResizeOptions::new(640, 480)),
        profile_size: ResizeOptions::PROFILE_THUMBNAIL,
    });

    let input = UserInput {
        photo: Some(photo()),
        ..UserInput::default()
    };
    let updated = service.update(7, &input).await.expect("update");

    assert_eq!(updated.image_path, Some(ImageRef::new("users/img-1-640x480")));
}

#[tokio::test]
async fn update_image_failure_leaves_record_untouched() {
    let mut h = Harness::new();
    h.images.fail_store = true;
    h.store.seed(7, "Annie", None, Some("users/old"), &[1, 2]);
    h.images.put("users/old");

    let input = UserInput {
        name: Some("Ann".to_string()),
        role_ids: Some(vec![3]),
        photo: Some(photo()),
        ..UserInput::default()
    };
    let err = h.service().update(7, &input).await.expect_err("image fails");

    assert_eq!(err.code(), "image_store_failed");
    let UserWriteError::OperationFailed(failed) = err else {
        panic!("expected operation failure");
    };
    assert_eq!(failed.message, "disk full");
    assert_eq!(h.store.user(7).expect("user").name, "Annie");
    assert_eq!(h.store.roles_of(7), RoleSet::from([1, 2]));
    assert_eq!(h.images.blobs(), vec!["users/old".to_string()]);
    assert!(!h.journal().contains(&"begin".to_string()));
}

#[tokio::test]
async fn update_old_image_delete_failure_rolls_back() {
    let mut h = Harness::new();
    h.images.fail_delete_of = Some("users/old".to_string());
    h.store.seed(7, "Annie", None, Some("users/old"), &[1, 2]);
    h.images.put("users/old");

    let input = UserInput {
        name: Some("Ann".to_string()),
        role_ids: Some(vec![2, 3]),
        photo: Some(photo()),
        ..UserInput::default()
    };
    let err = h.service().update(7, &input).await.expect_err("delete fails");

    assert_eq!(err.code(), "image_delete_failed");
    let user = h.store.user(7).expect("user");
    assert_eq!(user.name, "Annie");
    assert_eq!(user.image_path, Some(ImageRef::new("users/old")));
    assert_eq!(h.store.roles_of(7), RoleSet::from([1, 2]));
    assert_eq!(h.images.blobs(), vec!["users/old".to_string()]);
    let journal = h.journal();
    assert!(journal.contains(&"rollback".to_string()));
    assert!(!journal.contains(&"commit".to_string()));
}

#[tokio::test]
async fn update_role_sync_failure_rolls_back_fields() {
    let mut h = Harness::new();
    h.store = h.store.clone().failing_on("attach_roles");
    h.store.seed(7, "Annie", Some("$stored$"), None, &[1]);

    let input = UserInput {
        name: Some("Ann".to_string()),
        password: Some(Password::from("new")),
        role_ids: Some(vec![1, 2]),
        photo: Some(photo()),
        ..UserInput::default()
    };
    let err = h.service().update(7, &input).await.expect_err("sync fails");

    assert_eq!(err.code(), "db_error");
    let user = h.store.user(7).expect("user");
    assert_eq!(user.name, "Annie");
    assert_eq!(user.password, Some(StoredCredential::new("$stored$")));
    assert!(user.image_path.is_none());
    assert_eq!(h.store.roles_of(7), RoleSet::from([1]));
    assert!(h.images.blobs().is_empty(), "new image is discarded");
}

#[tokio::test]
async fn update_commit_failure_is_reported() {
    let mut h = Harness::new();
    h.store = h.store.clone().failing_on("commit");
    h.store.seed(7, "Annie", None, None, &[]);

    let input = UserInput {
        name: Some("Ann".to_string()),
        photo: Some(photo()),
        ..UserInput::default()
    };
    let err = h.service().update(7, &input).await.expect_err("commit fails");

    let UserWriteError::OperationFailed(failed) = err else {
        panic!("expected operation failure");
    };
    assert_eq!(failed.code, "db_error");
    assert_eq!(failed.message, "commit failed");
    assert_eq!(h.store.user(7).expect("user").name, "Annie");
    assert!(h.images.blobs().is_empty());
}

#[tokio::test]
async fn update_hash_failure_surfaces_kdf_error() {
    let mut h = Harness::new();
    h.hasher.fail = true;
    h.store.seed(7, "Ann", None, None, &[]);

    let input = UserInput {
        password: Some(Password::from("secret")),
        photo: Some(photo()),
        ..UserInput::default()
    };
    let err = h.service().update(7, &input).await.expect_err("hash fails");

    assert_eq!(err.code(), "kdf_error");
    assert!(h.journal().is_empty());
}

#[tokio::test]
async fn create_with_empty_password_stores_no_credential() {
    let h = Harness::new();

    let input = UserInput {
        name: Some("Bo".to_string()),
        password: Some(Password::from("")),
        ..UserInput::default()
    };
    h.service().create(&input).await.expect("create");

    let user = h.store.user(101).expect("created");
    assert_eq!(user.name, "Bo");
    assert!(user.password.is_none());
    assert_eq!(h.hash_calls(), 0);
    assert_eq!(h.roles.calls(), vec![(101, RoleSet::new())]);
}

#[tokio::test]
async fn create_hashes_password_and_assigns_roles() {
    let h = Harness::new();

    let input = UserInput {
        name: Some("Cy".to_string()),
        email: Some("cy@example.com".to_string()),
        password: Some(Password::from("abc")),
        role_ids: Some(vec![3, 1, 3]),
        ..UserInput::default()
    };
    h.service().create(&input).await.expect("create");

    let user = h.store.user(101).expect("created");
    assert_eq!(user.email.as_deref(), Some("cy@example.com"));
    assert_eq!(user.password, Some(StoredCredential::new("$fake$cba")));
    assert_eq!(h.store.roles_of(101), RoleSet::from([1, 3]));
    assert_eq!(h.roles.calls(), vec![(101, RoleSet::from([1, 3]))]);
    assert!(!h.journal().contains(&"begin".to_string()));
}

#[tokio::test]
async fn create_with_photo_records_image_reference() {
    let h = Harness::new();

    let input = UserInput {
        name: Some("Di".to_string()),
        photo: Some(photo()),
        ..UserInput::default()
    };
    h.service().create(&input).await.expect("create");

    let user = h.store.user(101).expect("created");
    assert_eq!(user.image_path, Some(ImageRef::new("users/img-1")));
    assert_eq!(h.images.blobs(), vec!["users/img-1".to_string()]);
}

#[tokio::test]
async fn create_with_empty_photo_skips_image_service() {
    let h = Harness::new();

    let input = UserInput {
        name: Some("Ed".to_string()),
        photo: Some(PhotoUpload::default()),
        ..UserInput::default()
    };
    h.service().create(&input).await.expect("create");

    assert!(h.store.user(101).expect("created").image_path.is_none());
    assert!(!h.journal().contains(&"image_store".to_string()));
}

#[tokio::test]
async fn create_insert_failure_discards_new_image() {
    let h = Harness::new();

    let input = UserInput {
        photo: Some(photo()),
        role_ids: Some(vec![1]),
        ..UserInput::default()
    };
    let err = h.service().create(&input).await.expect_err("name required");

    assert_eq!(err.code(), "db_error");
    assert_eq!(h.store.user_count(), 0);
    assert!(h.images.blobs().is_empty());
    assert!(h.roles.calls().is_empty());
}

#[tokio::test]
async fn create_role_sync_failure_keeps_inserted_row() {
    let mut h = Harness::new();
    h.store = h.store.clone().failing_on("attach_roles");

    let input = UserInput {
        name: Some("Gil".to_string()),
        photo: Some(photo()),
        role_ids: Some(vec![1]),
        ..UserInput::default()
    };
    let err = h.service().create(&input).await.expect_err("sync fails");

    let UserWriteError::OperationFailed(failed) = err else {
        panic!("expected operation failure");
    };
    assert_eq!(failed.code, "db_error");
    assert_eq!(failed.message, "attach_roles failed");
    let user = h.store.user(101).expect("row kept");
    assert_eq!(user.name, "Gil");
    assert_eq!(user.image_path, Some(ImageRef::new("users/img-1")));
    assert_eq!(h.images.blobs(), vec!["users/img-1".to_string()]);
    assert!(h.store.roles_of(101).is_empty());
    assert!(!h.journal().contains(&"rollback".to_string()));
}

#[tokio::test]
async fn profile_photo_replaces_thumbnail_and_keeps_password() {
    let h = Harness::new();
    h.store.seed(5, "Fay", Some("$stored$"), Some("users/old"), &[1]);
    h.images.put("users/old");

    let input = ProfileInput {
        photo: Some(photo()),
        ..ProfileInput::default()
    };
    let outcome = h
        .service()
        .update_own_profile(&Identity::new(5), &input)
        .await;

    let user = outcome.into_result().expect("updated");
    assert_eq!(user.image_path, Some(ImageRef::new("users/img-1-150x150")));
    assert_eq!(user.password, Some(StoredCredential::new("$stored$")));
    assert_eq!(h.images.blobs(), vec!["users/img-1-150x150".to_string()]);
    assert_eq!(h.store.roles_of(5), RoleSet::from([1]));
    assert!(h.roles.calls().is_empty());
    assert_eq!(
        h.journal(),
        vec![
            "image_store",
            "begin",
            "find_user",
            "save_user",
            "image_delete:users/old",
            "commit",
        ]
    );
}

#[tokio::test]
async fn profile_fields_and_password_are_saved() {
    let h = Harness::new();
    h.store.seed(5, "Fay", Some("$stored$"), None, &[]);

    let input = ProfileInput {
        name: Some("Faye".to_string()),
        phone: Some("555-0100".to_string()),
        password: Some(Password::from("xyz")),
        ..ProfileInput::default()
    };
    let outcome = h
        .service()
        .update_own_profile(&Identity::new(5), &input)
        .await;

    assert!(matches!(outcome, ProfileUpdate::Updated(_)));
    let user = h.store.user(5).expect("user");
    assert_eq!(user.name, "Faye");
    assert_eq!(user.phone.as_deref(), Some("555-0100"));
    assert_eq!(user.email.as_deref(), Some("fay@example.com"));
    assert_eq!(user.password, Some(StoredCredential::new("$fake$zyx")));
    assert_eq!(h.hash_calls(), 1);
}

#[tokio::test]
async fn profile_without_actor_fails_as_data() {
    let h = Harness::new();

    let outcome = h
        .service()
        .update_own_profile(&Anonymous, &ProfileInput::default())
        .await;

    let ProfileUpdate::Failed(failed) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failed.code, "unauthenticated");
    assert_eq!(
        failed.message,
        "Unable to update profile: no authenticated user"
    );
}

#[tokio::test]
async fn profile_for_missing_user_fails_with_not_found() {
    let h = Harness::new();

    let outcome = h
        .service()
        .update_own_profile(&Identity::new(9), &ProfileInput::default())
        .await;

    let failed = outcome.into_result().expect_err("missing user");
    assert_eq!(failed.code, "not_found");
    assert_eq!(failed.message, "Unable to update profile: user 9 not found");
}

#[tokio::test]
async fn profile_save_failure_rolls_back_and_discards_new_image() {
    let mut h = Harness::new();
    h.store = h.store.clone().failing_on("save_user");
    h.store.seed(5, "Fay", None, Some("users/old"), &[]);
    h.images.put("users/old");
    h.clear_journal();

    let input = ProfileInput {
        name: Some("Faye".to_string()),
        photo: Some(photo()),
        ..ProfileInput::default()
    };
    let outcome = h
        .service()
        .update_own_profile(&Identity::new(5), &input)
        .await;

    let failed = outcome.into_result().expect_err("save fails");
    assert_eq!(failed.code, "db_error");
    assert_eq!(failed.message, "Unable to update profile: save_user failed");
    let user = h.store.user(5).expect("user");
    assert_eq!(user.name, "Fay");
    assert_eq!(user.image_path, Some(ImageRef::new("users/old")));
    assert_eq!(h.images.blobs(), vec!["users/old".to_string()]);
    assert!(h.journal().contains(&"rollback".to_string()));
}
