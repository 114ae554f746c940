use roster_core::{
    AuthContext, CredentialHasher, ImageRef, ImageService, OperationFailed, Password,
    ProfileInput, ProfileUpdate, ResizeOptions, RoleAssigner, RoleSet, StoreError,
    StoredCredential, User, UserChanges, UserId, UserInput, UserStore, UserTransaction,
    UserWriteError, USER_IMAGE_PREFIX,
};

/// Size constraints handed to the image service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePolicy {
    /// Used by the admin create/update paths. `None` keeps the upload as is.
    pub default_size: Option<ResizeOptions>,
    /// Used for self-service profile photos.
    pub profile_size: ResizeOptions,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            default_size: None,
            profile_size: ResizeOptions::PROFILE_THUMBNAIL,
        }
    }
}

/// Write path for user records: credential hashing, photo lifecycle and role sync.
pub struct UserWriteService<S, I, H, R> {
    store: S,
    images: I,
    hasher: H,
    roles: R,
    policy: ImagePolicy,
}

impl<S, I, H, R> UserWriteService<S, I, H, R>
where
    S: UserStore,
    I: ImageService,
    H: CredentialHasher,
    R: RoleAssigner,
{
    pub fn new(store: S, images: I, hasher: H, roles: R) -> Self {
        Self {
            store,
            images,
            hasher,
            roles,
            policy: ImagePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_image_policy(mut self, policy: ImagePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates a user and assigns exactly the requested roles.
    #[tracing::instrument(skip_all)]
    pub async fn create(&self, input: &UserInput) -> Result<(), UserWriteError> {
        match self.create_user(input).await {
            Ok(user_id) => {
                tracing::info!(event = "user_created", user_id, "User created");
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    event = "user_create_failed",
                    code = %err.code,
                    error = %err.message,
                    "User create failed"
                );
                Err(UserWriteError::OperationFailed(err))
            }
        }
    }

    /// Updates a user's fields, photo and role membership in one transaction.
    #[tracing::instrument(skip_all, fields(user_id = id))]
    pub async fn update(&self, id: UserId, input: &UserInput) -> Result<User, UserWriteError> {
        match self.store.find_by_id(id).await {
            Ok(_) => {}
            Err(StoreError::NotFound(_)) => {
                tracing::warn!(event = "user_update_rejected", reason = "not_found");
                return Err(UserWriteError::NotFound(id));
            }
            Err(err) => {
                tracing::error!(event = "user_update_failed", error = %err, "DB error");
                return Err(OperationFailed::from(err).into());
            }
        }

        match self.update_user(id, input).await {
            Ok(user) => {
                tracing::info!(event = "user_updated", "User updated");
                Ok(user)
            }
            Err(err) => {
                tracing::error!(
                    event = "user_update_failed",
                    code = %err.code,
                    error = %err.message,
                    "User update failed"
                );
                Err(UserWriteError::OperationFailed(err))
            }
        }
    }

    /// Updates the authenticated user's own record. Never returns an error;
    /// callers branch on the [`ProfileUpdate`] variant.
    #[tracing::instrument(skip_all)]
    pub async fn update_own_profile(
        &self,
        auth: &dyn AuthContext,
        input: &ProfileInput,
    ) -> ProfileUpdate {
        match self.update_profile(auth, input).await {
            Ok(user) => {
                tracing::info!(event = "profile_updated", user_id = user.id, "Profile updated");
                ProfileUpdate::Updated(user)
            }
            Err(err) => {
                let failed = err.context("Unable to update profile");
                tracing::warn!(
                    event = "profile_update_failed",
                    code = %failed.code,
                    error = %failed.message,
                    "Profile update failed"
                );
                ProfileUpdate::Failed(failed)
            }
        }
    }

    async fn create_user(&self, input: &UserInput) -> Result<UserId, OperationFailed> {
        let mut changes = UserChanges::with_fields(
            input.name.as_deref(),
            input.email.as_deref(),
            input.phone.as_deref(),
        );
        changes.password = self.hash_new_password(input.new_password()).await?;

        let mut writer = self.store.writer().await?;
        let stored = match input.photo_upload() {
            Some(photo) => Some(
                self.images
                    .store(photo, USER_IMAGE_PREFIX, self.policy.default_size)
                    .await?,
            ),
            None => None,
        };
        changes.image_path = stored.clone();

        let user = match writer.insert_user(&changes).await {
            Ok(user) => user,
            Err(err) => {
                self.discard_image(stored.as_ref()).await;
                return Err(err.into());
            }
        };
        self.roles
            .sync(&mut *writer, user.id, &input.role_set())
            .await?;
        Ok(user.id)
    }

    async fn update_user(&self, id: UserId, input: &UserInput) -> Result<User, OperationFailed> {
        let mut changes = UserChanges::with_fields(
            input.name.as_deref(),
            input.email.as_deref(),
            input.phone.as_deref(),
        );
        changes.password = self.hash_new_password(input.new_password()).await?;

        let replacement = match input.photo_upload() {
            Some(photo) => Some(
                self.images
                    .store(photo, USER_IMAGE_PREFIX, self.policy.default_size)
                    .await?,
            ),
            None => None,
        };
        changes.image_path = replacement.clone();

        let mut tx = match self.store.begin().await {
            Ok(tx) => tx,
            Err(err) => {
                self.discard_image(replacement.as_ref()).await;
                return Err(err.into());
            }
        };
        let result = self
            .write_update(
                tx.as_mut(),
                id,
                &changes,
                &input.role_set(),
                replacement.is_some(),
            )
            .await;
        self.finish(tx, result, replacement.as_ref()).await
    }

    async fn write_update(
        &self,
        tx: &mut dyn UserTransaction,
        id: UserId,
        changes: &UserChanges,
        roles: &RoleSet,
        image_replaced: bool,
    ) -> Result<User, OperationFailed> {
        let previous = tx.find_user(id).await?;
        let previous_image = previous.image_path.clone();
        let user = if changes.is_empty() {
            previous
        } else {
            tx.update_user(id, changes).await?
        };
        self.roles.sync(&mut *tx, id, roles).await?;
        if image_replaced {
            self.release_image(previous_image.as_ref()).await?;
        }
        Ok(user)
    }

    async fn update_profile(
        &self,
        auth: &dyn AuthContext,
        input: &ProfileInput,
    ) -> Result<User, OperationFailed> {
        let user_id = auth.current_user_id()?;
        let mut user = self.store.find_by_id(user_id).await?;

        UserChanges::with_fields(
            input.name.as_deref(),
            input.email.as_deref(),
            input.phone.as_deref(),
        )
        .apply_to(&mut user);
        if let Some(credential) = self.hash_new_password(input.new_password()).await? {
            user.password = Some(credential);
        }

        let replacement = match input.photo_upload() {
            Some(photo) => Some(
                self.images
                    .store(photo, USER_IMAGE_PREFIX, Some(self.policy.profile_size))
                    .await?,
            ),
            None => None,
        };
        if let Some(image) = &replacement {
            user.image_path = Some(image.clone());
        }

        let mut tx = match self.store.begin().await {
            Ok(tx) => tx,
            Err(err) => {
                self.discard_image(replacement.as_ref()).await;
                return Err(err.into());
            }
        };
        let result = self
            .write_profile(tx.as_mut(), &user, replacement.is_some())
            .await;
        self.finish(tx, result, replacement.as_ref()).await
    }

    async fn write_profile(
        &self,
        tx: &mut dyn UserTransaction,
        user: &User,
        image_replaced: bool,
    ) -> Result<User, OperationFailed> {
        let previous = tx.find_user(user.id).await?;
        let saved = tx.save_user(user).await?;
        if image_replaced {
            self.release_image(previous.image_path.as_ref()).await?;
        }
        Ok(saved)
    }

    async fn hash_new_password(
        &self,
        password: Option<&Password>,
    ) -> Result<Option<StoredCredential>, OperationFailed> {
        match password {
            Some(password) => Ok(Some(self.hasher.hash(password).await?)),
            None => Ok(None),
        }
    }

    /// Commits on success; otherwise rolls back and drops the freshly stored image.
    async fn finish<T>(
        &self,
        tx: Box<dyn UserTransaction + '_>,
        result: Result<T, OperationFailed>,
        replacement: Option<&ImageRef>,
    ) -> Result<T, OperationFailed> {
        match result {
            Ok(value) => match tx.commit().await {
                Ok(()) => Ok(value),
                Err(err) => {
                    tracing::error!(event = "db_commit_failed", error = %err, "DB commit failed");
                    self.discard_image(replacement).await;
                    Err(err.into())
                }
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        event = "db_rollback_failed",
                        error = %rollback_err,
                        "DB rollback failed"
                    );
                }
                self.discard_image(replacement).await;
                Err(err)
            }
        }
    }

    async fn release_image(&self, image: Option<&ImageRef>) -> Result<(), OperationFailed> {
        if let Some(image) = image {
            self.images.delete(image).await?;
            tracing::debug!(event = "image_released", image = %image, "Previous image released");
        }
        Ok(())
    }

    async fn discard_image(&self, image: Option<&ImageRef>) {
        let Some(image) = image else {
            return;
        };
        if let Err(err) = self.images.delete(image).await {
            tracing::warn!(
                event = "image_discard_failed",
                image = %image,
                error = %err,
                "Unused image left in storage"
            );
        }
    }
}
