//! Account service - registration and credential checks.
//!
//! The persistence half of the registration form: uniqueness checks that
//! need the database, password hashing, and the insert itself.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{NewAccount, Password, User};
use crate::errors::{AppError, AppResult, FormErrors};
use crate::infra::UnitOfWork;

/// Field messages produced by the database-backed checks
pub const USERNAME_TAKEN: &str = "This username is already taken.";
pub const EMAIL_TAKEN: &str = "A user with this email already exists.";
pub const ACCOUNT_TAKEN: &str = "A user with that username or email already exists.";

/// Account service trait for dependency injection.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create a user from cleaned registration data.
    ///
    /// Returns `AppError::InvalidForm` when the username or email is taken;
    /// any other error comes from the storage layer.
    async fn register(&self, account: NewAccount) -> AppResult<User>;

    /// Database-backed uniqueness checks for a username and/or email.
    ///
    /// Lets a rejected form report "taken" alongside its other errors.
    /// `None` skips that field.
    async fn check_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<FormErrors>;

    /// Check a username/password pair and record the login.
    ///
    /// Inactive accounts with correct credentials yield `AppError::InactiveAccount`.
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<User>;
}

/// Concrete implementation of AccountService using Unit of Work.
pub struct AccountManager<U: UnitOfWork> {
    uow: Arc<U>,
    activate_on_signup: bool,
}

impl<U: UnitOfWork> AccountManager<U> {
    /// `require_email_verification == false` creates accounts already active.
    pub fn new(uow: Arc<U>, require_email_verification: bool) -> Self {
        Self {
            uow,
            activate_on_signup: !require_email_verification,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> AccountService for AccountManager<U> {
    async fn register(&self, account: NewAccount) -> AppResult<User> {
        self.check_unique(Some(&account.username), Some(&account.email))
            .await?
            .into_result()?;

        let password_hash = match Password::new(&account.password) {
            Ok(password) => password.into_string(),
            Err(AppError::Validation(msg)) => {
                let mut errors = FormErrors::new();
                errors.add("password1", msg);
                return Err(errors.into());
            }
            Err(e) => return Err(e),
        };

        let user = User::new(Uuid::new_v4(), account, password_hash, self.activate_on_signup);

        match self.uow.users().create(user).await {
            Ok(user) => {
                tracing::info!(
                    username = %user.username,
                    email = %user.email,
                    is_active = user.is_active,
                    "New user registered"
                );
                Ok(user)
            }
            Err(AppError::Conflict(_)) => {
                let mut errors = FormErrors::new();
                errors.add_non_field(ACCOUNT_TAKEN);
                Err(errors.into())
            }
            Err(e) => Err(e),
        }
    }

    async fn check_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<FormErrors> {
        let users = self.uow.users();
        let mut errors = FormErrors::new();

        if let Some(username) = username {
            if users.username_taken(username).await? {
                errors.add("username", USERNAME_TAKEN);
            }
        }
        if let Some(email) = email {
            if users.email_taken(email).await? {
                errors.add("email", EMAIL_TAKEN);
            }
        }

        Ok(errors)
    }

    async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let found = self.uow.users().find_by_username(username).await?;

        // Verify against a real hash even when the user is missing so both
        // paths cost one argon2 run.
        let stored = match &found {
            Some(user) => Password::from_hash(user.password_hash.clone()),
            None => Password::dummy(),
        };
        let password_valid = stored.verify(password);

        let mut user = match found {
            Some(user) if password_valid => user,
            _ => {
                tracing::warn!(username = %username, "Failed login attempt");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !user.is_active {
            tracing::info!(username = %username, "Login refused for inactive account");
            return Err(AppError::InactiveAccount);
        }

        user.touch_login();
        let user = self.uow.users().save(user).await?;
        tracing::info!(username = %user.username, "User logged in");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{MockUserRepository, UserRepository};

    struct TestUnitOfWork {
        users: Arc<MockUserRepository>,
    }

    impl UnitOfWork for TestUnitOfWork {
        fn users(&self) -> Arc<dyn UserRepository> {
            self.users.clone()
        }
    }

    fn manager(repo: MockUserRepository, require_verification: bool) -> AccountManager<TestUnitOfWork> {
        let uow = Arc::new(TestUnitOfWork {
            users: Arc::new(repo),
        });
        AccountManager::new(uow, require_verification)
    }

    fn account() -> NewAccount {
        NewAccount {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "TestPass123!".to_string(),
        }
    }

    fn stored_user(password: &str, is_active: bool) -> User {
        let hash = Password::new(password).unwrap().into_string();
        User::new(Uuid::new_v4(), account(), hash, is_active)
    }

    #[tokio::test]
    async fn test_register_creates_inactive_user_when_verification_required() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_taken().returning(|_| Ok(false));
        repo.expect_email_taken().returning(|_| Ok(false));
        repo.expect_create().times(1).returning(|user| Ok(user));

        let user = manager(repo, true).register(account()).await.unwrap();

        assert_eq!(user.username, "testuser");
        assert!(!user.is_active);
        assert_ne!(user.password_hash, "TestPass123!");
        assert!(Password::from_hash(user.password_hash.clone()).verify("TestPass123!"));
    }

    #[tokio::test]
    async fn test_register_creates_active_user_without_verification() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_taken().returning(|_| Ok(false));
        repo.expect_email_taken().returning(|_| Ok(false));
        repo.expect_create().returning(|user| Ok(user));

        let user = manager(repo, false).register(account()).await.unwrap();
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn test_register_reports_taken_username_and_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_taken().returning(|_| Ok(true));
        repo.expect_email_taken().returning(|_| Ok(true));
        repo.expect_create().never();

        let err = manager(repo, true).register(account()).await.unwrap_err();

        match err {
            AppError::InvalidForm(errors) => {
                assert_eq!(errors.get("username"), [USERNAME_TAKEN.to_string()]);
                assert_eq!(errors.get("email"), [EMAIL_TAKEN.to_string()]);
            }
            other => panic!("expected form errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_race_becomes_non_field_error() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_taken().returning(|_| Ok(false));
        repo.expect_email_taken().returning(|_| Ok(false));
        repo.expect_create()
            .returning(|_| Err(AppError::conflict("User")));

        let err = manager(repo, true).register(account()).await.unwrap_err();

        match err {
            AppError::InvalidForm(errors) => {
                assert_eq!(errors.non_field(), [ACCOUNT_TAKEN.to_string()]);
            }
            other => panic!("expected form errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_authenticate_success_records_login() {
        let user = stored_user("TestPass123!", true);
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_save().times(1).returning(|user| Ok(user));

        let user = manager(repo, true)
            .authenticate("testuser", "TestPass123!")
            .await
            .unwrap();
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let user = stored_user("TestPass123!", true);
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_save().never();

        let result = manager(repo, true).authenticate("testuser", "nope-nope").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));

        let result = manager(repo, true).authenticate("ghost", "TestPass123!").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_inactive_account() {
        let user = stored_user("TestPass123!", false);
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_save().never();

        let result = manager(repo, true)
            .authenticate("testuser", "TestPass123!")
            .await;
        assert!(matches!(result, Err(AppError::InactiveAccount)));
    }

    #[tokio::test]
    async fn test_check_unique_skips_missing_fields() {
        let mut repo = MockUserRepository::new();
        repo.expect_username_taken().times(1).returning(|_| Ok(true));
        repo.expect_email_taken().never();

        let errors = manager(repo, true)
            .check_unique(Some("Testuser"), None)
            .await
            .unwrap();

        assert_eq!(errors.get("username"), [USERNAME_TAKEN.to_string()]);
        assert!(!errors.has("email"));
    }
}
