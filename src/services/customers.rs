//! Customer registry service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        customer::{CreateCustomer, Customer, ExternalIdentity, NewCustomer, UpdateCustomer},
        rental::RentalFilter,
        Role,
    },
    policy::{authorize, Actor, Operation},
    repository::Repository,
};

#[derive(Clone)]
pub struct CustomersService {
    repository: Repository,
    config: AuthConfig,
}

impl CustomersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    async fn find(&self, id: i32) -> AppResult<Customer> {
        self.repository
            .customers
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))
    }

    pub async fn list(&self, actor: &Actor) -> AppResult<Vec<Customer>> {
        authorize(actor, Operation::ListCustomers, None)?;
        self.repository.customers.list().await
    }

    pub async fn get_by_id(&self, actor: &Actor, id: i32) -> AppResult<Customer> {
        authorize(actor, Operation::ViewCustomer, Some(id))?;
        self.find(id).await
    }

    pub async fn get_by_username(&self, actor: &Actor, username: &str) -> AppResult<Customer> {
        let customer = self
            .repository
            .customers
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer '{}' not found", username)))?;
        authorize(actor, Operation::ViewCustomer, Some(customer.id))?;
        Ok(customer)
    }

    /// Register a local (username/password) account.
    ///
    /// `actor` is `None` for anonymous sign-up; only an Admin may create
    /// another Admin.
    pub async fn create(&self, actor: Option<&Actor>, data: CreateCustomer) -> AppResult<Customer> {
        let role = data.role.unwrap_or_default();
        if role == Role::Admin {
            let actor = actor
                .ok_or_else(|| AppError::Forbidden("Only administrators may create administrators".to_string()))?;
            authorize(actor, Operation::CreateAdmin, None)?;
        }

        data.validate()?;

        let username = data
            .username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Username is required".to_string()))?;
        let password = data
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Validation("Password is required".to_string()))?;

        if self.repository.customers.username_exists(username, None).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let customer = self
            .repository
            .customers
            .create(&NewCustomer {
                name: data.name.clone(),
                email: data.email.clone(),
                username: Some(username.to_string()),
                password: Some(self.hash_password(password)?),
                role,
                external_provider: None,
                external_id: None,
            })
            .await?;

        tracing::info!(customer_id = customer.id, role = %customer.role, "Customer created");
        Ok(customer)
    }

    pub async fn update(&self, actor: &Actor, id: i32, data: UpdateCustomer) -> AppResult<Customer> {
        authorize(actor, Operation::UpdateCustomer, Some(id))?;
        data.validate()?;

        let mut customer = self.find(id).await?;

        if let Some(role) = data.role {
            if role != customer.role {
                authorize(actor, Operation::ChangeRole, Some(id))?;
                customer.role = role;
            }
        }

        if let Some(username) = data.username {
            if self.repository.customers.username_exists(&username, Some(id)).await? {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
            customer.username = Some(username);
        }
        if let Some(name) = data.name {
            customer.name = name;
        }
        if let Some(email) = data.email {
            customer.email = Some(email);
        }
        if let Some(password) = data.password.filter(|p| !p.is_empty()) {
            customer.password = Some(self.hash_password(&password)?);
        }

        self.repository
            .customers
            .update(&customer)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))
    }

    /// Delete a customer who holds no open rental
    pub async fn delete(&self, actor: &Actor, id: i32) -> AppResult<()> {
        authorize(actor, Operation::DeleteCustomer, Some(id))?;
        self.find(id).await?;

        let open = RentalFilter {
            customer_id: Some(id),
            open: Some(true),
            ..Default::default()
        };
        if !self.repository.rentals.list(&open).await?.is_empty() {
            return Err(AppError::Conflict(
                "customer has an active rental; return or cancel it first".to_string(),
            ));
        }

        if !self.repository.customers.delete(id).await? {
            return Err(AppError::NotFound(format!("Customer {} not found", id)));
        }
        tracing::info!(customer_id = id, "Customer deleted");
        Ok(())
    }

    /// Find or create the customer behind an SSO identity.
    ///
    /// Matches on external id first, then e-mail. Accounts whose e-mail is in
    /// `auth.admin_emails` are (re)assigned the Admin role.
    pub async fn provision_external(&self, identity: &ExternalIdentity) -> AppResult<Customer> {
        let listed_admin = self
            .config
            .admin_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&identity.email));

        let existing = self
            .repository
            .customers
            .find_external(&identity.subject, &identity.email)
            .await?;

        let Some(mut customer) = existing else {
            let name = identity
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| identity.email.split('@').next().unwrap_or_default().to_string());
            let customer = self
                .repository
                .customers
                .create(&NewCustomer {
                    name,
                    email: Some(identity.email.clone()),
                    username: None,
                    password: None,
                    role: if listed_admin { Role::Admin } else { Role::User },
                    external_provider: Some(identity.provider.clone()),
                    external_id: Some(identity.subject.clone()),
                })
                .await?;
            tracing::info!(customer_id = customer.id, provider = %identity.provider, "SSO customer provisioned");
            return Ok(customer);
        };

        if listed_admin {
            customer.role = Role::Admin;
        }
        if customer.external_id.is_none() {
            customer.external_id = Some(identity.subject.clone());
            customer.external_provider = Some(identity.provider.clone());
        }
        if customer.name.is_empty() {
            if let Some(ref name) = identity.name {
                customer.name = name.clone();
            }
        }
        customer.email = Some(identity.email.clone());

        self.repository
            .customers
            .update(&customer)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", customer.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{admin, signup};
    use argon2::{PasswordHash, PasswordVerifier};

    fn service() -> CustomersService {
        let config = AuthConfig {
            admin_emails: vec!["boss@example.com".to_string()],
            ..Default::default()
        };
        CustomersService::new(Repository::in_memory(), config)
    }

    #[tokio::test]
    async fn signup_hashes_password_and_defaults_to_user() {
        let service = service();
        let customer = service.create(None, signup("alice")).await.unwrap();
        assert_eq!(customer.role, Role::User);

        let hash = customer.password.clone().unwrap();
        assert_ne!(hash, "secret");
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"secret", &parsed).is_ok());
    }

    #[tokio::test]
    async fn missing_credentials_are_validation_errors() {
        let service = service();
        let mut data = signup("bob");
        data.password = None;
        assert!(matches!(
            service.create(None, data).await,
            Err(AppError::Validation(_))
        ));

        let mut data = signup("bob");
        data.username = None;
        assert!(matches!(
            service.create(None, data).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_username_is_conflict() {
        let service = service();
        service.create(None, signup("carol")).await.unwrap();
        let err = service.create(None, signup("Carol")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn only_admin_creates_admin() {
        let service = service();
        let mut data = signup("root");
        data.role = Some(Role::Admin);
        assert!(matches!(
            service.create(None, data.clone()).await,
            Err(AppError::Forbidden(_))
        ));
        let created = service.create(Some(&admin()), data).await.unwrap();
        assert_eq!(created.role, Role::Admin);
    }

    #[tokio::test]
    async fn user_cannot_promote_self() {
        let service = service();
        let customer = service.create(None, signup("dave")).await.unwrap();
        let me = Actor::new(customer.id, Role::User);

        let renamed = service
            .update(
                &me,
                customer.id,
                UpdateCustomer {
                    name: Some("David".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "David");

        let err = service
            .update(
                &me,
                customer.id,
                UpdateCustomer {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let promoted = service
            .update(
                &admin(),
                customer.id,
                UpdateCustomer {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);
    }

    #[tokio::test]
    async fn users_see_only_themselves() {
        let service = service();
        let erin = service.create(None, signup("erin")).await.unwrap();
        let frank = service.create(None, signup("frank")).await.unwrap();
        let as_erin = Actor::new(erin.id, Role::User);

        assert!(service.get_by_id(&as_erin, erin.id).await.is_ok());
        assert!(matches!(
            service.get_by_id(&as_erin, frank.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(service.list(&as_erin).await, Err(AppError::Forbidden(_))));
        assert_eq!(service.list(&admin()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sso_provisioning_creates_then_links() {
        let service = service();
        let identity = ExternalIdentity {
            provider: "Google".into(),
            subject: "sub-123".into(),
            email: "gina@example.com".into(),
            name: None,
        };
        let created = service.provision_external(&identity).await.unwrap();
        assert_eq!(created.name, "gina");
        assert_eq!(created.role, Role::User);
        assert!(created.username.is_none());
        assert!(created.is_sso());

        let again = service.provision_external(&identity).await.unwrap();
        assert_eq!(again.id, created.id);
    }

    #[tokio::test]
    async fn sso_links_existing_account_by_email_and_promotes_admins() {
        let service = service();
        let mut data = signup("boss");
        data.email = Some("boss@example.com".into());
        let local = service.create(None, data).await.unwrap();

        let linked = service
            .provision_external(&ExternalIdentity {
                provider: "Google".into(),
                subject: "sub-boss".into(),
                email: "boss@example.com".into(),
                name: Some("The Boss".into()),
            })
            .await
            .unwrap();
        assert_eq!(linked.id, local.id);
        assert_eq!(linked.role, Role::Admin);
        assert_eq!(linked.external_id.as_deref(), Some("sub-boss"));
        assert_eq!(linked.username.as_deref(), Some("boss"));
    }
}
