use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};

use super::domain::{AuthSession, AuthUser, Claims, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

pub const PASSWORD_ALGORITHM: &str = "argon2";

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub password_algorithm: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self { jwt_secret: jwt_secret.into(), token_ttl_hours: 12, password_algorithm: PASSWORD_ALGORITHM.into() }
    }
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(cfg: &configs::AuthConfig) -> Self {
        Self { jwt_secret: cfg.jwt_secret.clone(), token_ttl_hours: cfg.token_ttl_hours, password_algorithm: PASSWORD_ALGORITHM.into() }
    }
}

/// Argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Sign an HS256 token for `user`, valid for `ttl_hours`.
pub fn issue_token(secret: &str, user: &AuthUser, ttl_hours: i64) -> Result<(String, i64), AuthError> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(ttl_hours)).timestamp();
    let claims = Claims { sub: user.id.to_string(), email: user.email.clone(), role: user.role.clone(), exp: exp as usize };
    let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenError(e.to_string()))?;
    Ok((token, exp))
}

/// Verify signature and expiry of an HS256 token.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret"));
    /// let input = RegisterInput { email: "User@Example.com".into(), name: "Test".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// assert_eq!(user.role, "user");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        let email = models::user::validate_email(&input.email)?;
        let name = models::user::validate_name(&input.name)?;
        models::user::validate_password(&input.password)?;
        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.password)?;
        let user = self.repo.create_user(&email, &name).await?;
        let _cred = self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::new("secret"));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), name: "N".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let email = input.email.trim().to_lowercase();
        let user = self.repo
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        if !user.active {
            warn!(user_id = %user.id, "login attempt on deleted account");
            return Err(AuthError::Unauthorized);
        }

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        if !verify_password(&input.password, &cred.password_hash)? {
            return Err(AuthError::Unauthorized);
        }

        let (token, expires_at) = issue_token(&self.cfg.jwt_secret, &user, self.cfg.token_ttl_hours)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token, expires_at })
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> { decode_token(&self.cfg.jwt_secret, token) }
}
