use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    Claims, CreateUserRequest, LoginRequest, LoginResponse, User, UserResponse, UserRole,
};
use crate::services::QuotaLedger;

/// Issues and verifies bearer tokens.
///
/// Built once from [`JwtConfig`] at startup; the secret never changes for
/// the life of the process.
pub struct IdentityProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_expire_minutes: u64,
}

impl IdentityProvider {
    pub fn new(config: &JwtConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(AppError::Internal("JWT secret is not configured".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            token_expire_minutes: config.token_expire_minutes,
        })
    }

    /// Seconds an issued token stays valid
    pub fn expires_in(&self) -> u64 {
        self.token_expire_minutes * 60
    }

    /// Generate an access token for a user
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.token_expire_minutes as i64);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            jti: Uuid::new_v4().to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Validate a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
    }
}

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Register a new user and open their quota.
    ///
    /// The first registered user becomes admin.
    pub async fn register(
        db: &Database,
        req: CreateUserRequest,
        default_quota: i64,
    ) -> Result<UserResponse> {
        if !req.email.contains('@') {
            return Err(AppError::InvalidInput("Invalid email format".to_string()));
        }

        if req.password.len() < 6 {
            return Err(AppError::InvalidInput(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(&req.email)
            .fetch_optional(db.pool())
            .await?;

        if existing.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = Self::hash_password(&req.password)?;
        let user_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = db.pool().begin().await?;

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, created_at, updated_at)
            SELECT ?, ?, ?, ?,
                   CASE WHEN (SELECT COUNT(*) FROM users) = 0 THEN ? ELSE ? END,
                   ?, ?
            RETURNING *
            "#,
        )
        .bind(&user_id)
        .bind(&req.email)
        .bind(&req.name)
        .bind(&password_hash)
        .bind(UserRole::Admin.as_str())
        .bind(UserRole::User.as_str())
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Email already registered".to_string())
            }
            _ => AppError::Database(e),
        })?;

        QuotaLedger::ensure(&mut tx, &user.id, default_quota).await?;
        tx.commit().await?;

        tracing::info!("Registered user {} ({})", user.id, user.role);
        Ok(UserResponse::from(user))
    }

    /// Login user
    pub async fn login(
        db: &Database,
        identity: &IdentityProvider,
        req: LoginRequest,
    ) -> Result<LoginResponse> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(&req.email)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !Self::verify_password(&req.password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Invalid email or password".to_string()));
        }

        let access_token = identity.issue(&user)?;

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: identity.expires_in(),
            user: UserResponse::from(user),
        })
    }

    /// Hash password using Argon2
    fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    /// Verify password against hash
    fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
