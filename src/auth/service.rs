use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::auth::{
    AuthError, AuthResponse, JwtService, LoginRequest, MessageResponse, RefreshTokenRequest,
    RegisterRequest, TokenResponse, UserInfo, UserSession,
};
use crate::models::User;
use crate::services::EmailService;

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, role, is_active, created_at, updated_at";

/// Registration, login and token lifecycle. The backend constructs this too,
/// but only to validate sessions against the shared users database.
#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    db: PgPool,
    email_service: Option<Arc<EmailService>>,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_secret: &str) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret),
            db,
            email_service: None,
        }
    }

    /// Attach an outbound mailer; registration then sends a welcome email.
    pub fn with_email_service(mut self, email_service: Arc<EmailService>) -> Self {
        self.email_service = Some(email_service);
        self
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;
        validate_password(&request.password)?;

        if self.find_user_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let user: User = sqlx::query_as(&format!(
            "INSERT INTO users (email, password_hash, full_name)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&request.email)
        .bind(hash_password(&request.password)?)
        .bind(&request.full_name)
        .fetch_one(&self.db)
        .await?;

        self.send_welcome_email(&user);
        self.issue_auth_response(user).await
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self
            .find_user_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.issue_auth_response(user).await
    }

    /// Exchange a stored, unrevoked refresh token for a fresh access token.
    #[tracing::instrument(skip(self, request))]
    pub async fn refresh_token(
        &self,
        request: RefreshTokenRequest,
    ) -> Result<TokenResponse, AuthError> {
        let claims = self.jwt_service.validate_token(&request.refresh_token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let stored: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM refresh_tokens
             WHERE user_id = $1 AND token_hash = $2 AND expires_at > NOW() AND NOT revoked",
        )
        .bind(user_id)
        .bind(md5_hex(&request.refresh_token))
        .fetch_optional(&self.db)
        .await?;

        if stored.is_none() {
            return Err(AuthError::InvalidToken);
        }

        Ok(TokenResponse {
            access_token: self
                .jwt_service
                .create_access_token(user_id, &claims.email, claims.role)?,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
        })
    }

    /// Blacklist the access token's jti and revoke the user's refresh tokens.
    #[tracing::instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> Result<MessageResponse, AuthError> {
        let claims = self.jwt_service.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        sqlx::query(
            "INSERT INTO token_blacklist (jti, expires_at) VALUES ($1, $2)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(&claims.jti)
        .bind(expiry_timestamp(claims.exp)?)
        .execute(&self.db)
        .await?;

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(MessageResponse {
            message: "Successfully logged out".to_string(),
        })
    }

    /// Validate a bearer token into a session, rejecting blacklisted jtis.
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let session = self.jwt_service.extract_user_session(token)?;

        let blacklisted: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM token_blacklist WHERE jti = $1 AND expires_at > NOW()",
        )
        .bind(&session.jti)
        .fetch_optional(&self.db)
        .await?;

        if blacklisted.is_some() {
            return Err(AuthError::InvalidToken);
        }
        Ok(session)
    }

    /// Current profile, read fresh from the database.
    pub async fn me(&self, user_id: Uuid) -> Result<UserInfo, AuthError> {
        let user: Option<User> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;

        user.map(user_info).ok_or(AuthError::UserNotFound)
    }

    async fn issue_auth_response(&self, user: User) -> Result<AuthResponse, AuthError> {
        let (access_token, refresh_token) =
            self.jwt_service
                .create_token_pair(user.id, &user.email, user.role())?;

        let refresh_claims = self.jwt_service.validate_token(&refresh_token)?;
        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(md5_hex(&refresh_token))
        .bind(expiry_timestamp(refresh_claims.exp)?)
        .execute(&self.db)
        .await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
            user: user_info(user),
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user: Option<User> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.db)
                .await?;
        Ok(user)
    }

    /// Fire and forget: a failed welcome mail must not fail registration.
    fn send_welcome_email(&self, user: &User) {
        let Some(email_service) = self.email_service.clone() else {
            return;
        };
        let to_email = user.email.clone();
        let full_name = user.full_name.clone();
        tokio::spawn(async move {
            if let Err(err) = email_service
                .send_welcome_email(&to_email, full_name.as_deref())
                .await
            {
                tracing::warn!("Welcome email to {} failed: {:#}", to_email, err);
            }
        });
    }
}

/// Refresh tokens are stored as md5 digests, never raw.
fn md5_hex(token: &str) -> String {
    format!("{:x}", md5::compute(token))
}

fn expiry_timestamp(exp: usize) -> Result<DateTime<Utc>, AuthError> {
    DateTime::from_timestamp(exp as i64, 0).ok_or(AuthError::InvalidToken)
}

fn user_info(user: User) -> UserInfo {
    let role = user.role();
    UserInfo {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}
