use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    db::{DbPool, user_store::UserStore},
    error::{AppError, Result},
    models::user::{AuthResponse, Claims, Role, SignInInput, SignUpInput, User, UserDto},
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Issues and checks bearer tokens for user accounts
pub struct AuthService {
    users: UserStore,
    jwt_secret: String,
    expiration_hours: i64,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt_secret: impl Into<String>, expiration_hours: i64) -> Self {
        Self {
            users: UserStore::new(pool),
            jwt_secret: jwt_secret.into(),
            expiration_hours,
        }
    }

    /// Create an account and sign it in
    pub async fn register(&self, input: SignUpInput) -> Result<AuthResponse> {
        let name = input.name.trim();
        let email = input.email.trim().to_lowercase();

        if name.chars().count() < 2 {
            return Err(AppError::validation("name must be at least 2 characters"));
        }
        check_credentials(&email, &input.password)?;

        let password_hash = hash_password(&input.password)?;
        let (user, worker_id) = self
            .users
            .create_user(name, &email, &password_hash, input.role)
            .await?;

        tracing::info!(user_id = user.id, role = ?user.role, ?worker_id, "user registered");

        self.respond(user, worker_id)
    }

    /// Check credentials and issue a token
    pub async fn login(&self, input: SignInInput) -> Result<AuthResponse> {
        let email = input.email.trim().to_lowercase();

        let user = match self.users.get_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                tracing::warn!(%email, "login for unknown email");
                return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
            }
        };

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::warn!(user_id = user.id, "login with wrong password");
            return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
        }

        let worker_id = self.users.get_worker_id(user.id).await?;
        tracing::info!(user_id = user.id, "user logged in");

        self.respond(user, worker_id)
    }

    /// Decode and validate a bearer token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Auth(format!("invalid token: {e}")))?;

        Ok(data.claims)
    }

    fn issue_token(&self, user_id: i64, role: Role, worker_id: Option<i64>) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            role,
            worker_id,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiration_hours)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("failed to encode token: {e}")))
    }

    fn respond(&self, user: User, worker_id: Option<i64>) -> Result<AuthResponse> {
        let token = self.issue_token(user.id, user.role, worker_id)?;

        Ok(AuthResponse {
            token,
            user: UserDto::new(user, worker_id),
        })
    }
}

/// Hash a password into a PHC string with a random salt
/// Login rules shared by self-registration and manager-created accounts
pub fn check_credentials(email: &str, password: &str) -> Result<()> {
    if !email.contains('@') {
        return Err(AppError::validation("email is not valid"));
    }
    if password.chars().count() < 6 {
        return Err(AppError::validation("password must be at least 6 characters"));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("stored password hash is invalid: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
