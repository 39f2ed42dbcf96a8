use crate::error::{Error, Result};
use crate::models::user::{UserProfile, UserRole};
use crate::store::client::StoreClient;
use crate::store::collections;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

const TOKEN_TTL_SECONDS: usize = 12 * 60 * 60;

/// Claims carried by the locally-signed session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub profile: UserProfile,
}

#[derive(Deserialize)]
struct IdentityAccount {
    #[serde(rename = "localId")]
    local_id: String,
}

/// Delegates credential handling to the external identity provider and keeps
/// the profile record in `users/{uid}`. Vendor error codes are mapped to a
/// small fixed set of user-facing messages here, at the operation boundary.
#[derive(Clone)]
pub struct AuthService {
    client: Client,
    base_url: String,
    api_key: String,
    jwt_secret: String,
    store: StoreClient,
}

impl AuthService {
    pub fn new(
        base_url: String,
        api_key: String,
        jwt_secret: String,
        store: StoreClient,
        client: Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            jwt_secret,
            store,
        }
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: UserRole,
        company: Option<String>,
        phone: Option<String>,
    ) -> Result<AuthSession> {
        let account = self
            .identity_call("accounts:signUp", email, password, map_signup_error)
            .await?;

        let profile = UserProfile {
            uid: account.local_id.clone(),
            email: email.to_string(),
            name: name.to_string(),
            user_type: role,
            company,
            phone,
            created_at: Utc::now(),
        };
        self.store
            .put_record(collections::USERS, &profile.uid, &profile)
            .await?;

        self.session_for(profile)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let account = self
            .identity_call(
                "accounts:signInWithPassword",
                email,
                password,
                map_signin_error,
            )
            .await?;

        let profile: UserProfile = self
            .store
            .get_record(collections::USERS, &account.local_id)
            .await?
            .ok_or_else(|| Error::Auth("No account found with this email".to_string()))?;

        self.session_for(profile)
    }

    fn session_for(&self, profile: UserProfile) -> Result<AuthSession> {
        let claims = Claims {
            sub: profile.uid.clone(),
            exp: Utc::now().timestamp() as usize + TOKEN_TTL_SECONDS,
            role: profile.user_type.as_str().to_string(),
            name: profile.name.clone(),
            email: profile.email.clone(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| Error::Internal(format!("token signing failed: {}", e)))?;

        Ok(AuthSession { token, profile })
    }

    async fn identity_call(
        &self,
        operation: &str,
        email: &str,
        password: &str,
        map_error: fn(&str) -> String,
    ) -> Result<IdentityAccount> {
        let url = format!("{}/{}?key={}", self.base_url, operation, self.api_key);
        let res = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true
            }))
            .send()
            .await?;

        if !res.status().is_success() {
            let body: JsonValue = res.json().await.unwrap_or(JsonValue::Null);
            let code = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("");
            tracing::warn!(operation, code, "identity provider rejected request");
            return Err(Error::Auth(map_error(code)));
        }

        Ok(res.json().await?)
    }
}

fn map_signin_error(code: &str) -> String {
    match code {
        "EMAIL_NOT_FOUND" => "No account found with this email",
        "INVALID_PASSWORD" => "Incorrect password",
        "INVALID_EMAIL" => "Please enter a valid email address",
        c if c.starts_with("TOO_MANY_ATTEMPTS") => "Too many failed attempts. Please try again later",
        _ => "Invalid email or password",
    }
    .to_string()
}

fn map_signup_error(code: &str) -> String {
    match code {
        "EMAIL_EXISTS" => "An account with this email already exists",
        c if c.starts_with("WEAK_PASSWORD") => "Password should be at least 6 characters",
        "INVALID_EMAIL" => "Please enter a valid email address",
        c if c.starts_with("TOO_MANY_ATTEMPTS") => "Too many failed attempts. Please try again later",
        _ => "Failed to create account",
    }
    .to_string()
}
