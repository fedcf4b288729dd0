//! Authentication endpoints: `login/`, `register/`, `logout/`.

use reqwest::multipart;
use tracing::{info, warn};

use crate::api::{ApiClient, check};
use crate::error::{ApiError, ApiResult};
use crate::model::{AuthResponse, RegisterPayload};

impl ApiClient {
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let res = self
            .post("login/")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let res = check(res).await?;
        let auth: AuthResponse = serde_json::from_str(&res.text().await?)?;

        info!(user = %auth.user.username, "login succeeded");
        Ok(auth)
    }

    /// Register a new account. The backend expects a multipart form; the
    /// avatar travels as a file part when provided.
    pub async fn register(&self, payload: &RegisterPayload) -> ApiResult<AuthResponse> {
        let mut form = multipart::Form::new()
            .text("username", payload.username.clone())
            .text("email", payload.email.clone())
            .text("password", payload.password.clone())
            .text("password2", payload.password2.clone());

        if let Some(avatar) = &payload.avatar {
            let part =
                multipart::Part::bytes(avatar.bytes.clone()).file_name(avatar.filename.clone());
            form = form.part("avatar", part);
        }

        let res = self.post("register/").multipart(form).send().await?;
        let res = check(res).await?;
        let auth: AuthResponse = serde_json::from_str(&res.text().await?)?;

        info!(user = %auth.user.username, "account registered");
        Ok(auth)
    }

    /// Best-effort server-side logout. The caller clears the local session
    /// before this runs; a backend failure here is logged, not surfaced.
    pub async fn logout(&self) {
        let Some(token) = self.token().map(str::to_owned) else {
            return;
        };

        let result = async {
            let res =
                self.post("logout/").json(&serde_json::json!({ "token": token })).send().await?;
            check(res).await?;
            Ok::<_, ApiError>(())
        }
        .await;

        match result {
            Ok(()) => info!("logout acknowledged by backend"),
            Err(e) => warn!(error = %e, "logout request failed"),
        }
    }
}
