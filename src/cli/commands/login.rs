//! `jm login`: check the connection settings and persist them.

use super::Session;
use crate::cli::LoginArgs;
use crate::config::Credentials;
use crate::error::{JiraMetricsError, Result};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct LoginOutput<'a> {
    base_url: &'a str,
    email: &'a str,
    verified: bool,
    credentials_file: String,
}

/// # Errors
///
/// Returns `NotAuthenticated` when the url, email or token is missing, and
/// `AuthFailed` when the connection test is rejected.
pub fn execute(args: &LoginArgs, session: &Session) -> Result<()> {
    let settings = &session.settings;
    let (Some(url), Some(email), Some(token)) = (&settings.url, &settings.email, &settings.token)
    else {
        return Err(JiraMetricsError::NotAuthenticated {
            missing: settings.missing_credentials().join(", "),
        });
    };

    let verified = if args.no_verify {
        false
    } else {
        if !session.client()?.test_connection() {
            return Err(JiraMetricsError::AuthFailed {
                base_url: url.clone(),
            });
        }
        true
    };

    let path = session.paths.credentials_file();
    Credentials {
        base_url: url.clone(),
        email: email.clone(),
        api_token: token.clone(),
    }
    .save(&path)?;
    info!(base_url = %url, verified, "Saved credentials");

    let out = &session.out;
    if out.is_json() {
        out.json(&LoginOutput {
            base_url: url,
            email,
            verified,
            credentials_file: path.display().to_string(),
        });
    } else if verified {
        out.success(&format!("Connected to {url} as {email}"));
        out.info(&format!("Credentials saved to {}", path.display()));
    } else {
        out.success(&format!("Credentials saved to {}", path.display()));
    }
    Ok(())
}
