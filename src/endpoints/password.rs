//! The two-step, OTP-based password reset.

use crate::{
    config::Paths,
    http::{Auth, EndpointError},
    validate::{self, PasswordReset},
    HttpClient,
};
use reqwest::Method;
use serde_derive::Serialize;

/// Ask the backend to email `email` a one-time password. Deleting the
/// password resource is how the backend spells "start a reset".
pub async fn request_password_reset(
    client: &HttpClient,
    paths: &Paths,
    email: &str,
) -> Result<(), EndpointError> {
    if email.trim().is_empty() {
        let err = validate::ValidationError::new("email", "is required");
        return Err(err.into());
    }

    client
        .send(
            Method::DELETE,
            &password_path(paths, email)?,
            None::<&()>,
            Auth::Anonymous,
        )
        .await?;

    Ok(())
}

/// Prove ownership with the emailed OTP and set a new password.
pub async fn reset_password(
    client: &HttpClient,
    paths: &Paths,
    reset: &PasswordReset,
) -> Result<(), EndpointError> {
    validate::password_reset(reset)?;

    let data = Data {
        prooftype: "otp",
        proof: &reset.otp,
        new_password: &reset.new_password,
        confirm_new_password: &reset.confirm_password,
    };

    client
        .send(
            Method::PUT,
            &password_path(paths, &reset.email)?,
            Some(&data),
            Auth::Anonymous,
        )
        .await?;

    Ok(())
}

fn password_path(
    paths: &Paths,
    email: &str,
) -> Result<String, EndpointError> {
    let user = super::member(&paths.users, email.trim())?;
    Ok(format!("{}/password", user))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Data<'a> {
    prooftype: &'a str,
    proof: &'a str,
    new_password: &'a str,
    confirm_new_password: &'a str,
}
