//! Required-field checks, run before anything is sent to the backend.

use crate::models::{ClientForm, NewInvitation};

/// A form was submitted with a missing or malformed field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}: {}", field, reason)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: &'static str) -> Self {
        ValidationError { field, reason }
    }

    fn required(field: &'static str) -> Self {
        ValidationError::new(field, "is required")
    }
}

/// The fields needed to finish an OTP password reset.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordReset {
    pub email: String,
    /// The one-time password emailed to the user.
    pub otp: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub fn credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    require("email", email)?;
    require("password", password)?;
    Ok(())
}

pub fn invitation(invite: &NewInvitation) -> Result<(), ValidationError> {
    require("email", &invite.email)?;
    email_shaped("email", &invite.email)
}

pub fn client_form(form: &ClientForm) -> Result<(), ValidationError> {
    require("clientName", &form.client_name)?;
    require("clientCode", &form.client_code)?;
    require("clientMail", &form.client_mail)?;
    email_shaped("clientMail", &form.client_mail)?;

    for contact in &form.alternate_contacts {
        require("alternateContacts.name", &contact.name)?;
    }

    Ok(())
}

pub fn password_reset(reset: &PasswordReset) -> Result<(), ValidationError> {
    require("email", &reset.email)?;
    require("otp", &reset.otp)?;
    require("newPassword", &reset.new_password)?;
    require("confirmNewPassword", &reset.confirm_password)?;

    if reset.new_password != reset.confirm_password {
        return Err(ValidationError::new(
            "confirmNewPassword",
            "does not match the new password",
        ));
    }

    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::required(field))
    } else {
        Ok(())
    }
}

fn email_shaped(
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.contains('@') {
        Ok(())
    } else {
        Err(ValidationError::new(field, "is not an email address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlternateContact, Role};

    fn reset() -> PasswordReset {
        PasswordReset {
            email: String::from("user@x.com"),
            otp: String::from("123456"),
            new_password: String::from("hunter2"),
            confirm_password: String::from("hunter2"),
        }
    }

    #[test]
    fn blank_credentials_are_rejected() {
        assert_eq!(
            credentials("user@x.com", "  ").unwrap_err(),
            ValidationError::required("password")
        );
        assert!(credentials("user@x.com", "pw").is_ok());
    }

    #[test]
    fn invitations_need_an_email_address() {
        let invite = NewInvitation {
            email: String::from("not-an-email"),
            role: Role::Designer,
        };

        let err = invitation(&invite).unwrap_err();

        assert_eq!(err.field, "email");
    }

    #[test]
    fn client_form_requires_name_code_and_mail() {
        let mut form = ClientForm {
            client_name: String::from("Innovate Labs"),
            client_code: String::from("IL002"),
            client_mail: String::from("info@innovatelabs.com"),
            ..ClientForm::default()
        };
        assert!(client_form(&form).is_ok());

        form.alternate_contacts.push(AlternateContact::default());
        assert_eq!(
            client_form(&form).unwrap_err().field,
            "alternateContacts.name"
        );

        form.client_code.clear();
        assert_eq!(client_form(&form).unwrap_err().field, "clientCode");
    }

    #[test]
    fn password_reset_needs_matching_passwords() {
        assert!(password_reset(&reset()).is_ok());

        let mismatched = PasswordReset {
            confirm_password: String::from("hunter3"),
            ..reset()
        };
        assert_eq!(
            password_reset(&mismatched).unwrap_err().field,
            "confirmNewPassword"
        );

        let no_otp = PasswordReset {
            otp: String::new(),
            ..reset()
        };
        assert_eq!(password_reset(&no_otp).unwrap_err().field, "otp");
    }
}
