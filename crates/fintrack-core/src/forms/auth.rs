use crate::models::{NewUser, UserUpdate};

use super::ValidationErrors;

const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 100;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Returns the trimmed email and the password as typed
    pub fn validate(&self) -> Result<(String, String), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let email = self.email.trim();
        if email.is_empty() {
            errors.push("email", "Email is required");
        }
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }
        errors.into_result(|| (email.to_string(), self.password.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterForm {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let email = self.email.trim();
        if !looks_like_email(email) {
            errors.push("email", "Enter a valid email address");
        }

        let name = self.name.trim();
        check_name(&mut errors, name);

        let password_len = self.password.chars().count();
        if password_len < MIN_PASSWORD_LENGTH {
            errors.push(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            );
        } else if password_len > MAX_PASSWORD_LENGTH {
            errors.push(
                "password",
                format!("Password must be at most {} characters", MAX_PASSWORD_LENGTH),
            );
        }

        errors.into_result(|| NewUser {
            email: email.to_string(),
            name: name.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub name: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<UserUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = self.name.trim();
        check_name(&mut errors, name);
        errors.into_result(|| UserUpdate {
            name: Some(name.to_string()),
        })
    }
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    let len = name.chars().count();
    if len < MIN_NAME_LENGTH {
        errors.push(
            "name",
            format!("Name must be at least {} characters", MIN_NAME_LENGTH),
        );
    } else if len > MAX_NAME_LENGTH {
        errors.push(
            "name",
            format!("Name must be at most {} characters", MAX_NAME_LENGTH),
        );
    }
}

/// `local@domain.tld` with no whitespace
pub fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_requires_both_fields() {
        let errors = LoginForm::default().validate().expect_err("empty login");
        assert!(errors.has("email"));
        assert!(errors.has("password"));

        let ok = LoginForm {
            email: " ana@example.com ".to_string(),
            password: "secret".to_string(),
        };
        assert_eq!(
            ok.validate(),
            Ok(("ana@example.com".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("ana@example.com"));
        assert!(looks_like_email("a.b+c@mail.example.org"));
        assert!(!looks_like_email("ana"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ana@example"));
        assert!(!looks_like_email("ana@.com"));
        assert!(!looks_like_email("ana@@example.com"));
        assert!(!looks_like_email("ana @example.com"));
    }

    #[test]
    fn test_register_rules() {
        let form = RegisterForm {
            email: "ana@example.com".to_string(),
            name: "A".to_string(),
            password: "short".to_string(),
        };
        let errors = form.validate().expect_err("invalid registration");
        assert!(errors.has("name"));
        assert!(errors.has("password"));
        assert!(!errors.has("email"));

        let good = RegisterForm {
            email: "ana@example.com".to_string(),
            name: " Ana ".to_string(),
            password: "longenough".to_string(),
        };
        let body = good.validate().expect("valid registration");
        assert_eq!(body.name, "Ana");
    }

    #[test]
    fn test_profile_name() {
        assert!(ProfileForm { name: "Jo".to_string() }.validate().is_ok());
        assert!(ProfileForm { name: " J ".to_string() }.validate().is_err());
    }
}
