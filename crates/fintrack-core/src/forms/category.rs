use crate::models::{Category, NewCategory, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON};

use super::{is_hex_color, optional_text, required_text, ValidationErrors};

const MAX_NAME_LENGTH: usize = 50;
const MAX_ICON_LENGTH: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryForm {
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl Default for CategoryForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: DEFAULT_CATEGORY_COLOR.to_string(),
            icon: DEFAULT_CATEGORY_ICON.to_string(),
        }
    }
}

impl CategoryForm {
    /// Prefill from an existing category for editing
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            color: category.color.clone(),
            icon: category.icon.clone(),
        }
    }

    pub fn validate(&self) -> Result<NewCategory, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = required_text(&mut errors, "name", "Name", &self.name, MAX_NAME_LENGTH);

        let color = self.color.trim();
        if !is_hex_color(color) {
            errors.push("color", "Color must be a hex value like #6366f1");
        }

        let icon = optional_text(&mut errors, "icon", "Icon", &self.icon, MAX_ICON_LENGTH)
            .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string());

        errors.into_result(|| NewCategory {
            name: name.unwrap_or_default(),
            color: color.to_string(),
            icon,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_category() {
        let form = CategoryForm {
            name: "  Groceries ".to_string(),
            ..Default::default()
        };
        let body = form.validate().expect("form should be valid");
        assert_eq!(body.name, "Groceries");
        assert_eq!(body.color, "#6366f1");
        assert_eq!(body.icon, "tag");
    }

    #[test]
    fn test_empty_name_rejected() {
        let form = CategoryForm::default();
        let errors = form.validate().expect_err("empty name must fail");
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert!(!errors.has("color"));
    }

    #[test]
    fn test_malformed_color_rejected() {
        for color in ["red", "#fff", "6366f1", "#12345g", ""] {
            let form = CategoryForm {
                name: "Fun".to_string(),
                color: color.to_string(),
                ..Default::default()
            };
            let errors = form.validate().expect_err("bad color must fail");
            assert!(errors.has("color"), "color {:?} should be rejected", color);
        }
    }

    #[test]
    fn test_long_name_rejected() {
        let form = CategoryForm {
            name: "x".repeat(51),
            ..Default::default()
        };
        let errors = form.validate().expect_err("long name must fail");
        assert_eq!(errors.get("name"), Some("Name must be at most 50 characters"));
    }

    #[test]
    fn test_blank_icon_uses_default() {
        let form = CategoryForm {
            name: "Travel".to_string(),
            icon: " ".to_string(),
            ..Default::default()
        };
        assert_eq!(form.validate().map(|c| c.icon), Ok("tag".to_string()));
    }

    #[test]
    fn test_collects_every_error() {
        let form = CategoryForm {
            name: String::new(),
            color: "blue".to_string(),
            icon: "i".repeat(31),
        };
        let errors = form.validate().expect_err("all fields invalid");
        assert_eq!(errors.len(), 3);
    }
}
