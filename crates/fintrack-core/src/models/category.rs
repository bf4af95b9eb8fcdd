use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Color used when a category has none or cannot be found
pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

/// Icon name the backend assigns when none is given
pub const DEFAULT_CATEGORY_ICON: &str = "tag";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub user_id: Uuid,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

fn default_icon() -> String {
    DEFAULT_CATEGORY_ICON.to_string()
}

/// Parse a `#RRGGBB` string
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Look up a category name, falling back to `fallback` for unknown or missing ids
pub fn category_name<'a>(categories: &'a [Category], id: Option<Uuid>, fallback: &'a str) -> &'a str {
    id.and_then(|id| categories.iter().find(|c| c.id == id))
        .map(|c| c.name.as_str())
        .unwrap_or(fallback)
}

/// Look up a category color, falling back to the default color
pub fn category_color(categories: &[Category], id: Uuid) -> &str {
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.color.as_str())
        .unwrap_or(DEFAULT_CATEGORY_COLOR)
}

/// Body for `POST /categories`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Body for `PATCH /categories/{id}`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl From<NewCategory> for CategoryUpdate {
    fn from(c: NewCategory) -> Self {
        Self {
            name: Some(c.name),
            color: Some(c.color),
            icon: Some(c.icon),
        }
    }
}
