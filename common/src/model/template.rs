use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Horizontal alignment of text inside its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

fn default_font_size() -> f32 {
    40.0
}

fn default_font_color() -> String {
    "#000000".to_string()
}

/// A rectangle drawn by the user on the template background.
///
/// Each box carries a template `key` (e.g. `NAME`) that is resolved against a
/// roster column at render time, plus the styling used to draw the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub id: String,
    pub key: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_font_color")]
    pub font_color: String,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub align: TextAlign,
    /// Text drawn when the row has no value for `key`.
    #[serde(default)]
    pub default_text: Option<String>,
}

impl TextBox {
    /// Checks the box against the dimensions of the template image.
    pub fn validate(&self, image_width: u32, image_height: u32) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("text box id must not be empty".to_string());
        }
        if self.key.trim().is_empty() {
            return Err(format!("text box '{}' has an empty key", self.id));
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!("text box '{}' must have a non-zero size", self.id));
        }
        if !(self.font_size > 0.0 && self.font_size <= 500.0) {
            return Err(format!(
                "text box '{}' font size {} is outside (0, 500]",
                self.id, self.font_size
            ));
        }
        if parse_hex_color(&self.font_color).is_none() {
            return Err(format!(
                "text box '{}' has invalid color '{}'",
                self.id, self.font_color
            ));
        }
        let right = u64::from(self.x) + u64::from(self.width);
        let bottom = u64::from(self.y) + u64::from(self.height);
        if right > u64::from(image_width) || bottom > u64::from(image_height) {
            return Err(format!(
                "text box '{}' ({}x{} at {},{}) lies outside the {}x{} template",
                self.id, self.width, self.height, self.x, self.y, image_width, image_height
            ));
        }
        Ok(())
    }
}

/// Parses `#RRGGBB` or `#RGB` into an RGB triple.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some([r, g, b])
        }
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 16 + v;
            }
            Some(out)
        }
        _ => None,
    }
}

/// A certificate background plus the text boxes laid out on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateTemplate {
    pub id: String,
    pub session_id: String,
    /// Stored file name of the background image in the session's `templates/` folder.
    pub image: String,
    pub image_width: u32,
    pub image_height: u32,
    pub text_boxes: Vec<TextBox>,
    pub created_at: String,
    pub updated_at: String,
}

impl CertificateTemplate {
    /// Validates every box and the uniqueness of box ids and keys.
    pub fn validate(&self) -> Result<(), String> {
        let mut ids = HashSet::new();
        let mut keys = HashSet::new();
        for tb in &self.text_boxes {
            tb.validate(self.image_width, self.image_height)?;
            if !ids.insert(tb.id.as_str()) {
                return Err(format!("duplicate text box id '{}'", tb.id));
            }
            if !keys.insert(tb.key.trim().to_lowercase()) {
                return Err(format!("duplicate text box key '{}'", tb.key));
            }
        }
        Ok(())
    }

    /// Template keys in declaration order.
    pub fn keys(&self) -> Vec<String> {
        self.text_boxes.iter().map(|tb| tb.key.clone()).collect()
    }
}
