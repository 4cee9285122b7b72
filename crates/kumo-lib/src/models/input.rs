use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum InputType {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl From<String> for InputType {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for InputType {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<f64> for InputType {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for InputType {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// User facing setting or filter field, rendered by the host application
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum Input {
    Text {
        name: String,
        state: Option<String>,
    },
    Checkbox {
        name: String,
        state: Option<bool>,
    },
    Select {
        name: String,
        values: Vec<InputType>,
        state: Option<i64>,
    },
}

impl Input {
    /// Text state by field name, `None` for other variants or unset state
    pub fn text_state(&self, field: &str) -> Option<&str> {
        match self {
            Input::Text { name, state } if name == field => state.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_state() {
        let input = Input::Text {
            name: "Folder URL".to_string(),
            state: Some("https://example.com".to_string()),
        };

        assert_eq!(input.text_state("Folder URL"), Some("https://example.com"));
        assert_eq!(input.text_state("API Key"), None);
    }

    #[test]
    fn test_text_state_unset() {
        let input = Input::Text {
            name: "Folder URL".to_string(),
            state: None,
        };

        assert_eq!(input.text_state("Folder URL"), None);
    }
}
