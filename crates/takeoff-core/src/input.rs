//! Raw user input values
//!
//! The UI collects one raw value per plain-input code. Values arrive either as
//! numbers or as the text the user typed; the engine coerces them on read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A raw value entered for a variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Text(String),
}

impl InputValue {
    /// Coerce to a number: finite numbers and numeric text pass through,
    /// blank, non-numeric or non-finite values become 0
    pub fn as_number(&self) -> f64 {
        let n = match self {
            InputValue::Number(n) => *n,
            InputValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse().unwrap_or(0.0)
                }
            }
        };
        if n.is_finite() {
            n
        } else {
            0.0
        }
    }

    /// Whether the value counts as present when building labels
    /// (non-empty text, non-zero number)
    pub fn is_present(&self) -> bool {
        match self {
            InputValue::Number(n) => *n != 0.0 && !n.is_nan(),
            InputValue::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Number(n) => write!(f, "{}", n),
            InputValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Number(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        InputValue::Text(value)
    }
}

/// Raw inputs for the currently selected group, keyed by variable code
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputState {
    values: BTreeMap<String, InputValue>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, code: impl Into<String>, value: impl Into<InputValue>) {
        self.values.insert(code.into(), value.into());
    }

    pub fn set_number(&mut self, code: impl Into<String>, value: f64) {
        self.set(code, InputValue::Number(value));
    }

    pub fn set_text(&mut self, code: impl Into<String>, value: impl Into<String>) {
        self.set(code, InputValue::Text(value.into()));
    }

    pub fn get(&self, code: &str) -> Option<&InputValue> {
        self.values.get(code)
    }

    pub fn remove(&mut self, code: &str) -> Option<InputValue> {
        self.values.remove(code)
    }

    /// Numeric value of a code, 0 when missing or not a number
    pub fn numeric(&self, code: &str) -> f64 {
        self.values.get(code).map_or(0.0, InputValue::as_number)
    }

    /// Display text of a code when it is present (see [`InputValue::is_present`])
    pub fn label(&self, code: &str) -> Option<String> {
        self.values
            .get(code)
            .filter(|v| v.is_present())
            .map(ToString::to_string)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for InputState
where
    K: Into<String>,
    V: Into<InputValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = InputState::new();
        for (code, value) in iter {
            state.set(code, value);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        let inputs: InputState = [
            ("A", InputValue::Number(2.5)),
            ("B", InputValue::from(" 12 ")),
            ("C", InputValue::from("")),
            ("D", InputValue::from("abc")),
            ("E", InputValue::from("1e3")),
            ("F", InputValue::from("NaN")),
            ("G", InputValue::Number(f64::INFINITY)),
        ]
        .into_iter()
        .collect();

        assert_eq!(inputs.numeric("A"), 2.5);
        assert_eq!(inputs.numeric("B"), 12.0);
        assert_eq!(inputs.numeric("C"), 0.0);
        assert_eq!(inputs.numeric("D"), 0.0);
        assert_eq!(inputs.numeric("E"), 1000.0);
        assert_eq!(inputs.numeric("F"), 0.0);
        assert_eq!(inputs.numeric("G"), 0.0);
        assert_eq!(inputs.numeric("MISSING"), 0.0);
    }

    #[test]
    fn test_label() {
        let mut inputs = InputState::new();
        inputs.set_text("SIZE", "100x50");
        inputs.set_text("EMPTY", "");
        inputs.set_number("GAUGE", 18.0);
        inputs.set_number("ZERO", 0.0);

        assert_eq!(inputs.label("SIZE").as_deref(), Some("100x50"));
        assert_eq!(inputs.label("GAUGE").as_deref(), Some("18"));
        assert_eq!(inputs.label("EMPTY"), None);
        assert_eq!(inputs.label("ZERO"), None);
        assert_eq!(inputs.label("MISSING"), None);
    }

    #[test]
    fn test_json_values() {
        let inputs: InputState = serde_json::from_str(r#"{"LG": 4, "SIZE": "3/4"}"#).unwrap();
        assert_eq!(inputs.get("LG"), Some(&InputValue::Number(4.0)));
        assert_eq!(inputs.get("SIZE"), Some(&InputValue::Text("3/4".into())));
    }
}
