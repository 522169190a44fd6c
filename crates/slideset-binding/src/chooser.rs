use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BindingError;
use crate::param::ParamSpec;
use crate::resolver::Candidate;

/// A chooser's answer for one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Use the column or new-column candidate at this index.
    Candidate(usize),
    /// Use the constant candidate at this index with a literal value.
    Constant { candidate: usize, text: String },
}

impl Selection {
    pub fn candidate(&self) -> usize {
        match self {
            Selection::Candidate(i) => *i,
            Selection::Constant { candidate, .. } => *candidate,
        }
    }
}

/// Picks one candidate per parameter.
///
/// Called once per parameter, even when there is a single candidate.
/// `Ok(None)` means no selection; `Err(BindingError::Cancelled)` aborts the
/// whole resolution.
pub trait Chooser {
    fn choose(
        &mut self,
        param: &ParamSpec,
        candidates: &[Candidate],
    ) -> Result<Option<Selection>, BindingError>;
}

/// Picks the first candidate that is not a constant.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstCandidate;

impl Chooser for FirstCandidate {
    fn choose(
        &mut self,
        _param: &ParamSpec,
        candidates: &[Candidate],
    ) -> Result<Option<Selection>, BindingError> {
        Ok(candidates
            .iter()
            .position(|c| !c.is_constant())
            .map(Selection::Candidate))
    }
}

/// A stored answer for one parameter.
///
/// In YAML:
///
/// ```yaml
/// selections:
///   Count: { column: Count }
///   Threshold: { constant: 5 }
///   Report: { writer: text-file }
///   Mask: { index: 2 }
///   Extra: { cancel: true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Preset {
    Column {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reader: Option<String>,
    },
    Constant {
        constant: serde_yaml::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reader: Option<String>,
    },
    Writer {
        writer: String,
    },
    Index {
        index: usize,
    },
    Cancel {
        cancel: bool,
    },
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct PresetFile {
    #[serde(default)]
    selections: BTreeMap<String, Preset>,
}

/// Headless chooser answering from presets keyed by parameter name.
/// Parameters without a preset get no selection.
#[derive(Debug, Default, Clone)]
pub struct PresetChooser {
    presets: BTreeMap<String, Preset>,
}

impl PresetChooser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, param: impl Into<String>, preset: Preset) -> Self {
        self.presets.insert(param.into(), preset);
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, BindingError> {
        let file: PresetFile = serde_yaml::from_str(yaml)?;
        Ok(Self {
            presets: file.selections,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BindingError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn presets(&self) -> &BTreeMap<String, Preset> {
        &self.presets
    }
}

impl Chooser for PresetChooser {
    fn choose(
        &mut self,
        param: &ParamSpec,
        candidates: &[Candidate],
    ) -> Result<Option<Selection>, BindingError> {
        let Some(preset) = self.presets.get(&param.name) else {
            return Ok(None);
        };
        let not_found = |what: String| BindingError::InvalidSelection {
            param: param.name.clone(),
            reason: format!("no candidate matches {what}"),
        };
        let reader_matches =
            |reader: &Option<String>, c: &Candidate| reader.as_deref().is_none_or(|r| c.adapter_name() == r);

        let selection = match preset {
            Preset::Column { column, reader } => candidates
                .iter()
                .position(|c| {
                    matches!(c, Candidate::Column { column_name, .. } if column_name == column)
                        && reader_matches(reader, c)
                })
                .map(Selection::Candidate)
                .ok_or_else(|| not_found(format!("column `{column}`")))?,
            Preset::Constant { constant, reader } => {
                let candidate = candidates
                    .iter()
                    .position(|c| c.is_constant() && reader_matches(reader, c))
                    .ok_or_else(|| not_found("a constant".to_string()))?;
                Selection::Constant {
                    candidate,
                    text: scalar_text(constant).ok_or_else(|| BindingError::InvalidSelection {
                        param: param.name.clone(),
                        reason: "constants must be scalars".to_string(),
                    })?,
                }
            }
            Preset::Writer { writer } => candidates
                .iter()
                .position(|c| {
                    matches!(c, Candidate::NewColumn { .. }) && c.adapter_name() == writer
                })
                .map(Selection::Candidate)
                .ok_or_else(|| not_found(format!("writer `{writer}`")))?,
            Preset::Index { index } => Selection::Candidate(*index),
            Preset::Cancel { cancel: true } => return Err(BindingError::Cancelled),
            Preset::Cancel { cancel: false } => return Ok(None),
        };
        Ok(Some(selection))
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_presets_parse_each_form() {
        let chooser = PresetChooser::from_yaml_str(
            r#"
selections:
  Count: { column: Count, reader: integer-i32 }
  Threshold: { constant: 5 }
  Report: { writer: text-file }
  Mask: { index: 2 }
  Extra: { cancel: true }
"#,
        )
        .unwrap();
        let p = chooser.presets();
        assert_eq!(
            p["Count"],
            Preset::Column {
                column: "Count".into(),
                reader: Some("integer-i32".into())
            }
        );
        assert!(matches!(&p["Threshold"], Preset::Constant { constant, reader: None } if scalar_text(constant).as_deref() == Some("5")));
        assert_eq!(p["Report"], Preset::Writer { writer: "text-file".into() });
        assert_eq!(p["Mask"], Preset::Index { index: 2 });
        assert_eq!(p["Extra"], Preset::Cancel { cancel: true });
    }

    #[test]
    fn malformed_yaml_is_a_selection_error() {
        assert!(matches!(
            PresetChooser::from_yaml_str("selections: [1, 2"),
            Err(BindingError::Selections(_))
        ));
    }
}
