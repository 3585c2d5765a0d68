use std::fmt;
use std::fmt::Formatter;
use serde::{Deserialize, Serialize};

/// A project name that is safe to use as a file stem. Only alphanumeric characters, `-` and `_`
/// survive sanitisation, so a `ProjectName` can never contain path separators or dots.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
    /// Strip every disallowed character. Returns `None` if nothing is left, as an empty stem would
    /// produce hidden files like `.md`.
    pub fn sanitize(raw: &str) -> Option<Self> {
        let safe_name = sanitize_project_name(raw);
        if safe_name.is_empty() {
            None
        } else {
            Some(Self(safe_name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the raw capture for this project
    pub fn capture_file_name(&self) -> String {
        format!("{}.txt", self.0)
    }

    /// File name of the persisted report for this project
    pub fn report_file_name(&self) -> String {
        format!("{}.md", self.0)
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

pub fn sanitize_project_name(raw: &str) -> String {
    raw.chars().filter(|c| is_allowed(*c)).collect()
}
