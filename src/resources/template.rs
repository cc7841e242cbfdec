//! URI templates of the form `workspaces://{workspace_id}/projects`.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed '{{' in template {0:?}")]
    Unclosed(String),
    #[error("empty or invalid parameter name in template {0:?}")]
    InvalidName(String),
    #[error("parameters must be separated by literal text in template {0:?}")]
    AdjacentParams(String),
    #[error("unexpected '}}' in template {0:?}")]
    StrayClose(String),
}

/// A parsed URI template. `{name}` captures a non-empty run of characters
/// without `/`, ending at the next literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed(raw.to_string()));
                    }
                    let name = name.trim().to_string();
                    if name.is_empty() || name.contains('{') {
                        return Err(TemplateError::InvalidName(raw.to_string()));
                    }
                    if literal.is_empty() {
                        if matches!(segments.last(), Some(Segment::Param(_))) {
                            return Err(TemplateError::AdjacentParams(raw.to_string()));
                        }
                    } else {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Param(name));
                }
                '}' => return Err(TemplateError::StrayClose(raw.to_string())),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parameter names in order of appearance.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// True when the template has no parameters.
    pub fn is_concrete(&self) -> bool {
        self.params().next().is_none()
    }

    /// Total length of literal text; longer means more specific.
    pub fn literal_len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.len(),
                Segment::Param(_) => 0,
            })
            .sum()
    }

    /// Match a concrete URI, returning the captured parameters.
    pub fn matches(&self, uri: &str) -> Option<BTreeMap<String, String>> {
        let mut captures = BTreeMap::new();
        let mut rest = uri;

        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => {
                    rest = rest.strip_prefix(text.as_str())?;
                }
                Segment::Param(name) => {
                    let end = match self.segments.get(idx + 1) {
                        Some(Segment::Literal(next)) => rest.find(next.as_str())?,
                        _ => rest.len(),
                    };
                    let value = &rest[..end];
                    if value.is_empty() || value.contains('/') {
                        return None;
                    }
                    captures.insert(name.clone(), value.to_string());
                    rest = &rest[end..];
                }
            }
        }

        rest.is_empty().then_some(captures)
    }

    /// Substitute parameter values. Returns `None` if any is missing.
    pub fn expand(&self, values: &BTreeMap<String, String>) -> Option<String> {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param(name) => out.push_str(values.get(name)?),
            }
        }
        Some(out)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
