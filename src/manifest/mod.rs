//! Application manifests that can pin dependency versions.
//!
//! Four files influence which versions are staged, strongest first:
//! `buildpack.yml` (operator override), the published `*.runtimeconfig.json`,
//! the MSBuild project file, and `global.json`. Each reader turns one file
//! into a [`VersionSource`]; [`SourceSet`] folds the loaded sources into one
//! effective request per component. Precedence is per component, not per
//! file: a `buildpack.yml` that only pins the SDK leaves the runtime choice
//! to the weaker manifests.

pub mod buildpack_yml;
pub mod global_json;
pub mod project;
pub mod runtime_config;

pub use buildpack_yml::BuildpackYml;
pub use global_json::GlobalJson;
pub use project::ProjectFile;
pub use runtime_config::RuntimeConfig;

use crate::component::Component;
use crate::version::resolver::VersionRequest;
use crate::version::Constraint;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {file}: {reason}")]
    Invalid { file: String, reason: String },
    #[error("invalid version constraint '{value}' in {file}")]
    Constraint { value: String, file: String },
}

/// Where an effective version constraint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    BuildpackYml,
    RuntimeConfig,
    Project,
    GlobalJson,
}

impl SourceKind {
    /// Default precedence, strongest first.
    pub const PRECEDENCE: [SourceKind; 4] = [
        SourceKind::BuildpackYml,
        SourceKind::RuntimeConfig,
        SourceKind::Project,
        SourceKind::GlobalJson,
    ];

    /// File name shown in user-facing availability warnings.
    pub fn file_label(&self) -> &'static str {
        match self {
            SourceKind::BuildpackYml => "buildpack.yml",
            SourceKind::RuntimeConfig => "runtimeconfig.json",
            SourceKind::Project => "project file",
            SourceKind::GlobalJson => "global.json",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_label())
    }
}

/// One manifest's contribution to version selection.
pub trait VersionSource {
    fn kind(&self) -> SourceKind;

    /// The constraint this manifest states for `component`, if any.
    fn constraint(&self, component: Component) -> Option<Constraint>;
}

/// The manifests found in an application tree, strongest first.
#[derive(Default)]
pub struct SourceSet {
    sources: Vec<Box<dyn VersionSource>>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: Box<dyn VersionSource>) {
        self.sources.push(source);
    }

    /// Reorders the loaded sources to the given precedence, strongest
    /// first. Sources whose kind is absent from `order` are dropped.
    pub fn with_order(mut self, order: &[SourceKind]) -> Self {
        self.sources
            .retain(|s| order.contains(&s.kind()));
        self.sources
            .sort_by_key(|s| order.iter().position(|k| *k == s.kind()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The strongest constraint any loaded manifest states for `component`.
    pub fn effective(&self, component: Component) -> Option<(Constraint, SourceKind)> {
        self.sources
            .iter()
            .find_map(|s| s.constraint(component).map(|c| (c, s.kind())))
    }

    /// The request the resolver should satisfy for `component`. Falls back
    /// to "newest available" when no manifest pins the component.
    pub fn request(&self, component: Component) -> VersionRequest {
        match self.effective(component) {
            Some((constraint, kind)) => VersionRequest::new(component, constraint, kind),
            None => VersionRequest::latest(component),
        }
    }

    /// Like [`SourceSet::request`], but only when some manifest actually
    /// constrains the component. Used for components that are staged only
    /// when the app asks for them.
    pub fn request_if_constrained(&self, component: Component) -> Option<VersionRequest> {
        self.effective(component)
            .map(|(constraint, kind)| VersionRequest::new(component, constraint, kind))
    }
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|s| s.kind()))
            .finish()
    }
}

/// Strips `//` and `/* */` comments from JSON text.
///
/// Published `runtimeconfig.json` files routinely carry comments even though
/// strict JSON forbids them. String literals are respected, so a `//` inside
/// a URL survives. Comment bytes become spaces to keep serde's error
/// positions meaningful.
pub(crate) fn strip_json_comments(input: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Normal,
        InString { escaped: bool },
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(input.len());
    let mut state = State::Normal;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                '"' => {
                    state = State::InString { escaped: false };
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                    out.push_str("  ");
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                    out.push_str("  ");
                }
                _ => out.push(c),
            },
            State::InString { escaped } => {
                if !escaped && c == '"' {
                    state = State::Normal;
                } else {
                    state = State::InString {
                        escaped: !escaped && c == '\\',
                    };
                }
                out.push(c);
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Normal;
                    out.push_str("  ");
                } else if c == '\n' {
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
        }
    }
    out
}
