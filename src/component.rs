//! Installable component identities.
//!
//! Every dependency the buildpack can stage is one of these components. The
//! names here are load-bearing: `name()` must match the dependency names in
//! the bundled manifest, and the short and display names appear verbatim in
//! the staging log users grep.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dependency the buildpack knows how to install.
///
/// The variant order is the install order in a staging plan: the SDK is laid
/// down before the runtimes it builds against, and native libraries come
/// last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Component {
    /// The .NET Core SDK, needed to build from project sources.
    #[serde(rename = "dotnet-sdk")]
    Sdk,
    /// The shared runtime (`Microsoft.NETCore.App`).
    #[serde(rename = "dotnet-runtime")]
    Runtime,
    /// The ASP.NET Core shared framework (`Microsoft.AspNetCore.App`/`All`).
    #[serde(rename = "dotnet-aspnetcore")]
    AspNetCore,
    /// Native GDI+ port required by `System.Drawing.Common`.
    #[serde(rename = "libgdiplus")]
    LibGdiPlus,
}

impl Component {
    /// All components, in install order.
    pub const ALL: [Component; 4] = [
        Component::Sdk,
        Component::Runtime,
        Component::AspNetCore,
        Component::LibGdiPlus,
    ];

    /// Dependency name as it appears in the dependency manifest and in
    /// "Installing ..." log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Component::Sdk => "dotnet-sdk",
            Component::Runtime => "dotnet-runtime",
            Component::AspNetCore => "dotnet-aspnetcore",
            Component::LibGdiPlus => "libgdiplus",
        }
    }

    /// Short name used in availability warnings ("SDK 2.1.500 in global.json
    /// is not available").
    pub fn short_name(&self) -> &'static str {
        match self {
            Component::Sdk => "SDK",
            Component::Runtime => "Runtime",
            Component::AspNetCore => "AspNetCore",
            Component::LibGdiPlus => "libgdiplus",
        }
    }

    /// Long name used when an install fails ("Unable to install Dotnet SDK:
    /// no match found for ...").
    pub fn display_name(&self) -> &'static str {
        match self {
            Component::Sdk => "Dotnet SDK",
            Component::Runtime => "Dotnet Runtime",
            Component::AspNetCore => "Dotnet AspNetCore",
            Component::LibGdiPlus => "libgdiplus",
        }
    }

    /// Looks a component up by its manifest name.
    pub fn from_name(name: &str) -> Option<Component> {
        Component::ALL.iter().copied().find(|c| c.name() == name)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
