//! Native library requirements.
//!
//! Some managed packages bind native libraries the root filesystem does not
//! ship. The adviser looks at the dependency declarations it can see and
//! adds the native components the app will need at run time. Today that is
//! `System.Drawing.Common`, which needs libgdiplus on Linux.

use super::mode::Detection;
use super::scan::AppTree;
use super::StagingError;
use crate::component::Component;
use tracing::debug;

const GDIPLUS_PACKAGE: &str = "System.Drawing.Common";

/// Native components the application needs beyond the .NET frameworks.
pub fn advise(tree: &AppTree, detection: &Detection) -> Result<Vec<Component>, StagingError> {
    let mut components = Vec::new();
    if needs_gdiplus(tree, detection)? {
        debug!(package = GDIPLUS_PACKAGE, "app binds GDI+, staging libgdiplus");
        components.push(Component::LibGdiPlus);
    }
    Ok(components)
}

fn needs_gdiplus(tree: &AppTree, detection: &Detection) -> Result<bool, StagingError> {
    // Source pushes declare packages in the project file.
    if let Some(project) = &detection.project {
        if project.references_package(GDIPLUS_PACKAGE) {
            return Ok(true);
        }
    }
    // Published pushes carry the resolved dependency graph in *.deps.json.
    for deps in tree.root_files_with_suffix(".deps.json") {
        let content = tree.read_to_string(deps)?;
        if content.contains(GDIPLUS_PACKAGE) {
            return Ok(true);
        }
    }
    Ok(false)
}
