//! Circular-Import Resolver
//!
//! The generated module imports its compiled counterpart, and that
//! counterpart (or a sibling generated module) may call back into a
//! wrapper export during its own top-level evaluation. Wrappers therefore
//! must be usable the moment they are bound: they may close over nothing
//! but their own parameters and the checked binding, which the ordering
//! contract places before them.
//!
//! Function wrappers can always take that form (a function expression is
//! fully usable once bound). A wrapped non-function value cannot: its
//! converted construction runs at top level. That is only fatal when the
//! module actually sits inside a dependency cycle.

use crate::error::CodegenError;
use crate::wrapper::{ExportState, SynthesizedExport, WrapperBody};
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};
use tsbind_core::Project;

/// Modules that participate in a dependency cycle (an SCC of size > 1 or
/// a self-edge).
#[derive(Debug, Clone, Default)]
pub struct CycleSet {
    in_cycle: HashSet<String>,
}

impl CycleSet {
    pub fn from_project(project: &Project) -> Self {
        let mut graph = DiGraph::<&str, ()>::new();
        let mut indices = HashMap::new();
        for module in &project.modules {
            indices.insert(module.name.as_str(), graph.add_node(module.name.as_str()));
        }
        for module in &project.modules {
            let from = indices[module.name.as_str()];
            for dep in &module.deps {
                // Edges to modules outside the project cannot close a
                // cycle within it.
                if let Some(&to) = indices.get(dep.as_str()) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let mut in_cycle = HashSet::new();
        for component in tarjan_scc(&graph) {
            if component.len() > 1 {
                for idx in component {
                    in_cycle.insert(graph[idx].to_string());
                }
            } else {
                let idx = component[0];
                if graph.find_edge(idx, idx).is_some() {
                    in_cycle.insert(graph[idx].to_string());
                }
            }
        }

        debug!(modules_in_cycles = in_cycle.len(), "analyzed dependency graph");
        Self { in_cycle }
    }

    pub fn contains(&self, module: &str) -> bool {
        self.in_cycle.contains(module)
    }
}

/// Decide whether an export's wrapper must be hoisted, or refuse the
/// export entirely when no hoistable form exists.
pub fn resolve_hoisting(
    module: &str,
    in_cycle: bool,
    export: &SynthesizedExport,
) -> Result<bool, CodegenError> {
    match (&export.state, &export.wrapper) {
        // A direct alias carries no top-level work of its own.
        (ExportState::Direct, _) => Ok(false),

        (ExportState::Wrapped, Some(body)) if body.is_function => {
            if !is_hoist_safe(body, &export.checked) {
                return Err(CodegenError::Generation(format!(
                    "wrapper for '{}' closes over more than its checked binding",
                    export.name
                )));
            }
            trace!(module, export = export.name.as_str(), "wrapper hoisted");
            Ok(true)
        }

        (ExportState::Wrapped, Some(_)) if in_cycle => Err(CodegenError::CycleUnresolvable {
            module: module.to_string(),
            export: export.name.clone(),
            reason: "non-function value needs conversion at module evaluation time".to_string(),
        }),

        // Converted constant outside any cycle: safe as a plain binding.
        (ExportState::Wrapped, Some(_)) => Ok(false),

        (ExportState::Wrapped, None) => Err(CodegenError::Generation(format!(
            "wrapped export '{}' has no wrapper body",
            export.name
        ))),
    }
}

/// Structural hoist-safety: every root identifier in the delegate
/// expression is either a wrapper parameter or the checked binding.
/// Field accesses (`x.f`) and object keys (`{f:...}`) do not count as
/// root references.
pub fn is_hoist_safe(body: &WrapperBody, checked: &str) -> bool {
    for ident in root_identifiers(&body.delegate_expr) {
        if ident != checked && !body.params.iter().any(|p| p == &ident) {
            return false;
        }
    }
    true
}

fn root_identifiers(expr: &str) -> Vec<String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut idents = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            let preceded_by_dot = start > 0 && chars[start - 1] == '.';
            let followed_by_colon = i < chars.len() && chars[i] == ':';
            if !preceded_by_dot && !followed_by_colon {
                idents.push(chars[start..i].iter().collect());
            }
        } else {
            i += 1;
        }
    }
    idents
}
