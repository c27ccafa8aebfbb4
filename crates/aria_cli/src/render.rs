//! Terminal output for the consumers.

use aria_core::{IssueList, Severity, TypeCategory};
use aria_presentation::spec_registry;
use aria_topology::PipelineOutput;
use aria_types::TypeRegistry;
use console::style;
use std::fmt::Write;

/// Print collected issues to stderr
pub fn issues(issues: &IssueList) {
    for issue in issues.iter() {
        let label = match issue.severity {
            Severity::Error => style("error").red().bold(),
            Severity::Warning => style("warning").yellow().bold(),
            Severity::Info => style("info").cyan(),
        };
        eprintln!("{}: {}", label.for_stderr(), issue.message);
        eprintln!("    {} {}", style("at").dim().for_stderr(), issue.location);
    }
}

/// One-line result summary on stderr
pub fn summary(output: &PipelineOutput, printed: bool) {
    let errors = output.issues.errors().count();
    let warnings = output.issues.len() - errors;
    if output.is_clean() {
        eprintln!(
            "{} {} ({} warnings)",
            style("ok").green().bold().for_stderr(),
            output.document.locator,
            warnings
        );
    } else {
        eprintln!(
            "{} {} errors, {} warnings",
            style("failed").red().bold().for_stderr(),
            errors,
            warnings
        );
    }
    if !printed {
        eprintln!("nothing to print: fix the errors above first");
    }
}

/// Render every non-empty category as an indented inheritance tree
#[must_use]
pub fn type_tree(registry: &TypeRegistry) -> String {
    let mut out = String::new();
    for category in TypeCategory::ALL {
        if registry.category_len(category) == 0 {
            continue;
        }
        let _ = writeln!(out, "{} types", category);
        for root in registry.roots(category) {
            walk(registry, category, root, 1, &mut out);
        }
    }
    out
}

fn walk(registry: &TypeRegistry, category: TypeCategory, name: &str, depth: usize, out: &mut String) {
    let _ = writeln!(out, "{}{}", "  ".repeat(depth), name);
    for child in registry.children(category, name) {
        walk(registry, category, child, depth + 1, out);
    }
}

/// Print presentation types with the section documenting them
pub fn spec_entries() {
    for (name, section) in spec_registry::entries() {
        println!("{:<40} {}", name, style(section).dim());
    }
}
