//! Dependency Analysis
//!
//! Builds the graph of explicit (`DependsOn`) and implicit (intrinsic
//! reference) edges between logical ids, reports dangling names, and
//! detects cycles with an iterative depth-first search.

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::references::{self, is_pseudo_parameter, Reference};
use crate::templates::Template;
use crate::validation::{codes, Diagnostic, ValidationPass, ValidatorConfig};

/// Adjacency list keyed by logical id, in template order.
pub type DependencyGraph<'a> = IndexMap<&'a str, Vec<&'a str>>;

pub struct DependencyPass;

impl ValidationPass for DependencyPass {
    fn name(&self) -> &'static str {
        "dependencies"
    }

    fn check(&self, template: &Template, config: &ValidatorConfig) -> Vec<Diagnostic> {
        let (graph, mut diagnostics) = build_graph(template, config.max_reference_depth);
        diagnostics.extend(check_outputs(template, config.max_reference_depth));

        let search = find_cycles(&graph, config.max_dependency_depth);
        for cycle in &search.cycles {
            diagnostics.push(
                Diagnostic::error(
                    codes::CIRCULAR_DEPENDENCY,
                    format!("Circular dependency detected: {}", cycle.join(" -> ")),
                )
                .for_resource(cycle[0].as_str()),
            );
        }
        if search.truncated {
            diagnostics.push(Diagnostic::warning(
                codes::DEPENDENCY_DEPTH,
                format!(
                    "Dependency chain is deeper than {}; cycle detection was cut short",
                    config.max_dependency_depth
                ),
            ));
        }

        diagnostics
    }
}

fn resolves(template: &Template, reference: &Reference) -> bool {
    let target = reference.target();
    template.resources.contains_key(target)
        || is_pseudo_parameter(target)
        || (reference.may_name_parameter() && template.parameters.contains_key(target))
}

/// Graph plus dangling-name diagnostics.
pub fn build_graph(
    template: &Template,
    max_depth: usize,
) -> (DependencyGraph<'_>, Vec<Diagnostic>) {
    let mut graph = DependencyGraph::new();
    let mut diagnostics = vec![];

    for (logical_id, resource) in &template.resources {
        let edges = graph.entry(logical_id.as_str()).or_default();

        for dependency in &resource.depends_on {
            match template.resources.get_key_value(dependency) {
                Some((target, _)) => push_edge(edges, target),
                None => diagnostics.push(
                    Diagnostic::error(
                        codes::DANGLING_DEPENDENCY,
                        format!("DependsOn names undefined resource '{}'", dependency),
                    )
                    .for_resource(logical_id.as_str())
                    .on_property("DependsOn"),
                ),
            }
        }

        let mut truncated = false;
        for (property, value) in &resource.properties {
            let scan = references::scan(value, max_depth);
            truncated |= scan.truncated;
            for reference in &scan.references {
                if let Some((target, _)) = template.resources.get_key_value(reference.target()) {
                    push_edge(edges, target);
                } else if !resolves(template, reference) {
                    diagnostics.push(
                        Diagnostic::error(
                            codes::DANGLING_REFERENCE,
                            format!(
                                "{} points at undefined resource '{}'",
                                reference.describe(),
                                reference.target()
                            ),
                        )
                        .for_resource(logical_id.as_str())
                        .on_property(property.as_str()),
                    );
                }
            }
        }
        if truncated {
            diagnostics.push(
                Diagnostic::warning(
                    codes::REFERENCE_DEPTH,
                    format!(
                        "Properties nest deeper than {} levels; references below were not checked",
                        max_depth
                    ),
                )
                .for_resource(logical_id.as_str()),
            );
        }
    }

    debug!(
        nodes = graph.len(),
        edges = graph.values().map(Vec::len).sum::<usize>(),
        "dependency graph built"
    );
    (graph, diagnostics)
}

fn push_edge<'a>(edges: &mut Vec<&'a str>, target: &'a str) {
    if !edges.contains(&target) {
        edges.push(target);
    }
}

fn check_outputs(template: &Template, max_depth: usize) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    for (name, output) in &template.outputs {
        for reference in references::scan(&output.value, max_depth).references {
            if !resolves(template, &reference) {
                diagnostics.push(
                    Diagnostic::error(
                        codes::DANGLING_OUTPUT,
                        format!(
                            "Output '{}' {} points at undefined resource '{}'",
                            name,
                            reference.describe(),
                            reference.target()
                        ),
                    )
                    .on_property(name.as_str()),
                );
            }
        }
    }
    diagnostics
}

#[derive(Debug, Default)]
pub struct CycleSearch {
    /// Each cycle starts and ends with the same logical id.
    pub cycles: Vec<Vec<String>>,
    pub truncated: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

/// Depth-first search over the graph. Every back-edge closes one cycle;
/// the same cycle reached through a different entry point is reported once.
pub fn find_cycles(graph: &DependencyGraph<'_>, max_depth: usize) -> CycleSearch {
    let mut search = CycleSearch::default();
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut seen: HashSet<Vec<&str>> = HashSet::new();

    for &root in graph.keys() {
        if marks.contains_key(root) {
            continue;
        }
        marks.insert(root, Mark::Active);
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];

        while let Some(&(node, next_edge)) = stack.last() {
            let edges = graph.get(node).map_or(&[][..], Vec::as_slice);
            let Some(&next) = edges.get(next_edge) else {
                marks.insert(node, Mark::Done);
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            match marks.get(next) {
                Some(Mark::Active) => {
                    let start = stack.iter().position(|(n, _)| *n == next).unwrap_or(0);
                    let cycle: Vec<&str> = stack[start..].iter().map(|(n, _)| *n).collect();
                    if seen.insert(normalize(&cycle)) {
                        let mut path: Vec<String> = cycle.iter().map(|n| n.to_string()).collect();
                        path.push(next.to_string());
                        search.cycles.push(path);
                    }
                }
                Some(Mark::Done) => {}
                None if stack.len() >= max_depth => search.truncated = true,
                None => {
                    marks.insert(next, Mark::Active);
                    stack.push((next, 0));
                }
            }
        }
    }

    search
}

/// Rotate so the smallest id leads; rotations of one cycle compare equal.
fn normalize<'a>(cycle: &[&'a str]) -> Vec<&'a str> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map_or(0, |(i, _)| i);
    cycle[start..].iter().chain(cycle[..start].iter()).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::{Output, Resource};
    use crate::value::PropertyValue;

    fn topic() -> Resource {
        Resource::new("AWS::SNS::Topic")
    }

    fn check(template: &Template) -> Vec<Diagnostic> {
        DependencyPass.check(template, &ValidatorConfig::default())
    }

    fn codes_of(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn test_explicit_and_implicit_edges() {
        let mut template = Template::new("t");
        template.resources.insert("A".into(), topic());
        let mut b = topic();
        b.depend_on("A");
        b.set("KmsMasterKeyId", PropertyValue::map([("Key", PropertyValue::reference("C"))]));
        template.resources.insert("B".into(), b);
        template.resources.insert("C".into(), topic());

        let (graph, diagnostics) = build_graph(&template, 64);
        assert!(diagnostics.is_empty());
        assert_eq!(graph["B"], vec!["A", "C"]);
        assert!(graph["A"].is_empty());
    }

    #[test]
    fn test_dangling_depends_on() {
        let mut template = Template::new("t");
        let mut a = topic();
        a.depend_on("Ghost");
        template.resources.insert("A".into(), a);
        assert_eq!(codes_of(&check(&template)), vec![codes::DANGLING_DEPENDENCY]);
    }

    #[test]
    fn test_dangling_reference_but_pseudo_and_parameter_ok() {
        let mut template = Template::new("t");
        template.parameters.insert("Env".into(), serde_json::json!({"Type": "String"}));
        let mut a = topic();
        a.set("TopicName", PropertyValue::reference("AWS::StackName"))
            .set("DisplayName", PropertyValue::reference("Env"))
            .set("KmsMasterKeyId", PropertyValue::get_att("Env", "Arn"));
        template.resources.insert("A".into(), a);

        let diagnostics = check(&template);
        assert_eq!(codes_of(&diagnostics), vec![codes::DANGLING_REFERENCE]);
        assert_eq!(diagnostics[0].property.as_deref(), Some("KmsMasterKeyId"));
    }

    #[test]
    fn test_two_node_cycle_reported_once() {
        let mut template = Template::new("t");
        let mut a = topic();
        a.depend_on("B");
        let mut b = topic();
        b.set("DisplayName", PropertyValue::reference("A"));
        template.resources.insert("A".into(), a);
        template.resources.insert("B".into(), b);

        let diagnostics = check(&template);
        assert_eq!(codes_of(&diagnostics), vec![codes::CIRCULAR_DEPENDENCY]);
        assert!(diagnostics[0].message.ends_with("A -> B -> A"));
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let mut template = Template::new("t");
        let mut a = topic();
        a.depend_on("A");
        template.resources.insert("A".into(), a);
        let diagnostics = check(&template);
        assert!(diagnostics[0].message.ends_with("A -> A"));
    }

    #[test]
    fn test_independent_cycles_each_reported() {
        let mut graph = DependencyGraph::new();
        graph.insert("A", vec!["B"]);
        graph.insert("B", vec!["A"]);
        graph.insert("C", vec!["D"]);
        graph.insert("D", vec!["E"]);
        graph.insert("E", vec!["C"]);
        let search = find_cycles(&graph, 1024);
        assert_eq!(search.cycles.len(), 2);
        assert_eq!(search.cycles[1], vec!["C", "D", "E", "C"]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.insert("A", vec!["B", "C"]);
        graph.insert("B", vec!["D"]);
        graph.insert("C", vec!["D"]);
        graph.insert("D", vec![]);
        assert!(find_cycles(&graph, 1024).cycles.is_empty());
    }

    #[test]
    fn test_depth_bound_truncates() {
        let ids: Vec<String> = (0..50).map(|i| format!("N{}", i)).collect();
        let mut graph = DependencyGraph::new();
        for pair in ids.windows(2) {
            graph.insert(pair[0].as_str(), vec![pair[1].as_str()]);
        }
        let search = find_cycles(&graph, 10);
        assert!(search.truncated);
    }

    #[test]
    fn test_output_reference_must_resolve() {
        let mut template = Template::new("t");
        template.resources.insert("A".into(), topic());
        template
            .outputs
            .insert("GoodArn".into(), Output::new(PropertyValue::reference("A"), "ok"));
        template
            .outputs
            .insert("BadArn".into(), Output::new(PropertyValue::reference("Z"), "bad"));
        let diagnostics = check(&template);
        assert_eq!(codes_of(&diagnostics), vec![codes::DANGLING_OUTPUT]);
        assert_eq!(diagnostics[0].property.as_deref(), Some("BadArn"));
    }
}
