//! Turtle and JSON serialization of a [`TaxonomyGraph`].

use std::fmt::Write;

use serde::Serialize;

use curriculum_shared::{CurriculumError, Result};

use crate::model::{Edge, Label, Node, TaxonomyGraph, vocab};

/// Prefix table used to compact IRIs. The `minedu` prefix is the configured
/// concept base.
#[derive(Debug, Clone)]
pub struct Prefixes {
    entries: Vec<(String, String)>,
}

impl Prefixes {
    pub fn new(concept_base: &str) -> Self {
        let entries = [
            ("rdf", vocab::RDF),
            ("skos", vocab::SKOS),
            ("dct", vocab::DCT),
            ("elm", vocab::ELM),
            ("edu", vocab::EDU),
            ("minedu", concept_base),
        ]
        .into_iter()
        .map(|(p, ns)| (p.to_string(), ns.to_string()))
        .collect();
        Self { entries }
    }

    /// `prefix:local` when a namespace matches and the remainder is a safe
    /// local name, otherwise `<iri>`.
    fn compact(&self, iri: &str) -> String {
        self.entries
            .iter()
            .filter(|(_, ns)| !ns.is_empty())
            .filter_map(|(prefix, ns)| {
                iri.strip_prefix(ns.as_str())
                    .filter(|local| is_local_name(local))
                    .map(|local| (ns.len(), format!("{prefix}:{local}")))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, curie)| curie)
            .unwrap_or_else(|| format!("<{}>", escape_iri(iri)))
    }
}

fn is_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    !local.ends_with('.') && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn escape_iri(iri: &str) -> String {
    iri.chars()
        .flat_map(|c| match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | ' ' => {
                format!("\\u{:04X}", c as u32).chars().collect::<Vec<_>>()
            }
            c => vec![c],
        })
        .collect()
}

fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn literal(label: &Label) -> String {
    match &label.language {
        Some(lang) => format!("\"{}\"@{lang}", escape_literal(&label.text)),
        None => format!("\"{}\"", escape_literal(&label.text)),
    }
}

/// Serialize the graph as Turtle: one block per subject in IRI order,
/// `rdf:type` first, then label and source, then edges in
/// (relation, target) order.
pub fn write_turtle(graph: &TaxonomyGraph, prefixes: &Prefixes) -> Result<String> {
    let mut out = String::new();
    for (prefix, ns) in &prefixes.entries {
        writeln!(out, "@prefix {prefix}: <{}> .", escape_iri(ns))?;
    }

    for subject in graph.subjects() {
        let mut statements: Vec<String> = Vec::new();
        if let Some(node) = graph.node(subject) {
            statements.extend(node_statements(node, prefixes));
        }
        statements.extend(
            graph
                .edges_from(subject)
                .map(|edge| edge_statement(edge, prefixes)),
        );
        if statements.is_empty() {
            continue;
        }

        writeln!(out)?;
        writeln!(out, "{}", prefixes.compact(subject.as_str()))?;
        let last = statements.len() - 1;
        for (i, statement) in statements.iter().enumerate() {
            let end = if i == last { " ." } else { " ;" };
            writeln!(out, "    {statement}{end}")?;
        }
    }

    Ok(out)
}

fn node_statements(node: &Node, prefixes: &Prefixes) -> Vec<String> {
    let mut statements = vec![format!("a {}", prefixes.compact(node.kind.rdf_type()))];
    if let Some(label) = &node.label {
        statements.push(format!(
            "{} {}",
            prefixes.compact(vocab::SKOS_PREF_LABEL),
            literal(label)
        ));
    }
    if let Some(source) = &node.source {
        statements.push(format!(
            "{} \"{}\"",
            prefixes.compact(vocab::DCT_SOURCE),
            escape_literal(source)
        ));
    }
    statements
}

fn edge_statement(edge: &Edge, prefixes: &Prefixes) -> String {
    format!(
        "{} {}",
        prefixes.compact(edge.relation.iri()),
        prefixes.compact(edge.target.as_str())
    )
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonGraph<'a> {
    nodes: Vec<&'a Node>,
    edges: Vec<&'a Edge>,
}

/// Pretty-printed JSON dump of the node/edge model.
pub fn write_json(graph: &TaxonomyGraph) -> Result<String> {
    let doc = JsonGraph {
        nodes: graph.nodes().collect(),
        edges: graph.edges().collect(),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| CurriculumError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Iri, NodeKind, Relation};

    fn prefixes() -> Prefixes {
        Prefixes::new("http://minedu.sk/def/")
    }

    #[test]
    fn compacts_known_namespaces() {
        let p = prefixes();
        assert_eq!(p.compact("http://www.w3.org/2004/02/skos/core#narrower"), "skos:narrower");
        assert_eq!(p.compact("http://minedu.sk/def/rocnik-5"), "minedu:rocnik-5");
        assert_eq!(
            p.compact("http://minedu.sk/def/vykonovy-standard/pocita"),
            "<http://minedu.sk/def/vykonovy-standard/pocita>"
        );
        assert_eq!(p.compact("https://data.gov.sk/def/study-grade/5"), "<https://data.gov.sk/def/study-grade/5>");
    }

    #[test]
    fn literals_are_escaped_and_tagged() {
        let label = Label::new("Úloha \"A\"\nriadok", "sk");
        assert_eq!(literal(&label), "\"Úloha \\\"A\\\"\\nriadok\"@sk");
    }

    #[test]
    fn writes_subject_blocks() {
        let mut graph = TaxonomyGraph::new();
        let theme = Iri::new("http://minedu.sk/def/theme-hranol");
        let grade = Iri::new("http://minedu.sk/def/rocnik-8");
        graph.add_node(Node::new(theme.clone(), NodeKind::Theme).with_label(Label::new("Hranol", "sk")));
        graph.add_edge(&theme, Relation::Broader, &grade);

        let ttl = write_turtle(&graph, &prefixes()).expect("turtle");
        assert!(ttl.starts_with("@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> ."));
        assert!(ttl.contains(
            "minedu:theme-hranol\n    a skos:Concept ;\n    skos:prefLabel \"Hranol\"@sk ;\n    skos:broader minedu:rocnik-8 .\n"
        ));
    }

    #[test]
    fn json_lists_nodes_and_edges() {
        let mut graph = TaxonomyGraph::new();
        let a = Iri::new("http://minedu.sk/def/a");
        graph.add_node(Node::new(a.clone(), NodeKind::ContentStatement).with_label(Label::new("a", "sk")));
        graph.add_edge(&a, Relation::InScheme, &Iri::new("http://minedu.sk/def/s"));

        let json: serde_json::Value = serde_json::from_str(&write_json(&graph).expect("json")).expect("parse");
        assert_eq!(json["nodes"][0]["kind"], "content_statement");
        assert_eq!(json["nodes"][0]["label"]["language"], "sk");
        assert_eq!(json["edges"][0]["relation"], "in_scheme");
        assert_eq!(json["edges"][0]["target"], "http://minedu.sk/def/s");
    }
}
