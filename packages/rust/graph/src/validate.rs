//! Post-assembly validation: prune statement concepts whose label is page
//! furniture, then drop cross-references left without a labelled endpoint.

use serde::Serialize;
use tracing::{debug, info, instrument};

use curriculum_layout::NoiseClassifier;

use crate::model::{Iri, TaxonomyGraph};

/// What the validator removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Statement concepts removed because their label is noise.
    pub removed_nodes: usize,
    /// Edges removed together with those nodes.
    pub cascaded_edges: usize,
    /// `related`/`relatedMatch` edges removed for lacking a labelled endpoint.
    pub dangling_edges: usize,
}

/// Remove noise-labelled statement concepts (with every incident edge) and
/// any cross-reference edge whose source or target carries no label.
#[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn prune_noise(graph: &mut TaxonomyGraph, noise: &NoiseClassifier) -> ValidationReport {
    let mut report = ValidationReport::default();

    let noisy: Vec<Iri> = graph
        .nodes()
        .filter(|n| n.kind.is_statement())
        .filter(|n| n.label.as_ref().is_some_and(|l| noise.is_noise(&l.text)))
        .map(|n| n.id.clone())
        .collect();

    for id in &noisy {
        if let Some(edges) = graph.remove_node(id) {
            debug!(node = %id, edges, "noise concept removed");
            report.removed_nodes += 1;
            report.cascaded_edges += edges;
        }
    }

    let unlabelled = |graph: &TaxonomyGraph, id: &Iri| graph.label_of(id).is_none();
    let dangling: Vec<_> = graph
        .edges()
        .filter(|e| e.relation.is_cross_reference())
        .filter(|e| unlabelled(graph, &e.source) || unlabelled(graph, &e.target))
        .cloned()
        .collect();
    report.dangling_edges = graph.remove_edges_where(|e| dangling.contains(e));

    info!(
        removed_nodes = report.removed_nodes,
        cascaded_edges = report.cascaded_edges,
        dangling_edges = report.dangling_edges,
        "graph validated"
    );
    report
}
