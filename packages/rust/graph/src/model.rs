//! In-memory taxonomy graph: typed nodes keyed by IRI and a set of
//! (source, relation, target) edges.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Absolute identifier of a node or external resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Iri(String);

impl Iri {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// What a node represents in the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    ConceptScheme,
    Grade,
    Theme,
    PerformanceStatement,
    ContentStatement,
    LearningOpportunity,
    LearningAchievementSpecification,
}

impl NodeKind {
    /// RDF class IRI of nodes of this kind.
    pub fn rdf_type(self) -> &'static str {
        match self {
            Self::ConceptScheme => vocab::SKOS_CONCEPT_SCHEME,
            Self::Grade | Self::Theme | Self::PerformanceStatement | Self::ContentStatement => {
                vocab::SKOS_CONCEPT
            }
            Self::LearningOpportunity => vocab::ELM_LEARNING_OPPORTUNITY,
            Self::LearningAchievementSpecification => vocab::ELM_LEARNING_ACHIEVEMENT_SPEC,
        }
    }

    /// True for the statement kinds subject to noise pruning.
    pub fn is_statement(self) -> bool {
        matches!(self, Self::PerformanceStatement | Self::ContentStatement)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConceptScheme => "concept scheme",
            Self::Grade => "grade",
            Self::Theme => "theme",
            Self::PerformanceStatement => "performance statement",
            Self::ContentStatement => "content statement",
            Self::LearningOpportunity => "learning opportunity",
            Self::LearningAchievementSpecification => "achievement specification",
        };
        f.write_str(name)
    }
}

/// A language-tagged display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Label {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: Some(language.into()),
        }
    }
}

/// A typed graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: Iri,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    /// Bibliographic source citation (schemes only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Node {
    pub fn new(id: Iri, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            label: None,
            source: None,
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Predicates used between nodes and external resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    InScheme,
    TopConceptOf,
    HasTopConcept,
    Broader,
    Narrower,
    Related,
    RelatedMatch,
    ExactMatch,
    Subject,
    EducationLevel,
    StudyGrade,
    IscedfCode,
    LearningActivitySpecification,
}

impl Relation {
    /// Predicate IRI.
    pub fn iri(self) -> &'static str {
        match self {
            Self::InScheme => "http://www.w3.org/2004/02/skos/core#inScheme",
            Self::TopConceptOf => "http://www.w3.org/2004/02/skos/core#topConceptOf",
            Self::HasTopConcept => "http://www.w3.org/2004/02/skos/core#hasTopConcept",
            Self::Broader => "http://www.w3.org/2004/02/skos/core#broader",
            Self::Narrower => "http://www.w3.org/2004/02/skos/core#narrower",
            Self::Related => "http://www.w3.org/2004/02/skos/core#related",
            Self::RelatedMatch => "http://www.w3.org/2004/02/skos/core#relatedMatch",
            Self::ExactMatch => "http://www.w3.org/2004/02/skos/core#exactMatch",
            Self::Subject => "http://purl.org/dc/terms/subject",
            Self::EducationLevel => "http://data.europa.eu/snb/model/ontology/educationLevel",
            Self::StudyGrade => "https://data.gov.sk/def/ontology/education/studyGrade",
            Self::IscedfCode => "http://data.europa.eu/snb/model/ontology/ISCEDFCode",
            Self::LearningActivitySpecification => {
                "http://data.europa.eu/snb/model/ontology/learningActivitySpecification"
            }
        }
    }

    /// Relations between two labelled nodes that must not dangle.
    pub fn is_cross_reference(self) -> bool {
        matches!(self, Self::Related | Self::RelatedMatch)
    }
}

/// A directed edge. Ordering is (source, relation, target).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Edge {
    pub source: Iri,
    pub relation: Relation,
    pub target: Iri,
}

/// Well-known vocabulary IRIs.
pub mod vocab {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
    pub const DCT: &str = "http://purl.org/dc/terms/";
    pub const ELM: &str = "http://data.europa.eu/snb/model/ontology/";
    pub const EDU: &str = "https://data.gov.sk/def/ontology/education/";

    pub const SKOS_CONCEPT: &str = "http://www.w3.org/2004/02/skos/core#Concept";
    pub const SKOS_CONCEPT_SCHEME: &str = "http://www.w3.org/2004/02/skos/core#ConceptScheme";
    pub const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
    pub const DCT_SOURCE: &str = "http://purl.org/dc/terms/source";
    pub const ELM_LEARNING_OPPORTUNITY: &str =
        "http://data.europa.eu/snb/model/ontology/LearningOpportunity";
    pub const ELM_LEARNING_ACHIEVEMENT_SPEC: &str =
        "http://data.europa.eu/snb/model/ontology/LearningAchievementSpecification";
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Nodes keyed by IRI and a deduplicated, ordered edge set.
///
/// Nodes are inserted once (the first insertion wins) and only removed by
/// [`TaxonomyGraph::remove_node`], which cascades to every incident edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyGraph {
    nodes: BTreeMap<Iri, Node>,
    edges: BTreeSet<Edge>,
}

impl TaxonomyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless one with the same IRI exists. Returns whether it
    /// was inserted.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Insert an edge. Returns whether it was new.
    pub fn add_edge(&mut self, source: &Iri, relation: Relation, target: &Iri) -> bool {
        self.edges.insert(Edge {
            source: source.clone(),
            relation,
            target: target.clone(),
        })
    }

    /// Remove a node and every edge touching it. Returns the number of edges
    /// removed, or `None` if the node did not exist.
    pub fn remove_node(&mut self, id: &Iri) -> Option<usize> {
        self.nodes.remove(id)?;
        let before = self.edges.len();
        self.edges.retain(|e| &e.source != id && &e.target != id);
        Some(before - self.edges.len())
    }

    /// Remove every edge matching the predicate. Returns how many were removed.
    pub fn remove_edges_where(&mut self, mut pred: impl FnMut(&Edge) -> bool) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| !pred(e));
        before - self.edges.len()
    }

    pub fn node(&self, id: &Iri) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Label of a node, if the node exists and carries one.
    pub fn label_of(&self, id: &Iri) -> Option<&Label> {
        self.nodes.get(id).and_then(|n| n.label.as_ref())
    }

    pub fn has_edge(&self, source: &Iri, relation: Relation, target: &Iri) -> bool {
        self.edges.contains(&Edge {
            source: source.clone(),
            relation,
            target: target.clone(),
        })
    }

    /// Nodes in IRI order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in (source, relation, target) order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    pub fn edges_of(&self, relation: Relation) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.relation == relation)
    }

    /// Outgoing edges of `source` in (relation, target) order.
    pub fn edges_from<'a>(&'a self, source: &'a Iri) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.source == source)
    }

    /// Targets of `source` along `relation`, in IRI order.
    pub fn targets<'a>(
        &'a self,
        source: &'a Iri,
        relation: Relation,
    ) -> impl Iterator<Item = &'a Iri> + 'a {
        self.edges_from(source)
            .filter(move |e| e.relation == relation)
            .map(|e| &e.target)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn kind_counts(&self) -> BTreeMap<NodeKind, usize> {
        let mut counts = BTreeMap::new();
        for node in self.nodes.values() {
            *counts.entry(node.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Every IRI that is a node or an edge source, in order.
    pub(crate) fn subjects(&self) -> BTreeSet<&Iri> {
        self.nodes
            .keys()
            .chain(self.edges.iter().map(|e| &e.source))
            .collect()
    }
}
