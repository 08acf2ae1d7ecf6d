//! Graph assembler.
//!
//! Folds the extracted records into content-addressed indices (identifier →
//! first-seen label, grade → themes, theme → performance statements,
//! specification → statements, performance statement → co-occurring content
//! statements), then emits the SKOS/ELM graph from those indices. All
//! indices are ordered maps, so emission order is a function of identifiers
//! alone and assembling the same records twice yields the same graph.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use curriculum_shared::text::clean_statement;
use curriculum_shared::{Record, TaxonomyConfig};

use crate::ids::IdentifierScheme;
use crate::model::{Iri, Label, Node, NodeKind, Relation, TaxonomyGraph};

/// Counters describing one assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    /// Records folded into the graph.
    pub records: usize,
    /// Records skipped because the theme label yields no identifier.
    pub skipped_records: usize,
    /// Records kept without a grade link because their grade lies outside
    /// the configured range.
    pub out_of_range_grades: usize,
    pub themes: usize,
    pub performance_statements: usize,
    pub content_statements: usize,
    /// (theme, grade) segments, i.e. opportunity/specification pairs.
    pub segments: usize,
    pub match_edges: usize,
}

/// Assembled graph plus statistics.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub graph: TaxonomyGraph,
    pub stats: AssemblyStats,
}

// ---------------------------------------------------------------------------
// Indices
// ---------------------------------------------------------------------------

/// Accumulated state of one (theme, grade) segment.
#[derive(Debug)]
struct Segment {
    theme: Iri,
    grade: u32,
    opportunity: Iri,
    performance: BTreeSet<Iri>,
    content: BTreeSet<Iri>,
}

#[derive(Debug, Default)]
struct Indices {
    theme_labels: BTreeMap<Iri, String>,
    performance_labels: BTreeMap<Iri, String>,
    content_labels: BTreeMap<Iri, String>,
    grade_themes: BTreeMap<u32, BTreeSet<Iri>>,
    theme_performance: BTreeMap<Iri, BTreeSet<Iri>>,
    segments: BTreeMap<Iri, Segment>,
    cooccurrence: BTreeMap<Iri, BTreeSet<Iri>>,
}

/// Record `label` for `id` unless a label was already seen.
fn first_label(labels: &mut BTreeMap<Iri, String>, id: &Iri, label: &str) {
    labels.entry(id.clone()).or_insert_with(|| label.to_string());
}

impl Indices {
    /// Fold one record. Returns `false` when the record was skipped.
    /// `grade_in_range` gates only the grade → theme entry, so a grade
    /// outside the configured range never gains a concept or hierarchy edge.
    fn add_record(
        &mut self,
        record: &Record,
        ids: &IdentifierScheme,
        grade_in_range: bool,
    ) -> bool {
        let theme_label = record.theme.trim();
        let (Some(theme), Some(opportunity), Some(specification)) = (
            ids.theme(theme_label),
            ids.opportunity(theme_label, record.grade),
            ids.specification(theme_label, record.grade),
        ) else {
            warn!(theme = %record.theme, "theme label yields no identifier, record skipped");
            return false;
        };

        first_label(&mut self.theme_labels, &theme, theme_label);
        if grade_in_range {
            self.grade_themes
                .entry(record.grade)
                .or_default()
                .insert(theme.clone());
        }

        let performance = statement_ids(&record.performance, |s| ids.performance(s));
        let content = statement_ids(&record.content, |s| ids.content(s));

        for (id, label) in &performance {
            first_label(&mut self.performance_labels, id, label);
        }
        for (id, label) in &content {
            first_label(&mut self.content_labels, id, label);
        }

        self.theme_performance
            .entry(theme.clone())
            .or_default()
            .extend(performance.iter().map(|(id, _)| id.clone()));

        for (perf, _) in &performance {
            self.cooccurrence
                .entry(perf.clone())
                .or_default()
                .extend(content.iter().map(|(id, _)| id.clone()));
        }

        let segment = self.segments.entry(specification).or_insert_with(|| Segment {
            theme,
            grade: record.grade,
            opportunity,
            performance: BTreeSet::new(),
            content: BTreeSet::new(),
        });
        segment
            .performance
            .extend(performance.into_iter().map(|(id, _)| id));
        segment.content.extend(content.into_iter().map(|(id, _)| id));

        true
    }
}

/// Cleaned, identified statements of one record, duplicates removed (first
/// occurrence kept).
fn statement_ids(
    statements: &[String],
    identify: impl Fn(&str) -> Option<Iri>,
) -> Vec<(Iri, String)> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for raw in statements {
        let label = clean_statement(raw);
        let Some(id) = identify(&label) else {
            debug!(statement = %raw, "statement yields no identifier, skipped");
            continue;
        };
        if seen.insert(id.clone()) {
            out.push((id, label));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Assemble the taxonomy graph from all extracted records.
#[instrument(skip_all, fields(records = records.len()))]
pub fn assemble(records: &[Record], taxonomy: &TaxonomyConfig) -> Assembly {
    let ids = IdentifierScheme::new(taxonomy);
    let grades = taxonomy.grades();

    let mut indices = Indices::default();
    let mut stats = AssemblyStats::default();

    for record in records {
        let grade_in_range = grades.contains(&record.grade);
        if !indices.add_record(record, &ids, grade_in_range) {
            stats.skipped_records += 1;
            continue;
        }
        stats.records += 1;
        if !grade_in_range {
            warn!(
                theme = %record.theme,
                grade = record.grade,
                "grade outside configured range, no grade link emitted"
            );
            stats.out_of_range_grades += 1;
        }
    }

    let mut emitter = Emitter {
        graph: TaxonomyGraph::new(),
        ids: &ids,
        taxonomy,
    };
    emitter.schemes();
    emitter.grades();
    emitter.themes(&indices);
    emitter.statements(&indices);
    emitter.segments(&indices);
    stats.match_edges = emitter.matches(&indices);

    stats.themes = indices.theme_labels.len();
    stats.performance_statements = indices.performance_labels.len();
    stats.content_statements = indices.content_labels.len();
    stats.segments = indices.segments.len();

    let graph = emitter.graph;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        themes = stats.themes,
        segments = stats.segments,
        skipped = stats.skipped_records,
        out_of_range = stats.out_of_range_grades,
        "graph assembled"
    );

    Assembly { graph, stats }
}

/// Emits nodes and edges from finished indices.
struct Emitter<'a> {
    graph: TaxonomyGraph,
    ids: &'a IdentifierScheme,
    taxonomy: &'a TaxonomyConfig,
}

impl Emitter<'_> {
    fn label(&self, text: impl Into<String>) -> Label {
        Label::new(text, self.taxonomy.language.clone())
    }

    fn grade_label(&self, grade: u32) -> String {
        format!("{grade}. {}", self.taxonomy.grade_label_suffix)
    }

    fn schemes(&mut self) {
        let subject = self.ids.subject();
        for (id, label) in [
            (self.ids.main_scheme(), &self.taxonomy.main_scheme_label),
            (self.ids.performance_scheme(), &self.taxonomy.performance_scheme_label),
            (self.ids.content_scheme(), &self.taxonomy.content_scheme_label),
        ] {
            let node = Node::new(id.clone(), NodeKind::ConceptScheme)
                .with_label(self.label(label.as_str()))
                .with_source(self.taxonomy.source_citation.as_str());
            self.graph.add_node(node);
            self.graph.add_edge(&id, Relation::Subject, &subject);
        }
    }

    /// Every grade of the configured range, referenced or not.
    fn grades(&mut self) {
        let scheme = self.ids.main_scheme();
        for grade in self.taxonomy.grades() {
            let id = self.ids.grade(grade);
            let node = Node::new(id.clone(), NodeKind::Grade)
                .with_label(self.label(self.grade_label(grade)));
            self.graph.add_node(node);
            self.graph.add_edge(&id, Relation::InScheme, &scheme);
            self.graph.add_edge(&id, Relation::TopConceptOf, &scheme);
            self.graph.add_edge(&scheme, Relation::HasTopConcept, &id);
            self.graph
                .add_edge(&id, Relation::ExactMatch, &self.ids.study_grade(grade));
        }
    }

    fn themes(&mut self, indices: &Indices) {
        let scheme = self.ids.main_scheme();
        for (id, label) in &indices.theme_labels {
            let node = Node::new(id.clone(), NodeKind::Theme).with_label(self.label(label.as_str()));
            self.graph.add_node(node);
            self.graph.add_edge(id, Relation::InScheme, &scheme);
        }
        for (grade, themes) in &indices.grade_themes {
            let grade_id = self.ids.grade(*grade);
            for theme in themes {
                self.graph.add_edge(&grade_id, Relation::Narrower, theme);
                self.graph.add_edge(theme, Relation::Broader, &grade_id);
            }
        }
    }

    fn statements(&mut self, indices: &Indices) {
        let performance_scheme = self.ids.performance_scheme();
        for (id, label) in &indices.performance_labels {
            let node = Node::new(id.clone(), NodeKind::PerformanceStatement)
                .with_label(self.label(label.as_str()));
            self.graph.add_node(node);
            self.graph.add_edge(id, Relation::InScheme, &performance_scheme);
        }
        for (theme, statements) in &indices.theme_performance {
            for statement in statements {
                self.graph.add_edge(theme, Relation::Narrower, statement);
                self.graph.add_edge(statement, Relation::Broader, theme);
            }
        }

        let content_scheme = self.ids.content_scheme();
        for (id, label) in &indices.content_labels {
            let node = Node::new(id.clone(), NodeKind::ContentStatement)
                .with_label(self.label(label.as_str()));
            self.graph.add_node(node);
            self.graph.add_edge(id, Relation::InScheme, &content_scheme);
        }
    }

    /// Opportunity/specification pairs and their links.
    fn segments(&mut self, indices: &Indices) {
        let subject = self.ids.subject();
        let level = self.ids.education_level();

        for (spec, segment) in &indices.segments {
            let theme_label = indices
                .theme_labels
                .get(&segment.theme)
                .map(String::as_str)
                .unwrap_or_default();
            let grade_label = self.grade_label(segment.grade);
            let study_grade = self.ids.study_grade(segment.grade);
            let lo = &segment.opportunity;

            let opportunity = Node::new(lo.clone(), NodeKind::LearningOpportunity).with_label(
                self.label(format!(
                    "{} – {grade_label} – {theme_label}",
                    self.taxonomy.subject_name
                )),
            );
            self.graph.add_node(opportunity);
            self.graph
                .add_edge(lo, Relation::LearningActivitySpecification, spec);
            self.graph.add_edge(lo, Relation::Related, &segment.theme);
            self.graph.add_edge(lo, Relation::EducationLevel, &level);
            self.graph.add_edge(lo, Relation::StudyGrade, &study_grade);
            self.graph.add_edge(lo, Relation::Subject, &subject);

            let specification = Node::new(spec.clone(), NodeKind::LearningAchievementSpecification)
                .with_label(self.label(format!("{theme_label} – {grade_label} (LAS)")));
            self.graph.add_node(specification);
            self.graph.add_edge(spec, Relation::Related, lo);
            self.graph.add_edge(spec, Relation::Related, &segment.theme);
            self.graph.add_edge(spec, Relation::IscedfCode, &subject);
            self.graph.add_edge(spec, Relation::StudyGrade, &study_grade);

            for statement in segment.performance.iter().chain(&segment.content) {
                self.graph.add_edge(spec, Relation::Related, statement);
            }

            debug!(
                specification = %spec,
                performance = segment.performance.len(),
                content = segment.content.len(),
                "segment emitted"
            );
        }
    }

    /// Performance → content match edges from record co-occurrence.
    fn matches(&mut self, indices: &Indices) -> usize {
        let mut count = 0;
        for (performance, contents) in &indices.cooccurrence {
            for content in contents {
                if self.graph.add_edge(performance, Relation::RelatedMatch, content) {
                    count += 1;
                }
            }
        }
        count
    }
}
