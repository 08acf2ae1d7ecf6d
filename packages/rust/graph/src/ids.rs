//! Identifier templates. Every IRI is a pure function of label text (and,
//! for opportunities and specifications, of the grade); each node kind has
//! its own template so equal slugs never collide across kinds.

use curriculum_shared::text::{slugify, statement_slug};
use curriculum_shared::{NamespaceConfig, TaxonomyConfig};

use crate::model::Iri;

/// IRI builder for one taxonomy configuration.
#[derive(Debug, Clone)]
pub struct IdentifierScheme {
    ns: NamespaceConfig,
    subject_slug: String,
    grade_slug: String,
}

impl IdentifierScheme {
    pub fn new(taxonomy: &TaxonomyConfig) -> Self {
        Self {
            ns: taxonomy.namespaces.clone(),
            subject_slug: slugify(&taxonomy.subject_slug),
            grade_slug: slugify(&taxonomy.grade_label_suffix),
        }
    }

    pub fn main_scheme(&self) -> Iri {
        Iri::new(format!("{}{}", self.ns.concept_base, self.ns.main_scheme))
    }

    pub fn performance_scheme(&self) -> Iri {
        Iri::new(format!("{}{}", self.ns.concept_base, self.ns.performance_scheme))
    }

    pub fn content_scheme(&self) -> Iri {
        Iri::new(format!("{}{}", self.ns.concept_base, self.ns.content_scheme))
    }

    /// `{concept_base}{grade-suffix}-{grade}`, e.g. `rocnik-7`.
    pub fn grade(&self, grade: u32) -> Iri {
        Iri::new(format!("{}{}-{grade}", self.ns.concept_base, self.grade_slug))
    }

    /// `{concept_base}theme-{slug}`. `None` when the label has no slug.
    pub fn theme(&self, label: &str) -> Option<Iri> {
        let slug = slugify(label);
        (!slug.is_empty()).then(|| Iri::new(format!("{}theme-{slug}", self.ns.concept_base)))
    }

    pub fn performance(&self, label: &str) -> Option<Iri> {
        let slug = statement_slug(label);
        (!slug.is_empty()).then(|| Iri::new(format!("{}{slug}", self.ns.performance_base)))
    }

    pub fn content(&self, label: &str) -> Option<Iri> {
        let slug = statement_slug(label);
        (!slug.is_empty()).then(|| Iri::new(format!("{}{slug}", self.ns.content_base)))
    }

    /// `{opportunity_base}{subject}-{grade}-{grade-suffix}-{theme}`.
    pub fn opportunity(&self, theme: &str, grade: u32) -> Option<Iri> {
        let theme = slugify(theme);
        (!theme.is_empty()).then(|| {
            Iri::new(format!(
                "{}{}-{grade}-{}-{theme}",
                self.ns.opportunity_base, self.subject_slug, self.grade_slug
            ))
        })
    }

    /// `{specification_base}{theme}-las-{grade}`.
    pub fn specification(&self, theme: &str, grade: u32) -> Option<Iri> {
        let theme = slugify(theme);
        (!theme.is_empty())
            .then(|| Iri::new(format!("{}{theme}-las-{grade}", self.ns.specification_base)))
    }

    /// External study-grade resource.
    pub fn study_grade(&self, grade: u32) -> Iri {
        Iri::new(format!("{}{grade}", self.ns.study_grade_base))
    }

    /// External subject classification.
    pub fn subject(&self) -> Iri {
        Iri::new(self.ns.subject.clone())
    }

    /// External education level.
    pub fn education_level(&self) -> Iri {
        Iri::new(self.ns.education_level.clone())
    }
}
