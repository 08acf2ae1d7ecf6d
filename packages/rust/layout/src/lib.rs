//! Column-aware line reconstruction.
//!
//! Rebuilds visual lines from positioned word tokens and splits each line
//! into a left/right column pair at a configured horizontal coordinate.
//! Also hosts the [`NoiseClassifier`] for repeated page furniture.

mod noise;

use tracing::{debug, instrument, trace};

use curriculum_shared::{LayoutConfig, LinePair, Page, PositionedToken, TokenDocument};

pub use noise::NoiseClassifier;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Reconstructed lines of one page.
#[derive(Debug, Clone)]
pub struct PageLines {
    /// Page number from the token document.
    pub number: usize,
    /// Line pairs, top to bottom.
    pub lines: Vec<LinePair>,
}

/// Tokens sharing a visual line, keyed by the first token's vertical position.
#[derive(Debug)]
struct LineCluster<'a> {
    anchor: f64,
    tokens: Vec<&'a PositionedToken>,
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

/// Reconstruct every page of a document, preserving page order.
///
/// `on_page` is called after each page with its lines and 1-based position.
pub fn reconstruct_document(
    doc: &TokenDocument,
    config: &LayoutConfig,
    mut on_page: impl FnMut(&PageLines, usize),
) -> Vec<PageLines> {
    doc.pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let lines = PageLines {
                number: page.number,
                lines: reconstruct_page(page, config),
            };
            on_page(&lines, i + 1);
            lines
        })
        .collect()
}

/// Reconstruct the (left, right) line pairs of a single page.
///
/// Tokens are scanned top to bottom; each joins the first existing line whose
/// anchor is within `line_tolerance`, otherwise it starts a new line. Lines
/// are never re-balanced once formed. Tokens left of `column_split` form the
/// left column, the rest the right column.
#[instrument(skip_all, fields(page = page.number, tokens = page.tokens.len()))]
pub fn reconstruct_page(page: &Page, config: &LayoutConfig) -> Vec<LinePair> {
    let clusters = cluster_lines(&page.tokens, config.line_tolerance);
    let split = config.column_split as f64;

    let lines: Vec<LinePair> = clusters
        .into_iter()
        .filter_map(|cluster| {
            let (left, right): (Vec<_>, Vec<_>) =
                cluster.tokens.into_iter().partition(|t| t.x0 < split);
            let pair = LinePair::new(join_tokens(left), join_tokens(right));
            trace!(anchor = cluster.anchor, left = %pair.left, right = %pair.right, "line");
            (!pair.is_blank()).then_some(pair)
        })
        .collect();

    debug!(lines = lines.len(), "page reconstructed");
    lines
}

/// Group tokens into lines by vertical proximity (first fit, scan order).
fn cluster_lines(tokens: &[PositionedToken], tolerance: f64) -> Vec<LineCluster<'_>> {
    let mut ordered: Vec<&PositionedToken> = tokens
        .iter()
        .filter(|t| !t.text.trim().is_empty())
        .collect();
    ordered.sort_by(|a, b| a.top.total_cmp(&b.top));

    let mut clusters: Vec<LineCluster<'_>> = Vec::new();
    for token in ordered {
        match clusters
            .iter_mut()
            .find(|c| (c.anchor - token.top).abs() <= tolerance)
        {
            Some(cluster) => cluster.tokens.push(token),
            None => clusters.push(LineCluster {
                anchor: token.top,
                tokens: vec![token],
            }),
        }
    }

    clusters.sort_by(|a, b| a.anchor.total_cmp(&b.anchor));
    clusters
}

/// Join one column's tokens left to right with single spaces.
fn join_tokens(mut tokens: Vec<&PositionedToken>) -> String {
    tokens.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    tokens
        .iter()
        .map(|t| t.text.trim())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, x0: f64, top: f64) -> PositionedToken {
        PositionedToken::new(text, x0, top)
    }

    fn page(tokens: Vec<PositionedToken>) -> Page {
        Page { number: 1, tokens }
    }

    #[test]
    fn empty_page_yields_no_lines() {
        let lines = reconstruct_page(&page(vec![]), &LayoutConfig::default());
        assert!(lines.is_empty());
    }

    #[test]
    fn splits_columns_at_threshold() {
        let tokens = vec![
            tok("štvorca", 160.0, 100.0),
            tok("Vypočíta", 60.0, 100.4),
            tok("obsah", 120.0, 99.8),
            tok("Štvorec", 420.0, 100.2),
        ];
        let lines = reconstruct_page(&page(tokens), &LayoutConfig::default());
        assert_eq!(lines, vec![LinePair::new("Vypočíta obsah štvorca", "Štvorec")]);
    }

    #[test]
    fn token_exactly_at_split_goes_right() {
        let tokens = vec![tok("left", 10.0, 50.0), tok("right", 400.0, 50.0)];
        let lines = reconstruct_page(&page(tokens), &LayoutConfig::default());
        assert_eq!(lines[0].left, "left");
        assert_eq!(lines[0].right, "right");
    }

    #[test]
    fn lines_are_ordered_top_to_bottom() {
        let tokens = vec![
            tok("third", 50.0, 300.0),
            tok("first", 50.0, 100.0),
            tok("second", 50.0, 200.0),
        ];
        let lines = reconstruct_page(&page(tokens), &LayoutConfig::default());
        let left: Vec<_> = lines.iter().map(|l| l.left.as_str()).collect();
        assert_eq!(left, vec!["first", "second", "third"]);
    }

    #[test]
    fn clustering_is_anchored_not_chained() {
        // 101.5 joins the 100.0 line; 103.0 is within tolerance of 101.5 but
        // not of the anchor, so it starts its own line.
        let tokens = vec![
            tok("a", 50.0, 100.0),
            tok("b", 80.0, 101.5),
            tok("c", 50.0, 103.0),
        ];
        let lines = reconstruct_page(&page(tokens), &LayoutConfig::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].left, "a b");
        assert_eq!(lines[1].left, "c");
    }

    #[test]
    fn whitespace_only_tokens_are_skipped() {
        let tokens = vec![tok("  ", 50.0, 10.0), tok("", 450.0, 10.0), tok("x", 50.0, 40.0)];
        let lines = reconstruct_page(&page(tokens), &LayoutConfig::default());
        assert_eq!(lines, vec![LinePair::new("x", "")]);
    }

    #[test]
    fn custom_split_and_tolerance_are_honoured() {
        let config = LayoutConfig {
            column_split: 200,
            line_tolerance: 5.0,
        };
        let tokens = vec![tok("a", 150.0, 10.0), tok("b", 250.0, 14.0)];
        let lines = reconstruct_page(&page(tokens), &config);
        assert_eq!(lines, vec![LinePair::new("a", "b")]);
    }

    #[test]
    fn document_keeps_page_order() {
        let doc: TokenDocument = serde_json::from_value(serde_json::json!({
            "pages": [
                { "number": 1, "tokens": [ { "text": "one", "x0": 10.0, "top": 10.0 } ] },
                { "number": 2, "tokens": [] },
                { "number": 3, "tokens": [ { "text": "three", "x0": 10.0, "top": 10.0 } ] }
            ]
        }))
        .expect("fixture");
        let mut seen = Vec::new();
        let pages = reconstruct_document(&doc, &LayoutConfig::default(), |page, position| {
            seen.push((page.number, position));
        });
        assert_eq!(seen, vec![(1, 1), (2, 2), (3, 3)]);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].lines[0].left, "one");
        assert!(pages[1].lines.is_empty());
        assert_eq!(pages[2].number, 3);
    }
}
