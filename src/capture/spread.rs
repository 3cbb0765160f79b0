//! Spread ranking
//!
//! The viewer renders the visible spread as canvas elements positioned by
//! CSS transforms. A canvas mid-transition has opacity below 1 and must
//! not be captured; settled canvases are read right-to-left, which is
//! descending horizontal offset. The ranking is a pure function over
//! per-canvas snapshots so it can be tested without a browser.

use serde::Deserialize;
use std::cmp::Ordering;

/// JS expression snapshotting every page canvas in the viewer:
/// computed opacity, horizontal transform offset, and the rendered
/// bitmap as a data URL (null when the canvas is absent/unrenderable).
pub const SNAPSHOT_JS: &str = r#"
    (() => {
        return Array.from(document.querySelectorAll('.nv-pvImageCanvas')).map((div) => {
            const style = getComputedStyle(div);
            const matrix = new WebKitCSSMatrix(style.transform);
            const canvas = div.querySelector('canvas');
            return {
                opacity: Number(style.opacity),
                offset: matrix.m41,
                dataUrl: canvas ? canvas.toDataURL() : null,
            };
        });
    })()
"#;

/// One page canvas as observed during a polling iteration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSnapshot {
    /// Computed opacity; 1 means settled, anything else is transitional
    pub opacity: f64,
    /// Horizontal transform offset (position in the reading strip)
    pub offset: f64,
    /// Rendered bitmap, if the canvas could be read
    pub data_url: Option<String>,
}

/// Reduce a spread snapshot to the data URLs worth saving, in reading
/// order: settled canvases only, rightmost first (right-to-left layout),
/// unrenderable canvases skipped silently.
pub fn reading_order(mut snapshots: Vec<CanvasSnapshot>) -> Vec<String> {
    snapshots.retain(|canvas| canvas.opacity == 1.0);
    snapshots.sort_by(|a, b| b.offset.partial_cmp(&a.offset).unwrap_or(Ordering::Equal));
    snapshots
        .into_iter()
        .filter_map(|canvas| canvas.data_url)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snap(opacity: f64, offset: f64, data_url: Option<&str>) -> CanvasSnapshot {
        CanvasSnapshot {
            opacity,
            offset,
            data_url: data_url.map(str::to_string),
        }
    }

    #[test]
    fn test_descending_offset_order() {
        let spread = vec![
            snap(1.0, 50.0, Some("mid")),
            snap(1.0, 150.0, Some("right")),
            snap(1.0, 0.0, Some("left")),
        ];
        assert_eq!(reading_order(spread), vec!["right", "mid", "left"]);
    }

    #[test]
    fn test_transitioning_canvases_excluded() {
        let spread = vec![
            snap(1.0, 0.0, Some("settled")),
            snap(0.4, 100.0, Some("fading")),
            snap(0.0, 200.0, Some("gone")),
        ];
        assert_eq!(reading_order(spread), vec!["settled"]);
    }

    #[test]
    fn test_unrenderable_canvases_skipped() {
        let spread = vec![
            snap(1.0, 100.0, None),
            snap(1.0, 0.0, Some("only")),
        ];
        assert_eq!(reading_order(spread), vec!["only"]);
    }

    #[test]
    fn test_empty_spread() {
        assert_eq!(reading_order(Vec::new()), Vec::<String>::new());
    }

    #[test]
    fn test_snapshot_deserializes_from_page_shape() {
        let raw = r#"[{"opacity": 1, "offset": 720.5, "dataUrl": "data:image/png;base64,AA=="},
                      {"opacity": 0.5, "offset": 0, "dataUrl": null}]"#;
        let spread: Vec<CanvasSnapshot> = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(spread.len(), 2);
        assert_eq!(spread[0].offset, 720.5);
        assert!(spread[1].data_url.is_none());
    }
}
