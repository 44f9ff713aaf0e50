//! Projection of a grouped series onto a Plotly figure description.
//!
//! The dashboard page hands the returned JSON straight to `Plotly.react`;
//! labels go on the x axis and values on the y axis for every chart kind.

use serde::Serialize;
use serde_json::{Value, json};

use crate::analyzers::types::{ChartKind, GroupedSeries};

/// Bin count along the label axis of heatmaps.
pub const HEATMAP_BINS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub data: Vec<Value>,
    pub layout: Value,
}

pub fn project(series: &GroupedSeries, kind: ChartKind) -> ChartSpec {
    let x = series.labels();
    let y = series.values();

    let trace = match kind {
        ChartKind::Line => json!({"type": "scatter", "mode": "lines", "x": x, "y": y}),
        ChartKind::Scatter => json!({"type": "scatter", "mode": "markers", "x": x, "y": y}),
        ChartKind::Bar => json!({"type": "bar", "x": x, "y": y}),
        ChartKind::Box => json!({"type": "box", "x": x, "y": y}),
        ChartKind::Heatmap => json!({
            "type": "histogram2d",
            "x": x,
            "y": y,
            "nbinsx": HEATMAP_BINS,
        }),
    };

    ChartSpec {
        data: vec![trace],
        layout: json!({
            "xaxis": {"title": {"text": "label"}},
            "yaxis": {"title": {"text": "value"}},
        }),
    }
}
