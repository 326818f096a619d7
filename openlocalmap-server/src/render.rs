//! The map surface routes are drawn on.
//!
//! The surface owns map layers and the status line of the routes panel.
//! Everything the route session shows goes through [`RenderSurface`], so a
//! browser bridge, a test recorder or anything else can sit behind it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{LatLon, Polyline, Route, Stop};
use crate::overpass::OverpassError;

/// Identifies one layer on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerHandle(u64);

/// How a route's polylines are stroked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolylineStyle {
    pub colour: String,
    pub weight: u32,
    pub opacity: f32,
}

impl PolylineStyle {
    /// Route colour at the usual stroke.
    pub fn for_route(route: &Route) -> Self {
        Self {
            colour: route.colour().to_string(),
            weight: 5,
            opacity: 0.8,
        }
    }
}

/// Icon family for markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// A stop with a known position along its route.
    OrderedStop,
    /// A stop found by area scan, order unknown.
    LooseStop,
}

/// A point marker with a popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLon,
    pub label: String,
    pub popup: String,
}

impl Marker {
    pub fn for_stop(stop: &Stop, route: &Route) -> Self {
        let label = match stop.order {
            Some(order) => format!("{order}. {}", stop.name),
            None => stop.name.clone(),
        };
        Self {
            position: stop.position,
            label,
            popup: format!("{}\nParada de {}", stop.name, route.name),
        }
    }
}

/// What the user should try after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureHint {
    /// The query was too heavy: timeout or Overpass 504.
    SmallerArea,
    /// Overpass is rate limiting (429).
    WaitAndRetry,
    /// Anything else.
    Retry,
}

impl FailureHint {
    pub fn from_error(error: &OverpassError) -> Self {
        if error.suggests_smaller_area() {
            FailureHint::SmallerArea
        } else if error.is_rate_limited() {
            FailureHint::WaitAndRetry
        } else {
            FailureHint::Retry
        }
    }

    /// Advice shown in the panel.
    pub fn message(&self) -> &'static str {
        match self {
            FailureHint::SmallerArea => {
                "El servidor d'OpenStreetMap està sobrecarregat. Proveu-ho més tard o amb una zona més petita."
            }
            FailureHint::WaitAndRetry => {
                "Massa consultes. Espereu uns minuts abans de tornar-ho a intentar."
            }
            FailureHint::Retry => "Torneu-ho a intentar.",
        }
    }
}

/// State of the routes panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelStatus {
    Idle,
    Loading { message: String },
    Ready { message: String },
    /// Finished with nothing to show. Not a failure.
    Empty { message: String },
    Failed { message: String, hint: FailureHint },
}

impl PanelStatus {
    pub fn loading(message: impl Into<String>) -> Self {
        PanelStatus::Loading {
            message: message.into(),
        }
    }

    pub fn ready(message: impl Into<String>) -> Self {
        PanelStatus::Ready {
            message: message.into(),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        PanelStatus::Empty {
            message: message.into(),
        }
    }

    /// Failure status for `error`, with `context` leading the message.
    pub fn failed(context: &str, error: &OverpassError) -> Self {
        let hint = FailureHint::from_error(error);
        PanelStatus::Failed {
            message: format!("{context} {}", hint.message()),
            hint,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PanelStatus::Loading { .. })
    }
}

/// A map that can show route layers.
pub trait RenderSurface: Send {
    fn create_layer(&mut self) -> LayerHandle;

    /// Remove everything drawn on `layer`.
    fn clear_layer(&mut self, layer: LayerHandle);

    fn draw_polylines(&mut self, layer: LayerHandle, polylines: &[Polyline], style: &PolylineStyle);

    fn draw_markers(&mut self, layer: LayerHandle, markers: &[Marker], kind: MarkerKind);

    /// Move the viewport so every point is visible.
    fn fit_to_bounds(&mut self, points: &[LatLon]);

    fn set_status(&mut self, status: PanelStatus);
}

/// Contents of one layer of a [`RecordingSurface`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedLayer {
    pub polylines: Vec<(Polyline, PolylineStyle)>,
    pub markers: Vec<(Marker, MarkerKind)>,
}

/// Surface that keeps what was drawn in memory.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    next_layer: u64,
    layers: BTreeMap<LayerHandle, RecordedLayer>,
    fits: Vec<Vec<LatLon>>,
    statuses: Vec<PanelStatus>,
    clears: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, layer: LayerHandle) -> Option<&RecordedLayer> {
        self.layers.get(&layer)
    }

    /// Every layer, oldest first.
    pub fn layers(&self) -> impl Iterator<Item = &RecordedLayer> {
        self.layers.values()
    }

    /// Viewport fits, oldest first.
    pub fn fits(&self) -> &[Vec<LatLon>] {
        &self.fits
    }

    /// Status history, oldest first.
    pub fn statuses(&self) -> &[PanelStatus] {
        &self.statuses
    }

    pub fn status(&self) -> Option<&PanelStatus> {
        self.statuses.last()
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }
}

impl RenderSurface for RecordingSurface {
    fn create_layer(&mut self) -> LayerHandle {
        self.next_layer += 1;
        let handle = LayerHandle(self.next_layer);
        self.layers.insert(handle, RecordedLayer::default());
        handle
    }

    fn clear_layer(&mut self, layer: LayerHandle) {
        self.clears += 1;
        if let Some(contents) = self.layers.get_mut(&layer) {
            *contents = RecordedLayer::default();
        }
    }

    fn draw_polylines(&mut self, layer: LayerHandle, polylines: &[Polyline], style: &PolylineStyle) {
        let contents = self.layers.entry(layer).or_default();
        contents
            .polylines
            .extend(polylines.iter().map(|p| (p.clone(), style.clone())));
    }

    fn draw_markers(&mut self, layer: LayerHandle, markers: &[Marker], kind: MarkerKind) {
        let contents = self.layers.entry(layer).or_default();
        contents
            .markers
            .extend(markers.iter().map(|m| (m.clone(), kind)));
    }

    fn fit_to_bounds(&mut self, points: &[LatLon]) {
        self.fits.push(points.to_vec());
    }

    fn set_status(&mut self, status: PanelStatus) {
        self.statuses.push(status);
    }
}
