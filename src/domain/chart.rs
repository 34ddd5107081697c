// Chart domain models - Series, layout and the drawing surface they land on
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStyle {
    Line,
    LineWithMarkers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub style: SeriesStyle,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Plot values against their position, starting at 0
    pub fn indexed(name: impl Into<String>, style: SeriesStyle, values: &[f64]) -> Self {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &y)| ChartPoint { x: i as f64, y })
            .collect();

        Self {
            name: name.into(),
            style,
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRequest {
    pub series: Vec<ChartSeries>,
    pub layout: ChartLayout,
}

#[derive(Debug, Default)]
struct SurfaceState {
    generation: u64,
    unmounted: bool,
    figure: Option<String>,
}

/// The container a chart is drawn into. Cloning shares the same container.
#[derive(Debug, Clone)]
pub struct ChartSurface {
    id: String,
    state: Arc<Mutex<SurfaceState>>,
}

impl ChartSurface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Arc::new(Mutex::new(SurfaceState::default())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The drawn figure, if any
    pub fn figure(&self) -> Option<String> {
        self.lock().figure.clone()
    }

    /// Clear the surface and hand out a target for the next drawing.
    /// Targets handed out earlier stop accepting figures.
    pub fn reset(&self) -> SurfaceTarget {
        let mut state = self.lock();
        state.generation += 1;
        state.figure = None;

        SurfaceTarget {
            id: self.id.clone(),
            generation: state.generation,
            state: self.state.clone(),
        }
    }

    /// Tear the surface down; nothing can be drawn on it afterwards.
    pub fn unmount(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.unmounted = true;
        state.figure = None;
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Write access to a surface for one drawing
#[derive(Debug, Clone)]
pub struct SurfaceTarget {
    id: String,
    generation: u64,
    state: Arc<Mutex<SurfaceState>>,
}

impl SurfaceTarget {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether a figure put now would still land on the surface
    pub fn is_current(&self) -> bool {
        let state = self.lock();
        !state.unmounted && state.generation == self.generation
    }

    /// Store a figure; returns false when the target was superseded or the
    /// surface was torn down.
    pub fn put(&self, figure: String) -> bool {
        let mut state = self.lock();
        if state.unmounted || state.generation != self.generation {
            return false;
        }
        state.figure = Some(figure);
        true
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
