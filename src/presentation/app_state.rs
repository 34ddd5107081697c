// Application state for HTTP handlers
use crate::application::dashboard_view::DashboardHandle;
use crate::infrastructure::chart_library::ChartLibraryAsset;

#[derive(Clone)]
pub struct AppState {
    pub view: DashboardHandle,
    pub chart_library: ChartLibraryAsset,
}
