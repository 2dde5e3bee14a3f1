//! List-selection events.

use serde::{Deserialize, Serialize};

use crate::Fields;

/// Application data attached to a menu list item.
///
/// This is what the host hands to its selection callback, and what a
/// discovery handler receives when asked to launch an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    /// Application the item transitions into.
    pub app_name: String,
    /// Event the host raises when the item is selected.
    pub mmui_event: String,
    /// Uninterpreted fields.
    #[serde(flatten)]
    pub extra: Fields,
}

impl AppData {
    /// Item data with no extra fields.
    pub fn new(app_name: impl Into<String>, mmui_event: impl Into<String>) -> Self {
        Self { app_name: app_name.into(), mmui_event: mmui_event.into(), extra: Fields::new() }
    }
}

/// A selection made in a host menu list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEvent {
    /// Name of the list control the selection came from.
    pub control: String,
    /// Data of the selected item.
    pub app_data: AppData,
    /// Extra parameters supplied by the list control.
    pub params: Fields,
}

impl SelectionEvent {
    /// Selection of `app_data` in `control` with no parameters.
    pub fn new(control: impl Into<String>, app_data: AppData) -> Self {
        Self { control: control.into(), app_data, params: Fields::new() }
    }
}
