//! Application descriptors.

use serde::{Deserialize, Serialize};

use crate::AppData;

/// A custom application reported by the discovery handler.
///
/// Descriptors are appended to the host's application registry as-is, so
/// they carry the same [`AppData`] a native menu item does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDescriptor {
    /// Menu item data.
    pub app_data: AppData,
    /// Display title.
    pub title: String,
    /// Context category. Defaults to the system application's category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl AppDescriptor {
    /// Descriptor for `app_name` launched through `mmui_event`.
    pub fn new(
        app_name: impl Into<String>,
        mmui_event: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self { app_data: AppData::new(app_name, mmui_event), title: title.into(), category: None }
    }

    /// Application name.
    pub fn app_name(&self) -> &str {
        &self.app_data.app_name
    }
}
