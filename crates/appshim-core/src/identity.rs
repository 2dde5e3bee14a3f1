//! The fixed identities involved in translation.

use appshim_proto::Identity;

/// Static identity configuration.
///
/// Three identities matter:
///
/// - `system`: the host's own application. Its active state signals that the
///   host finished starting up, and it owns the application list the custom
///   applications are appended to.
/// - `proxy`: an application the host already knows, borrowed as a disguise.
/// - `target`: the custom application. Never leaves the proxy toward the
///   host transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityTable {
    /// The host's own application and the context holding its app list.
    pub system: Identity,
    /// Context category custom applications are registered under.
    pub system_category: String,
    /// Borrowed identity. Its event id is the event that selects it.
    pub proxy: Identity,
    /// Custom application identity.
    pub target: Identity,
    /// Menu event marking a custom application selection.
    pub launch_event: String,
    /// Template the target's surface renders with.
    pub surface_template: String,
    /// Template category the host must map `surface_template` to.
    pub surface_template_category: String,
}

impl Default for IdentityTable {
    fn default() -> Self {
        Self {
            system: Identity::new("system", "Applications"),
            system_category: "Applications".to_string(),
            proxy: Identity::new("vdt", "DriveChartDetails").with_event("SelectDriveRecord"),
            target: Identity::new("custom", "Surface"),
            launch_event: "SelectCustomApplication".to_string(),
            surface_template: "SurfaceTmplt".to_string(),
            surface_template_category: "Detail with UMP".to_string(),
        }
    }
}

impl IdentityTable {
    /// Key a title is stored under in the localization dictionary.
    ///
    /// Only the first `.` is replaced.
    pub fn localization_key(app_name: &str) -> String {
        app_name.replacen('.', "_", 1)
    }

    /// Context-category pattern covering every context of `app_name`.
    pub fn category_pattern(app_name: &str) -> String {
        format!("{app_name}.*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localization_key_replaces_first_dot_only() {
        assert_eq!(IdentityTable::localization_key("app.demo.one"), "app_demo.one");
        assert_eq!(IdentityTable::localization_key("plain"), "plain");
    }

    #[test]
    fn category_pattern_wildcards_contexts() {
        assert_eq!(IdentityTable::category_pattern("app.demo"), "app.demo.*");
    }

    #[test]
    fn default_identities_are_distinct() {
        let table = IdentityTable::default();
        assert_ne!(table.proxy.app_id, table.target.app_id);
        assert_ne!(table.system.app_id, table.proxy.app_id);
        assert_eq!(table.proxy.event_id.as_deref(), Some("SelectDriveRecord"));
    }
}
