pub mod init;
pub mod zone;

use std::path::Path;

use tracing::debug;
use zonal_admin::ZoneAdmin;
use zonal_catalog::Catalog;
use zonal_core::ZonalSettings;
use zonal_state::ZoneStore;

/// Load `zonal.toml`, falling back to defaults when the file is absent.
pub fn load_settings(path: &Path) -> anyhow::Result<ZonalSettings> {
    if path.exists() {
        ZonalSettings::from_file(path)
    } else {
        Ok(ZonalSettings::default())
    }
}

/// Everything a zone command needs.
pub struct Context {
    pub admin: ZoneAdmin,
    pub catalog: Catalog,
    pub database: Option<String>,
    pub json: bool,
}

impl Context {
    pub fn open(
        settings: ZonalSettings,
        catalog: Option<&Path>,
        database: Option<String>,
        format: &str,
    ) -> anyhow::Result<Self> {
        let store = match &settings.store.path {
            Some(path) => ZoneStore::open(path)?,
            None => ZoneStore::open_in_memory()?,
        };
        let catalog = match catalog {
            Some(path) => Catalog::from_json(&std::fs::read_to_string(path)?)?,
            None => Catalog::default(),
        };
        debug!(
            databases = catalog.databases.len(),
            tables = catalog.tables.len(),
            "catalog snapshot loaded"
        );

        let admin = ZoneAdmin::new(store, settings.default_zone_config());
        admin.bootstrap()?;
        let linked = admin.link_from_catalog(&catalog);
        debug!(linked, "temporary index links loaded from catalog");
        Ok(Self {
            admin,
            catalog,
            database,
            json: format == "json",
        })
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }
}
