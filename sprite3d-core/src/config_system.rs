use std::path::Path;

use crate::config::RendererConfig;
use crate::utils::*;

/// Read from the working directory when present.
pub const CONFIG_FILE: &str = "sprite3d.toml";


/// Holds the renderer configuration for the other systems.
pub struct ConfigSystem {
    renderer: RendererConfig,
}
impl ConfigSystem {
    pub fn renderer(&self) -> &RendererConfig {
        &self.renderer
    }

    fn load(path: &Path) -> RendererConfig {
        if !path.exists() {
            debug!("No {} found, using the default renderer config", path.display());
            return RendererConfig::default();
        }
        match RendererConfig::load_from_file(path) {
            Ok(config) => {
                info!("Loaded renderer config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring {}: {e}", path.display());
                RendererConfig::default()
            }
        }
    }
}
impl GeeseSystem for ConfigSystem {
    fn new(_ctx: GeeseContextHandle<Self>) -> Self {
        Self {
            renderer: Self::load(Path::new(CONFIG_FILE)),
        }
    }
}
