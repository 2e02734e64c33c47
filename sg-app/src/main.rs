//! This binary crate runs the Snowglobe scene: a particle Christmas tree with snow falling in
//! front of it, which can be switched on and off with hand gestures.
//!
//! The config is read from the RON file given as the first argument, or `snowglobe.ron` by
//! default. Every frame is composited and saved as a PNG, unless the debug surface is selected, in
//! which case every draw call is just logged.

mod compose;
mod config;
mod logging;
mod run;

use self::{
    compose::{compose, Layers},
    config::{AppConfig, SurfaceKind},
};
use color_eyre::{eyre::Context, Result};
use sg_scene::Scene;
use sg_surface_debug::DebugSurface;
use sg_surface_raster::{save_png, RasterSurface};
use tracing::{debug, info};

/// The default filename for the config.
const CONFIG_FILENAME: &str = "snowglobe.ron";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CONFIG_FILENAME.to_string());
    let config = AppConfig::from_file(&config_path);
    debug!(?config, "Loaded config");

    match config.surface {
        SurfaceKind::Debug => {
            run::run(&config, DebugSurface::new, |_frame, _scene, _bridge| Ok(())).await?;
        }
        SurfaceKind::Raster => {
            run::run(
                &config,
                RasterSurface::new,
                |frame, scene: &Scene<RasterSurface>, bridge| {
                    let Some(dir) = &config.output_dir else {
                        return Ok(());
                    };

                    let image = compose(
                        scene.viewport(),
                        config.background,
                        Layers {
                            tree: scene.tree().surface().image(),
                            snow: scene.snow().surface().image(),
                            overlay: bridge.map(|bridge| bridge.overlay().image()),
                        },
                    );

                    let path = dir.join(format!("frame_{frame:05}.png"));
                    save_png(&image, &path)
                        .wrap_err_with(|| format!("Unable to save {}", path.display()))
                },
            )
            .await?;
        }
    }

    info!("Finished");
    Ok(())
}
