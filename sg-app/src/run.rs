//! This module provides the main frame loop of the binary.

use crate::config::{AppConfig, CameraSource, GestureSetup};
use color_eyre::Result;
use sg_frame::FrameScheduler;
use sg_gesture::{Camera, GestureBridge, ReplayLoader, SyntheticCamera};
use sg_scene::Scene;
use sg_surface_trait::Surface;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// Build the camera for the gesture bridge.
fn make_camera(source: CameraSource) -> Result<Box<dyn Camera>> {
    match source {
        CameraSource::Synthetic => Ok(Box::new(SyntheticCamera::new())),

        #[cfg(feature = "webcam")]
        CameraSource::Webcam { index } => Ok(Box::new(sg_gesture::NokhwaCamera::new(index))),

        #[cfg(not(feature = "webcam"))]
        CameraSource::Webcam { index } => Err(color_eyre::eyre::eyre!(
            "Camera {index} is a webcam, but snowglobe was built without the `webcam` feature"
        )),
    }
}

/// Build a gesture bridge from its config, with a fresh surface for the skeleton overlay.
fn make_bridge<S: Surface>(
    setup: &GestureSetup,
    make_surface: &mut impl FnMut(u32, u32) -> S,
) -> Result<GestureBridge<S>> {
    let (width, height) = setup.bridge.overlay_size;
    Ok(GestureBridge::new(
        Box::new(ReplayLoader::from_file(setup.script.clone())),
        make_camera(setup.camera)?,
        make_surface(width, height),
        setup.bridge,
    ))
}

/// Wait for the next frame. In real time this waits for the interval, otherwise it just yields so
/// that Ctrl-C can still be noticed.
async fn next_tick(interval: &mut Interval, realtime: bool) {
    if realtime {
        interval.tick().await;
    } else {
        tokio::task::yield_now().await;
    }
}

/// Run the scene frame by frame until the configured number of frames has been rendered or the
/// user presses Ctrl-C.
///
/// `make_surface` creates a surface of the given size for each layer, and `present` is called
/// after every frame with the frame number, the scene, and the gesture bridge if there is one.
#[instrument(skip_all)]
pub async fn run<S, P>(
    config: &AppConfig,
    mut make_surface: impl FnMut(u32, u32) -> S,
    mut present: P,
) -> Result<()>
where
    S: Surface,
    P: FnMut(u32, &Scene<S>, Option<&GestureBridge<S>>) -> Result<()>,
{
    let mut scheduler = FrameScheduler::new();

    let mut scene = Scene::new(
        make_surface(0, 0),
        make_surface(0, 0),
        config.scene.clone(),
        config.settings,
    );
    scene.mount(&mut scheduler, config.viewport);

    let mut bridge = config
        .gesture
        .as_ref()
        .map(|setup| make_bridge(setup, &mut make_surface))
        .transpose()?;

    if let Some(bridge) = bridge.as_mut() {
        bridge.start(&mut scheduler);
        if let Some(message) = bridge.error_message() {
            warn!(error = message, "Gesture bridge couldn't start");
        }
    }

    let dt = Duration::from_secs_f64(1. / f64::from(config.fps.max(1)));
    let mut interval = tokio::time::interval(dt);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(frames = ?config.frames, fps = config.fps, realtime = config.realtime, "Running scene");

    let mut frame = 0;
    let result = loop {
        if config.frames.is_some_and(|limit| frame >= limit) {
            break Ok(());
        }

        tokio::select! {
            biased;

            _ = &mut ctrl_c => {
                info!("Received Ctrl-C, stopping");
                break Ok(());
            }

            _ = next_tick(&mut interval, config.realtime) => {}
        }

        scheduler.begin_frame(dt);

        if let Some(bridge) = bridge.as_mut() {
            bridge.on_frame(&mut scheduler, scene.settings_mut());
        }
        scene.run_frame(&mut scheduler);

        if let Err(error) = present(frame, &scene, bridge.as_ref()) {
            break Err(error);
        }

        frame += 1;
    };

    if let Some(bridge) = bridge.as_mut() {
        bridge.stop(&mut scheduler);
    }
    scene.unmount(&mut scheduler);
    debug!(
        frames = frame,
        pending = scheduler.pending_callbacks(),
        "Torn down scene"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_scene::Settings;
    use sg_surface_trait::RecordingSurface;

    fn test_config() -> AppConfig {
        AppConfig {
            frames: Some(5),
            output_dir: None,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn renders_configured_frames_test() {
        let config = test_config();
        let mut surfaces = Vec::new();
        let mut presented = Vec::new();

        run(
            &config,
            |width, height| {
                let surface = RecordingSurface::new(width, height);
                surfaces.push(surface.clone());
                surface
            },
            |frame, scene: &Scene<RecordingSurface>, bridge| {
                assert!(bridge.is_none());
                assert_eq!(*scene.settings(), Settings::default());
                presented.push(frame);
                Ok(())
            },
        )
        .await
        .unwrap();

        assert_eq!(presented, vec![0, 1, 2, 3, 4]);

        // Tree and snow, each cleared by every frame and once more by unmounting
        assert_eq!(surfaces.len(), 2);
        for surface in &surfaces {
            assert_eq!(surface.recording().clears, 6);
        }
    }

    #[tokio::test]
    async fn present_error_stops_loop_test() {
        let config = test_config();
        let mut presented = 0;

        let result = run(
            &config,
            RecordingSurface::new,
            |frame, _scene: &Scene<RecordingSurface>, _bridge| {
                presented += 1;
                if frame == 2 {
                    Err(color_eyre::eyre::eyre!("disk full"))
                } else {
                    Ok(())
                }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(presented, 3);
    }

    #[tokio::test]
    async fn missing_gesture_script_test() {
        let config = AppConfig {
            gesture: Some(GestureSetup {
                script: "/definitely/not/here/gestures.ron".into(),
                camera: CameraSource::Synthetic,
                bridge: Default::default(),
            }),
            ..test_config()
        };

        run(
            &config,
            RecordingSurface::new,
            |_frame, scene: &Scene<RecordingSurface>, bridge| {
                let bridge = bridge.unwrap();
                assert_eq!(bridge.error_message(), Some("Failed to load AI model."));
                assert_eq!(bridge.overlay().size(), (128, 96));
                assert!(scene.settings().snow_enabled);
                Ok(())
            },
        )
        .await
        .unwrap();
    }
}
