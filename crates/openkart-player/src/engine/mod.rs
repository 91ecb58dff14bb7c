//! Game engine: minifb window, input polling and the frame loop.
//!
//! The race is drawn into a fixed-size ARGB framebuffer (the configured
//! display size) and scaled to the window with nearest-neighbor sampling.

pub mod input;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use openkart_common::{next_difficulty, AppConfig};
use openkart_core::minimap::{MINIMAP_SAMPLES, MINIMAP_SIZE};
use openkart_core::render::scale_nearest;
use openkart_core::{Framebuffer, Hud, Minimap, RaceEvent, RaceSession, Renderer, SpriteSet, Track};

/// Longest frame interval fed to the simulation (window drags, breakpoints)
const MAX_FRAME_DT: f32 = 0.25;
/// Window title refresh interval in frames
const TITLE_INTERVAL: u64 = 15;

/// Run the game engine until the window closes or Esc is pressed
pub fn run(config: &AppConfig, track: Arc<Track>, players: usize) -> Result<()> {
    let display = &config.display;
    let (width, height) = (display.width as usize, display.height as usize);
    let scale = display.scale.max(1) as usize;

    let mut session = RaceSession::new(track.clone(), &config.race, &config.tuning, players);
    let mut renderer = Renderer::new(track.clone()).with_sprites(SpriteSet::placeholders());
    let minimap = Minimap::build(&track, MINIMAP_SAMPLES, MINIMAP_SIZE);
    let hud = Hud::default();

    let options = WindowOptions {
        resize: true,
        scale_mode: minifb::ScaleMode::AspectRatioStretch,
        ..Default::default()
    };
    let mut window = Window::new("OpenKart", width * scale, height * scale, options)
        .map_err(|e| anyhow::anyhow!("Window creation failed: {}", e))?;
    window.set_target_fps(display.fps as usize);

    // Internal framebuffer at native resolution
    let mut framebuffer = Framebuffer::new(width, height);

    // Output buffer, sized to match window
    let (mut out_w, mut out_h) = (width * scale, height * scale);
    let mut scaled_buf = vec![0u32; out_w * out_h];

    tracing::info!("Engine initialized, entering game loop");
    tracing::info!("Controls: P1 WASD+LShift | P2 Arrows+RCtrl | F4 difficulty | F5 restart | Esc quit");

    let mut last = Instant::now();
    let mut frame_count: u64 = 0;
    let mut finish_time: Option<f32> = None;

    while window.is_open() {
        if window.is_key_pressed(Key::Escape, KeyRepeat::No) {
            tracing::info!("Engine shutdown (Esc)");
            break;
        }

        // Track window size changes
        let (actual_w, actual_h) = window.get_size();
        if actual_w > 0 && actual_h > 0 && (actual_w != out_w || actual_h != out_h) {
            out_w = actual_w;
            out_h = actual_h;
            scaled_buf.resize(out_w * out_h, 0);
        }

        if window.is_key_pressed(Key::F4, KeyRepeat::No) {
            if let Some(current) = session.difficulty() {
                let next = next_difficulty(current);
                session.set_difficulty(next);
                tracing::info!("Difficulty → {:.1}", next);
            }
        }
        if window.is_key_pressed(Key::F5, KeyRepeat::No) {
            session.restart();
            finish_time = None;
        }

        // Simulation
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(MAX_FRAME_DT);
        last = now;

        let inputs = input::read_players(session.players().len(), |key| window.is_key_down(key));
        for event in session.update(dt, &inputs) {
            match event {
                RaceEvent::Finished { player, lap_times, total } => {
                    let laps: Vec<String> = lap_times.iter().map(|t| format!("{:.2}", t)).collect();
                    tracing::info!("Player {} finished: {} (total {:.2}s)", player + 1, laps.join(" / "), total);
                    if player == 0 {
                        finish_time = Some(total);
                    }
                }
                RaceEvent::PickupHit(hit) => {
                    tracing::debug!("Player {} picked up {}", hit.vehicle + 1, hit.kind.name());
                }
                RaceEvent::Lap { .. } => {}
            }
        }

        // Render player 1's view
        if let Some(viewer) = session.player(0) {
            let others = session.opponents(0);
            let items = session.items_enabled().then(|| session.pickups().items());
            renderer.render(&mut framebuffer, viewer, &others, items);

            let laps = session.lap_tracker(0).map_or(0, |t| t.laps());
            hud.draw(&mut framebuffer, viewer, laps, session.laps_to_win(), &minimap, &others);
        }

        frame_count += 1;
        if frame_count % TITLE_INTERVAL == 0 {
            window.set_title(&title(&session, finish_time));
        }

        // Scale to output size and present
        scale_nearest(framebuffer.pixels(), width, height, &mut scaled_buf, out_w, out_h);
        window
            .update_with_buffer(&scaled_buf, out_w, out_h)
            .map_err(|e| anyhow::anyhow!("Display error: {}", e))?;
    }

    tracing::info!("Engine shutdown");
    Ok(())
}

fn title(session: &RaceSession, finish_time: Option<f32>) -> String {
    let Some(player) = session.player(0) else {
        return "OpenKart".to_string();
    };
    let laps = session.lap_tracker(0).map_or(0, |t| t.laps());
    let shown_lap = (laps + 1).min(session.laps_to_win());
    let mut title = format!(
        "OpenKart | Lap {}/{} | {:>3} km/h",
        shown_lap,
        session.laps_to_win(),
        player.effective_speed().round() as i32
    );
    if let Some(difficulty) = session.difficulty() {
        title.push_str(&format!(" | Ghost ×{:.1}", difficulty));
    }
    if let Some(total) = finish_time {
        title.push_str(&format!(" | Finished {:.2}s", total));
    }
    title
}
