use std::path::Path;

use macroquad::prelude::*;
use tracing::info;

use discogsnake::config::{CONFIG_PATH, GameConfig};
use discogsnake::dispatch::default_spawner;
use discogsnake::provider;
use discogsnake::session::Session;

mod input;
mod render;

use render::{TextureCache, Viewport};

fn window_conf() -> Conf {
    Conf {
        window_title: "DiscogSnake".to_owned(),
        window_width: 600,
        window_height: 600,
        high_dpi: true,
        ..Default::default()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(target_arch = "wasm32")]
fn init_logging() {}

#[macroquad::main(window_conf)]
async fn main() {
    init_logging();

    let config = GameConfig::load_or_default(Path::new(CONFIG_PATH));
    info!(backend = ?config.backend, url = %config.backend_url, "starting");

    let (albums, playback) = provider::connect(&config);
    let seed = (macroquad::miniquad::date::now() * 1_000_000.0) as u64;
    let mut session = Session::new(config, albums, playback, default_spawner(), seed);
    let mut textures = TextureCache::default();

    // Window close goes through the session so playback gets paused.
    prevent_quit();

    loop {
        let vp = Viewport::fit(session.config().width as f32, session.config().height as f32);
        for event in input::poll(&session, &vp) {
            session.handle(event);
        }
        session.update(get_time());
        if session.is_terminated() {
            break;
        }

        textures.sync(&session);
        render::draw(&session, &mut textures, &vp);

        next_frame().await;
    }
    info!("bye");
}
