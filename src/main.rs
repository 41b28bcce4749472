//! Twin Keeps server binary.
//!
//! Runs the authoritative battle simulation on a fixed tokio interval.
//! Without a transport layer attached it hosts a scripted demo match so the
//! simulation can be observed end to end from the logs.

use std::sync::Arc;
use std::time::Duration;

use twin_keeps_server::config::ServerConfig;
use twin_keeps_server::game::state::Side;
use twin_keeps_server::lobby::manager::new_player_id;
use twin_keeps_server::lobby::RoomManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twin_keeps_server=info".into()),
        )
        .init();

    let config = ServerConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    tracing::info!(
        tick_rate = config.tick_rate,
        max_rooms = config.max_rooms,
        "twin keeps server starting"
    );

    let manager = Arc::new(RoomManager::new(config.max_rooms));

    // scripted two-player demo match
    let host = new_player_id();
    let guest = new_player_id();
    let code = manager.create_room(host, "red-keep")?;
    manager.join_room(&code, guest, "blue-keep")?;

    let dt = config.dt();
    let mut ticker = tokio::time::interval(Duration::from_secs_f32(dt));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let tick_rate = config.tick_rate;
    let sim = {
        let manager = Arc::clone(&manager);
        let code = code.clone();
        tokio::spawn(async move {
            let mut tick: u64 = 0;
            loop {
                ticker.tick().await;
                tick += 1;
                let t = tick as f32 * dt;

                // slowly sweeping aim pulls keep both archers busy
                let sweep = (t * 0.4).sin() * 0.15;
                manager.set_aim_pull(&code, host, -0.8, -0.4 + sweep);
                manager.set_aim_pull(&code, guest, 0.8, -0.4 - sweep);

                manager.tick_all(dt);

                if let Some((sfx, damage, lines)) = manager.drain_events(&code) {
                    if !sfx.is_empty() || !damage.is_empty() || !lines.is_empty() {
                        tracing::debug!(
                            sfx = sfx.len(),
                            damage = damage.len(),
                            lines = lines.len(),
                            "tick events"
                        );
                    }
                }

                if tick % (tick_rate as u64 * 10) == 0 {
                    if let Some(snap) = manager.snapshot(&code) {
                        tracing::info!(
                            t = %format!("{:.1}", snap.state.t),
                            left_hp = snap.state.sides.left.tower_hp as i64,
                            right_hp = snap.state.sides.right.tower_hp as i64,
                            minions = snap.state.minions.len(),
                            arrows = snap.state.arrows.len(),
                            "battle status"
                        );
                        if snap.state.game_over {
                            let winner = match snap.state.winner {
                                Some(Side::Left) => "red-keep",
                                Some(Side::Right) => "blue-keep",
                                None => "draw",
                            };
                            tracing::info!(winner, "demo battle finished");
                            break;
                        }
                    }
                }
            }
        })
    };

    tokio::select! {
        _ = sim => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}
