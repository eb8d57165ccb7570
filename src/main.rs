use rhythmrun::config;
use rhythmrun::game::gameplay::RunEvent;
use rhythmrun::game::replay::{ReplayHost, ReplayScript};
use rhythmrun::game::stage::{self, StageConfig};
use rhythmrun::game::stage_stats;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    config::load();
    let cfg = config::get();
    log::set_max_level(cfg.log_level.as_level_filter());

    let Some(script_path) = std::env::args().nth(1) else {
        eprintln!("usage: rhythmrun <replay.json>");
        std::process::exit(2);
    };

    let stage = stage::load_stage(&cfg.stage_file).unwrap_or_else(|e| {
        log::error!("Failed to load stage '{}': {e}", cfg.stage_file.display());
        StageConfig::default()
    });
    let script = ReplayScript::load(&script_path)?;

    let result = ReplayHost::new(script, stage, cfg.keymap.clone()).play(cfg.tick_seconds());
    for event in &result.events {
        if let RunEvent::Judged {
            judgment,
            score,
            combo,
        } = event
        {
            log::info!(
                "Zone {}: {} (score {score}, combo {combo}, pressed {:?})",
                judgment.zone_id,
                judgment.grade,
                judgment.pressed
            );
        }
    }

    let Some(summary) = result.summary else {
        log::error!("Replay ended without a finished run.");
        return Ok(());
    };
    if cfg.save_results
        && let Err(e) = stage_stats::save_summary(&cfg.results_dir, &summary)
    {
        log::warn!("Failed to save run summary: {e}");
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
