//! Check compiled-in backends and the effective configuration.

use std::path::Path;

use reelswipe_common::config::{config_file_path, AppConfig};
use reelswipe_gesture::{build_extractor, ExtractorKind};

use super::resolve;

pub fn run(config: &AppConfig, explicit_path: Option<&Path>) -> anyhow::Result<()> {
    println!("ReelSwipe System Check");
    println!("{}", "=".repeat(50));

    for kind in ExtractorKind::ALL {
        if kind.is_available() {
            println!("[OK] Motion backend: {kind}");
        } else {
            println!("[--] Motion backend: {kind} (not compiled in)");
        }
    }

    let path = explicit_path.map_or_else(config_file_path, Path::to_path_buf);
    if path.exists() {
        println!("[OK] Config file: {}", path.display());
    } else {
        println!("[--] Config file: {} (using defaults)", path.display());
    }

    println!();
    let session = match resolve(config) {
        Ok(session) => session,
        Err(e) => {
            println!("[FAIL] Configuration: {e:#}");
            anyhow::bail!("Configuration is invalid");
        }
    };
    println!(
        "[OK] Swipe: axis={} min_displacement={} max_duration={}s history={} cooldown={}s",
        session.swipe.axis(),
        session.swipe.min_displacement(),
        session.swipe.max_duration(),
        session.swipe.history(),
        session.swipe.cooldown()
    );
    println!("[OK] Keys: {}", session.keys);

    if let Err(e) = build_extractor(session.kind, &config.detector) {
        println!("[FAIL] Backend '{}': {e}", session.kind);
        anyhow::bail!("Selected motion backend cannot be used");
    }
    let policy = session.kind.default_policy();
    println!(
        "[OK] Backend '{}': window={} min_samples={} confirmation={:?}",
        session.kind,
        policy.tracker_capacity(&session.swipe),
        policy.min_samples,
        policy.confirmation
    );

    println!();
    println!("Configuration is valid. ReelSwipe is ready.");

    Ok(())
}
