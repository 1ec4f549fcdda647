use anyhow::Context;
use smartrefresh::{Constraints, Density};
use smartrefresh_demo::{FramePacer, Session, WallClock, SCRIPT};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    println!("=== SmartRefresh Demo ===");
    println!("A scripted session on a 1080x1920 screen:");
    println!("  - Refresh on first entry");
    println!("  - Pull down to refresh (every other fetch fails)");
    println!("  - Scroll to the bottom and pull up to load more");
    println!();
    println!("Set RUST_LOG=debug to follow every flag change");
    println!();

    let mut session = Session::new(Density::new(2.0), Constraints::tight(1080.0, 1920.0));
    let mut pacer = FramePacer::new(WallClock);
    session
        .run(SCRIPT, || pacer.wait_for_frame())
        .context("scripted session failed")?;

    log::info!(
        "session finished after {} frames: {}",
        session.frames(),
        session.screen().snapshot()
    );
    Ok(())
}
