//! ecolensd - EcoLens analysis daemon
//!
//! This daemon:
//! 1. Loads configuration from file and environment
//! 2. Connects a local frame source
//! 3. Feeds every captured frame through the cadence-gated pipeline
//! 4. Logs classification results as they arrive
//! 5. Stops cleanly on Ctrl-C

use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use ecolens::{
    AnalysisPipeline, BackendKind, Category, Classification, ClassifierRegistry, EcolensConfig,
    FileConfig, FileSource, StubClassifier,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = EcolensConfig::load()?;
    log::info!(
        "ecolensd starting: category={} backend={} cadence={} crop={}",
        cfg.classify.category,
        cfg.classify.backend,
        cfg.pipeline.cadence,
        cfg.pipeline.crop_size
    );

    let mut registry = ClassifierRegistry::new();
    register_backends(&mut registry, &cfg)?;
    let classifier = registry.select(cfg.classify.category)?;

    let mut source = FileSource::new(FileConfig {
        path: cfg.source.path.clone(),
        target_fps: cfg.source.target_fps,
        rotation: cfg.source.rotation,
    })?;
    source.connect()?;

    let delivered = Arc::new(AtomicU64::new(0));
    let sink_count = Arc::clone(&delivered);
    let mut pipeline = AnalysisPipeline::new(classifier, move |results: Vec<Classification>| {
        let analysis = sink_count.fetch_add(1, Ordering::SeqCst) + 1;
        if results.is_empty() {
            log::info!("analysis #{}: no results", analysis);
        }
        for result in &results {
            log::info!(
                "analysis #{}: {} ({:.2})",
                analysis,
                result.label,
                result.confidence
            );
        }
    })
    .with_cadence(cfg.pipeline.cadence)
    .with_crop_size(cfg.pipeline.crop_size);

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    let frame_interval = Duration::from_millis(1000 / u64::from(cfg.source.target_fps));
    let mut last_health_log = Instant::now();

    log::info!("ecolensd running. source={}", cfg.source.path);

    loop {
        if rx.try_recv().is_ok() {
            log::info!("shutdown signal received, stopping...");
            break;
        }

        let frame = source.next_frame()?;
        pipeline.on_frame(frame);

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            let stats = source.stats();
            log::info!(
                "source health={} frames={} analyses={} path={}",
                source.is_healthy(),
                stats.frames_captured,
                delivered.load(Ordering::SeqCst),
                stats.path
            );
            last_health_log = Instant::now();
        }

        std::thread::sleep(frame_interval);
    }

    log::info!(
        "ecolensd stopped after {} frames, {} analyses",
        pipeline.frames_seen(),
        delivered.load(Ordering::SeqCst)
    );
    Ok(())
}

fn register_backends(registry: &mut ClassifierRegistry, cfg: &EcolensConfig) -> Result<()> {
    match cfg.classify.backend {
        BackendKind::Stub => {
            for category in Category::ALL {
                registry.register(StubClassifier::new(category));
            }
        }
        BackendKind::Tract => {
            #[cfg(feature = "backend-tract")]
            {
                let classifier = ecolens::TractClassifier::new(
                    &cfg.classify.model_dir,
                    cfg.classify.category,
                    cfg.pipeline.crop_size,
                )?
                .with_threshold(cfg.classify.confidence_threshold)
                .with_max_results(cfg.classify.max_results);
                registry.register(classifier);
            }
            #[cfg(not(feature = "backend-tract"))]
            {
                return Err(anyhow::anyhow!(
                    "tract backend requires the backend-tract feature"
                ));
            }
        }
    }
    Ok(())
}
