//! Command-line entry points.
//!
//! Each command drives the loading engine against real collaborators: the
//! HTTP probe, a geometric viewport and a static connection hint. The host
//! loop stands in for a browser event loop, forwarding viewport changes and
//! draining instance messages.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use super::manifest::{ManifestEntry, load_manifest};
use super::markup::render_markup;
use crate::application::dto::ViewContext;
use crate::application::services::{
    EscalationScheduler, LoadCallbacks, ProgressiveImage, ProgressiveLoader, build_render_plan,
};
use crate::domain::entities::{ImageSourceSet, LoadPhase, LoadState};
use crate::domain::errors::TransitionError;
use crate::domain::ports::ElementId;
use crate::infrastructure::config::{AppConfig, RenderState, StorageManager};
use crate::infrastructure::media::{
    HttpImageProbe, MembershipCache, Rect, StaticConnectionHint, ViewportObserver,
};

const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 800;
const SLOT_HEIGHT: u32 = 400;
/// Distance below the fold where lazy images start out.
const OFFSCREEN_Y: i64 = 4000;
const DRAIN_INTERVAL: Duration = Duration::from_millis(10);

enum Tick {
    Event,
    Scroll,
    Deadline,
}

/// Builds the state an instance would be in for `requested`.
///
/// # Errors
///
/// Returns `TransitionError` if the path is not reachable, which would be a bug.
pub fn simulate_state(
    sources: &ImageSourceSet,
    requested: RenderState,
) -> Result<LoadState, TransitionError> {
    let mut state = LoadState::seeding(sources.placeholder_url());
    match requested {
        RenderState::Cached => state.seed_cached(sources.target_url())?,
        RenderState::Placeholder => state.show_placeholder()?,
        RenderState::Loaded => {
            state.show_placeholder()?;
            state.begin_probe()?;
            state.upgrade(sources.target_url(), false)?;
        }
        RenderState::Failed => {
            state.show_placeholder()?;
            state.begin_probe()?;
            state.fail()?;
        }
    }
    Ok(state)
}

/// Prints the markup for every entry of a manifest.
///
/// # Errors
///
/// Returns error if the manifest cannot be loaded.
pub fn run_render(manifest: &Path, context: Option<ViewContext>, state: RenderState) -> Result<()> {
    let entries = read_entries(manifest)?;
    for entry in entries {
        let mut props = entry.into_props();
        if let Some(context) = context {
            props.context = context;
        }
        let load_state = simulate_state(&props.sources, state)?;
        println!("{}", render_markup(&build_render_plan(&props, &load_state)));
    }
    Ok(())
}

/// Mounts the first entry of a manifest and reports each transition.
///
/// # Errors
///
/// Returns error if the manifest or probe cannot be set up.
pub async fn run_load(
    config: &AppConfig,
    manifest: &Path,
    eager: bool,
    visible_after_ms: Option<u64>,
    deadline_secs: u64,
) -> Result<()> {
    let entry = read_entries(manifest)?
        .into_iter()
        .next()
        .ok_or_else(|| eyre!("manifest holds no images"))?;
    let mut props = entry.into_props();
    props.eager |= eager;

    let cache = Arc::new(MembershipCache::new(config.media.cache_capacity));
    let viewport = ViewportObserver::new();
    viewport.set_viewport(Rect::new(0, 0, VIEWPORT_WIDTH, VIEWPORT_HEIGHT));
    let target = ElementId(1);
    viewport.set_bounds(target, Rect::new(0, OFFSCREEN_Y, VIEWPORT_WIDTH, SLOT_HEIGHT));

    let loader = build_loader(config, Arc::clone(&cache), &viewport)?;
    let mut image = loader.mount(target, props, reporting_callbacks());
    report(&image);

    let deadline = sleep(Duration::from_secs(deadline_secs));
    tokio::pin!(deadline);
    let scroll = async {
        match visible_after_ms {
            Some(ms) => sleep(Duration::from_millis(ms)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(scroll);
    let mut scrolled = false;

    while !image.state().phase().is_terminal() {
        let tick = tokio::select! {
            _ = image.next_event() => Tick::Event,
            () = &mut scroll, if !scrolled => Tick::Scroll,
            () = &mut deadline => Tick::Deadline,
        };
        match tick {
            Tick::Event => report(&image),
            Tick::Scroll => {
                scrolled = true;
                debug!(element = %target, "Scrolling element into view");
                viewport.set_viewport(Rect::new(0, OFFSCREEN_Y, VIEWPORT_WIDTH, VIEWPORT_HEIGHT));
            }
            Tick::Deadline => {
                warn!(id = %image.id(), phase = %image.state().phase(), "Deadline reached");
                break;
            }
        }
    }

    println!("{}", render_markup(&image.render_plan()));
    println!("{}", cache.stats());
    image.unmount();
    Ok(())
}

/// Mounts every entry of every manifest against one shared cache.
///
/// Manifests are processed in order, so an image repeated in a later
/// manifest is served from the cache instead of probed again.
///
/// # Errors
///
/// Returns error if a manifest or the probe cannot be set up.
pub async fn run_batch(config: &AppConfig, manifests: &[PathBuf], deadline_secs: u64) -> Result<()> {
    let cache = Arc::new(MembershipCache::new(config.media.cache_capacity));
    let viewport = ViewportObserver::new();
    viewport.set_viewport(Rect::new(0, 0, VIEWPORT_WIDTH, VIEWPORT_HEIGHT));
    let loader = build_loader(config, Arc::clone(&cache), &viewport)?;

    let mut next_element = 0u64;
    let mut summary = BatchSummary::default();

    for manifest in manifests {
        let entries = read_entries(manifest)?;
        info!(manifest = %manifest.display(), images = entries.len(), "Mounting batch");

        let mut images: Vec<ProgressiveImage> = Vec::with_capacity(entries.len());
        for (row, entry) in entries.into_iter().enumerate() {
            next_element += 1;
            let target = ElementId(next_element);
            let y = i64::try_from(row).unwrap_or(i64::MAX).saturating_mul(i64::from(SLOT_HEIGHT));
            viewport.set_bounds(target, Rect::new(0, y, VIEWPORT_WIDTH, SLOT_HEIGHT));
            images.push(loader.mount(target, entry.into_props(), LoadCallbacks::new()));
        }

        drive_until_settled(&mut images, &viewport, Duration::from_secs(deadline_secs)).await;

        for image in images {
            summary.record(image.state().phase());
            println!(
                "{}\t{}\t{}",
                image.state().phase(),
                image.id(),
                image.state().current_src()
            );
            viewport.remove_element(image.target());
            image.unmount();
        }
    }

    println!("{summary}");
    println!("{}", cache.stats());
    Ok(())
}

/// Writes `config` to the configuration directory and prints the path.
///
/// # Errors
///
/// Returns error if the file cannot be written.
pub fn run_init_config(storage: &StorageManager, config: &AppConfig) -> Result<()> {
    let path = storage
        .save_config(config)
        .wrap_err("Failed to write configuration")?;
    info!(path = %path.display(), "Configuration written");
    println!("{}", path.display());
    Ok(())
}

/// Scrolls through the laid-out images and drains their messages until
/// every instance is terminal or the deadline passes.
async fn drive_until_settled(
    images: &mut [ProgressiveImage],
    viewport: &ViewportObserver,
    deadline: Duration,
) {
    let started = Instant::now();
    let mut scroll_y: i64 = 0;
    let step = i64::from(VIEWPORT_HEIGHT);
    viewport.set_viewport(Rect::new(0, scroll_y, VIEWPORT_WIDTH, VIEWPORT_HEIGHT));

    loop {
        sleep(DRAIN_INTERVAL).await;
        for image in images.iter_mut() {
            image.drain_pending();
        }
        if images.iter().all(|image| image.state().phase().is_terminal()) {
            return;
        }
        if started.elapsed() >= deadline {
            let waiting = images
                .iter()
                .filter(|image| !image.state().phase().is_terminal())
                .count();
            warn!(waiting, "Deadline reached with images still loading");
            return;
        }
        scroll_y = scroll_y.saturating_add(step);
        viewport.set_viewport(Rect::new(0, scroll_y, VIEWPORT_WIDTH, VIEWPORT_HEIGHT));
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct BatchSummary {
    cached: usize,
    upgraded: usize,
    settled: usize,
    failed: usize,
    pending: usize,
}

impl BatchSummary {
    fn record(&mut self, phase: LoadPhase) {
        match phase {
            LoadPhase::CachedReady => self.cached += 1,
            LoadPhase::Upgraded => self.upgraded += 1,
            LoadPhase::Settled => self.settled += 1,
            LoadPhase::Failed => self.failed += 1,
            LoadPhase::Seeding | LoadPhase::PlaceholderShown | LoadPhase::Probing => {
                self.pending += 1;
            }
        }
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Images: {} from cache, {} upgraded, {} settled, {} failed, {} pending",
            self.cached, self.upgraded, self.settled, self.failed, self.pending
        )
    }
}

fn build_loader(
    config: &AppConfig,
    cache: Arc<MembershipCache>,
    viewport: &ViewportObserver,
) -> Result<ProgressiveLoader> {
    let probe = HttpImageProbe::new(config.media.probe_config())
        .wrap_err("Failed to create image probe")?;
    let hint = StaticConnectionHint::from_config(config.media.connection);
    let scheduler = EscalationScheduler::new(config.media.scheduler_config(), Arc::new(hint));
    Ok(ProgressiveLoader::new(
        cache,
        Arc::new(probe),
        Arc::new(viewport.clone()),
        scheduler,
    ))
}

fn read_entries(manifest: &Path) -> Result<Vec<ManifestEntry>> {
    load_manifest(manifest)
        .wrap_err_with(|| format!("Failed to load manifest {}", manifest.display()))
}

fn reporting_callbacks() -> LoadCallbacks {
    LoadCallbacks::new()
        .on_load(|element| {
            println!(
                "loaded {} ({}x{})",
                element.src, element.natural_width, element.natural_height
            );
        })
        .on_error(|failure| println!("failed {}: {}", failure.url, failure.error))
}

fn report(image: &ProgressiveImage) {
    let state = image.state();
    println!(
        "{}\tsrc={}\tloaded={}\tskip_transition={}\terror={}",
        state.phase(),
        state.current_src(),
        state.is_loaded(),
        state.skip_transition(),
        state.is_error()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::ImageProps;
    use crate::application::services::SchedulerConfig;
    use crate::domain::connection::ConnectionSpeed;
    use crate::domain::entities::Tier;
    use crate::domain::ports::mocks::{MockConnectionHintPort, MockImageProbe};
    use test_case::test_case;

    fn sources() -> ImageSourceSet {
        ImageSourceSet::new("o.jpg")
            .with_tier(Tier::Thumbnail, "t.jpg")
            .with_tier(Tier::Small, "s.jpg")
    }

    #[test_case(RenderState::Placeholder, LoadPhase::PlaceholderShown, "t.jpg", false)]
    #[test_case(RenderState::Loaded, LoadPhase::Upgraded, "s.jpg", true)]
    #[test_case(RenderState::Cached, LoadPhase::CachedReady, "s.jpg", true)]
    #[test_case(RenderState::Failed, LoadPhase::Failed, "t.jpg", true)]
    fn test_simulate_state(requested: RenderState, phase: LoadPhase, src: &str, loaded: bool) {
        let state = simulate_state(&sources(), requested).unwrap();

        assert_eq!(state.phase(), phase);
        assert_eq!(state.current_src(), src);
        assert_eq!(state.is_loaded(), loaded);
    }

    #[test]
    fn test_batch_summary_counts_phases() {
        let mut summary = BatchSummary::default();
        summary.record(LoadPhase::CachedReady);
        summary.record(LoadPhase::Upgraded);
        summary.record(LoadPhase::Upgraded);
        summary.record(LoadPhase::Probing);

        assert_eq!(summary.cached, 1);
        assert_eq!(summary.upgraded, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(
            summary.to_string(),
            "Images: 1 from cache, 2 upgraded, 0 settled, 0 failed, 1 pending"
        );
    }

    #[tokio::test]
    async fn test_drive_reveals_first_row_after_earlier_scroll() {
        let cache = Arc::new(MembershipCache::new(16));
        let probe = Arc::new(MockImageProbe::new());
        probe.succeed("s.jpg");
        let mut hint = MockConnectionHintPort::new();
        hint.expect_connection_speed()
            .return_const(ConnectionSpeed::FourG);
        let viewport = ViewportObserver::new();
        viewport.set_viewport(Rect::new(0, 2400, VIEWPORT_WIDTH, VIEWPORT_HEIGHT));
        let loader = ProgressiveLoader::new(
            cache,
            probe.clone(),
            Arc::new(viewport.clone()),
            EscalationScheduler::new(SchedulerConfig::default(), Arc::new(hint)),
        );

        let target = ElementId(1);
        viewport.set_bounds(target, Rect::new(0, 0, VIEWPORT_WIDTH, SLOT_HEIGHT));
        let props = ImageProps::new(sources(), "first row");
        let mut images = vec![loader.mount(target, props, LoadCallbacks::new())];
        assert_eq!(images[0].state().phase(), LoadPhase::PlaceholderShown);

        drive_until_settled(&mut images, &viewport, Duration::from_secs(1)).await;

        assert_eq!(images[0].state().phase(), LoadPhase::Upgraded);
        assert_eq!(probe.requests(), vec!["s.jpg".to_string()]);
    }

    #[test]
    fn test_init_config_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::with_dir(dir.path().join("nested"));
        let mut config = AppConfig::default();
        config.media.cache_capacity = 42;
        config.media.connection = Some(ConnectionSpeed::ThreeG);

        run_init_config(&storage, &config).unwrap();

        let loaded = storage.load_config(None).unwrap();
        assert_eq!(loaded.media, config.media);
    }

    #[test]
    fn test_render_rejects_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");

        assert!(run_render(&missing, None, RenderState::Placeholder).is_err());
    }
}
