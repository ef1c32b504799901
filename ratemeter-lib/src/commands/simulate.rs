//! Drive a meter through a simulated run over headless backends.

use super::Host;
use super::common::{LogLevel, SurfaceArg, init_logging};
use crate::config::MeterConfig;
use crate::counter::{BasicCounter, Clock, Counter, ManualClock, SystemClock};
use crate::lifecycle::{LifecycleState, Registry};
use crate::render::SurfaceEvent;
use crate::render::headless::{HeadlessToolkit, RecordingPlot, WidgetHandle};
use crate::{GuiMeter, GuiOptions, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ohno::IntoAppError;
use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

const LOG_TARGET: &str = "   simulate";

#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Surface the meter draws on
    #[arg(long, value_name = "SURFACE", default_value = "plot")]
    pub surface: SurfaceArg,

    /// Total amount of work (omit for an open-ended run)
    #[arg(long, value_name = "COUNT")]
    pub total: Option<u64>,

    /// Number of updates to perform
    #[arg(long, value_name = "COUNT", default_value_t = 100)]
    pub steps: u64,

    /// Amount added to the count by each update
    #[arg(long, value_name = "COUNT", default_value_t = 1)]
    pub increment: u64,

    /// Time between updates
    #[arg(long, value_name = "DURATION", default_value = "50ms")]
    pub step_delay: humantime::Duration,

    /// Advance a simulated clock instead of sleeping
    #[arg(long)]
    pub virtual_time: bool,

    /// Press the widget's Cancel button after this many updates
    #[arg(long, value_name = "STEP")]
    pub cancel_at: Option<u64>,

    /// Report the host event loop as already running
    #[arg(long)]
    pub host_driven: bool,

    /// Description shown with the meter (overrides the configuration)
    #[arg(long, value_name = "TEXT")]
    pub desc: Option<String>,

    /// Path to configuration file (default is `ratemeter.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

/// Runs a simulated meter and prints one JSON snapshot per rendered frame
///
/// A last snapshot is printed after the meter closes.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the surface cannot be created,
/// or a snapshot cannot be serialized
pub async fn simulate<H: Host>(host: &mut H, args: &SimulateArgs) -> Result<()> {
    init_logging(args.log_level);
    simulate_in(host, args, Utf8Path::new(".")).await
}

async fn simulate_in<H: Host>(host: &mut H, args: &SimulateArgs, base_dir: &Utf8Path) -> Result<()> {
    let config = MeterConfig::load(base_dir, args.config.as_deref())?;

    let manual = args.virtual_time.then(|| ManualClock::new(0.0));
    let clock: Arc<dyn Clock> = match &manual {
        Some(clock) => Arc::new(clock.clone()),
        None => Arc::new(SystemClock::new()),
    };

    let counter = BasicCounter::new(args.total, clock)
        .with_desc(args.desc.clone().unwrap_or_else(|| config.desc.clone()))
        .with_unit(config.unit.clone())
        .with_unit_scale(config.unit_scale);

    let cancelled = Rc::new(Cell::new(false));
    let registry = Registry::new();
    let dispatching = Some(args.host_driven);

    let (mut meter, window) = match args.surface {
        SurfaceArg::Plot => {
            let backend = RecordingPlot::new().with_dispatching(dispatching);
            (GuiMeter::plot(counter, GuiOptions::new(config), Box::new(backend), registry), None)
        }
        SurfaceArg::Widget => {
            let flag = Rc::clone(&cancelled);
            let options = GuiOptions::new(config).with_cancel_callback(move || flag.set(true));
            let mut toolkit = HeadlessToolkit::new().with_dispatching(dispatching);
            let meter = GuiMeter::widget(counter, options, &mut toolkit, registry)?;
            (meter, toolkit.last_window())
        }
    };

    if meter.is_disabled() {
        log::info!(target: LOG_TARGET, "Meter is disabled, nothing will be shown");
    }

    let delay = *args.step_delay;
    for step in 1..=args.steps {
        match &manual {
            Some(clock) => clock.advance(delay.as_secs_f64()),
            None => tokio::time::sleep(delay).await,
        }

        if meter.update(args.increment) {
            emit(host, &meter)?;
        }

        if args.cancel_at == Some(step) {
            press_cancel(window.as_ref());
            meter.poll_events();
        }

        if meter.state() == Some(LifecycleState::Closed) {
            break;
        }
    }

    meter.close();
    emit(host, &meter)?;

    if cancelled.get() {
        log::info!(target: LOG_TARGET, "Run cancelled at {}", meter.counter().n());
    } else {
        log::info!(target: LOG_TARGET, "Run finished");
    }

    Ok(())
}

fn press_cancel(window: Option<&WidgetHandle>) {
    match window {
        Some(window) => window.push_event(SurfaceEvent::CancelPressed),
        None => log::warn!(target: LOG_TARGET, "Only widget surfaces have a Cancel button"),
    }
}

fn emit<H: Host>(host: &mut H, meter: &GuiMeter) -> Result<()> {
    if let Some(snapshot) = meter.snapshot() {
        let line = serde_json::to_string(&snapshot).into_app_err("serializing meter snapshot")?;
        let _ = writeln!(host.output(), "{line}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::TestHost;
    use serde_json::Value;

    fn args(surface: SurfaceArg) -> SimulateArgs {
        SimulateArgs {
            surface,
            total: Some(10),
            steps: 10,
            increment: 1,
            step_delay: core::time::Duration::from_millis(200).into(),
            virtual_time: true,
            cancel_at: None,
            host_driven: false,
            desc: None,
            config: None,
            log_level: LogLevel::None,
        }
    }

    fn frames(host: &TestHost) -> Vec<Value> {
        host.output_text()
            .lines()
            .map(|line| serde_json::from_str(line).expect("each line should be JSON"))
            .collect()
    }

    async fn run_in_temp(args: &SimulateArgs) -> TestHost {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let base = Utf8PathBuf::from(temp_dir.path().to_string_lossy().to_string());
        let mut host = TestHost::new();
        simulate_in(&mut host, args, &base).await.expect("simulation should succeed");
        host
    }

    #[tokio::test]
    async fn test_plot_run_is_throttled() {
        let host = run_in_temp(&args(SurfaceArg::Plot)).await;
        let frames = frames(&host);

        // renders at 0.2, 0.8, 1.4 and the final update at 2.0, then the closing frame
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0]["count"], 1);
        assert_eq!(frames[3]["count"], 10);

        let last = frames.last().unwrap();
        assert_eq!(last["state"], "closed");
        assert_eq!(last["surface"], "plot");
        assert_eq!(last["total"], 10);
    }

    #[tokio::test]
    async fn test_widget_cancel_stops_run() {
        let mut args = args(SurfaceArg::Widget);
        args.cancel_at = Some(3);
        let host = run_in_temp(&args).await;
        let frames = frames(&host);

        let last = frames.last().unwrap();
        assert_eq!(last["state"], "closed");
        assert_eq!(last["surface"], "widget");
        assert_eq!(last["count"], 3);
    }

    #[tokio::test]
    async fn test_open_ended_run() {
        let mut args = args(SurfaceArg::Plot);
        args.total = None;
        let host = run_in_temp(&args).await;
        let frames = frames(&host);

        let last = frames.last().unwrap();
        assert_eq!(last["count"], 10);
        assert_eq!(last["total"], Value::Null);
        assert!(last["text"].as_str().unwrap().starts_with("10 ["));
    }

    #[tokio::test]
    async fn test_disabled_prints_nothing() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let base = Utf8PathBuf::from(temp_dir.path().to_string_lossy().to_string());
        std::fs::write(base.join("ratemeter.toml"), "disable = true\n").unwrap();

        let mut host = TestHost::new();
        simulate_in(&mut host, &args(SurfaceArg::Widget), &base).await.unwrap();
        assert!(host.output_text().is_empty());
    }
}
