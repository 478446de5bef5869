use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use strata::{
    Engine, MemorySink, Rect, ResolvedStroke, ShowcaseDef, Stage, install,
};

#[derive(Parser, Debug)]
#[command(name = "strata", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a showcase JSON file.
    Validate(ValidateArgs),
    /// Drive a showcase through a simulated scroll sweep and print each
    /// tick's write batch as a JSON line.
    Sweep(SweepArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input showcase JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SweepArgs {
    /// Input showcase JSON; the built-in showcase when omitted.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Number of ticks in the sweep.
    #[arg(long, default_value_t = 120)]
    ticks: u32,

    /// Scroll offset at the first tick.
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Scroll offset at the last tick; document end when omitted.
    #[arg(long)]
    to: Option<f64>,

    /// Simulated viewport height in pixels.
    #[arg(long, default_value_t = 900.0)]
    viewport: f64,

    /// Simulated display refresh rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Sweep(args) => cmd_sweep(args),
    }
}

fn read_showcase(path: &PathBuf) -> anyhow::Result<ShowcaseDef> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("open showcase '{}'", path.display()))?;
    Ok(ShowcaseDef::from_json(&text)?)
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let def = read_showcase(&args.in_path)?;
    def.validate()?;

    let regions: usize = def.sections.iter().map(|s| s.regions.len()).sum();
    let layers: usize = def.sections.iter().map(|s| s.layers.len()).sum();
    eprintln!(
        "ok: {} sections, {} regions, {} layers",
        def.sections.len(),
        regions,
        layers
    );
    Ok(())
}

fn cmd_sweep(args: SweepArgs) -> anyhow::Result<()> {
    let def = match &args.in_path {
        Some(path) => read_showcase(path)?,
        None => ShowcaseDef::builtin(),
    };

    let stage = SimStage::new(args.viewport);
    let mut engine = Engine::new();
    engine.start(&stage)?;
    let report = install(&def, &mut engine, &stage)?;
    eprintln!(
        "installed {} regions, {} bindings ({} skipped)",
        report.regions_installed,
        report.bindings_installed,
        report.skipped_layers.len()
    );

    let ticks = args.ticks.max(2);
    let to = args.to.unwrap_or(stage.max_scroll());
    let mut sink = MemorySink::new();
    for i in 0..ticks {
        let t = f64::from(i) / f64::from(ticks - 1);
        let offset = args.from + (to - args.from) * t;
        stage.set_scroll(offset);
        engine.on_scroll();

        let elapsed = f64::from(i) / args.fps.max(1.0);
        engine.tick(&stage, &mut sink, elapsed);

        let line = serde_json::json!({
            "tick": i,
            "scroll_offset": offset,
            "writes": sink.last_batch(),
        });
        println!("{line}");
    }

    Ok(())
}

/// Synthetic document for headless sweeps: the showcase's six sections
/// stacked one viewport tall each, with content anchors, stroke styles and a
/// 30-second video.
struct SimStage {
    viewport_h: f64,
    scroll: std::cell::Cell<f64>,
    anchors: BTreeMap<String, Rect>,
    strokes: BTreeMap<String, ResolvedStroke>,
    durations: BTreeMap<String, f64>,
}

impl SimStage {
    fn new(viewport_h: f64) -> Self {
        let vh = viewport_h;
        let mut anchors = BTreeMap::new();
        let mut band = |name: &str, index: f64| {
            anchors.insert(
                name.to_owned(),
                Rect::new(0.0, index * vh, 0.0, (index + 1.0) * vh),
            );
        };
        band("hero", 0.0);
        band("layers", 1.0);
        band("depth", 2.0);
        band("speed", 3.0);
        band("advanced", 4.0);
        band("video-section", 5.0);

        for n in 0..4 {
            let top = vh + (0.2 + 0.15 * f64::from(n)) * vh;
            anchors.insert(
                format!("layer-card-{}-content", n + 1),
                Rect::new(0.0, top, 0.0, top + 0.1 * vh),
            );
        }
        let depth_top = 2.0 * vh + 0.6 * vh;
        anchors.insert(
            "depth-content".to_owned(),
            Rect::new(0.0, depth_top, 0.0, depth_top + 0.2 * vh),
        );

        let mut strokes = BTreeMap::new();
        for (path, color, width) in [
            ("advanced-path-1", "#ff6600", 2.0),
            ("advanced-path-2", "rgb(0, 200, 255)", 2.0),
            ("advanced-path-3", "#aa00ff", 3.0),
        ] {
            strokes.insert(
                path.to_owned(),
                ResolvedStroke {
                    color: color.to_owned(),
                    width_px: width,
                },
            );
        }

        let mut durations = BTreeMap::new();
        durations.insert("scroll-video".to_owned(), 30.0);

        Self {
            viewport_h,
            scroll: std::cell::Cell::new(0.0),
            anchors,
            strokes,
            durations,
        }
    }

    fn set_scroll(&self, offset: f64) {
        self.scroll.set(offset);
    }

    fn max_scroll(&self) -> f64 {
        // Six stacked sections minus one viewport.
        5.0 * self.viewport_h
    }
}

impl Stage for SimStage {
    fn scroll_offset(&self) -> f64 {
        self.scroll.get()
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_h
    }

    fn anchor_rect(&self, anchor: &str) -> Option<Rect> {
        self.anchors.get(anchor).copied()
    }

    fn target_exists(&self, _layer: &str) -> bool {
        true
    }

    fn resolved_stroke(&self, layer: &str) -> Option<ResolvedStroke> {
        self.strokes.get(layer).cloned()
    }

    fn media_duration_secs(&self, layer: &str) -> Option<f64> {
        self.durations.get(layer).copied()
    }
}
