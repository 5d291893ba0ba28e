use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use circle_engine::session::{PointerButton, ScoreOutcome, Session, SessionConfig};
use circle_engine::target::Viewport;
use circle_raster::{Circle, CompositeOp, Surface};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Headless host that traces synthetic circles and scores them.
#[derive(Parser, Debug)]
#[command(
    about = "Simulates freehand circle attempts and reports their accuracy scores",
    version
)]
struct Args {
    /// Viewport width in pixels
    #[arg(long, default_value_t = 1000)]
    width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// RNG seed for reproducible targets and traces
    #[arg(long)]
    seed: Option<u64>,

    /// Tolerance multiplier applied to the score baseline
    #[arg(long, default_value_t = 1.0)]
    allowance: f64,

    /// Number of simulated attempts to run
    #[arg(long, default_value_t = 3)]
    attempts: usize,

    /// Radial noise amplitude of the synthetic trace, in pixels
    #[arg(long, default_value_t = 6.0)]
    wobble: f32,

    /// Number of samples in each synthetic trace
    #[arg(long, default_value_t = 128)]
    segments: usize,

    /// Path to write the session report as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Path to write the last attempt's diff image as PNG
    #[arg(long)]
    diff_png: Option<PathBuf>,

    /// Path to write a preview of the last attempt (target plus stroke) as PNG
    #[arg(long)]
    trace_png: Option<PathBuf>,

    /// Print the overlap breakdown for every attempt
    #[arg(long)]
    verbose: bool,
}

#[derive(Serialize)]
struct AttemptSummary {
    index: usize,
    score: f64,
    inner: usize,
    outer: usize,
    total: usize,
    samples: usize,
    target: Circle,
}

#[derive(Serialize)]
struct SessionReport<'a> {
    viewport: Viewport,
    allowance: f64,
    attempts: &'a [AttemptSummary],
    best_score: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let viewport = Viewport {
        width: args.width,
        height: args.height,
    };
    let mut session = Session::new(
        viewport,
        SessionConfig {
            allowance: args.allowance,
            seed: args.seed,
            ..SessionConfig::default()
        },
    )
    .context("opening scoring session")?;

    let mut trace_rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_os_rng(),
    };

    let mut summaries = Vec::with_capacity(args.attempts);
    for index in 0..args.attempts {
        let target = session.current_target();
        let outcome = run_attempt(&mut session, &mut trace_rng, &args)?;

        println!(
            "Attempt {:>2}: score {:>6.2} | target r={:>3.0}px | {} samples",
            index + 1,
            outcome.score,
            target.radius,
            args.segments
        );
        if args.verbose {
            println!(
                "            drawn outside target: {:>6}px | target left uncovered: {:>6}px | total {:>6}px",
                outcome.counts.inner, outcome.counts.outer, outcome.counts.total
            );
        }

        summaries.push(AttemptSummary {
            index: index + 1,
            score: outcome.score,
            inner: outcome.counts.inner,
            outer: outcome.counts.outer,
            total: outcome.counts.total,
            samples: args.segments,
            target,
        });

        session.restart().context("restarting after attempt")?;
    }

    // exports cover the final attempt; restart keeps last/best intact
    if let Some(path) = args.diff_png.as_ref() {
        let attempt = session.last_attempt().context("no attempt to export")?;
        attempt
            .diff_image
            .save_png(path)
            .context("saving diff image")?;
        println!("Saved diff image to {}", path.display());
    }
    if let Some(path) = args.trace_png.as_ref() {
        save_trace_preview(&session, path)?;
        println!("Saved trace preview to {}", path.display());
    }

    match session.best_attempt() {
        Some(best) => println!(
            "\nBest score: {:.2} (target r={:.0}px, {} mismatch pixels)",
            best.score, best.target.radius, best.counts.total
        ),
        None => println!("\nNo attempt scored above zero."),
    }

    if let Some(path) = args.report_json.as_ref() {
        let report = SessionReport {
            viewport,
            allowance: args.allowance,
            attempts: &summaries,
            best_score: session.best_attempt().map(|a| a.score),
        };
        let json =
            serde_json::to_string_pretty(&report).context("serializing session report to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing session report to {}", path.display()))?;
        println!("Saved session report to {}", path.display());
    }

    Ok(())
}

/// Drive one attempt through the pointer interface: a polygonal trace of
/// the current target with radial noise, like a steady but imperfect hand.
fn run_attempt(session: &mut Session, rng: &mut StdRng, args: &Args) -> Result<ScoreOutcome> {
    let target = session.current_target();
    session.pointer_down(PointerButton::Primary)?;
    for i in 0..args.segments {
        let angle = i as f32 / args.segments as f32 * std::f32::consts::TAU;
        let jitter = if args.wobble > 0.0 {
            rng.random_range(-args.wobble..=args.wobble)
        } else {
            0.0
        };
        let radius = (target.radius + jitter).max(1.0);
        session.pointer_move(target.x + radius * angle.cos(), target.y + radius * angle.sin());
    }
    session
        .pointer_up(PointerButton::Primary)?
        .context("primary pointer release must produce a score")
}

/// Render the "what you drew" preview: the target as a light filled disc
/// with the recorded stroke outlined on top.
fn save_trace_preview(session: &Session, path: &Path) -> Result<()> {
    let attempt = session.last_attempt().context("attempt just recorded")?;
    let viewport = session.viewport();
    let mut preview = Surface::new(viewport.width, viewport.height)?;
    preview.fill_circle(&attempt.target, [0xDD, 0xDD, 0xDD, 0xFF], CompositeOp::Over);
    let line_width = (viewport.height as f32 / 335.0).max(1.0);
    preview.stroke_closed_path(&attempt.stroke, [0x00, 0x00, 0x00, 0xFF], line_width);
    preview.save_png(path).context("saving trace preview")
}
