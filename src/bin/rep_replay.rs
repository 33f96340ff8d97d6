use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing_subscriber::EnvFilter;

use lunge_counter::config::Config;
use lunge_counter::counter::{ExerciseRepCounter, FrameStatus, RepCounterHost};
use lunge_counter::pose::PoseFrame;

const CONFIG_PATH: &str = "config.toml";

/// 標準出力に通知を流すホスト
struct ConsoleHost {
    reps: u32,
    frame: usize,
    verbose: bool,
}

impl RepCounterHost for ConsoleHost {
    fn increment_rep_count(&mut self) {
        self.reps += 1;
        println!("[{:>6}] REP {}", self.frame, self.reps);
    }

    fn send_progress_update(&mut self, progress: f32) {
        if self.verbose {
            println!("[{:>6}] progress {:.3}", self.frame, progress);
        }
    }

    fn send_feedback_message(&mut self, _message: &str) {}
}

struct Args {
    frames_path: String,
    config_path: String,
    verbose: bool,
}

fn parse_args() -> Result<Args> {
    // Usage: rep_replay <frames.jsonl> [--config config.toml] [-v]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut frames_path = None;
    let mut config_path = CONFIG_PATH.to_string();
    let mut verbose = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                config_path = iter.next().context("--config needs a path")?;
            }
            "-v" | "--verbose" => verbose = true,
            _ if frames_path.is_none() => frames_path = Some(arg),
            _ => bail!("unexpected argument: {}", arg),
        }
    }

    let Some(frames_path) = frames_path else {
        bail!("usage: rep_replay <frames.jsonl> [--config config.toml] [-v]");
    };
    Ok(Args {
        frames_path,
        config_path,
        verbose,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = parse_args()?;
    let config = Config::load_or_default(&args.config_path);

    println!("Lunge Rep Replay ({})", env!("GIT_VERSION"));
    println!("Frames: {}", args.frames_path);
    println!(
        "Counter: frequency={}, window={}, knee_divisor={}, arm={}",
        config.counter.frequency,
        config.counter.window(),
        config.counter.knee_divisor,
        config.counter.arm_threshold
    );
    println!();

    let file = File::open(&args.frames_path)
        .with_context(|| format!("failed to open {}", args.frames_path))?;
    let host = ConsoleHost {
        reps: 0,
        frame: 0,
        verbose: args.verbose,
    };
    let mut counter = ExerciseRepCounter::from_config(&config, host)?;

    let mut frames = 0usize;
    let mut skipped = 0usize;
    let mut absent = 0usize;
    let mut last = None;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: PoseFrame = serde_json::from_str(&line)
            .with_context(|| format!("invalid frame at line {}", line_no + 1))?;

        frames += 1;
        counter.host_mut().frame = frames;
        let output = counter.set_results(&frame);
        match output.status {
            FrameStatus::NoHuman => absent += 1,
            FrameStatus::Skipped => skipped += 1,
            FrameStatus::Tracked => {}
        }
        last = Some(output);
    }

    println!();
    println!("Frames: {} (no human: {}, skipped: {})", frames, absent, skipped);
    println!("Reps (session): {}", counter.session().count());
    println!("Reps (host):    {}", counter.host().reps);
    if let Some(out) = last {
        println!("Last: progress {:.3}, live {:.3}", out.progress, out.live_progress);
        if let Some(similarity) = out.similarity {
            println!("Template cosine: {}", similarity);
        }
    }
    if config.similarity.enabled {
        match counter.session().dtw_distance() {
            Some(distance) => println!("Template DTW:    {:.4}", distance),
            None => println!("Template DTW:    n/a"),
        }
    }
    Ok(())
}
