//! Frame and section timing

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use particle_physics::{PHYSICS_STEPS_PER_SECOND, TARGET_FPS};
use serde::Serialize;

use crate::error::Result;
use crate::exporter::{create, flush};

/// Samples kept per history before the oldest is dropped
pub const MAX_HISTORY: usize = 1000;

/// Fraction of the target frame rate that still counts as on target
const TARGET_TOLERANCE: f32 = 0.9;

/// Aggregate of the recorded samples of one named section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimingStats {
    pub call_count: usize,
    pub average_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub total_ms: f64,
}

impl TimingStats {
    fn from_samples<'a>(samples: impl IntoIterator<Item = &'a f64>) -> Self {
        let mut stats = Self {
            min_ms: f64::INFINITY,
            max_ms: f64::NEG_INFINITY,
            ..Default::default()
        };
        for &ms in samples {
            stats.call_count += 1;
            stats.total_ms += ms;
            stats.min_ms = stats.min_ms.min(ms);
            stats.max_ms = stats.max_ms.max(ms);
        }

        if stats.call_count == 0 {
            return Self::default();
        }
        stats.average_ms = stats.total_ms / stats.call_count as f64;
        stats
    }
}

#[derive(Serialize)]
struct Summary {
    current_fps: f32,
    average_fps: f32,
    target_fps: f32,
    target_met: bool,
    current_particles: usize,
    average_particles: f64,
    physics_steps: u32,
    target_physics_steps: u32,
    last_frame_time_ms: f64,
}

#[derive(Serialize)]
struct ProfileDocument<'a> {
    performance_profile: ProfileBody<'a>,
}

#[derive(Serialize)]
struct ProfileBody<'a> {
    summary: Summary,
    timing_data: BTreeMap<&'a str, TimingStats>,
}

/// Rolling performance samples for the loop driver.
///
/// Observes wall-clock time only; it never touches simulation state.
#[derive(Debug)]
pub struct Profiler {
    start_times: HashMap<String, Instant>,
    timings: BTreeMap<String, VecDeque<f64>>,

    frame_start: Option<Instant>,
    last_frame_ms: f64,
    frame_times: VecDeque<f64>,

    current_fps: f32,
    fps_history: VecDeque<f32>,
    particle_count: usize,
    particle_counts: VecDeque<usize>,
    physics_steps: u32,

    target_fps: f32,
    target_physics_steps: u32,
}

fn push_capped<T>(history: &mut VecDeque<T>, value: T) {
    history.push_back(value);
    while history.len() > MAX_HISTORY {
        history.pop_front();
    }
}

fn average(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            start_times: HashMap::new(),
            timings: BTreeMap::new(),
            frame_start: None,
            last_frame_ms: 0.0,
            frame_times: VecDeque::new(),
            current_fps: 0.0,
            fps_history: VecDeque::new(),
            particle_count: 0,
            particle_counts: VecDeque::new(),
            physics_steps: 0,
            target_fps: TARGET_FPS,
            target_physics_steps: PHYSICS_STEPS_PER_SECOND,
        }
    }

    pub fn set_target_fps(&mut self, target_fps: f32) {
        self.target_fps = target_fps;
    }

    pub fn set_target_physics_steps(&mut self, steps: u32) {
        self.target_physics_steps = steps;
    }

    pub fn start_timer(&mut self, name: &str) {
        self.start_times.insert(name.to_owned(), Instant::now());
    }

    /// Stop a timer started with [`Profiler::start_timer`]. Unknown names are ignored.
    pub fn end_timer(&mut self, name: &str) {
        if let Some(start) = self.start_times.remove(name) {
            self.record(name, start.elapsed());
        }
    }

    /// Add one sample for `name`.
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        let history = self.timings.entry(name.to_owned()).or_default();
        push_capped(history, elapsed.as_secs_f64() * 1000.0);
    }

    /// Time the enclosing scope under `name`.
    pub fn scope<'a>(&'a mut self, name: &'a str) -> ScopedTimer<'a> {
        ScopedTimer {
            profiler: self,
            name,
            start: Instant::now(),
        }
    }

    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    pub fn end_frame(&mut self) {
        if let Some(start) = self.frame_start.take() {
            self.record_frame_time(start.elapsed());
        }
    }

    pub fn record_frame_time(&mut self, elapsed: Duration) {
        self.last_frame_ms = elapsed.as_secs_f64() * 1000.0;
        push_capped(&mut self.frame_times, self.last_frame_ms);
    }

    pub fn update_fps(&mut self, fps: f32) {
        self.current_fps = fps;
        push_capped(&mut self.fps_history, fps);
    }

    pub fn update_particle_count(&mut self, count: usize) {
        self.particle_count = count;
        push_capped(&mut self.particle_counts, count);
    }

    pub fn update_physics_steps(&mut self, steps: u32) {
        self.physics_steps = steps;
    }

    pub fn stats(&self, name: &str) -> TimingStats {
        self.timings
            .get(name)
            .map(|samples| TimingStats::from_samples(samples))
            .unwrap_or_default()
    }

    pub fn current_fps(&self) -> f32 {
        self.current_fps
    }

    pub fn average_fps(&self) -> f32 {
        average(self.fps_history.iter().map(|&fps| f64::from(fps))) as f32
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    pub fn average_particle_count(&self) -> f64 {
        average(self.particle_counts.iter().map(|&count| count as f64))
    }

    pub fn last_frame_ms(&self) -> f64 {
        self.last_frame_ms
    }

    /// Average frame rate reaches 90% of the target.
    pub fn is_target_met(&self) -> bool {
        self.average_fps() >= self.target_fps * TARGET_TOLERANCE
    }

    /// Human-readable summary of all samples.
    pub fn report(&self) -> String {
        self.to_string()
    }

    /// Zero the current values; histories are kept.
    pub fn reset(&mut self) {
        self.current_fps = 0.0;
        self.particle_count = 0;
        self.physics_steps = 0;
        self.last_frame_ms = 0.0;
    }

    pub fn clear_history(&mut self) {
        self.start_times.clear();
        self.timings.clear();
        self.frame_times.clear();
        self.fps_history.clear();
        self.particle_counts.clear();
    }

    /// Write the summary and per-section stats as JSON.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let document = ProfileDocument {
            performance_profile: ProfileBody {
                summary: Summary {
                    current_fps: self.current_fps,
                    average_fps: self.average_fps(),
                    target_fps: self.target_fps,
                    target_met: self.is_target_met(),
                    current_particles: self.particle_count,
                    average_particles: self.average_particle_count(),
                    physics_steps: self.physics_steps,
                    target_physics_steps: self.target_physics_steps,
                    last_frame_time_ms: self.last_frame_ms,
                },
                timing_data: self
                    .timings
                    .iter()
                    .map(|(name, samples)| (name.as_str(), TimingStats::from_samples(samples)))
                    .collect(),
            },
        };

        let mut writer = create(path)?;
        serde_json::to_writer_pretty(&mut writer, &document)?;
        flush(writer, path)
    }
}

impl fmt::Display for Profiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Performance Report ===")?;
        writeln!(f, "Current FPS: {:.1}", self.current_fps)?;
        writeln!(f, "Average FPS: {:.1}", self.average_fps())?;
        writeln!(f, "Target FPS: {:.1}", self.target_fps)?;
        writeln!(
            f,
            "Target Met: {}",
            if self.is_target_met() { "YES" } else { "NO" }
        )?;
        writeln!(f, "Current Particles: {}", self.particle_count)?;
        writeln!(f, "Average Particles: {:.1}", self.average_particle_count())?;
        writeln!(
            f,
            "Physics Steps: {} (target {}/s)",
            self.physics_steps, self.target_physics_steps
        )?;
        writeln!(f, "Last Frame Time: {:.2} ms", self.last_frame_ms)?;

        if !self.frame_times.is_empty() {
            let frames = TimingStats::from_samples(&self.frame_times);
            writeln!(f, "Average Frame Time: {:.2} ms", frames.average_ms)?;
            writeln!(f, "Min Frame Time: {:.2} ms", frames.min_ms)?;
            writeln!(f, "Max Frame Time: {:.2} ms", frames.max_ms)?;
        }

        writeln!(f, "\n=== Timing Breakdown ===")?;
        for (name, samples) in &self.timings {
            let stats = TimingStats::from_samples(samples);
            writeln!(f, "{name}:")?;
            writeln!(f, "  Calls: {}", stats.call_count)?;
            writeln!(f, "  Avg: {:.3} ms", stats.average_ms)?;
            writeln!(f, "  Min: {:.3} ms", stats.min_ms)?;
            writeln!(f, "  Max: {:.3} ms", stats.max_ms)?;
            writeln!(f, "  Total: {:.2} ms", stats.total_ms)?;
        }

        Ok(())
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Records the time between its creation and drop.
pub struct ScopedTimer<'a> {
    profiler: &'a mut Profiler,
    name: &'a str,
    start: Instant,
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        self.profiler.record(self.name, self.start.elapsed());
    }
}
