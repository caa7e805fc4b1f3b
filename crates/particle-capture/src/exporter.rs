//! Periodic JSON snapshots of the particle state
//!
//! Output layout:
//!
//! ```json
//! {
//!   "simulation_data": {
//!     "metadata": { "total_frames": 2, "start_time": 0.0, "end_time": 1.0,
//!                   "duration": 1.0, "data_rate_mb_per_hour": 1.5 },
//!     "custom_data": { "seed": "42" },
//!     "frames": [
//!       { "timestamp": 0.0, "frame_number": 0, "fps": 60.0, "particle_count": 1,
//!         "particles": [ { "position": [0.0, 0.0], "velocity": [0.0, 0.0],
//!                          "acceleration": [0.0, -9.81], "mass": 1.0, "radius": 5.0 } ] }
//!     ]
//!   }
//! }
//! ```
//!
//! `custom_data` is omitted when empty.

use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use particle_physics::Particle;
use particle_simulation::ParticleSystem;
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, Result};

/// Frames kept before the oldest is evicted
pub const DEFAULT_MAX_FRAMES: usize = 1000;

/// Estimated serialized size of a frame without particles, in bytes
const FRAME_OVERHEAD_BYTES: usize = 200;
/// Estimated serialized size of one particle record, in bytes
const PARTICLE_BYTES: usize = 150;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    /// Acceleration of the last integration commit
    pub acceleration: [f32; 2],
    pub mass: f32,
    pub radius: f32,
}

impl From<&Particle> for ParticleRecord {
    fn from(particle: &Particle) -> Self {
        Self {
            position: particle.position.to_array(),
            velocity: particle.velocity.to_array(),
            acceleration: particle.acceleration().to_array(),
            mass: particle.mass(),
            radius: particle.radius(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub timestamp: f64,
    pub frame_number: u64,
    pub fps: f32,
    pub particle_count: usize,
    pub particles: Vec<ParticleRecord>,
}

impl FrameRecord {
    fn estimated_size(&self) -> usize {
        FRAME_OVERHEAD_BYTES + self.particles.len() * PARTICLE_BYTES
    }
}

#[derive(Serialize)]
struct Metadata {
    total_frames: usize,
    start_time: f64,
    end_time: f64,
    duration: f64,
    data_rate_mb_per_hour: f64,
}

#[derive(Serialize)]
struct SimulationData<'a> {
    metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_data: Option<&'a BTreeMap<String, String>>,
    frames: &'a VecDeque<FrameRecord>,
}

#[derive(Serialize)]
struct Document<'a> {
    simulation_data: SimulationData<'a>,
}

#[derive(Serialize)]
struct CurrentFrame<'a> {
    current_frame: &'a FrameRecord,
}

/// Bounded history of captured frames plus free-form metadata.
#[derive(Debug)]
pub struct JsonExporter {
    frames: VecDeque<FrameRecord>,
    custom_data: BTreeMap<String, String>,
    max_frames: usize,
    export_on_drop: Option<PathBuf>,
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::with_max_frames(DEFAULT_MAX_FRAMES)
    }

    /// Exporter keeping at most `max_frames` frames (at least one).
    pub fn with_max_frames(max_frames: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            custom_data: BTreeMap::new(),
            max_frames: max_frames.max(1),
            export_on_drop: None,
        }
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Change the history limit, evicting the oldest frames if needed.
    pub fn set_max_frames(&mut self, max_frames: usize) {
        self.max_frames = max_frames.max(1);
        self.evict();
    }

    /// Write everything to `path` when the exporter is dropped.
    pub fn set_export_on_drop(&mut self, path: Option<PathBuf>) {
        self.export_on_drop = path;
    }

    /// Snapshot the committed state of `system`.
    pub fn capture_frame(
        &mut self,
        system: &ParticleSystem,
        timestamp: f64,
        frame_number: u64,
        fps: f32,
    ) {
        let particles: Vec<ParticleRecord> = system.iter().map(ParticleRecord::from).collect();

        self.frames.push_back(FrameRecord {
            timestamp,
            frame_number,
            fps,
            particle_count: particles.len(),
            particles,
        });
        self.evict();
    }

    pub fn add_custom_data(&mut self, key: impl Into<String>, value: impl ToString) {
        self.custom_data.insert(key.into(), value.to_string());
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> impl Iterator<Item = &FrameRecord> {
        self.frames.iter()
    }

    pub fn latest_frame(&self) -> Option<&FrameRecord> {
        self.frames.back()
    }

    /// Drop all frames and metadata.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.custom_data.clear();
    }

    /// Estimated JSON size of the captured frames in bytes.
    pub fn total_data_size(&self) -> usize {
        self.frames.iter().map(FrameRecord::estimated_size).sum()
    }

    /// Estimated output growth in MB per hour of simulated time.
    ///
    /// Zero until at least two frames spanning a positive duration exist.
    pub fn data_rate_mb_per_hour(&self) -> f64 {
        if self.frames.len() < 2 {
            return 0.0;
        }

        let hours = self.duration() / 3600.0;
        if hours <= 0.0 {
            return 0.0;
        }

        self.total_data_size() as f64 / BYTES_PER_MB / hours
    }

    fn start_time(&self) -> f64 {
        self.frames.front().map_or(0.0, |f| f.timestamp)
    }

    fn end_time(&self) -> f64 {
        self.frames.back().map_or(0.0, |f| f.timestamp)
    }

    fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    fn evict(&mut self) {
        while self.frames.len() > self.max_frames {
            self.frames.pop_front();
        }
    }

    fn document(&self) -> Document<'_> {
        Document {
            simulation_data: SimulationData {
                metadata: Metadata {
                    total_frames: self.frames.len(),
                    start_time: self.start_time(),
                    end_time: self.end_time(),
                    duration: self.duration(),
                    data_rate_mb_per_hour: self.data_rate_mb_per_hour(),
                },
                custom_data: (!self.custom_data.is_empty()).then_some(&self.custom_data),
                frames: &self.frames,
            },
        }
    }

    /// Serialize the whole history as pretty-printed JSON.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.document())?;
        Ok(())
    }

    /// Write the whole history to `path`.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = create(path)?;
        self.write_to(&mut writer)?;
        flush(writer, path)?;

        log::info!(
            "Exported {} frames to {} ({:.3} MB/hour)",
            self.frames.len(),
            path.display(),
            self.data_rate_mb_per_hour()
        );
        Ok(())
    }

    /// Write only the most recent frame to `path`.
    pub fn export_current_frame(&self, path: impl AsRef<Path>) -> Result<()> {
        let frame = self.frames.back().ok_or(CaptureError::NoFrames)?;
        let path = path.as_ref();

        let mut writer = create(path)?;
        serde_json::to_writer_pretty(
            &mut writer,
            &CurrentFrame {
                current_frame: frame,
            },
        )?;
        flush(writer, path)
    }
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JsonExporter {
    fn drop(&mut self) {
        let Some(path) = self.export_on_drop.take() else {
            return;
        };
        if self.frames.is_empty() {
            return;
        }
        if let Err(e) = self.export_to_file(&path) {
            log::warn!("export on drop to {} failed: {}", path.display(), e);
        }
    }
}

pub(crate) fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| CaptureError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Flush explicitly so write errors surface instead of being lost on drop.
pub(crate) fn flush(mut writer: BufWriter<File>, path: &Path) -> Result<()> {
    writer.flush().map_err(|source| CaptureError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn system_of(n: usize) -> ParticleSystem {
        (0..n)
            .map(|i| Particle::new(Vec2::new(i as f32, 0.0), 1.0 + i as f32).unwrap())
            .collect()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("particle-capture-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_capture_records_particle_fields() {
        let mut system = system_of(1);
        let mut forces = system.force_accumulator();
        forces.apply_acceleration(0, Vec2::new(0.0, -2.0));
        system.advance(forces, 0.5);

        let mut exporter = JsonExporter::new();
        exporter.capture_frame(&system, 0.5, 1, 60.0);

        let frame = exporter.latest_frame().unwrap();
        assert_eq!(frame.frame_number, 1);
        assert_eq!(frame.particle_count, 1);
        assert_eq!(
            frame.particles[0],
            ParticleRecord {
                position: [0.0, -0.5],
                velocity: [0.0, -1.0],
                acceleration: [0.0, -2.0],
                mass: 1.0,
                radius: 5.0,
            }
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let system = system_of(2);
        let mut exporter = JsonExporter::with_max_frames(3);

        for frame in 0..5u64 {
            exporter.capture_frame(&system, frame as f64, frame, 60.0);
        }

        assert_eq!(exporter.frame_count(), 3);
        let numbers: Vec<u64> = exporter.frames().map(|f| f.frame_number).collect();
        assert_eq!(numbers, vec![2, 3, 4]);

        exporter.set_max_frames(1);
        assert_eq!(exporter.frame_count(), 1);
        assert_eq!(exporter.latest_frame().unwrap().frame_number, 4);
    }

    #[test]
    fn test_data_size_and_rate() {
        let system = system_of(10);
        let mut exporter = JsonExporter::new();
        assert_eq!(exporter.data_rate_mb_per_hour(), 0.0);

        exporter.capture_frame(&system, 0.0, 0, 60.0);
        assert_eq!(exporter.total_data_size(), 200 + 10 * 150);
        assert_eq!(exporter.data_rate_mb_per_hour(), 0.0);

        exporter.capture_frame(&system, 3600.0, 1, 60.0);
        let expected = 2.0 * 1700.0 / (1024.0 * 1024.0);
        assert_relative_eq!(exporter.data_rate_mb_per_hour(), expected);
    }

    #[test]
    fn test_document_layout() {
        let system = system_of(2);
        let mut exporter = JsonExporter::new();

        let mut buffer = Vec::new();
        exporter.write_to(&mut buffer).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert!(json["simulation_data"].get("custom_data").is_none());
        assert_eq!(json["simulation_data"]["metadata"]["total_frames"], 0);

        exporter.add_custom_data("seed", 42);
        exporter.capture_frame(&system, 1.0, 10, 59.5);
        exporter.capture_frame(&system, 2.5, 11, 60.5);

        let mut buffer = Vec::new();
        exporter.write_to(&mut buffer).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let data = &json["simulation_data"];

        assert_eq!(data["custom_data"]["seed"], "42");
        assert_eq!(data["metadata"]["total_frames"], 2);
        assert_eq!(data["metadata"]["duration"], 1.5);
        assert_eq!(data["frames"][1]["frame_number"], 11);
        assert_eq!(data["frames"][0]["particles"][1]["mass"], 2.0);
    }

    #[test]
    fn test_export_files() {
        let system = system_of(3);
        let mut exporter = JsonExporter::new();

        let current = temp_path("current.json");
        assert!(matches!(
            exporter.export_current_frame(&current),
            Err(CaptureError::NoFrames)
        ));

        exporter.capture_frame(&system, 0.0, 7, 60.0);

        let full = temp_path("full.json");
        exporter.export_to_file(&full).unwrap();
        exporter.export_current_frame(&current).unwrap();

        let text = std::fs::read_to_string(&current).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        let frame: FrameRecord = serde_json::from_value(json["current_frame"].clone()).unwrap();
        assert_eq!(&frame, exporter.latest_frame().unwrap());

        assert!(std::fs::metadata(&full).unwrap().len() > 0);
        std::fs::remove_file(full).ok();
        std::fs::remove_file(current).ok();
    }

    #[test]
    fn test_export_on_drop() {
        let path = temp_path("drop.json");
        {
            let mut exporter = JsonExporter::new();
            exporter.set_export_on_drop(Some(path.clone()));
            exporter.capture_frame(&system_of(1), 0.0, 0, 60.0);
        }
        assert!(path.exists());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_unwritable_path_reports_io_error() {
        let mut exporter = JsonExporter::new();
        exporter.capture_frame(&system_of(1), 0.0, 0, 60.0);

        let bad = temp_path("missing-dir").join("out.json");
        let err = exporter.export_to_file(&bad).unwrap_err();
        assert!(matches!(err, CaptureError::Io { .. }));
        assert!(err.to_string().contains("out.json"));
    }
}
