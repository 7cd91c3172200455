//! FFmpeg-backed engine. Stages files in a private temp directory and runs
//! the ffmpeg/ffprobe binaries against them.
//!
//! One engine owns one staging directory and at most one child process at a
//! time. The active child is kept in a slot so [`FfmpegEngine::terminate`]
//! can kill it from another thread; the staging directory is removed when
//! the engine is dropped.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use parking_lot::Mutex;
use tempfile::TempDir;

use super::discovery::{get_ffmpeg_path, get_ffprobe_path};
use super::{EngineError, TranscodeEngine};
use crate::probe::parse_probe_json;

/// Keep only the last N bytes of stderr to avoid unbounded memory growth.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Interval for polling a probed child against its deadline.
const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Default bounded wait for duration probing.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

struct LoadedState {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    staging: TempDir,
}

pub struct FfmpegEngine {
    loaded: Option<LoadedState>,
    active: Mutex<Option<Child>>,
    probe_timeout: Duration,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self::with_probe_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_probe_timeout(probe_timeout: Duration) -> Self {
        Self {
            loaded: None,
            active: Mutex::new(None),
            probe_timeout,
        }
    }

    fn state(&self) -> Result<&LoadedState, EngineError> {
        self.loaded.as_ref().ok_or(EngineError::NotLoaded)
    }

    /// Virtual names stay inside the staging dir: no separators, no parent
    /// traversal.
    fn staged_path(&self, name: &str) -> Result<PathBuf, EngineError> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(EngineError::BadName(name.to_string()));
        }
        Ok(self.state()?.staging.path().join(name))
    }

    /// Kill the active child process, if any. Safe to call from another
    /// thread; the in-flight `exec` then fails with [`EngineError::Aborted`].
    pub fn terminate(&self) {
        let mut guard = self.active.lock();
        if let Some(mut child) = guard.take() {
            log::info!(
                target: "vidsplit::engine",
                "Terminating FFmpeg process"
            );
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl TranscodeEngine for FfmpegEngine {
    fn load(&mut self) -> Result<(), EngineError> {
        if self.loaded.is_some() {
            return Ok(());
        }
        let ffmpeg = get_ffmpeg_path()?.to_path_buf();
        let ffprobe = get_ffprobe_path()?;
        let staging = tempfile::Builder::new().prefix("vidsplit-").tempdir()?;
        log::debug!(
            target: "vidsplit::engine",
            "Engine loaded: ffmpeg={}, staging={}",
            ffmpeg.display(),
            staging.path().display()
        );
        self.loaded = Some(LoadedState {
            ffmpeg,
            ffprobe,
            staging,
        });
        Ok(())
    }

    fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        let path = self.staged_path(name)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn exec(&self, args: &[String]) -> Result<(), EngineError> {
        let state = self.state()?;
        log::debug!(
            target: "vidsplit::engine",
            "Spawning FFmpeg: args={:?}",
            args
        );

        let mut cmd = Command::new(&state.ffmpeg);
        cmd.args(args)
            .current_dir(state.staging.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        #[cfg(windows)]
        cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW

        // Spawn under the lock so a concurrent terminate cannot observe an
        // empty slot while the process is already running.
        let stderr = {
            let mut guard = self.active.lock();
            let mut child = cmd.spawn()?;
            match child.stderr.take() {
                Some(stderr) => {
                    *guard = Some(child);
                    stderr
                }
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(EngineError::failed(-1, "Failed to capture stderr"));
                }
            }
        };

        let stderr_bytes = read_tail(stderr, MAX_STDERR_BYTES);

        let child = self.active.lock().take();
        let status = match child {
            Some(mut c) => c.wait()?,
            None => {
                log::warn!(
                    target: "vidsplit::engine",
                    "FFmpeg process was aborted (terminated externally)"
                );
                return Err(EngineError::Aborted);
            }
        };

        if status.success() {
            Ok(())
        } else {
            let code = status.code().unwrap_or(-1);
            let stderr_str = String::from_utf8_lossy(&stderr_bytes).to_string();
            let err_preview = stderr_str.lines().rev().take(3).collect::<Vec<_>>().join("; ");
            log::error!(
                target: "vidsplit::engine",
                "FFmpeg failed (code={}): {}",
                code,
                err_preview
            );
            Err(EngineError::Failed {
                code,
                stderr: stderr_str,
            })
        }
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        let path = self.staged_path(name)?;
        Ok(std::fs::read(path)?)
    }

    fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        let path = self.staged_path(name)?;
        std::fs::remove_file(path)?;
        Ok(())
    }

    fn probe_duration(&self, name: &str) -> Result<f64, EngineError> {
        let state = self.state()?;
        let path = self.staged_path(name)?;

        let mut cmd = Command::new(&state.ffprobe);
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(&path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
        #[cfg(windows)]
        cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
        let mut child = cmd.spawn()?;

        let stdout = match child.stdout.take() {
            Some(s) => s,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EngineError::Probe("failed to capture stdout".to_string()));
            }
        };
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = std::io::BufReader::new(stdout).read_to_end(&mut buf);
            buf
        });

        let deadline = Instant::now() + self.probe_timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    log::warn!(
                        target: "vidsplit::engine",
                        "ffprobe exceeded {}s deadline for {}, killing",
                        self.probe_timeout.as_secs(),
                        name
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    // Do not join the reader here: a grandchild can keep the
                    // pipe's write end open past the kill, and the join would
                    // block for as long as it lives. The thread exits on its
                    // own at pipe EOF.
                    drop(reader);
                    return Err(EngineError::Timeout(self.probe_timeout.as_secs()));
                }
                None => thread::sleep(PROBE_POLL_INTERVAL),
            }
        };

        let json_bytes = reader.join().unwrap_or_default();
        if !status.success() {
            return Err(EngineError::failed(
                status.code().unwrap_or(-1),
                "ffprobe exited with an error",
            ));
        }

        let json = String::from_utf8_lossy(&json_bytes);
        let info = parse_probe_json(&json)?;
        log::debug!(
            target: "vidsplit::engine",
            "Probed {}: duration={:.3}s, format={:?}",
            name,
            info.duration,
            info.format_name
        );
        Ok(info.duration)
    }
}

fn read_tail<R: Read>(mut reader: R, cap: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.len() > cap {
                    let excess = buf.len() - cap;
                    buf.drain(..excess);
                }
            }
            Err(_) => break,
        }
    }
    buf
}
