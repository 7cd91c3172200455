#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use vidsplit::{EngineError, TranscodeEngine};

/// Scripted in-memory engine for pipeline tests. Files live in a map;
/// `exec` fabricates segment bytes from the output name, and failures are
/// injected per exec-call ordinal.
pub struct MockEngine {
    pub duration: f64,
    /// 1-based exec call ordinals that fail with an engine error.
    pub fail_exec_calls: Vec<usize>,
    pub probe_failure: Option<String>,
    pub probe_times_out: bool,
    loaded: bool,
    files: RefCell<HashMap<String, Vec<u8>>>,
    exec_count: Cell<usize>,
    exec_log: RefCell<Vec<Vec<String>>>,
    probe_count: Cell<usize>,
}

impl MockEngine {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration,
            fail_exec_calls: Vec::new(),
            probe_failure: None,
            probe_times_out: false,
            loaded: false,
            files: RefCell::new(HashMap::new()),
            exec_count: Cell::new(0),
            exec_log: RefCell::new(Vec::new()),
            probe_count: Cell::new(0),
        }
    }

    pub fn loaded(duration: f64) -> Self {
        let mut engine = Self::with_duration(duration);
        engine
            .load()
            .unwrap_or_else(|e| panic!("mock load cannot fail: {e}"));
        engine
    }

    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn exec_args(&self) -> Vec<Vec<String>> {
        self.exec_log.borrow().clone()
    }

    pub fn exec_calls(&self) -> usize {
        self.exec_count.get()
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_count.get()
    }

    fn require_loaded(&self) -> Result<(), EngineError> {
        if self.loaded {
            Ok(())
        } else {
            Err(EngineError::NotLoaded)
        }
    }

    fn missing(name: &str) -> EngineError {
        EngineError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no such engine file: {name}"),
        ))
    }
}

impl TranscodeEngine for MockEngine {
    fn load(&mut self) -> Result<(), EngineError> {
        self.loaded = true;
        Ok(())
    }

    fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        self.require_loaded()?;
        self.files
            .borrow_mut()
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn exec(&self, args: &[String]) -> Result<(), EngineError> {
        self.require_loaded()?;
        let call = self.exec_count.get() + 1;
        self.exec_count.set(call);
        self.exec_log.borrow_mut().push(args.to_vec());

        if self.fail_exec_calls.contains(&call) {
            return Err(EngineError::failed(1, "simulated engine failure"));
        }

        let input = args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| args.get(i + 1))
            .ok_or_else(|| EngineError::failed(1, "no input argument"))?;
        if !self.files.borrow().contains_key(input.as_str()) {
            return Err(EngineError::failed(1, format!("missing input: {input}")));
        }
        let output = args
            .last()
            .ok_or_else(|| EngineError::failed(1, "no output argument"))?;
        self.files
            .borrow_mut()
            .insert(output.clone(), format!("segment:{output}").into_bytes());
        Ok(())
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.require_loaded()?;
        self.files
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| Self::missing(name))
    }

    fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        self.require_loaded()?;
        self.files
            .borrow_mut()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::missing(name))
    }

    fn probe_duration(&self, name: &str) -> Result<f64, EngineError> {
        self.require_loaded()?;
        self.probe_count.set(self.probe_count.get() + 1);
        if self.probe_times_out {
            return Err(EngineError::Timeout(5));
        }
        if let Some(reason) = &self.probe_failure {
            return Err(EngineError::Probe(reason.clone()));
        }
        if !self.files.borrow().contains_key(name) {
            return Err(Self::missing(name));
        }
        Ok(self.duration)
    }
}

/// Tempdir plus a resolved ffmpeg binary for tests that drive the real
/// engine. `try_new` returns None when ffmpeg is not installed so those
/// tests can skip instead of failing.
pub struct IntegrationEnv {
    pub ffmpeg: PathBuf,
    dir: tempfile::TempDir,
}

impl IntegrationEnv {
    pub fn try_new() -> Option<Self> {
        let ffmpeg = vidsplit::engine::discovery::get_ffmpeg_path()
            .ok()?
            .to_path_buf();
        let dir = tempfile::tempdir().ok()?;
        Some(Self { ffmpeg, dir })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Generate a synthetic clip with lavfi testsrc.
    pub fn create_test_video(&self, name: &str, duration_secs: f32) -> PathBuf {
        let output_path = self.path(name);
        let status = create_test_video(&self.ffmpeg, &output_path, duration_secs)
            .expect("failed to spawn ffmpeg for test video");
        assert!(status.success(), "ffmpeg failed to create test video");
        output_path
    }
}

fn create_test_video(
    ffmpeg: &Path,
    output_path: &Path,
    duration_secs: f32,
) -> std::io::Result<std::process::ExitStatus> {
    Command::new(ffmpeg)
        .args([
            "-loglevel",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={}:size=320x240:rate=30", duration_secs),
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            output_path.to_string_lossy().as_ref(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
}
