use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::error::{Error, Result};

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Encoder executable, `ffmpeg` on `PATH` by default.
    pub program: OsString,
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Arguments placed between the raw input and the output path.
    pub output_args: Vec<String>,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            program: OsString::from("ffmpeg"),
            out_path: out_path.into(),
            overwrite: true,
            output_args: ["-an", "-c:v", "libx264", "-pix_fmt", "yuv420p"]
                .map(String::from)
                .to_vec(),
        }
    }

    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Spawns an encoder process and streams raw frames into its stdin.
///
/// The child is always reaped: by `end`, by `abort`, or on drop.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    cfg: Option<SinkConfig>,
    last_index: Option<u64>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_index: None,
        }
    }

    fn command(&self, cfg: &SinkConfig) -> Command {
        let mut cmd = Command::new(&self.opts.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            cfg.pixel_format,
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
        ]);
        cmd.args(&self.opts.output_args);
        cmd.arg(&self.opts.out_path);
        cmd
    }

    fn join_stderr(&mut self) -> String {
        let Some(handle) = self.stderr_drain.take() else {
            return String::new();
        };
        match handle.join() {
            Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).trim().to_string(),
            Ok(Err(e)) => format!("<stderr read failed: {e}>"),
            Err(_) => "<stderr drain thread panicked>".to_string(),
        }
    }

    /// Reaps the child after its stdin broke and describes how it exited.
    fn reap_exited(&mut self) -> String {
        drop(self.stdin.take());
        self.cfg = None;
        let Some(mut child) = self.child.take() else {
            return "encoder was not running".to_string();
        };
        let waited = match child.try_wait() {
            Ok(Some(status)) => Ok(status),
            // Still running with a closed stdin: it will not read further frames.
            _ => {
                let _ = child.kill();
                child.wait()
            }
        };
        let stderr = self.join_stderr();
        match waited {
            Ok(status) => format!("encoder exited with status {status}: {stderr}"),
            Err(e) => format!("failed to reap encoder: {e}: {stderr}"),
        }
    }

    /// Closes stdin, kills the child if it is still running and waits for it.
    fn teardown(&mut self) -> Result<()> {
        drop(self.stdin.take());
        self.cfg = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        // Already exited is fine.
        let _ = child.kill();
        let waited = child.wait();
        let stderr = self.join_stderr();
        let status = waited.map_err(|e| Error::encoder(format!("failed to reap encoder: {e}")))?;
        debug!(%status, stderr = %stderr, "encoder torn down");
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> Result<()> {
        if self.child.is_some() {
            return Err(Error::encoder("encoder already started"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(Error::config("encoder frame size must be non-zero"));
        }
        if cfg.fps == 0 {
            return Err(Error::config("encoder fps must be non-zero"));
        }
        if let Some(parent) = self.opts.out_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(Error::config(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        let mut child = self.command(&cfg).spawn().map_err(|e| {
            Error::encoder(format!(
                "failed to spawn '{}': {e}",
                self.opts.program.to_string_lossy()
            ))
        })?;
        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(mut stderr)) = (stdin, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::encoder("encoder pipes were not opened"));
        };
        self.stderr_drain = Some(std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        }));

        debug!(
            program = %self.opts.program.to_string_lossy(),
            out = %self.opts.out_path.display(),
            pixel_format = cfg.pixel_format,
            width = cfg.width,
            height = cfg.height,
            "spawned encoder"
        );
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.cfg = Some(cfg);
        self.last_index = None;
        Ok(())
    }

    fn push_frame(&mut self, index: u64, bytes: &[u8]) -> Result<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| Error::encoder("encoder not started"))?;
        if let Some(last) = self.last_index {
            if index <= last {
                return Err(Error::encoder(format!(
                    "frame {index} pushed after frame {last}"
                )));
            }
        }
        if bytes.len() != cfg.frame_bytes {
            return Err(Error::encoder(format!(
                "frame {index} has {} bytes, expected {}",
                bytes.len(),
                cfg.frame_bytes
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::encoder("encoder is already finalized"))?;
        if let Err(e) = stdin.write_all(bytes) {
            let exit = self.reap_exited();
            return Err(Error::encoder(format!(
                "failed to write frame {index}: {e}; {exit}"
            )));
        }
        self.last_index = Some(index);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        drop(self.stdin.take());
        self.cfg = None;
        let mut child = self
            .child
            .take()
            .ok_or_else(|| Error::encoder("encoder not started"))?;
        let waited = child.wait();
        let stderr = self.join_stderr();
        let status =
            waited.map_err(|e| Error::encoder(format!("failed to wait for encoder: {e}")))?;
        if !status.success() {
            return Err(Error::encoder(format!(
                "encoder exited with status {status}: {stderr}"
            )));
        }
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        self.teardown()
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            warn!("Encoder dropped while running; killing it.");
            if let Err(e) = self.teardown() {
                warn!("Encoder teardown failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SinkConfig {
        SinkConfig {
            width: 2,
            height: 2,
            fps: 30,
            pixel_format: "gray",
            frame_bytes: 4,
        }
    }

    #[test]
    fn missing_program_is_an_encoder_failure() {
        let opts = FfmpegSinkOpts::new("out.mp4").with_program("definitely-not-an-encoder-7f3a");
        let mut sink = FfmpegSink::new(opts);
        let err = sink.begin(cfg()).expect_err("spawn must fail");
        assert!(matches!(err, Error::EncoderFailure(_)));
    }

    #[test]
    fn frames_before_begin_are_rejected() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("out.mp4"));
        assert!(matches!(
            sink.push_frame(0, &[0; 4]),
            Err(Error::EncoderFailure(_))
        ));
        assert!(sink.end().is_err());
        assert!(sink.abort().is_ok());
    }

    #[test]
    fn zero_fps_is_invalid() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("out.mp4"));
        let bad = SinkConfig { fps: 0, ..cfg() };
        assert!(matches!(
            sink.begin(bad),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn broken_pipe_reports_the_exit_status() {
        let out = std::env::temp_dir().join("proc_tex_false_encoder_unit.mkv");
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(out).with_program("false"));
        let big = SinkConfig {
            width: 512,
            height: 512,
            frame_bytes: 512 * 512,
            ..cfg()
        };
        sink.begin(big).expect("false spawns");
        let err = sink
            .push_frame(0, &vec![0; 512 * 512])
            .expect_err("the pipe must break");
        let msg = match err {
            Error::EncoderFailure(msg) => msg,
            other => panic!("expected an encoder failure, got {other:?}"),
        };
        assert!(msg.contains("failed to write frame 0"), "{msg}");
        assert!(msg.contains("encoder exited with status"), "{msg}");
        // child already reaped
        assert!(sink.child.is_none());
        assert!(sink.abort().is_ok());
    }

    #[test]
    fn command_line_declares_the_raw_input() {
        let sink = FfmpegSink::new(FfmpegSinkOpts::new("clip.mkv").with_output_args(["-c:v", "ffv1"]));
        let cmd = sink.command(&cfg());
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt gray -s 2x2 -r 30 -i pipe:0"));
        assert!(joined.ends_with("-c:v ffv1 clip.mkv"));
        assert_eq!(args[0], "-y");
    }
}
