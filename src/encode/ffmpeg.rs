use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context as _, anyhow};

use crate::assets::source::decode_frames;
use crate::config::{ComposeOptions, EncodeOptions};
use crate::encode::meme::MemeFormat;
use crate::encode::writer::encode_meme;
use crate::foundation::cancel::CancellationToken;
use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};
use crate::render::stream::FrameStream;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const PALETTE_CHAIN: &str =
    "split[s1][s2];[s1]palettegen=max_colors=256[p];[s2][p]paletteuse=dither=bayer";

/// An external transcode: the composed GIF goes to the program's stdin and whatever it writes
/// to stdout is decoded back into frames.
///
/// `input_args` and `output_args` are passed verbatim, in that order, so they must name the pipes
/// themselves (the presets use `-i pipe:0` and `pipe:1`).
#[derive(Clone, Debug, PartialEq)]
pub struct FfmpegTranscode {
    pub program: PathBuf,
    pub input_args: Vec<String>,
    pub output_args: Vec<String>,
    /// How the stream is flattened before it is piped.
    pub compose: ComposeOptions,
    /// How the flattened artifact is encoded before it is piped.
    pub encode: EncodeOptions,
}

impl FfmpegTranscode {
    /// Transcode with `ffmpeg` using explicit argument lists.
    pub fn new(input_args: Vec<String>, output_args: Vec<String>) -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            input_args,
            output_args,
            compose: ComposeOptions::default(),
            encode: EncodeOptions::default(),
        }
    }

    /// Re-encode as a 24 fps GIF with a generated palette, running `filters` first when given.
    pub fn to_gif(filters: Option<&str>) -> Self {
        let chain = match filters.map(str::trim).filter(|f| !f.is_empty()) {
            Some(f) => format!("{f},{PALETTE_CHAIN}"),
            None => PALETTE_CHAIN.to_string(),
        };
        let input = ["-hide_banner", "-loglevel", "error", "-f", "gif", "-i", "pipe:0"];
        let output = ["-vf", chain.as_str(), "-r", "24", "-f", "gif", "pipe:1"];
        Self::new(
            input.into_iter().map(String::from).collect(),
            output.into_iter().map(String::from).collect(),
        )
    }

    /// [`FfmpegTranscode::to_gif`] with presentation timestamps divided by `factor`.
    pub fn speed_up(factor: f64) -> LoopsmithResult<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(LoopsmithError::contract(
                Stage::External,
                format!("speed-up factor must be finite and > 0 (got {factor})"),
            ));
        }
        Ok(Self::to_gif(Some(&format!("setpts=PTS/{factor}"))))
    }

    /// Run a different binary with the same arguments.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Full argument list in invocation order.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.input_args
            .iter()
            .chain(&self.output_args)
            .map(String::as_str)
    }

    /// Pipe `input` through the program and return its stdout.
    ///
    /// The child is killed when `cancel` fires. A non-zero exit is an
    /// [`Upstream`](LoopsmithError::Upstream) error carrying the program's stderr.
    pub fn run(&self, input: Vec<u8>, cancel: &CancellationToken) -> LoopsmithResult<Vec<u8>> {
        cancel.check(Stage::External)?;

        let mut child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn '{}'", self.program.display()))
            .map_err(|e| LoopsmithError::upstream(Stage::External, e))?;

        let pipes = match Pipes::attach(&mut child, input) {
            Ok(pipes) => pipes,
            Err(e) => {
                kill_quietly(&mut child);
                return Err(e);
            }
        };

        let status = match wait_cancellable(&mut child, cancel) {
            Ok(status) => status,
            Err(e) => {
                kill_quietly(&mut child);
                let _ = pipes.join();
                return Err(e);
            }
        };

        let PipeOutput {
            written,
            stdout,
            stderr,
        } = pipes.join()?;
        let stderr = String::from_utf8_lossy(&stderr);
        if !status.success() {
            return Err(LoopsmithError::upstream(
                Stage::External,
                anyhow!(
                    "'{}' exited with status {status}: {}",
                    self.program.display(),
                    stderr.trim()
                ),
            ));
        }
        if let Err(e) = written
            && e.kind() != ErrorKind::BrokenPipe
        {
            return Err(LoopsmithError::upstream(Stage::External, e));
        }
        if !stderr.trim().is_empty() {
            tracing::debug!(stderr = %stderr.trim(), "transcoder diagnostics");
        }
        Ok(stdout)
    }
}

struct Pipes {
    writer: JoinHandle<std::io::Result<()>>,
    stdout: JoinHandle<std::io::Result<Vec<u8>>>,
    stderr: JoinHandle<std::io::Result<Vec<u8>>>,
}

impl Pipes {
    fn attach(child: &mut Child, input: Vec<u8>) -> LoopsmithResult<Self> {
        let missing = |name: &str| {
            LoopsmithError::contract(Stage::External, format!("child {name} was not captured"))
        };
        let mut stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        // Dropping stdin at the end of the thread closes the pipe.
        let writer = thread::spawn(move || stdin.write_all(&input));
        Ok(Self {
            writer,
            stdout: spawn_reader(stdout),
            stderr: spawn_reader(stderr),
        })
    }

    fn join(self) -> LoopsmithResult<PipeOutput> {
        let panicked = || LoopsmithError::contract(Stage::External, "pipe thread panicked");
        let written = self.writer.join().map_err(|_| panicked())?;
        let stdout = self
            .stdout
            .join()
            .map_err(|_| panicked())?
            .map_err(|e| LoopsmithError::upstream(Stage::External, e))?;
        let stderr = self
            .stderr
            .join()
            .map_err(|_| panicked())?
            .map_err(|e| LoopsmithError::upstream(Stage::External, e))?;
        Ok(PipeOutput {
            written,
            stdout,
            stderr,
        })
    }
}

struct PipeOutput {
    written: std::io::Result<()>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

fn spawn_reader(mut pipe: impl Read + Send + 'static) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn wait_cancellable(child: &mut Child, cancel: &CancellationToken) -> LoopsmithResult<ExitStatus> {
    loop {
        cancel.check(Stage::External)?;
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(LoopsmithError::upstream(Stage::External, e)),
        }
    }
}

fn kill_quietly(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Return `true` when `ffmpeg -version` runs successfully.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

impl<'a> FrameStream<'a> {
    /// Compose the stream, pipe it through `transcode` as a GIF, and decode the result.
    ///
    /// Output frames keep the indices the decoder assigns (from 0).
    #[tracing::instrument(skip_all, fields(program = %transcode.program.display()))]
    pub fn ffmpeg(
        self,
        transcode: &FfmpegTranscode,
        cancel: &CancellationToken,
    ) -> LoopsmithResult<FrameStream<'a>> {
        let meme = self.auto_compose(&transcode.compose, cancel)?;
        let mut input = Vec::new();
        encode_meme(&meme, MemeFormat::Gif, &mut input, &transcode.encode)?;
        drop(meme);
        tracing::debug!(bytes = input.len(), "piping composed GIF");

        let output = transcode.run(input, cancel)?;
        Ok(decode_frames(output)?.cancellable(cancel, Stage::External))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
