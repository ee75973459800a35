//! yt-dlp process runner
//!
//! Spawns the `yt-dlp` binary once per download with `--dump-single-json
//! --no-simulate`, so the file is downloaded and the info JSON for it is
//! printed to stdout afterwards. Stderr is kept as a bounded tail for error
//! reporting.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use mediagrab_common::FormatType;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{format_selector, DownloadRequest, ExtractedMedia, ExtractorError, MediaExtractor};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const REFERER: &str = "https://www.google.com/";
const EXTRA_HEADERS: &[&str] = &[
    "Accept:text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    "Accept-Language:en-us,en;q=0.5",
    "Accept-Encoding:gzip,deflate",
    "Connection:keep-alive",
];
const RETRIES: &str = "5";

/// Title bound inside the output template
const TEMPLATE_TITLE_CHARS: usize = 100;
const MAX_TITLE_CHARS: usize = 150;
const MAX_UPLOADER_CHARS: usize = 100;

/// Stderr lines kept for error reporting
const MAX_STDERR_LINES: usize = 200;
/// Longer stderr lines are split
const MAX_STDERR_LINE_BYTES: u64 = 8 * 1024;
/// Info JSON larger than this is rejected
const MAX_STDOUT_BYTES: u64 = 32 * 1024 * 1024;

/// Where to find yt-dlp and how to run it
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Binary path or name looked up on PATH
    pub binary: PathBuf,
    /// Cookie jar, passed only when the file exists
    pub cookie_file: Option<PathBuf>,
    /// Whole-download timeout; the process is killed when exceeded
    pub timeout: Duration,
    /// Extra arguments injected before the per-download arguments (e.g. proxy)
    pub global_args: Vec<String>,
}

impl YtDlpConfig {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cookie_file: None,
            timeout: Duration::from_secs(900),
            global_args: Vec::new(),
        }
    }
}

/// Production extractor backed by the yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    config: YtDlpConfig,
}

impl YtDlpExtractor {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// Full argument list for one download
    pub fn build_args(&self, request: &DownloadRequest) -> Vec<String> {
        let template = request.output_dir.join(format!(
            "{}_%(title).{}s.%(ext)s",
            request.filename_prefix, TEMPLATE_TITLE_CHARS
        ));

        let format = format_selector(request.quality, request.format_type);
        let output = template.to_string_lossy().into_owned();

        let mut args = self.config.global_args.clone();
        args.extend(
            [
                "--format",
                format.as_str(),
                "--output",
                output.as_str(),
                "--no-playlist",
                "--restrict-filenames",
                "--windows-filenames",
                "--no-color",
                "--no-progress",
                "--user-agent",
                USER_AGENT,
                "--referer",
                REFERER,
                "--extractor-retries",
                RETRIES,
                "--fragment-retries",
                RETRIES,
                "--skip-unavailable-fragments",
                "--no-check-certificates",
            ]
            .map(String::from),
        );

        for header in EXTRA_HEADERS {
            args.push("--add-header".to_string());
            args.push(header.to_string());
        }

        if let Some(cookies) = self.config.cookie_file.as_ref().filter(|p| p.is_file()) {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }

        match request.format_type {
            FormatType::Audio => args.extend(
                ["--extract-audio", "--audio-format", "mp3", "--audio-quality", "192K"]
                    .map(String::from),
            ),
            FormatType::Video => {
                args.extend(["--recode-video", "mp4"].map(String::from));
            }
        }

        args.extend(["--dump-single-json", "--no-simulate", "--"].map(String::from));
        args.push(request.url.clone());
        args
    }

    /// Run the binary to completion, returning stdout and the stderr tail
    async fn run(&self, args: &[String]) -> Result<(Vec<u8>, Vec<String>), ExtractorError> {
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                ExtractorError::NotFound(self.config.binary.display().to_string())
            }
            _ => ExtractorError::Io(e),
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "failed to capture stderr"))?;

        let read_stdout = read_capped(stdout, MAX_STDOUT_BYTES);
        let read_stderr = read_tail(stderr, MAX_STDERR_LINES, MAX_STDERR_LINE_BYTES);

        let finished = tokio::time::timeout(self.config.timeout, async {
            let (out, err) = tokio::try_join!(read_stdout, read_stderr)?;
            let status = child.wait().await?;
            Ok::<_, io::Error>((out, err, status))
        })
        .await;

        match finished {
            Err(_) => {
                warn!("yt-dlp exceeded {:?}, killing process", self.config.timeout);
                let _ = child.kill().await;
                Err(ExtractorError::Timeout(self.config.timeout))
            }
            Ok(Err(e)) => Err(ExtractorError::Io(e)),
            Ok(Ok((_, stderr_tail, status))) if !status.success() => Err(ExtractorError::Failed {
                message: failure_message(&stderr_tail, status),
            }),
            Ok(Ok(((_, true), _, _))) => Err(ExtractorError::InvalidOutput(format!(
                "stdout exceeded {} bytes",
                MAX_STDOUT_BYTES
            ))),
            Ok(Ok(((out, false), stderr_tail, _))) => Ok((out, stderr_tail)),
        }
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract(&self, request: &DownloadRequest) -> Result<ExtractedMedia, ExtractorError> {
        let args = self.build_args(request);
        info!("Extracting media information...");
        debug!("{} {}", self.config.binary.display(), args.join(" "));

        let (stdout, stderr_tail) = self.run(&args).await?;
        for line in stderr_tail.iter().filter(|l| l.starts_with("WARNING:")) {
            warn!("yt-dlp {}", line);
        }

        parse_info_json(&stdout, request)
    }
}

/// Read `reader` to EOF keeping at most `cap` bytes
///
/// Past the cap the rest is drained and discarded so the writer never blocks;
/// the flag reports the overflow and the buffer comes back empty.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, cap: u64) -> io::Result<(Vec<u8>, bool)> {
    let mut buf = Vec::new();
    (&mut reader).take(cap + 1).read_to_end(&mut buf).await?;
    if buf.len() as u64 <= cap {
        return Ok((buf, false));
    }
    buf.clear();
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok((buf, true))
}

/// Last `max_lines` lines of `reader`, each at most `max_line_bytes` long
///
/// Overlong lines are split into several entries.
async fn read_tail<R: AsyncRead + Unpin>(
    reader: R,
    max_lines: usize,
    max_line_bytes: u64,
) -> io::Result<Vec<String>> {
    let mut reader = BufReader::new(reader);
    let mut tail = VecDeque::with_capacity(max_lines);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        let n = (&mut reader)
            .take(max_line_bytes)
            .read_until(b'\n', &mut raw)
            .await?;
        if n == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&raw)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        debug!("yt-dlp: {}", line);
        if tail.len() == max_lines {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Ok(Vec::from(tail))
}

/// Best error line from the stderr tail
fn failure_message(stderr_tail: &[String], status: ExitStatus) -> String {
    stderr_tail
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr_tail.iter().rev().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| format!("yt-dlp exited with status {:?}", status.code()))
}

fn looks_like_json_object(s: &str) -> bool {
    let t = s.trim();
    t.starts_with('{') && t.ends_with('}')
}

/// Parse the info JSON printed after the download
pub(crate) fn parse_info_json(
    stdout: &[u8],
    request: &DownloadRequest,
) -> Result<ExtractedMedia, ExtractorError> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .find(|l| looks_like_json_object(l))
        .ok_or_else(|| ExtractorError::InvalidOutput("no JSON on stdout".to_string()))?;

    let v: Value = serde_json::from_str(line)
        .map_err(|e| ExtractorError::InvalidOutput(format!("invalid JSON: {}", e)))?;

    let reported = v
        .get("requested_downloads")
        .and_then(|d| d.get(0))
        .and_then(|d| d.get("filepath"))
        .and_then(Value::as_str)
        .or_else(|| v.get("_filename").and_then(Value::as_str))
        .or_else(|| v.get("filename").and_then(Value::as_str))
        .ok_or_else(|| ExtractorError::InvalidOutput("no output filename reported".to_string()))?;

    let file_name = Path::new(reported)
        .file_name()
        .ok_or_else(|| ExtractorError::InvalidOutput(format!("bad output path: {}", reported)))?;
    let mut path = request.output_dir.join(file_name);
    if request.format_type == FormatType::Audio
        && path.extension().and_then(|e| e.to_str()) != Some("mp3")
    {
        path.set_extension("mp3");
    }

    Ok(ExtractedMedia {
        path,
        title: truncated_str(&v, "title", MAX_TITLE_CHARS),
        uploader: truncated_str(&v, "uploader", MAX_UPLOADER_CHARS),
        duration: v.get("duration").and_then(Value::as_f64).unwrap_or(0.0),
        thumbnail: v
            .get("thumbnail")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        view_count: as_u64(v.get("view_count")).unwrap_or(0),
        width: as_u64(v.get("width")),
        height: as_u64(v.get("height")),
        fps: v.get("fps").and_then(Value::as_f64),
        filesize: as_u64(v.get("filesize"))
            .or_else(|| as_u64(v.get("filesize_approx")))
            .unwrap_or(0),
    })
}

fn truncated_str(v: &Value, key: &str, max_chars: usize) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| s.chars().take(max_chars).collect())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Integer field that yt-dlp sometimes reports as a float
fn as_u64(v: Option<&Value>) -> Option<u64> {
    let v = v?;
    v.as_u64()
        .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}
