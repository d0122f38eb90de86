// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const BIN: &str = env!("CARGO_BIN_EXE_dd-memsampler");

/// Handle to a running dd-memsampler process.
pub struct SamplerHandle {
    child: Child,
    output: PathBuf,
    log_lines: Arc<Mutex<Vec<String>>>,
    _stdout_thread: std::thread::JoinHandle<()>,
    _stderr_thread: std::thread::JoinHandle<()>,
}

impl SamplerHandle {
    /// Start sampling every second into `output`, probing `disk_path` with du.
    pub fn start(output: &Path, disk_path: &Path) -> Self {
        let mut child = Command::new(BIN)
            .arg("-o")
            .arg(output)
            .arg("-n")
            .arg("1")
            .arg("--disk-path")
            .arg(disk_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to start dd-memsampler");

        let stdout = child.stdout.take().expect("failed to capture stdout");
        let stderr = child.stderr.take().expect("failed to capture stderr");
        let log_lines = Arc::new(Mutex::new(Vec::<String>::new()));

        // simple_logger writes INFO to stdout, WARN/ERROR to stderr.
        let stdout_thread = collect_lines(stdout, "sampler", Arc::clone(&log_lines));
        let stderr_thread = collect_lines(stderr, "sampler:err", Arc::clone(&log_lines));

        Self {
            child,
            output: output.to_path_buf(),
            log_lines,
            _stdout_thread: stdout_thread,
            _stderr_thread: stderr_thread,
        }
    }

    /// Wait until the log holds at least `n` data rows.
    pub fn wait_for_rows(&self, n: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if data_rows(&self.output).len() >= n {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    pub fn has_log(&self, pattern: &str) -> bool {
        let lines = self.log_lines.lock().unwrap();
        lines.iter().any(|l| l.contains(pattern))
    }

    pub fn send_signal(&self, sig: Signal) {
        let pid = self.child.id() as i32;
        signal::kill(Pid::from_raw(pid), sig).expect("failed to send signal to dd-memsampler");
    }

    /// Send `sig` and wait for the sampler to exit.
    pub fn stop_with(&mut self, sig: Signal) -> ExitStatus {
        self.send_signal(sig);
        self.wait_with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn wait_with_timeout(&mut self, timeout: Duration) -> ExitStatus {
        let deadline = Instant::now() + timeout;
        loop {
            match self
                .child
                .try_wait()
                .expect("failed to check dd-memsampler status")
            {
                Some(status) => return status,
                None => {
                    if Instant::now() >= deadline {
                        self.child.kill().ok();
                        return self
                            .child
                            .wait()
                            .expect("failed to wait on killed dd-memsampler");
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn collect_lines<R: std::io::Read + Send + 'static>(
    stream: R,
    tag: &'static str,
    lines: Arc<Mutex<Vec<String>>>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            match line {
                Ok(l) => {
                    eprintln!("[{tag}] {l}");
                    lines.lock().unwrap().push(l);
                }
                Err(_) => break,
            }
        }
    })
}

/// Run dd-memsampler to completion with the given arguments.
pub fn run_to_completion(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .output()
        .expect("failed to run dd-memsampler")
}

/// All lines of the log, split into fields. Empty if the file is absent.
pub fn read_lines(path: &Path) -> Vec<Vec<String>> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|l| l.split(',').map(str::to_string).collect())
        .collect()
}

/// Lines that are not the header.
pub fn data_rows(path: &Path) -> Vec<Vec<String>> {
    read_lines(path)
        .into_iter()
        .filter(|fields| fields.first().is_some_and(|f| f != "date"))
        .collect()
}
