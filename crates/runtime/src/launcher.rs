//! Chromium lifecycle: executable discovery and headless launch.
//!
//! Discovery order:
//! 1. `VOUCH_BROWSER` environment variable (runtime override)
//! 2. `which`/`where` lookup over the known executable names
//! 3. Common install locations per platform
//!
//! The launched browser announces its DevTools WebSocket endpoint on
//! stderr (`DevTools listening on ws://...`); launch fails if the
//! announcement does not appear within the configured wait.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

const ENDPOINT_PREFIX: &str = "DevTools listening on ";

const EXECUTABLE_NAMES: &[&str] = &[
	"chromium",
	"chromium-browser",
	"google-chrome",
	"google-chrome-stable",
	"chrome",
];

/// Options for launching the browser process.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
	/// Run without a visible window.
	pub headless: bool,
	/// Explicit executable path; discovery is skipped when set.
	pub executable: Option<PathBuf>,
	/// Extra command-line switches appended after the defaults.
	pub extra_args: Vec<String>,
	/// How long to wait for the DevTools endpoint announcement.
	pub endpoint_wait: Duration,
}

impl Default for LaunchConfig {
	fn default() -> Self {
		Self {
			headless: true,
			executable: None,
			extra_args: Vec::new(),
			endpoint_wait: Duration::from_secs(30),
		}
	}
}

/// A running browser process and its DevTools endpoint.
pub struct LaunchedBrowser {
	child: Child,
	ws_url: String,
	user_data_dir: PathBuf,
}

impl LaunchedBrowser {
	/// WebSocket debugger URL announced by the browser.
	pub fn ws_url(&self) -> &str {
		&self.ws_url
	}

	/// Kills the browser process and removes its scratch profile.
	///
	/// Safe to call after the process has already exited.
	pub async fn close(&mut self) -> Result<()> {
		if let Err(e) = self.child.kill().await {
			debug!(target = "vouch", error = %e, "browser already exited");
		}
		let _ = self.child.wait().await;
		if let Err(e) = std::fs::remove_dir_all(&self.user_data_dir) {
			trace!(target = "vouch", error = %e, "scratch profile cleanup failed");
		}
		Ok(())
	}
}

/// Launches a browser with an ephemeral profile and waits for its
/// DevTools endpoint.
pub async fn launch(config: &LaunchConfig) -> Result<LaunchedBrowser> {
	let executable = match &config.executable {
		Some(path) => path.clone(),
		None => find_browser_executable()?,
	};

	let user_data_dir =
		std::env::temp_dir().join(format!("vouch-profile-{}", std::process::id()));
	std::fs::create_dir_all(&user_data_dir)?;

	let mut command = Command::new(&executable);
	command
		.arg("--remote-debugging-port=0")
		.arg(format!("--user-data-dir={}", user_data_dir.display()))
		.arg("--no-sandbox")
		.arg("--disable-setuid-sandbox")
		.arg("--disable-dev-shm-usage")
		.arg("--disable-gpu")
		.arg("--no-first-run")
		.arg("--no-default-browser-check")
		.arg("about:blank");
	if config.headless {
		command.arg("--headless=new");
	}
	for arg in &config.extra_args {
		command.arg(arg);
	}
	command
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::piped())
		.kill_on_drop(true);

	debug!(
		target = "vouch",
		executable = %executable.display(),
		headless = config.headless,
		"launching browser"
	);
	let mut child = command
		.spawn()
		.map_err(|e| Error::LaunchFailed(format!("{}: {e}", executable.display())))?;

	let stderr = child
		.stderr
		.take()
		.ok_or_else(|| Error::LaunchFailed("browser stderr not captured".to_string()))?;
	let mut lines = BufReader::new(stderr).lines();

	let ws_url = tokio::time::timeout(config.endpoint_wait, async {
		while let Some(line) = lines.next_line().await? {
			trace!(target = "vouch", %line, "browser stderr");
			if let Some(url) = line.strip_prefix(ENDPOINT_PREFIX) {
				return Ok(url.trim().to_string());
			}
		}
		Err(Error::LaunchFailed(
			"browser exited before announcing DevTools endpoint".to_string(),
		))
	})
	.await
	.map_err(|_| Error::EndpointTimeout(config.endpoint_wait))??;

	// Keep draining stderr so the browser never blocks on a full pipe.
	tokio::spawn(async move {
		while let Ok(Some(line)) = lines.next_line().await {
			trace!(target = "vouch", %line, "browser stderr");
		}
	});

	debug!(target = "vouch", %ws_url, "browser ready");
	Ok(LaunchedBrowser {
		child,
		ws_url,
		user_data_dir,
	})
}

/// Locates a Chromium-family executable.
pub fn find_browser_executable() -> Result<PathBuf> {
	discover(
		std::env::var_os("VOUCH_BROWSER").map(PathBuf::from),
		is_executable,
	)
}

/// Discovery with injectable probe, so tests never touch process env.
fn discover<F>(env_override: Option<PathBuf>, usable: F) -> Result<PathBuf>
where
	F: Fn(&Path) -> bool,
{
	if let Some(path) = env_override {
		if usable(&path) {
			return Ok(path);
		}
		warn!(
			target = "vouch",
			path = %path.display(),
			"VOUCH_BROWSER is set but not runnable; falling back to discovery"
		);
	}

	for name in EXECUTABLE_NAMES {
		if let Some(path) = lookup_in_path(name) {
			if usable(&path) {
				return Ok(path);
			}
		}
	}

	for location in common_locations() {
		if usable(location.as_path()) {
			return Ok(location);
		}
	}

	Err(Error::BrowserNotFound)
}

fn lookup_in_path(name: &str) -> Option<PathBuf> {
	#[cfg(not(windows))]
	let which_cmd = "which";
	#[cfg(windows)]
	let which_cmd = "where";

	let output = std::process::Command::new(which_cmd)
		.arg(name)
		.output()
		.ok()?;
	if !output.status.success() {
		return None;
	}
	let stdout = String::from_utf8_lossy(&output.stdout);
	let first = stdout.lines().next()?.trim();
	(!first.is_empty()).then(|| PathBuf::from(first))
}

fn common_locations() -> Vec<PathBuf> {
	#[cfg(not(windows))]
	let locations = [
		"/usr/bin/chromium",
		"/usr/bin/chromium-browser",
		"/usr/bin/google-chrome",
		"/usr/bin/google-chrome-stable",
		"/snap/bin/chromium",
		"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
		"/Applications/Chromium.app/Contents/MacOS/Chromium",
	];

	#[cfg(windows)]
	let locations = [
		"C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
		"C:\\Program Files (x86)\\Google\\Chrome\\Application\\chrome.exe",
	];

	locations.iter().map(PathBuf::from).collect()
}

fn is_executable(path: &Path) -> bool {
	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		path.is_file()
			&& std::fs::metadata(path)
				.map(|m| m.permissions().mode() & 0o111 != 0)
				.unwrap_or(false)
	}
	#[cfg(not(unix))]
	{
		path.is_file()
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use tempfile::TempDir;

	use super::*;

	#[cfg(unix)]
	fn write_mock_browser(dir: &Path, name: &str) -> PathBuf {
		use std::os::unix::fs::PermissionsExt;
		let path = dir.join(name);
		fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
		let mut perms = fs::metadata(&path).unwrap().permissions();
		perms.set_mode(0o755);
		fs::set_permissions(&path, perms).unwrap();
		path
	}

	#[cfg(unix)]
	#[test]
	fn env_override_wins_when_usable() {
		let temp = TempDir::new().unwrap();
		let mock = write_mock_browser(temp.path(), "custom-chromium");

		let found = discover(Some(mock.clone()), is_executable).unwrap();
		assert_eq!(found, mock);
	}

	#[test]
	fn unusable_env_override_falls_through() {
		let result = discover(Some(PathBuf::from("/nonexistent/browser")), |_| false);
		assert!(matches!(result, Err(Error::BrowserNotFound)));
	}

	#[cfg(unix)]
	#[test]
	fn non_executable_file_rejected() {
		let temp = TempDir::new().unwrap();
		let plain = temp.path().join("not-a-browser");
		fs::write(&plain, "data").unwrap();
		assert!(!is_executable(&plain));
	}

	#[test]
	fn endpoint_prefix_parsing() {
		let line = "DevTools listening on ws://127.0.0.1:9222/devtools/browser/abc-def";
		let url = line.strip_prefix(ENDPOINT_PREFIX).unwrap();
		assert_eq!(url, "ws://127.0.0.1:9222/devtools/browser/abc-def");
	}
}
