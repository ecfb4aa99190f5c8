use std::{process::Command, time::SystemTime};

fn main() {
  let now = SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .map(|d| d.as_millis())
    .unwrap_or(0);
  println!("cargo:rustc-env=BUILD_TIME={}", now);

  // Tell Cargo to rerun this script if git state changes
  println!("cargo:rerun-if-changed=.git/HEAD");

  println!(
    "cargo:rustc-env=GIT_BRANCH={}",
    git(&["rev-parse", "--abbrev-ref", "HEAD"]).unwrap_or_else(|| "unknown".to_string())
  );
  println!(
    "cargo:rustc-env=GIT_COMMIT={}",
    git(&["rev-parse", "HEAD"]).unwrap_or_else(|| "unknown".to_string())
  );

  let commit_time = git(&["show", "-s", "--format=%ct", "HEAD"])
    .and_then(|s| s.parse::<u64>().ok())
    .map(|t| t * 1000)
    .unwrap_or(0);
  println!("cargo:rustc-env=GIT_COMMIT_TIME={}", commit_time);
}

fn git(args: &[&str]) -> Option<String> {
  let output = Command::new("git").args(args).output().ok()?;
  if !output.status.success() {
    return None;
  }
  let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
  if value.is_empty() { None } else { Some(value) }
}
