use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::path::Path;
use std::process::Output;

pub fn treediff_cmd(cwd: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("treediff");
    cmd.arg("-C").arg(cwd);
    cmd
}

// Each integration test file is its own crate; not all of them use every helper.
#[allow(dead_code)]
pub fn status_output(cwd: &Path, args: &[&str]) -> Output {
    let mut cmd = treediff_cmd(cwd);
    cmd.arg("status").args(args);
    cmd.output().expect("failed to run `treediff status`")
}

#[allow(dead_code)]
pub fn extract_digest(stdout: &[u8]) -> String {
    let output = std::str::from_utf8(stdout).expect("status stdout should be UTF-8");
    output
        .lines()
        .find_map(|line| line.strip_prefix("Digest: "))
        .expect("digest not found in output")
        .to_string()
}

#[allow(dead_code)]
pub fn status_digest(cwd: &Path, args: &[&str]) -> (Output, String) {
    let output = status_output(cwd, args);
    let digest = extract_digest(&output.stdout);
    (output, digest)
}
