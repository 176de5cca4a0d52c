use std::process::Command;

/// Abbreviated hash of the checked out commit, if git can tell us.
fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn main() {
    // Shown by `retail-etl --version`
    let hash = git_short_hash().unwrap_or_else(|| String::from("unknown"));
    println!("cargo:rustc-env=GIT_HASH={hash}");

    for watched in [".git/HEAD", ".git/refs/heads/"] {
        println!("cargo:rerun-if-changed={watched}");
    }
}
