//! Scan command implementation.

use anyhow::Context;
use hostmirror_protocol::VersionMap;
use hostmirror_storage::scan_dir;
use std::path::Path;

/// Renders a map as one `name<TAB>mtime` line per file.
fn render_text(map: &VersionMap) -> String {
    let mut out = String::new();
    for (name, mtime) in map.iter() {
        out.push_str(&format!("{name}\t{mtime:.6}\n"));
    }
    out
}

/// Runs the scan command.
pub fn run(dir: &Path, json: bool) -> anyhow::Result<()> {
    let map = scan_dir(dir).with_context(|| format!("cannot scan {}", dir.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        print!("{}", render_text(&map));
        println!("{} files", map.len());
    }
    Ok(())
}
