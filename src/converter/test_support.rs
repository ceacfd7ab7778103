//! Shell script stand-ins for the external tools.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ETXTBSY: i32 = 26;

/// Writes an executable `/bin/sh` script and waits until it can be executed.
///
/// A test thread forking while the script is still open for writing leaves a
/// copy of the write descriptor in the child until it execs, which makes
/// `execve` on the script fail with `ETXTBSY` for a short while.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\n[ -n \"$SCRIPT_READY_CHECK\" ] && exit 0\n{}\n",
        body
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    for _ in 0..100 {
        match std::process::Command::new(&path)
            .env("SCRIPT_READY_CHECK", "1")
            .status()
        {
            Ok(_) => return path,
            Err(e) if e.raw_os_error() == Some(ETXTBSY) => {
                std::thread::sleep(Duration::from_millis(10))
            }
            Err(e) => panic!("cannot execute {}: {}", path.display(), e),
        }
    }
    panic!("{} stayed busy", path.display());
}
