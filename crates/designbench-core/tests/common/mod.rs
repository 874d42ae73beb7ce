// Fake platform tools for pipeline tests: small `/bin/sh` scripts written
// into a temp dir that answer the subset of adb / xcrun commands the runners
// issue, and append every invocation to `<name>.log`.

#![allow(dead_code, clippy::unwrap_used)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub struct FakeTool {
    pub path: PathBuf,
    log: PathBuf,
}

impl FakeTool {
    /// Write an executable script whose body is a `case "$*" in ... esac`
    /// over the joined arguments.
    pub fn new(dir: &Path, name: &str, cases: &str) -> Self {
        let path = dir.join(name);
        let log = dir.join(format!("{name}.log"));
        let script = format!(
            "#!/bin/sh\n\
             echo \"$*\" >> '{log}'\n\
             case \"$*\" in\n\
             {cases}\n\
             *) echo \"unexpected: $*\" >&2; exit 1 ;;\n\
             esac\n",
            log = log.display(),
        );
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        Self { path, log }
    }

    pub fn program(&self) -> String {
        self.path.display().to_string()
    }

    /// Every invocation so far, one joined argument line each.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

/// `adb` answering every probe the Android runner makes for package
/// `com.example.shop` with pid 4242.
pub const ADB_HAPPY: &str = r#"
*"am start -W"*) printf 'Starting: Intent { cmp=com.example.shop/.MainActivity }\nStatus: ok\nLaunchState: COLD\nThisTime: 8\nTotalTime: 12\nWaitTime: 14\nComplete\n' ;;
*"getprop ro.product.model"*) echo "Pixel 7" ;;
*"getprop ro.build.version.release"*) echo "14" ;;
*"wm size"*) printf 'Physical size: 1080x2400\n' ;;
*"dumpsys meminfo"*) printf '** MEMINFO in pid 4242 [com.example.shop] **\n   TOTAL  4096  2048  0\n' ;;
*"pidof com.example.shop"*) echo 4242 ;;
*"top -b -n 1 -p 4242"*) printf '  PID USER %%CPU NAME\n 4242 u0_a1 3.5%% com.example.shop\n' ;;
*"cat /proc/4242/stat"*) echo "4242 (example.shop) S 0 0 0 0 0 0 0 0 0 0 100 50 0 0 20 0" ;;
*"devices -l"*) printf 'List of devices attached\nemulator-5554 device product:sdk model:Pixel_7\n\n' ;;"#;
