// ── Project auto-detection ──
//
// Locates the Android manifest / iOS Info.plist under a project root so the
// CLI can fill in a missing package, activity or bundle id.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use walkdir::WalkDir;

use crate::error::CoreError;

const ANDROID_MANIFEST: &str = "AndroidManifest.xml";
const INFO_PLIST: &str = "Info.plist";

const ANDROID_MANIFEST_CANDIDATES: &[&str] = &[
    "androidApp/src/main/AndroidManifest.xml",
    "androidApp/src/androidMain/AndroidManifest.xml",
    "app/src/main/AndroidManifest.xml",
    "AndroidManifest.xml",
];
const ANDROID_SKIP_DIRS: &[&str] = &[".git", "build", "gradle", ".gradle", ".idea", "node_modules"];

const INFO_PLIST_CANDIDATES: &[&str] = &["iosApp/iosApp/Info.plist", "iosApp/Info.plist", "ios/Info.plist"];
const IOS_SKIP_DIRS: &[&str] = &[".git", "build", "DerivedData", ".idea", "Pods", "node_modules"];

const GRADLE_BUILD_FILES: &[&str] = &["build.gradle.kts", "build.gradle"];
/// The manifest directory plus this many ancestors are searched for a
/// Gradle namespace.
const GRADLE_SEARCH_ANCESTORS: usize = 6;

const MAIN_ACTION: &str = "android.intent.action.MAIN";
const LAUNCHER_CATEGORY: &str = "android.intent.category.LAUNCHER";

static GRADLE_PACKAGE_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r#"namespace\s*=\s*"([^"]+)""#,
        r#"namespace\s+"([^"]+)""#,
        r#"applicationId\s*=\s*"([^"]+)""#,
        r#"applicationId\s+"([^"]+)""#,
    ]
    .map(|pattern| Regex::new(pattern).expect("gradle pattern is a valid regex"))
});

static BUNDLE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<key>CFBundleIdentifier</key>\s*<string>(.*?)</string>")
        .expect("bundle id pattern is a valid regex")
});

// ── Android ─────────────────────────────────────────────────────────

/// Metadata extracted from an Android manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidProject {
    pub package: String,
    /// Launcher activity, or the first declared one.
    pub activity: Option<String>,
    pub manifest_path: PathBuf,
    /// Gradle module directory relative to the root, `/`-separated; empty
    /// when the module is the root itself.
    pub module_dir: String,
    pub warnings: Vec<String>,
}

/// Find and parse the Android manifest under `root`.
pub fn detect_android_project(root: &Path) -> Result<AndroidProject, CoreError> {
    let root = std::path::absolute(root)?;
    let manifest = ANDROID_MANIFEST_CANDIDATES
        .iter()
        .map(|rel| root.join(rel))
        .find(|path| path.is_file())
        .or_else(|| {
            find_file(&root, ANDROID_SKIP_DIRS, |name| {
                name.eq_ignore_ascii_case(ANDROID_MANIFEST)
            })
        })
        .ok_or_else(|| CoreError::ProjectNotFound {
            kind: "android manifest",
            root: root.clone(),
        })?;
    load_android_project(&manifest, &root)
}

fn load_android_project(manifest_path: &Path, root: &Path) -> Result<AndroidProject, CoreError> {
    let xml = std::fs::read_to_string(manifest_path)?;
    let manifest = parse_manifest(&xml)?;
    let mut warnings = Vec::new();

    let package = match manifest.package {
        Some(package) => package,
        None => {
            let package = gradle_package(manifest_path).ok_or_else(|| {
                CoreError::ManifestPackageMissing {
                    path: manifest_path.to_path_buf(),
                }
            })?;
            tracing::warn!(%package, "manifest has no package attribute, using Gradle namespace");
            warnings.push(format!("manifest missing package; using Gradle namespace {package:?}"));
            package
        }
    };

    Ok(AndroidProject {
        package,
        activity: primary_activity(&manifest.activities),
        manifest_path: manifest_path.to_path_buf(),
        module_dir: gradle_module_dir(manifest_path, root),
        warnings,
    })
}

#[derive(Debug, Default)]
struct ManifestActivity {
    name: String,
    has_main: bool,
    has_launcher: bool,
}

#[derive(Debug, Default)]
struct Manifest {
    package: Option<String>,
    activities: Vec<ManifestActivity>,
}

fn parse_manifest(xml: &str) -> Result<Manifest, CoreError> {
    let mut reader = Reader::from_str(xml);
    let mut manifest = Manifest::default();
    let mut current: Option<ManifestActivity> = None;
    let mut filter_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| CoreError::Malformed {
            what: "android manifest",
            reason: e.to_string(),
        })?;
        match event {
            Event::Start(ref tag) | Event::Empty(ref tag) => {
                let self_closing = matches!(event, Event::Empty(_));
                match tag.local_name().as_ref() {
                    b"manifest" if manifest.package.is_none() => {
                        manifest.package = attribute(tag, b"package");
                    }
                    b"activity" => {
                        let activity = ManifestActivity {
                            name: attribute(tag, b"name").unwrap_or_default(),
                            ..ManifestActivity::default()
                        };
                        if self_closing {
                            manifest.activities.push(activity);
                        } else {
                            current = Some(activity);
                        }
                    }
                    b"intent-filter" if current.is_some() && !self_closing => filter_depth += 1,
                    b"action" if filter_depth > 0 => {
                        if let Some(ref mut activity) = current {
                            activity.has_main |= attribute(tag, b"name").as_deref() == Some(MAIN_ACTION);
                        }
                    }
                    b"category" if filter_depth > 0 => {
                        if let Some(ref mut activity) = current {
                            activity.has_launcher |=
                                attribute(tag, b"name").as_deref() == Some(LAUNCHER_CATEGORY);
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref tag) => match tag.local_name().as_ref() {
                b"intent-filter" => filter_depth = filter_depth.saturating_sub(1),
                b"activity" => {
                    if let Some(activity) = current.take() {
                        manifest.activities.push(activity);
                    }
                    filter_depth = 0;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(manifest)
}

/// Trimmed, non-empty value of the attribute with the given local name.
fn attribute(tag: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    tag.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local)
        .map(|attr| String::from_utf8_lossy(&attr.value).trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn primary_activity(activities: &[ManifestActivity]) -> Option<String> {
    activities
        .iter()
        .find(|a| a.has_main && a.has_launcher)
        .or_else(|| activities.first())
        .map(|a| a.name.clone())
        .filter(|name| !name.is_empty())
}

fn gradle_package(manifest_path: &Path) -> Option<String> {
    manifest_path
        .ancestors()
        .skip(1)
        .take(GRADLE_SEARCH_ANCESTORS + 1)
        .flat_map(|dir| GRADLE_BUILD_FILES.iter().map(move |name| dir.join(name)))
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .find_map(|content| parse_gradle_package(&content))
}

/// `namespace` or `applicationId` from a Gradle build script, in either
/// assignment (`= "..."`) or call (`"..."`) syntax.
pub fn parse_gradle_package(content: &str) -> Option<String> {
    GRADLE_PACKAGE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(content))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|package| !package.is_empty())
}

fn gradle_module_dir(manifest_path: &Path, root: &Path) -> String {
    for dir in manifest_path.ancestors().skip(1) {
        if !dir.starts_with(root) {
            break;
        }
        if has_gradle_build_file(dir) {
            return relative_slash_path(dir, root);
        }
    }
    String::new()
}

fn has_gradle_build_file(dir: &Path) -> bool {
    GRADLE_BUILD_FILES.iter().any(|name| dir.join(name).is_file())
}

fn relative_slash_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

// ── iOS ─────────────────────────────────────────────────────────────

/// Bundle details extracted from an Info.plist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IosProject {
    pub bundle_id: String,
    pub info_plist_path: PathBuf,
}

/// Find the app's Info.plist under `root` and read `CFBundleIdentifier`.
pub fn detect_ios_project(root: &Path) -> Result<IosProject, CoreError> {
    let root = std::path::absolute(root)?;
    let plist = INFO_PLIST_CANDIDATES
        .iter()
        .map(|rel| root.join(rel))
        .find(|path| path.exists())
        .or_else(|| find_file(&root, IOS_SKIP_DIRS, |name| name == INFO_PLIST))
        .ok_or_else(|| CoreError::ProjectNotFound {
            kind: "Info.plist",
            root: root.clone(),
        })?;
    parse_info_plist(&plist)
}

fn parse_info_plist(path: &Path) -> Result<IosProject, CoreError> {
    let content = std::fs::read_to_string(path)?;
    let bundle_id = BUNDLE_ID_PATTERN
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CoreError::BundleIdMissing {
            path: path.to_path_buf(),
        })?;
    Ok(IosProject {
        bundle_id: bundle_id.to_owned(),
        info_plist_path: path.to_path_buf(),
    })
}

// ── Tree walk ───────────────────────────────────────────────────────

/// First file (in sorted walk order) whose name satisfies `matches`,
/// never descending into `skip` directories. Unreadable entries are ignored.
fn find_file(root: &Path, skip: &[&str], matches: impl Fn(&str) -> bool) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !skip.contains(&name))
        })
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_file() && entry.file_name().to_str().is_some_and(|name| matches(name))
        })
        .map(walkdir::DirEntry::into_path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.shop">
    <application android:label="Shop">
        <!-- <activity android:name=".Commented">
            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>
        </activity> -->
        <activity android:name=".SettingsActivity" />
        <activity android:name=".MainActivity" android:exported="true">
            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>
        </activity>
    </application>
</manifest>
"#;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn launcher_activity_wins() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        assert_eq!(manifest.package.as_deref(), Some("com.example.shop"));
        assert_eq!(manifest.activities.len(), 2);
        assert_eq!(primary_activity(&manifest.activities).as_deref(), Some(".MainActivity"));
    }

    #[test]
    fn first_activity_without_launcher() {
        let xml = r#"<manifest package="p"><application>
            <activity android:name=".First"><intent-filter>
                <action android:name="android.intent.action.VIEW" />
            </intent-filter></activity>
            <activity android:name=".Second" />
        </application></manifest>"#;
        let manifest = parse_manifest(xml).unwrap();
        assert_eq!(primary_activity(&manifest.activities).as_deref(), Some(".First"));
    }

    #[test]
    fn malformed_manifest_is_reported() {
        let err = parse_manifest("<manifest><application></manifest>").unwrap_err();
        assert!(matches!(err, CoreError::Malformed { .. }));
    }

    #[test]
    fn detects_conventional_app_module() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("app/src/main/AndroidManifest.xml"), MANIFEST);
        write(&dir.path().join("app/build.gradle.kts"), "plugins {}\n");
        write(&dir.path().join("settings.gradle.kts"), "include(\":app\")\n");

        let project = detect_android_project(dir.path()).unwrap();
        assert_eq!(project.package, "com.example.shop");
        assert_eq!(project.activity.as_deref(), Some(".MainActivity"));
        assert_eq!(project.module_dir, "app");
        assert!(project.warnings.is_empty());
    }

    #[test]
    fn walks_tree_and_skips_build_output() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("build/intermediates/AndroidManifest.xml"),
            r#"<manifest package="com.wrong" />"#,
        );
        write(&dir.path().join("modules/shop/src/main/AndroidManifest.xml"), MANIFEST);
        write(&dir.path().join("modules/shop/build.gradle"), "android {}\n");

        let project = detect_android_project(dir.path()).unwrap();
        assert_eq!(project.package, "com.example.shop");
        assert_eq!(project.module_dir, "modules/shop");
    }

    #[test]
    fn falls_back_to_gradle_namespace() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("app/src/main/AndroidManifest.xml"),
            r#"<manifest><application><activity android:name=".Main" /></application></manifest>"#,
        );
        write(
            &dir.path().join("app/build.gradle.kts"),
            "android {\n    namespace = \"com.example.gradle\"\n}\n",
        );

        let project = detect_android_project(dir.path()).unwrap();
        assert_eq!(project.package, "com.example.gradle");
        assert_eq!(project.warnings.len(), 1);
    }

    #[test]
    fn missing_package_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("AndroidManifest.xml"), "<manifest />");
        let err = detect_android_project(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::ManifestPackageMissing { .. }));
    }

    #[test]
    fn no_manifest_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = detect_android_project(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::ProjectNotFound { .. }));
    }

    #[test]
    fn gradle_package_syntaxes() {
        assert_eq!(parse_gradle_package("namespace 'x'\nnamespace \"a.b\""), Some("a.b".into()));
        assert_eq!(parse_gradle_package("applicationId = \"c.d\""), Some("c.d".into()));
        assert_eq!(parse_gradle_package("applicationId \"e.f\""), Some("e.f".into()));
        assert_eq!(parse_gradle_package("android {}"), None);
    }

    #[test]
    fn detects_info_plist() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("iosApp/iosApp/Info.plist"),
            "<plist><dict>\n  <key>CFBundleIdentifier</key>\n  <string>com.example.shop</string>\n</dict></plist>\n",
        );
        let project = detect_ios_project(dir.path()).unwrap();
        assert_eq!(project.bundle_id, "com.example.shop");
        assert!(project.info_plist_path.ends_with("iosApp/iosApp/Info.plist"));
    }

    #[test]
    fn walked_plist_without_bundle_id() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("Pods/Lib/Info.plist"), "<key>CFBundleIdentifier</key><string>pods</string>");
        write(&dir.path().join("App/Info.plist"), "<key>CFBundleIdentifier</key><string> </string>");
        let err = detect_ios_project(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::BundleIdMissing { .. }));
    }
}
