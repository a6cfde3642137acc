//! Package installation through dnf, plus the curated catalogs the software
//! pages offer: codecs, drivers, popular applications and third-party repositories.

use std::collections::HashMap;

use tracing::debug;

use crate::config::YUM_REPOS_DIR;
use crate::exec::{run, CommandSpec};
use crate::utils::binary_exists;

pub fn install_spec(packages: &[&str], extra_args: &[&str]) -> CommandSpec {
    CommandSpec::new("dnf")
        .arg("install")
        .arg("-y")
        .args(extra_args.iter().copied())
        .args(packages.iter().copied())
        .privileged()
}

pub fn remove_spec(packages: &[&str]) -> CommandSpec {
    CommandSpec::new("dnf")
        .arg("remove")
        .arg("-y")
        .args(packages.iter().copied())
        .privileged()
}

pub fn swap_spec(from: &str, to: &str) -> CommandSpec {
    CommandSpec::new("dnf")
        .args(["swap", "-y", "--allowerasing", from, to])
        .privileged()
}

/// Writes `content` to a root-owned file without a temporary copy.
pub fn write_root_file_spec(path: &str, content: &str) -> CommandSpec {
    CommandSpec::new("tee").arg(path).stdin(content).privileged()
}

pub async fn is_installed(package: &str) -> bool {
    let installed = matches!(
        run(&CommandSpec::new("rpm").args(["-q", package])).await,
        Ok(output) if output.success()
    );
    debug!(package, installed, "package query");
    installed
}

/// Repository channel from the os-release `VERSION` field.
pub fn release_channel(version: &str) -> &'static str {
    if version.contains("Rome") {
        "rolling"
    } else if version.contains("Rock") {
        "rock"
    } else {
        "cooker"
    }
}

pub fn repo_arch(machine: &str) -> &'static str {
    match machine.trim() {
        "znver1" => "znver1",
        "aarch64" => "aarch64",
        "riscv64" => "riscv64",
        _ => "x86_64",
    }
}

/// `--enablerepo` value for the restricted repository of this installation.
pub fn restricted_repo(os_release: &HashMap<String, String>, machine: &str) -> String {
    let version = os_release.get("VERSION").map(String::as_str).unwrap_or_default();
    format!("{}-{}-restricted", release_channel(version), repo_arch(machine))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    pub package: &'static str,
    pub description: &'static str,
}

pub const CODECS: &[Codec] = &[
    Codec { package: "lib64dvdcss2", description: "DVD decryption library" },
    Codec { package: "faac", description: "AAC audio encoder" },
    Codec { package: "flac", description: "Free Lossless Audio Codec" },
    Codec { package: "faad2", description: "AAC audio decoder" },
    Codec { package: "gpac", description: "Multimedia framework" },
    Codec { package: "gstreamer1.0-svt-hevc", description: "SVT-HEVC encoder plugin for GStreamer" },
    Codec { package: "kvazaar", description: "Open-source HEVC encoder" },
    Codec { package: "lib64de265_0", description: "H.265/HEVC decoder" },
    Codec { package: "lib64dvdcss", description: "DVD decryption library" },
    Codec { package: "x264", description: "H.264/AVC encoder" },
    Codec { package: "lib64xvid4", description: "MPEG-4 video codec" },
    Codec { package: "lib64dca0", description: "DTS audio decoder" },
    Codec { package: "lib64fdk-aac", description: "AAC audio codec" },
    Codec { package: "lib64heif", description: "HEIF image format support" },
    Codec { package: "x265", description: "H.265/HEVC encoder" },
    Codec { package: "vvenc", description: "Versatile Video Encoder" },
    Codec { package: "vvdec", description: "Versatile Video Decoder" },
    Codec { package: "uvg266", description: "Open-source VVC encoder" },
    Codec { package: "svt-hevc", description: "SVT-HEVC encoder" },
    Codec { package: "kf6-kimageformats-heif", description: "HEIF format plugin for KDE" },
];

pub fn codec_install_spec(selected: &[&str], restricted_repo: &str) -> Option<CommandSpec> {
    if selected.is_empty() {
        return None;
    }
    let enable = format!("--enablerepo={}", restricted_repo);
    Some(install_spec(selected, &[enable.as_str()]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverBundle {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub confirmation: &'static str,
    pub packages: &'static [&'static str],
    pub post_install: Option<&'static str>,
}

pub const DRIVERS: &[DriverBundle] = &[
    DriverBundle {
        id: "nvidia",
        name: "NVIDIA Drivers",
        description: "Proprietary drivers for NVIDIA graphics cards",
        confirmation: "This will install the NVIDIA proprietary drivers from the system repository. Do you want to continue?",
        packages: &["nvidia", "nvidia-settings"],
        post_install: Some("Restart the computer to load the new driver."),
    },
    DriverBundle {
        id: "rocm",
        name: "AMD ROCm",
        description: "Open-source ROCm drivers for AMD graphics cards",
        confirmation: "This will install the ROCm compute stack. Do you want to continue?",
        packages: &[
            "lib64hsakmt1",
            "rocm-clinfo",
            "rocm-comgr",
            "rocm-device-libs",
            "rocm-opencl",
            "rocm-runtime",
            "rocm-smi",
            "rocminfo",
        ],
        post_install: Some(
            "Add your user to the render and video groups (Users page) and restart the computer to use ROCm.",
        ),
    },
    DriverBundle {
        id: "amdvlk",
        name: "AMDVLK",
        description: "Open-source Vulkan drivers for AMD graphics cards",
        confirmation: "This will install the AMDVLK Vulkan drivers (for advanced users). Do you want to continue?",
        packages: &["amdvlk-vulkan-driver", "amdvlk-vulkan-driver-32"],
        post_install: None,
    },
];

pub fn driver(id: &str) -> Option<&'static DriverBundle> {
    DRIVERS.iter().find(|bundle| bundle.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularApp {
    pub name: &'static str,
    pub package: &'static str,
    pub binary: Option<&'static str>,
    pub description: &'static str,
}

impl PopularApp {
    /// Binary to launch when the application is present.
    pub fn launchable(&self) -> Option<&'static str> {
        self.binary.filter(|path| binary_exists(path))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AppCategory {
    pub name: &'static str,
    pub apps: &'static [PopularApp],
}

const fn app(
    name: &'static str,
    package: &'static str,
    binary: Option<&'static str>,
    description: &'static str,
) -> PopularApp {
    PopularApp { name, package, binary, description }
}

pub const APP_CATEGORIES: &[AppCategory] = &[
    AppCategory {
        name: "Web Browsers",
        apps: &[
            app("Mozilla Firefox", "firefox", Some("/usr/bin/firefox"), "Popular open-source web browser from Mozilla"),
            app("Chromium", "chromium-browser", Some("/usr/bin/chromium"), "Open-source browser that powers Chrome"),
            app("Falkon", "plasma6-falkon", Some("/usr/bin/falkon"), "Web browser based on QtWebEngine"),
            app("GNOME Web (Epiphany)", "epiphany", Some("/usr/bin/epiphany"), "Simple and clean web browser for GNOME"),
            app("Konqueror", "plasma6-konqueror", Some("/usr/bin/konqueror"), "KDE's web browser and file manager"),
            app("SeaMonkey", "seamonkey", Some("/usr/bin/seamonkey"), "All-in-one internet application suite"),
        ],
    },
    AppCategory {
        name: "Email Clients",
        apps: &[
            app("Mozilla Thunderbird", "thunderbird", Some("/usr/bin/thunderbird"), "Email, RSS and newsgroup client"),
            app("Evolution", "evolution", Some("/usr/bin/evolution"), "Integrated mail, calendar and address book"),
            app("KMail", "plasma6-kmail", Some("/usr/bin/kmail"), "KDE's email client"),
            app("Geary", "geary", Some("/usr/bin/geary"), "Lightweight email client for GNOME"),
            app("Claws Mail", "claws-mail", Some("/usr/bin/claws-mail"), "Lightweight and fast email client"),
        ],
    },
    AppCategory {
        name: "Office Suites",
        apps: &[
            app("LibreOffice", "libreoffice", Some("/usr/bin/soffice"), "Office suite compatible with Microsoft Office"),
            app("AbiWord", "abiword", Some("/usr/bin/abiword"), "Lightweight word processor"),
            app("Calligra", "calligra", Some("/usr/bin/calligra"), "Integrated office suite for KDE"),
        ],
    },
    AppCategory {
        name: "Launchers",
        apps: &[
            app("Steam", "steam", Some("/usr/bin/steam"), "Popular gaming platform"),
            app("WINE", "wine", None, "Windows compatibility layer"),
            app("DXVK", "dxvk", None, "Vulkan-based implementation of DirectX"),
            app("Lutris", "lutris", Some("/usr/bin/lutris"), "Game manager for Linux"),
            app("Rare", "rare", Some("/usr/bin/rare"), "Epic Games Launcher for Linux"),
            app("Faugus Launcher", "faugus-launcher", Some("/usr/bin/faugus-launcher"), "Game launcher"),
        ],
    },
    AppCategory {
        name: "Audio Players",
        apps: &[
            app("G4Music", "g4music", Some("/usr/bin/g4music"), "Modern GTK4 music player"),
            app("Amarok", "amarok", Some("/usr/bin/amarok"), "Feature-rich music player"),
            app("Audacious", "audacious", Some("/usr/bin/audacious"), "Advanced audio player"),
            app("Rhythmbox", "rhythmbox", Some("/usr/bin/rhythmbox"), "Music management application"),
            app("Amberol", "amberol", Some("/usr/bin/amberol"), "Elegant music player"),
            app("Strawberry", "strawberry", Some("/usr/bin/strawberry"), "Music player and collection organizer"),
        ],
    },
    AppCategory {
        name: "Video Players",
        apps: &[
            app("Clapper", "clapper", Some("/usr/bin/clapper"), "GNOME media player"),
            app("MPV", "mpv", Some("/usr/bin/mpv"), "Minimalist video player"),
            app("VLC", "vlc", Some("/usr/bin/vlc"), "Versatile media player"),
            app("Celluloid", "celluloid", Some("/usr/bin/celluloid"), "GTK frontend for mpv"),
            app("SMPlayer", "smplayer", Some("/usr/bin/smplayer"), "Complete front-end for MPlayer"),
        ],
    },
    AppCategory {
        name: "Graphics",
        apps: &[
            app("GIMP", "gimp", Some("/usr/bin/gimp"), "Image manipulation program"),
            app("Inkscape", "inkscape", Some("/usr/bin/inkscape"), "Vector graphics editor"),
            app("Darktable", "darktable", Some("/usr/bin/darktable"), "Photography workflow application"),
            app("RawTherapee", "rawtherapee", Some("/usr/bin/rawtherapee"), "Raw image processing program"),
            app("Krita", "krita", Some("/usr/bin/krita"), "Digital painting program"),
        ],
    },
    AppCategory {
        name: "Video Editors",
        apps: &[
            app("Kdenlive", "kdenlive", Some("/usr/bin/kdenlive"), "Non-linear video editor"),
            app("Shotcut", "shotcut", Some("/usr/bin/shotcut"), "Cross-platform video editor"),
            app("OpenShot", "openshot", Some("/usr/bin/openshot-qt"), "Simple video editor"),
            app("Pitivi", "pitivi", Some("/usr/bin/pitivi"), "Free video editor"),
        ],
    },
    AppCategory {
        name: "Screen Recording / Stream",
        apps: &[
            app("OBS Studio", "obs-studio", Some("/usr/bin/obs"), "Streaming and recording program"),
            app("GPU Screen Recorder", "gpu-screen-recorder-gtk", Some("/usr/bin/gpu-screen-recorder-gtk"), "Hardware-accelerated screen recorder"),
            app("Vokoscreen NG", "vokoscreenng", Some("/usr/bin/vokoscreenNG"), "Screen recorder"),
        ],
    },
    AppCategory {
        name: "Games",
        apps: &[
            app("0 A.D.", "0ad", Some("/usr/games/0ad"), "Ancient warfare game"),
            app("SuperTuxKart", "supertuxkart", Some("/usr/bin/supertuxkart"), "3D racing game"),
            app("Battle for Wesnoth", "wesnoth", Some("/usr/bin/wesnoth"), "Turn-based strategy game"),
            app("Warzone 2100", "warzone2100", Some("/usr/bin/warzone2100"), "Real-time strategy game"),
            app("OpenTTD", "openttd", Some("/usr/games/openttd"), "Transport simulation game"),
            app("Xonotic", "xonotic", Some("/usr/games/xonotic-glx"), "Fast-paced arena shooter"),
            app("Hedgewars", "hedgewars", Some("/usr/bin/hedgewars"), "Turn-based strategy game"),
        ],
    },
    AppCategory {
        name: "Games That Need Assets",
        apps: &[
            app("VCMI", "vcmi", Some("/usr/bin/vcmilauncher"), "Heroes III engine"),
            app("FHeroes2", "fheroes2", Some("/usr/bin/fheroes2"), "Heroes II engine"),
            app("DevilutionX", "devilutionx", Some("/usr/bin/devilutionx"), "Diablo engine"),
            app("OpenMW", "openmw", Some("/usr/bin/openmw-launcher"), "Morrowind engine"),
            app("GZDoom", "gzdoom", Some("/usr/bin/gzdoom"), "Advanced Doom engine"),
        ],
    },
    AppCategory {
        name: "Messengers",
        apps: &[
            app("Fractal", "fractal", Some("/usr/bin/fractal"), "Matrix client"),
            app("Nheko", "nheko", Some("/usr/bin/nheko"), "Matrix client"),
            app("Pidgin", "pidgin", Some("/usr/bin/pidgin"), "Multi-protocol messenger"),
            app("Telegram", "telegram-desktop", Some("/usr/bin/telegram-desktop"), "Telegram messenger"),
        ],
    },
    AppCategory {
        name: "Utility",
        apps: &[
            app("Audacity", "audacity", Some("/usr/bin/audacity"), "Audio editor"),
            app("Blender", "blender", Some("/usr/bin/blender"), "3D creation suite"),
            app("HandBrake", "handbrake", Some("/usr/bin/handbrake"), "Video transcoder"),
            app("Mixxx", "mixxx", Some("/usr/bin/mixxx"), "DJ software"),
            app("VirtualBox", "virtualbox", Some("/usr/bin/VirtualBox"), "Virtualization software"),
        ],
    },
];

pub fn find_app(package: &str) -> Option<&'static PopularApp> {
    APP_CATEGORIES
        .iter()
        .flat_map(|category| category.apps.iter())
        .find(|app| app.package == package)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalApp {
    pub id: &'static str,
    pub name: &'static str,
    pub package: &'static str,
    pub binary: &'static str,
    pub description: &'static str,
    pub repo_file: &'static str,
    pub repo_content: &'static str,
    pub key_url: Option<&'static str>,
}

impl ExternalApp {
    pub fn is_installed(&self) -> bool {
        binary_exists(self.binary)
    }

    pub fn repo_path(&self) -> String {
        format!("{}/{}", YUM_REPOS_DIR, self.repo_file)
    }

    /// Key import, repository file, cache refresh and install, in order.
    pub fn install_steps(&self) -> Vec<CommandSpec> {
        let mut steps = Vec::with_capacity(4);
        if let Some(key) = self.key_url {
            steps.push(CommandSpec::new("rpm").args(["--import", key]).privileged());
        }
        steps.push(write_root_file_spec(&self.repo_path(), &format!("{}\n", self.repo_content)));
        steps.push(CommandSpec::new("dnf").arg("makecache").privileged());
        steps.push(install_spec(&[self.package], &[]));
        steps
    }
}

pub const EXTERNAL_APPS: &[ExternalApp] = &[
    ExternalApp {
        id: "opera",
        name: "Opera Browser",
        package: "opera-stable",
        binary: "/usr/bin/opera",
        description: "Fast and secure web browser",
        repo_file: "opera.repo",
        repo_content: "[opera]\nname=Opera Browser\ntype=rpm-md\nbaseurl=https://rpm.opera.com/rpm\ngpgcheck=1\ngpgkey=https://rpm.opera.com/rpmrepo.key\nenabled=1",
        key_url: Some("https://rpm.opera.com/rpmrepo.key"),
    },
    ExternalApp {
        id: "brave",
        name: "Brave Browser",
        package: "brave-browser",
        binary: "/usr/bin/brave-browser",
        description: "Privacy-focused web browser",
        repo_file: "brave-browser.repo",
        repo_content: "[brave-browser]\nname=Brave Browser\nbaseurl=https://brave-browser-rpm-release.s3.brave.com/x86_64/\nenabled=1\ngpgcheck=1\ngpgkey=https://brave-browser-rpm-release.s3.brave.com/brave-core.asc",
        key_url: None,
    },
    ExternalApp {
        id: "chrome",
        name: "Google Chrome",
        package: "google-chrome-stable",
        binary: "/usr/bin/google-chrome",
        description: "Popular web browser from Google",
        repo_file: "google-chrome.repo",
        repo_content: "[google-chrome]\nname=Google Chrome\nbaseurl=https://dl.google.com/linux/chrome/rpm/stable/$basearch\nenabled=1\ngpgcheck=0",
        key_url: None,
    },
    ExternalApp {
        id: "vivaldi",
        name: "Vivaldi Browser",
        package: "vivaldi-stable",
        binary: "/usr/bin/vivaldi",
        description: "Feature-rich web browser",
        repo_file: "vivaldi.repo",
        repo_content: "[vivaldi]\nname=Vivaldi browser\nbaseurl=https://repo.vivaldi.com/archive/rpm/x86_64\nenabled=1\ngpgcheck=0",
        key_url: None,
    },
    ExternalApp {
        id: "edge",
        name: "Microsoft Edge",
        package: "microsoft-edge-stable",
        binary: "/usr/bin/microsoft-edge",
        description: "Chromium-based browser from Microsoft",
        repo_file: "microsoft-edge.repo",
        repo_content: "[microsoft-edge]\nname=Microsoft Edge\nbaseurl=https://packages.microsoft.com/yumrepos/edge\nenabled=1\ngpgcheck=1\ngpgkey=https://packages.microsoft.com/keys/microsoft.asc",
        key_url: Some("https://packages.microsoft.com/keys/microsoft.asc"),
    },
    ExternalApp {
        id: "vscode",
        name: "Visual Studio Code",
        package: "code",
        binary: "/usr/bin/code",
        description: "Popular code editor from Microsoft",
        repo_file: "vscode.repo",
        repo_content: "[code]\nname=Visual Studio Code\nbaseurl=https://packages.microsoft.com/yumrepos/vscode\nenabled=1\ngpgcheck=1\ngpgkey=https://packages.microsoft.com/keys/microsoft.asc",
        key_url: Some("https://packages.microsoft.com/keys/microsoft.asc"),
    },
];

pub fn external_app(id: &str) -> Option<&'static ExternalApp> {
    EXTERNAL_APPS.iter().find(|app| app.id == id)
}

pub const YUMEX_BINARY: &str = "yumex";
pub const YUMEX_PACKAGE: &str = "yumex";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restricted_repo_follows_release_and_arch() {
        let mut release = HashMap::new();
        release.insert("VERSION".to_string(), "6.0 (Rome)".to_string());
        assert_eq!(restricted_repo(&release, "x86_64\n"), "rolling-x86_64-restricted");
        assert_eq!(restricted_repo(&release, "znver1"), "rolling-znver1-restricted");

        release.insert("VERSION".to_string(), "5.0 (Rock)".to_string());
        assert_eq!(restricted_repo(&release, "mips"), "rock-x86_64-restricted");

        assert_eq!(restricted_repo(&HashMap::new(), "aarch64"), "cooker-aarch64-restricted");
    }

    #[test]
    fn codec_install_enables_restricted_repo() {
        assert!(codec_install_spec(&[], "cooker-x86_64-restricted").is_none());
        let spec = codec_install_spec(&["x264", "x265"], "cooker-x86_64-restricted").unwrap();
        assert_eq!(
            spec.display(),
            "dnf install -y --enablerepo=cooker-x86_64-restricted x264 x265"
        );
        assert!(spec.is_privileged());
    }

    #[test]
    fn external_app_steps_import_key_first() {
        let vscode = external_app("vscode").unwrap();
        let steps: Vec<String> = vscode.install_steps().iter().map(|s| s.display()).collect();
        assert_eq!(
            steps,
            vec![
                "rpm --import https://packages.microsoft.com/keys/microsoft.asc".to_string(),
                "tee /etc/yum.repos.d/vscode.repo".to_string(),
                "dnf makecache".to_string(),
                "dnf install -y code".to_string(),
            ]
        );
        let chrome = external_app("chrome").unwrap();
        assert_eq!(chrome.install_steps().len(), 3);
    }

    #[test]
    fn catalogs_have_unique_keys() {
        let mut codecs: Vec<_> = CODECS.iter().map(|c| c.package).collect();
        codecs.sort();
        codecs.dedup();
        assert_eq!(codecs.len(), CODECS.len());
        assert_eq!(driver("rocm").map(|d| d.packages.len()), Some(8));
        assert_eq!(find_app("vlc").map(|a| a.name), Some("VLC"));
    }
}
