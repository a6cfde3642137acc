use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    Home,
    System,
    Software,
    Network,
    Hardware,
    Security,
    Users,
    Services,
    Console,
    Settings,
}

impl Section {
    pub const SIDEBAR: [Section; 10] = [
        Section::Home,
        Section::System,
        Section::Software,
        Section::Network,
        Section::Hardware,
        Section::Security,
        Section::Users,
        Section::Services,
        Section::Console,
        Section::Settings,
    ];

    /// Stack child name of the section page.
    pub fn name(self) -> &'static str {
        match self {
            Section::Home => "home",
            Section::System => "system",
            Section::Software => "software",
            Section::Network => "network",
            Section::Hardware => "hardware",
            Section::Security => "security",
            Section::Users => "users",
            Section::Services => "services",
            Section::Console => "console",
            Section::Settings => "settings",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::System => "System",
            Section::Software => "Software",
            Section::Network => "Network",
            Section::Hardware => "Hardware",
            Section::Security => "Security",
            Section::Users => "Users",
            Section::Services => "Services",
            Section::Console => "Console",
            Section::Settings => "Settings",
        }
    }

    pub fn icon_name(self) -> &'static str {
        match self {
            Section::Home => "user-home-symbolic",
            Section::System => "computer-symbolic",
            Section::Software => "system-software-install-symbolic",
            Section::Network => "network-wired-symbolic",
            Section::Hardware => "drive-harddisk-symbolic",
            Section::Security => "security-high-symbolic",
            Section::Users => "system-users-symbolic",
            Section::Services => "system-run-symbolic",
            Section::Console => "utilities-terminal-symbolic",
            Section::Settings => "emblem-system-symbolic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::System, Theme::Light, Theme::Dark];

    pub fn index(self) -> u32 {
        match self {
            Theme::System => 0,
            Theme::Light => 1,
            Theme::Dark => 2,
        }
    }

    pub fn from_index(index: u32) -> Self {
        match index {
            2 => Theme::Dark,
            1 => Theme::Light,
            _ => Theme::System,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Dark => write!(f, "Dark"),
            Theme::Light => write!(f, "Light"),
            Theme::System => write!(f, "System"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_index_round_trips_through_combo_position() {
        for theme in Theme::ALL {
            assert_eq!(Theme::from_index(theme.index()), theme);
        }
        assert_eq!(Theme::from_index(42), Theme::System);
    }

    #[test]
    fn section_names_are_unique() {
        let mut names: Vec<_> = Section::SIDEBAR.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Section::SIDEBAR.len());
    }
}
