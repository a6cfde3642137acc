use std::future::Future;
use std::sync::Arc;

use adw::prelude::*;
use relm4::{ComponentSender, gtk};
use tokio::runtime::Runtime;

use crate::config::AppConfig;
use crate::models::Section;
use crate::settings::Settings;
use crate::system::audio::{AudioState, SoundServer};
use crate::system::repositories::RepoState;
use crate::system::security::FirewallStatus;
use crate::system::services::{ServiceInfo, StatusFilter};
use crate::system::updates::PendingUpdate;
use crate::system::users::Accounts;
use crate::ui::dialogs::{self, ProgressDialog};
use crate::ui::hardware::HardwarePage;
use crate::ui::msg::AppMsg;
use crate::ui::network::NetworkPage;
use crate::ui::security::SecurityPage;
use crate::ui::services::ServicesPage;
use crate::ui::software::SoftwarePage;
use crate::ui::system::SystemPage;
use crate::ui::task::{AfterTask, Task};
use crate::ui::users::UsersPage;

#[derive(Debug, Clone, Default)]
pub enum AppState {
    #[default]
    Loading,
    Ready {
        current_section: Section,
        subpage: Option<&'static str>,
    },
    Error {
        message: String,
    },
}

impl AppState {
    pub fn ready(section: Section) -> Self {
        AppState::Ready {
            current_section: section,
            subpage: None,
        }
    }

    /// Whether `section`/`subpage` is what the user is looking at.
    pub fn showing(&self, section: Section, page: &str) -> bool {
        matches!(self, AppState::Ready { current_section, subpage: Some(name) }
            if *current_section == section && *name == page)
    }
}

pub struct AppModel {
    pub state: AppState,
    pub config: AppConfig,
    pub window: Option<adw::ApplicationWindow>,
    pub toast_overlay: Option<adw::ToastOverlay>,

    // Settings & Console
    pub settings: Settings,
    pub logs: gtk::TextBuffer,
    pub sidebar_collapsed: bool,

    // Task in flight
    pub active_task: Option<Task>,
    pub progress_dialog: Option<ProgressDialog>,

    // Category pages
    pub system: SystemPage,
    pub software: SoftwarePage,
    pub network: NetworkPage,
    pub hardware: HardwarePage,
    pub security: SecurityPage,
    pub users: UsersPage,
    pub services: ServicesPage,

    // Last known system state
    pub ticks: u64,
    pub hardware_loading: bool,
    pub pending_updates: Vec<PendingUpdate>,
    pub repo_states: Vec<RepoState>,
    pub restricted_repo: Option<String>,
    pub accounts: Accounts,
    pub service_list: Vec<ServiceInfo>,
    pub service_search: String,
    pub service_filter: StatusFilter,
    pub audio: AudioState,
    pub audio_loading: bool,
    pub sound_server: Option<SoundServer>,
    pub firewall: FirewallStatus,

    // Component sender for UI updates
    pub sender: ComponentSender<AppModel>,

    // Shared Tokio Runtime
    pub rt: Arc<Runtime>,
}

impl AppModel {
    pub fn log(&self, line: &str) {
        self.logs.insert(&mut self.logs.end_iter(), &format!("{}\n", line));
    }

    pub fn toast(&self, text: &str) {
        if let Some(overlay) = &self.toast_overlay {
            overlay.add_toast(adw::Toast::new(text));
        }
    }

    pub fn message(&self, heading: &str, body: &str) {
        dialogs::message(self.window.as_ref(), heading, body);
    }

    /// Always asks before sending `msg`.
    pub fn confirm(&self, heading: &str, body: &str, accept: &str, destructive: bool, msg: AppMsg) {
        let appearance = if destructive {
            adw::ResponseAppearance::Destructive
        } else {
            adw::ResponseAppearance::Suggested
        };
        dialogs::confirm(self.window.as_ref(), &self.sender, heading, body, accept, appearance, msg);
    }

    /// Asks before privileged changes when the user wants to be asked.
    pub fn guard(&self, heading: &str, body: &str, msg: AppMsg) {
        if self.settings.confirm_privileged {
            self.confirm(heading, body, "Continue", false, msg);
        } else {
            self.sender.input(msg);
        }
    }

    pub fn request_task(&self, task: Task) {
        self.sender.input(AppMsg::RequestTask(Box::new(task)));
    }

    /// Runs a short privileged change in the background and reports through
    /// a toast or an error dialog.
    pub fn spawn_action<F>(&self, title: impl Into<String>, after: AfterTask, action: F)
    where
        F: Future<Output = crate::error::Result<String>> + Send + 'static,
    {
        let title = title.into();
        let sender = self.sender.clone();
        self.rt.spawn(async move {
            let result = action.await.map_err(|e| e.user_message());
            sender.input(AppMsg::ActionFinished { title, result, after });
        });
    }

    /// Spawns `load` and feeds its result back as a message.
    pub fn spawn_load<F, M>(&self, load: F, wrap: M)
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
        M: FnOnce(F::Output) -> AppMsg + Send + 'static,
    {
        let sender = self.sender.clone();
        self.rt.spawn(async move {
            let output = load.await;
            sender.input(wrap(output));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn showing_matches_only_the_open_sub_page() {
        let state = AppState::Ready {
            current_section: Section::System,
            subpage: Some("datetime"),
        };
        assert!(state.showing(Section::System, "datetime"));
        assert!(!state.showing(Section::System, "hardware"));
        assert!(!state.showing(Section::Hardware, "datetime"));
        assert!(!AppState::ready(Section::System).showing(Section::System, "datetime"));
        assert!(!AppState::Loading.showing(Section::System, "datetime"));
    }
}
