pub mod msg;
pub mod widgets;
pub mod model;
pub mod task;
pub mod dialogs;
pub mod category;
pub mod sidebar;
pub mod home;
pub mod system;
pub mod software;
pub mod network;
pub mod hardware;
pub mod security;
pub mod users;
pub mod services;
pub mod settings;
pub mod console;
pub mod loading;

pub use model::AppModel;
pub use msg::AppMsg;

use std::sync::Arc;
use std::time::Duration;

use adw::prelude::*;
use relm4::gtk;
use relm4::{ComponentParts, ComponentSender, SimpleComponent};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::exec::spawn_detached;
use crate::models::{Section, Theme};
use crate::progress::{self, TaskEvent};
use crate::settings::Settings;
use crate::system::audio::AudioState;
use crate::system::security::FirewallStatus;
use crate::system::services::StatusFilter;
use crate::system::users::Accounts;
use crate::ui::console::create_console_page;
use crate::ui::dialogs::ProgressDialog;
use crate::ui::hardware::HardwarePage;
use crate::ui::home::create_home_page;
use crate::ui::loading::create_loading_page;
use crate::ui::model::AppState;
use crate::ui::msg::SoftwareMsg;
use crate::ui::network::NetworkPage;
use crate::ui::security::SecurityPage;
use crate::ui::services::ServicesPage;
use crate::ui::settings::create_settings_page;
use crate::ui::sidebar::create_sidebar;
use crate::ui::software::SoftwarePage;
use crate::ui::system::SystemPage;
use crate::ui::task::AfterTask;
use crate::ui::users::UsersPage;
use crate::ui::widgets::AppWidgets;

const TICK_INTERVAL: Duration = Duration::from_secs(1);
const HARDWARE_REFRESH_TICKS: u64 = 5;
const AUDIO_REFRESH_TICKS: u64 = 2;

pub struct AppInit {
    pub rt: Arc<Runtime>,
    pub config: AppConfig,
    pub start_page: Section,
}

impl SimpleComponent for AppModel {
    type Input = AppMsg;
    type Output = ();
    type Init = AppInit;
    type Root = adw::ApplicationWindow;
    type Widgets = AppWidgets;

    fn init_root() -> Self::Root {
        let window = adw::ApplicationWindow::builder()
            .title("Tears of Mandrake")
            .default_width(900)
            .default_height(640)
            .build();
        window.set_decorated(true);

        let provider = gtk::CssProvider::new();
        provider.load_from_data("
            .task-transcript { font-size: smaller; }
            flowbox > flowboxchild { padding: 0; }
            flowbox button.card { padding: 6px; }
            row.property label.subtitle { font-family: monospace; }
        ");

        if let Some(display) = gtk::gdk::Display::default() {
            gtk::style_context_add_provider_for_display(
                &display,
                &provider,
                gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
            );
        }

        window
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let AppInit { rt, config, start_page } = init;

        // Category pages hold their own widgets and live in the model
        let system = SystemPage::new(&sender);
        let software = SoftwarePage::new(&sender);
        let network = NetworkPage::new(&sender);
        let hardware = HardwarePage::new(&sender);
        let security = SecurityPage::new(&sender);
        let users = UsersPage::new(&sender);
        let services = ServicesPage::new(&sender);

        let mut model = AppModel {
            state: AppState::Loading,
            config,
            window: Some(root.clone()),
            toast_overlay: None,

            settings: Settings::default(),
            logs: gtk::TextBuffer::new(None),
            sidebar_collapsed: false,

            active_task: None,
            progress_dialog: None,

            system,
            software,
            network,
            hardware,
            security,
            users,
            services,

            ticks: 0,
            hardware_loading: false,
            pending_updates: Vec::new(),
            repo_states: Vec::new(),
            restricted_repo: None,
            accounts: Accounts::default(),
            service_list: Vec::new(),
            service_search: String::new(),
            service_filter: StatusFilter::default(),
            audio: AudioState::default(),
            audio_loading: false,
            sound_server: None,
            firewall: FirewallStatus::default(),

            sender: sender.clone(),
            rt,
        };

        root.set_title(Some("Tears of Mandrake"));

        let navigation_split_view = adw::NavigationSplitView::new();
        navigation_split_view.set_collapsed(false);
        navigation_split_view.set_vexpand(true);
        navigation_split_view.set_hexpand(true);

        navigation_split_view.set_max_sidebar_width(250.0);
        navigation_split_view.set_min_sidebar_width(60.0);

        let (sidebar, nav_buttons) = create_sidebar(&sender);
        navigation_split_view.set_sidebar(Some(&sidebar));

        let content_stack = gtk::Stack::new();
        content_stack.set_transition_type(gtk::StackTransitionType::Crossfade);
        content_stack.set_transition_duration(200);

        let home_page = create_home_page(&sender);
        let settings_widgets = create_settings_page(&sender);
        let console_page = create_console_page(&sender, &model.logs);
        let loading_page = create_loading_page();

        content_stack.add_titled(&home_page, Some(Section::Home.name()), Section::Home.title());
        content_stack.add_titled(&model.system.root, Some(Section::System.name()), Section::System.title());
        content_stack.add_titled(&model.software.root, Some(Section::Software.name()), Section::Software.title());
        content_stack.add_titled(&model.network.root, Some(Section::Network.name()), Section::Network.title());
        content_stack.add_titled(&model.hardware.root, Some(Section::Hardware.name()), Section::Hardware.title());
        content_stack.add_titled(&model.security.root, Some(Section::Security.name()), Section::Security.title());
        content_stack.add_titled(&model.users.root, Some(Section::Users.name()), Section::Users.title());
        content_stack.add_titled(&model.services.root, Some(Section::Services.name()), Section::Services.title());
        content_stack.add_titled(&console_page, Some(Section::Console.name()), Section::Console.title());
        content_stack.add_titled(&settings_widgets.page, Some(Section::Settings.name()), Section::Settings.title());
        content_stack.add_titled(&loading_page, Some("loading"), "Loading");

        // Error Page
        let error_box = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(12)
            .halign(gtk::Align::Center)
            .build();

        let error_label = gtk::Label::new(None);
        error_label.add_css_class("error-label");
        error_label.set_wrap(true);
        error_label.set_max_width_chars(50);
        error_label.set_halign(gtk::Align::Center);

        let error_back_button = gtk::Button::builder()
            .label("Back to Home")
            .halign(gtk::Align::Center)
            .css_classes(vec!["suggested-action".to_string()])
            .build();

        let sender_clone = sender.clone();
        error_back_button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::NavigateToSection(Section::Home));
        });

        error_box.append(&error_label);
        error_box.append(&error_back_button);

        let error_status_page = adw::StatusPage::builder()
            .title("Error")
            .icon_name("dialog-error-symbolic")
            .child(&error_box)
            .build();

        content_stack.add_titled(&error_status_page, Some("error"), "Error");

        // Wrap content_stack in a NavigationPage for NavigationSplitView
        let navigation_page = adw::NavigationPage::builder()
            .title("Tears of Mandrake")
            .child(&content_stack)
            .build();

        navigation_split_view.set_content(Some(&navigation_page));

        let toast_overlay = adw::ToastOverlay::new();
        toast_overlay.set_child(Some(&navigation_split_view));
        model.toast_overlay = Some(toast_overlay.clone());

        let header_bar = adw::HeaderBar::new();
        header_bar.set_show_end_title_buttons(true);
        let window_title = adw::WindowTitle::new("Tears of Mandrake", "");
        header_bar.set_title_widget(Some(&window_title));

        let sidebar_toggle_button = gtk::Button::builder()
            .icon_name("sidebar-show-symbolic")
            .tooltip_text("Toggle Sidebar")
            .build();

        let sender_clone = sender.clone();
        sidebar_toggle_button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::ToggleSidebar);
        });

        let back_button = gtk::Button::builder()
            .icon_name("go-previous-symbolic")
            .tooltip_text("Back")
            .visible(false)
            .build();

        let sender_clone = sender.clone();
        back_button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::GoBack);
        });

        header_bar.pack_start(&sidebar_toggle_button);
        header_bar.pack_start(&back_button);

        let main_box = gtk::Box::new(gtk::Orientation::Vertical, 0);
        main_box.set_vexpand(true);
        main_box.set_hexpand(true);
        main_box.set_valign(gtk::Align::Fill);
        main_box.append(&header_bar);
        main_box.append(&toast_overlay);

        root.set_content(Some(&main_box));

        let widgets = AppWidgets {
            window_title,
            navigation_split_view,
            navigation_page,
            content_stack,
            back_button,
            sidebar_toggle_button,
            nav_buttons,
            theme_combo: settings_widgets.theme_combo,
            hide_console_switch: settings_widgets.hide_console_switch,
            confirm_switch: settings_widgets.confirm_switch,
            error_label,
        };

        // Load settings, then show the first page
        let sender_clone = sender.clone();
        let config = model.config.clone();
        model.rt.spawn(async move {
            let settings = Settings::load(&config.settings_path()).await;
            sender_clone.input(AppMsg::SettingsLoaded(settings));
            match config.ensure_directories().await {
                Ok(()) => sender_clone.input(AppMsg::NavigateToSection(start_page)),
                Err(e) => sender_clone.input(AppMsg::Error(format!(
                    "Could not create {}: {}. Settings will not be saved.",
                    config.config_dir.display(),
                    e
                ))),
            }
        });

        // Clock and live refreshes
        let sender_clone = sender.clone();
        model.rt.spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                sender_clone.input(AppMsg::Tick);
            }
        });

        info!(page = start_page.name(), "control center started");
        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        match msg {
            AppMsg::NavigateToSection(section) => {
                if section == Section::Console && self.settings.hide_console {
                    return;
                }
                self.state = AppState::ready(section);
                match section {
                    Section::Users => self.load_accounts(),
                    Section::Services => self.load_services(),
                    _ => {}
                }
            }
            AppMsg::OpenSubpage(section, name) => {
                self.state = AppState::Ready {
                    current_section: section,
                    subpage: Some(name),
                };
                match section {
                    Section::System => self.open_system_page(name),
                    Section::Software => self.open_software_page(name),
                    Section::Hardware => self.open_hardware_page(name),
                    Section::Security => self.load_firewall(),
                    _ => {}
                }
            }
            AppMsg::GoBack => {
                self.state = match &self.state {
                    AppState::Ready {
                        current_section,
                        subpage: Some(_),
                    } => AppState::ready(*current_section),
                    _ => AppState::ready(Section::Home),
                };
            }
            AppMsg::ToggleSidebar => {
                self.sidebar_collapsed = !self.sidebar_collapsed;
                self.settings.sidebar_collapsed = self.sidebar_collapsed;
                self.save_settings();
            }
            AppMsg::NotImplemented(feature) => {
                self.message(feature, &format!("{} is not implemented yet.", feature));
            }
            AppMsg::Tick => self.tick(),

            AppMsg::SettingsLoaded(settings) => {
                self.sidebar_collapsed = settings.sidebar_collapsed;
                apply_theme(settings.theme);
                self.settings = settings;
            }
            AppMsg::ThemeSelected(theme) => {
                apply_theme(theme);
                if self.settings.theme != theme {
                    self.settings.theme = theme;
                    self.save_settings();
                }
            }
            AppMsg::ToggleHideConsole(hide) => {
                if self.settings.hide_console != hide {
                    self.settings.hide_console = hide;
                    self.save_settings();
                    if hide && matches!(self.state, AppState::Ready { current_section: Section::Console, .. }) {
                        self.state = AppState::ready(Section::Settings);
                    }
                }
            }
            AppMsg::ToggleConfirmPrivileged(confirm) => {
                if self.settings.confirm_privileged != confirm {
                    self.settings.confirm_privileged = confirm;
                    self.save_settings();
                }
            }
            AppMsg::OpenConfigFolder => {
                let dir = self.config.config_dir.clone();
                let sender = self.sender.clone();
                self.rt.spawn(async move {
                    if let Err(e) = open::that(&dir) {
                        sender.input(AppMsg::ShowError(
                            "Could Not Open Folder".to_string(),
                            format!("{}: {}", dir.display(), e),
                        ));
                    }
                });
            }
            AppMsg::ClearConsole => self.logs.set_text(""),

            AppMsg::Log(line) => self.log(&line),
            AppMsg::ShowToast(text) => self.toast(&text),
            AppMsg::ShowMessage(heading, body) => self.message(&heading, &body),
            AppMsg::ShowError(heading, body) => {
                error!(heading = %heading, "{}", body);
                self.message(&heading, &body);
            }
            AppMsg::Error(message) => {
                error!("{}", message);
                self.state = AppState::Error { message };
            }

            AppMsg::RequestTask(task) => {
                if self.active_task.is_some() {
                    self.toast("Another task is already running");
                    return;
                }
                let always_ask = task.confirm.is_some();
                if always_ask || self.settings.confirm_privileged {
                    let body = task.confirm.clone().unwrap_or_else(|| {
                        format!(
                            "The following commands will run with administrator privileges:\n\n{}",
                            task.command_summary()
                        )
                    });
                    let heading = task.title.clone();
                    self.confirm(&heading, &body, "Continue", false, AppMsg::StartTask(task));
                } else {
                    self.sender.input(AppMsg::StartTask(task));
                }
            }
            AppMsg::StartTask(task) => {
                if self.active_task.is_some() {
                    self.toast("Another task is already running");
                    return;
                }
                self.log(&format!("==> {}", task.title));
                for step in &task.steps {
                    self.log(&format!("$ {}", step.display()));
                }
                self.progress_dialog = Some(ProgressDialog::new(self.window.as_ref(), &task.title));

                let steps = task.steps.clone();
                let status = task.status.clone();
                let sender = self.sender.clone();
                self.rt.spawn(async move {
                    let events = sender.clone();
                    let result = progress::run_tracked(&steps, &status, move |event| {
                        events.input(AppMsg::TaskProgress(event));
                    })
                    .await;
                    sender.input(AppMsg::TaskFinished(result.map_err(|e| e.user_message())));
                });
                self.active_task = Some(*task);
            }
            AppMsg::TaskProgress(TaskEvent::Output(line)) => self.log(line.text()),
            AppMsg::TaskProgress(TaskEvent::Progress(update)) => {
                if let Some(dialog) = &self.progress_dialog {
                    dialog.update(&update);
                }
            }
            AppMsg::TaskFinished(result) => {
                if let Some(dialog) = self.progress_dialog.take() {
                    dialog.close();
                }
                let Some(task) = self.active_task.take() else {
                    return;
                };
                let success = result.is_ok();
                match result {
                    Ok(_) => {
                        info!(task = %task.title, "task finished");
                        self.log(&format!("==> {} finished", task.title));
                        self.message("Success", &task.success);
                    }
                    Err(e) => {
                        warn!(task = %task.title, error = %e, "task failed");
                        self.log(&format!("==> {} failed: {}", task.title, e));
                        if task.suggest_repositories {
                            self.confirm(
                                "Failed",
                                &format!(
                                    "{} failed.\n\n{}\n\nSome packages are only available from the optional repositories. Open the repository settings?",
                                    task.title, e
                                ),
                                "Open Repositories",
                                false,
                                AppMsg::OpenSubpage(Section::Software, "repositories"),
                            );
                        } else {
                            self.message("Failed", &format!("{} failed.\n\n{}", task.title, e));
                        }
                    }
                }
                self.after_task(task.after, success);
            }
            AppMsg::ActionFinished { title, result, after } => {
                let success = result.is_ok();
                match result {
                    Ok(text) => {
                        if !text.is_empty() {
                            self.log(&text);
                            self.toast(&text);
                        }
                    }
                    Err(e) => {
                        warn!(action = %title, error = %e, "action failed");
                        self.log(&format!("{} failed: {}", title, e));
                        self.message(&format!("{} Failed", title), &e);
                    }
                }
                self.after_task(after, success);
            }

            AppMsg::System(msg) => self.update_system(msg),
            AppMsg::Software(msg) => self.update_software(msg),
            AppMsg::Network(msg) => self.update_network(msg),
            AppMsg::Hardware(msg) => self.update_hardware(msg),
            AppMsg::Security(msg) => self.update_security(msg),
            AppMsg::Users(msg) => self.update_users(msg),
            AppMsg::Services(msg) => self.update_services(msg),
        }
    }

    fn update_view(&self, widgets: &mut Self::Widgets, _sender: ComponentSender<Self>) {
        widgets.clear_sidebar_selection();

        match &self.state {
            AppState::Loading => {
                widgets.content_stack.set_visible_child_name("loading");
                widgets.back_button.set_visible(false);
            }
            AppState::Ready { current_section, subpage } => {
                if let Some(nav) = widgets.nav_button(*current_section) {
                    nav.button.add_css_class("suggested-action");
                }
                widgets.content_stack.set_visible_child_name(current_section.name());
                if let Some(stack) = self.category_stack(*current_section) {
                    stack.set_visible_child_name(subpage.unwrap_or("main"));
                }
                widgets.window_title.set_subtitle(current_section.title());
                widgets.navigation_page.set_title(current_section.title());
                widgets.back_button.set_visible(*current_section != Section::Home);
            }
            AppState::Error { message } => {
                widgets.error_label.set_text(message);
                widgets.content_stack.set_visible_child_name("error");
                widgets.back_button.set_visible(false);
            }
        }

        // Settings controls follow the model
        if let Some(console) = widgets.nav_button(Section::Console) {
            console.button.set_visible(!self.settings.hide_console);
        }
        if widgets.hide_console_switch.is_active() != self.settings.hide_console {
            widgets.hide_console_switch.set_active(self.settings.hide_console);
        }
        if widgets.confirm_switch.is_active() != self.settings.confirm_privileged {
            widgets.confirm_switch.set_active(self.settings.confirm_privileged);
        }
        let theme_index = self.settings.theme.index();
        if widgets.theme_combo.selected() != theme_index {
            widgets.theme_combo.set_selected(theme_index);
        }

        if self.sidebar_collapsed {
            widgets.navigation_split_view.set_min_sidebar_width(60.0);
            widgets.navigation_split_view.set_max_sidebar_width(60.0);
            widgets.sidebar_toggle_button.set_tooltip_text(Some("Expand Sidebar"));
        } else {
            widgets.navigation_split_view.set_min_sidebar_width(180.0);
            widgets.navigation_split_view.set_max_sidebar_width(250.0);
            widgets.sidebar_toggle_button.set_tooltip_text(Some("Collapse Sidebar"));
        }
        for nav in &widgets.nav_buttons {
            nav.container.set_halign(if self.sidebar_collapsed {
                gtk::Align::Center
            } else {
                gtk::Align::Start
            });
            nav.label.set_visible(!self.sidebar_collapsed);
        }
    }
}

fn apply_theme(theme: Theme) {
    let style_manager = adw::StyleManager::default();
    match theme {
        Theme::Dark => style_manager.set_color_scheme(adw::ColorScheme::ForceDark),
        Theme::Light => style_manager.set_color_scheme(adw::ColorScheme::ForceLight),
        Theme::System => style_manager.set_color_scheme(adw::ColorScheme::Default),
    }
}

// Helpers for model to keep update() cleaner
impl AppModel {
    fn save_settings(&self) {
        let path = self.config.settings_path();
        let settings = self.settings.clone();
        self.rt.spawn(async move {
            if let Err(e) = settings.save(&path).await {
                warn!(path = %path.display(), error = %e, "could not save settings");
            }
        });
    }

    fn category_stack(&self, section: Section) -> Option<&gtk::Stack> {
        match section {
            Section::System => Some(&self.system.root),
            Section::Software => Some(&self.software.root),
            Section::Network => Some(&self.network.root),
            Section::Hardware => Some(&self.hardware.root),
            Section::Security => Some(&self.security.root),
            _ => None,
        }
    }

    fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if self.state.showing(Section::System, "datetime") {
            self.system.update_clock();
        }
        if self.state.showing(Section::System, "hardware") && self.ticks % HARDWARE_REFRESH_TICKS == 0 {
            self.load_hardware();
        }
        if self.state.showing(Section::Hardware, "sound") && self.ticks % AUDIO_REFRESH_TICKS == 0 {
            self.load_audio();
        }
    }

    /// Refreshes whatever a finished task or action touched.
    fn after_task(&mut self, after: AfterTask, success: bool) {
        if !success && !after.runs_on_failure() {
            return;
        }
        match after {
            AfterTask::Nothing => {}
            AfterTask::ReloadKernels => self.open_system_page("kernels"),
            AfterTask::ReloadShells => self.open_system_page("tweaks"),
            AfterTask::ReloadTime => self.load_time_status(),
            AfterTask::ClearUpdates => {
                self.pending_updates.clear();
                self.update_software(SoftwareMsg::CheckUpdates);
            }
            AfterTask::ReloadPolicy => self.load_policy(),
            AfterTask::ReloadRepositories => self.load_repositories(),
            AfterTask::ReloadApps => self.refresh_app_lists(),
            AfterTask::AppInstalled(package) => self.mark_app_installed(package),
            AfterTask::ReloadAudio => {
                self.load_audio();
                self.load_sound_server();
            }
            AfterTask::ReloadTools => self.reload_tools(),
            AfterTask::ReloadFirewall => self.load_firewall(),
            AfterTask::ReloadAccounts => self.load_accounts(),
            AfterTask::ReloadServices => self.load_services(),
            AfterTask::Launch(binary) => {
                if let Err(e) = spawn_detached(binary, &[]) {
                    self.message("Could Not Launch Application", &e.user_message());
                }
                self.refresh_current_page();
            }
            AfterTask::LaunchTool(tool) => {
                if let Err(e) = tool.launch() {
                    self.message(&format!("Could Not Open {}", tool.name), &e.user_message());
                }
                self.reload_tools();
            }
        }
    }

    /// Re-runs the loader of the sub page on screen.
    fn refresh_current_page(&mut self) {
        if let AppState::Ready {
            current_section,
            subpage: Some(name),
        } = self.state.clone()
        {
            match current_section {
                Section::System => self.open_system_page(name),
                Section::Software => self.open_software_page(name),
                Section::Hardware => self.open_hardware_page(name),
                _ => {}
            }
        }
    }
}
