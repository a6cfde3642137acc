use std::cell::Cell;
use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;

use adw::prelude::*;
use relm4::gtk;
use relm4::ComponentSender;

use crate::config::AUTOMATIC_CONF;
use crate::exec::{probe, spawn_detached, which};
use crate::models::Section;
use crate::system::packages::{
    self, APP_CATEGORIES, CODECS, DRIVERS, EXTERNAL_APPS, YUMEX_BINARY, YUMEX_PACKAGE,
};
use crate::system::repositories::{self, RepoState};
use crate::system::updates::{self, AutoUpdatePolicy, PendingUpdate};
use crate::ui::category::{
    add_subpage, boxed_list, clear_list, create_category_page, page_container, section_label,
    suffix_button, text_row, CategoryOption,
};
use crate::ui::model::AppModel;
use crate::ui::msg::{AppMsg, SoftwareMsg};
use crate::ui::task::{AfterTask, Task};
use crate::utils::read_os_release;

const UPDATE_LIST_LIMIT: usize = 25;

const OPTIONS: &[CategoryOption] = &[
    CategoryOption::page("Updates", "Check for and install system updates", "software-update-available-symbolic", "updates"),
    CategoryOption::page("Repositories", "Extra, Restricted and Non-Free", "folder-download-symbolic", "repositories"),
    CategoryOption::page("Popular Apps", "Install well known applications", "view-app-grid-symbolic", "apps"),
    CategoryOption::page("External Apps", "Browsers and editors from vendor repositories", "application-x-addon-symbolic", "external"),
    CategoryOption::page("Codecs", "Multimedia codecs from the restricted repository", "audio-x-generic-symbolic", "codecs"),
    CategoryOption::page("Drivers", "NVIDIA and AMD graphics drivers", "video-display-symbolic", "drivers"),
    CategoryOption::message("Yum Extender", "Graphical package manager", "system-software-install-symbolic", || {
        AppMsg::Software(SoftwareMsg::OpenYumex)
    }),
];

pub struct SoftwarePage {
    pub root: gtk::Stack,

    updates_status: gtk::Label,
    updates_spinner: gtk::Spinner,
    updates_list: gtk::ListBox,
    check_button: gtk::Button,
    apply_button: gtk::Button,
    policy_row: adw::ComboRow,
    applying_policy: Rc<Cell<bool>>,

    repos_list: gtk::ListBox,
    toggle_all_button: gtk::Button,

    apps_box: gtk::Box,
    installed_apps: HashSet<&'static str>,
    external_list: gtk::ListBox,

    codec_repo_label: gtk::Label,
    codec_checks: Vec<(&'static str, gtk::CheckButton)>,
}

impl SoftwarePage {
    pub fn new(sender: &ComponentSender<AppModel>) -> Self {
        let root = create_category_page(sender, Section::Software, OPTIONS);

        // Updates
        let (updates_page, updates_content) = page_container("Updates");
        let status_box = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        let updates_spinner = gtk::Spinner::new();
        let updates_status = gtk::Label::builder()
            .label("Press Check for Updates to look for new packages.")
            .wrap(true)
            .xalign(0.0)
            .hexpand(true)
            .build();
        status_box.append(&updates_spinner);
        status_box.append(&updates_status);

        let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        let check_button = gtk::Button::builder()
            .label("Check for Updates")
            .css_classes(vec!["pill".to_string()])
            .build();
        let sender_clone = sender.clone();
        check_button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::Software(SoftwareMsg::CheckUpdates));
        });
        let apply_button = gtk::Button::builder()
            .label("Install Updates")
            .sensitive(false)
            .css_classes(vec!["pill".to_string(), "suggested-action".to_string()])
            .build();
        let sender_clone = sender.clone();
        apply_button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::Software(SoftwareMsg::ApplyUpdates));
        });
        buttons.append(&check_button);
        buttons.append(&apply_button);

        let updates_list = boxed_list();
        updates_list.set_visible(false);

        let policy_list = boxed_list();
        let policies: Vec<String> = AutoUpdatePolicy::ALL.iter().map(|p| p.to_string()).collect();
        let policy_names: Vec<&str> = policies.iter().map(String::as_str).collect();
        let policy_row = adw::ComboRow::builder()
            .title("Automatic Updates")
            .subtitle("How dnf-automatic handles new updates")
            .model(&gtk::StringList::new(&policy_names))
            .build();
        let applying_policy = Rc::new(Cell::new(true));
        let sender_clone = sender.clone();
        let applying = applying_policy.clone();
        policy_row.connect_notify_local(Some("selected"), move |combo, _| {
            if applying.get() {
                return;
            }
            if let Some(policy) = AutoUpdatePolicy::ALL.get(combo.selected() as usize) {
                sender_clone.input(AppMsg::Software(SoftwareMsg::PolicySelected(*policy)));
            }
        });
        policy_list.append(&policy_row);

        updates_content.append(&status_box);
        updates_content.append(&buttons);
        updates_content.append(&updates_list);
        updates_content.append(&section_label("Update Frequency"));
        updates_content.append(&policy_list);
        add_subpage(&root, "updates", &updates_page);

        // Repositories
        let (repos_page, repos_content) = page_container("Repositories");
        let repos_description = gtk::Label::builder()
            .label("Optional repositories provide additional software. Restricted and Non-Free contain packages with patent or licensing restrictions.")
            .wrap(true)
            .xalign(0.0)
            .build();
        let repos_list = boxed_list();
        let toggle_all_button = gtk::Button::builder()
            .label("Enable All")
            .halign(gtk::Align::Start)
            .css_classes(vec!["pill".to_string()])
            .build();
        let sender_clone = sender.clone();
        toggle_all_button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::Software(SoftwareMsg::ToggleAllRepos));
        });
        repos_content.append(&repos_description);
        repos_content.append(&repos_list);
        repos_content.append(&toggle_all_button);
        add_subpage(&root, "repositories", &repos_page);

        // Popular apps
        let (apps_page, apps_content) = page_container("Popular Apps");
        let apps_box = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(18)
            .build();
        apps_content.append(&apps_box);
        add_subpage(&root, "apps", &apps_page);

        // External apps
        let (external_page, external_content) = page_container("External Apps");
        let external_description = gtk::Label::builder()
            .label("These applications come from their vendors' own repositories. Installing one adds its repository to the system.")
            .wrap(true)
            .xalign(0.0)
            .build();
        let external_list = boxed_list();
        external_content.append(&external_description);
        external_content.append(&external_list);
        add_subpage(&root, "external", &external_page);

        // Codecs
        let (codecs_page, codecs_content) = page_container("Codecs");
        let codec_repo_label = gtk::Label::builder()
            .wrap(true)
            .xalign(0.0)
            .css_classes(vec!["dim-label".to_string()])
            .build();
        let codecs_list = boxed_list();
        let mut codec_checks = Vec::with_capacity(CODECS.len());
        for codec in CODECS {
            let check = gtk::CheckButton::new();
            let row = adw::ActionRow::builder()
                .title(codec.package)
                .subtitle(codec.description)
                .build();
            row.add_prefix(&check);
            row.set_activatable_widget(Some(&check));
            codecs_list.append(&row);
            codec_checks.push((codec.package, check));
        }
        let codec_buttons = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        let select_all = gtk::Button::builder()
            .label("Select All")
            .css_classes(vec!["pill".to_string()])
            .build();
        let checks: Vec<gtk::CheckButton> = codec_checks.iter().map(|(_, c)| c.clone()).collect();
        select_all.connect_clicked(move |_| {
            let all = checks.iter().all(|c| c.is_active());
            for check in &checks {
                check.set_active(!all);
            }
        });
        let install_codecs = gtk::Button::builder()
            .label("Install Selected")
            .css_classes(vec!["pill".to_string(), "suggested-action".to_string()])
            .build();
        let sender_clone = sender.clone();
        install_codecs.connect_clicked(move |_| {
            sender_clone.input(AppMsg::Software(SoftwareMsg::InstallCodecs));
        });
        codec_buttons.append(&select_all);
        codec_buttons.append(&install_codecs);
        codecs_content.append(&codec_repo_label);
        codecs_content.append(&codecs_list);
        codecs_content.append(&codec_buttons);
        add_subpage(&root, "codecs", &codecs_page);

        // Drivers
        let (drivers_page, drivers_content) = page_container("Drivers");
        let drivers_list = boxed_list();
        for bundle in DRIVERS {
            let row = adw::ActionRow::builder()
                .title(bundle.name)
                .subtitle(bundle.description)
                .build();
            let button = suffix_button("Install", Some("suggested-action"));
            let sender_clone = sender.clone();
            let id = bundle.id;
            button.connect_clicked(move |_| {
                sender_clone.input(AppMsg::Software(SoftwareMsg::InstallDriver(id)));
            });
            row.add_suffix(&button);
            drivers_list.append(&row);
        }
        drivers_content.append(&drivers_list);
        add_subpage(&root, "drivers", &drivers_page);

        Self {
            root,
            updates_status,
            updates_spinner,
            updates_list,
            check_button,
            apply_button,
            policy_row,
            applying_policy,
            repos_list,
            toggle_all_button,
            apps_box,
            installed_apps: HashSet::new(),
            external_list,
            codec_repo_label,
            codec_checks,
        }
    }

    fn show_updates(&self, pending: &[PendingUpdate]) {
        clear_list(&self.updates_list);
        self.updates_status.set_text(&updates::summary(pending));
        self.updates_list.set_visible(!pending.is_empty());
        self.apply_button.set_sensitive(!pending.is_empty());
        for update in pending {
            let mut details = format!("{} ({})", update.version, update.arch);
            if let Some(repo) = &update.repo {
                details.push_str(&format!(" from {}", repo));
            }
            if let Some(size) = &update.size {
                details.push_str(&format!(", {}", size));
            }
            let row = text_row(&update.name, &details);
            let action = gtk::Label::builder()
                .label(update.action.label())
                .valign(gtk::Align::Center)
                .css_classes(vec!["dim-label".to_string()])
                .build();
            row.add_suffix(&action);
            self.updates_list.append(&row);
        }
    }

    fn show_policy(&self, policy: AutoUpdatePolicy) {
        let index = AutoUpdatePolicy::ALL.iter().position(|p| *p == policy).unwrap_or_default();
        self.applying_policy.set(true);
        self.policy_row.set_selected(index as u32);
        self.applying_policy.set(false);
    }

    fn show_repositories(&self, states: &[RepoState], sender: &ComponentSender<AppModel>) {
        clear_list(&self.repos_list);
        for (index, state) in states.iter().enumerate() {
            let status = if state.enabled { "Enabled" } else { "Disabled" };
            let row = text_row(&state.repo.to_string(), &format!("{} ({})", state.id, status));
            let button = suffix_button(
                &state.toggle_label(),
                Some(if state.enabled { "destructive-action" } else { "suggested-action" }),
            );
            let sender_clone = sender.clone();
            button.connect_clicked(move |_| {
                sender_clone.input(AppMsg::Software(SoftwareMsg::ToggleRepo(index)));
            });
            row.add_suffix(&button);
            self.repos_list.append(&row);
        }
        self.toggle_all_button.set_label(if repositories::all_target(states) {
            "Enable All"
        } else {
            "Disable All"
        });
    }

    fn show_apps(&self, sender: &ComponentSender<AppModel>) {
        while let Some(child) = self.apps_box.first_child() {
            self.apps_box.remove(&child);
        }
        for category in APP_CATEGORIES {
            let list = boxed_list();
            for app in category.apps {
                let row = adw::ActionRow::builder()
                    .title(app.name)
                    .subtitle(app.description)
                    .build();
                let sender_clone = sender.clone();
                if let Some(binary) = app.launchable() {
                    let button = suffix_button("Launch", None);
                    button.connect_clicked(move |_| {
                        sender_clone.input(AppMsg::Software(SoftwareMsg::LaunchApp(binary)));
                    });
                    row.add_suffix(&button);
                } else if self.installed_apps.contains(app.package) {
                    row.add_suffix(&installed_label());
                } else {
                    let package = app.package;
                    let button = suffix_button("Install", Some("suggested-action"));
                    button.connect_clicked(move |_| {
                        sender_clone.input(AppMsg::Software(SoftwareMsg::InstallApp(package)));
                    });
                    row.add_suffix(&button);
                }
                list.append(&row);
            }
            self.apps_box.append(&section_label(category.name));
            self.apps_box.append(&list);
        }
    }

    fn show_external(&self, sender: &ComponentSender<AppModel>) {
        clear_list(&self.external_list);
        for app in EXTERNAL_APPS {
            let row = adw::ActionRow::builder()
                .title(app.name)
                .subtitle(app.description)
                .build();
            if app.is_installed() {
                let sender_clone = sender.clone();
                let binary = app.binary;
                let button = suffix_button("Launch", None);
                button.connect_clicked(move |_| {
                    sender_clone.input(AppMsg::Software(SoftwareMsg::LaunchApp(binary)));
                });
                row.add_suffix(&button);
            } else {
                let sender_clone = sender.clone();
                let id = app.id;
                let button = suffix_button("Install", Some("suggested-action"));
                button.connect_clicked(move |_| {
                    sender_clone.input(AppMsg::Software(SoftwareMsg::InstallExternal(id)));
                });
                row.add_suffix(&button);
            }
            self.external_list.append(&row);
        }
    }

    fn selected_codecs(&self) -> Vec<&'static str> {
        self.codec_checks
            .iter()
            .filter(|(_, check)| check.is_active())
            .map(|(package, _)| *package)
            .collect()
    }
}

fn installed_label() -> gtk::Label {
    gtk::Label::builder()
        .label("Installed")
        .valign(gtk::Align::Center)
        .css_classes(vec!["dim-label".to_string()])
        .build()
}

fn software_msg(msg: SoftwareMsg) -> AppMsg {
    AppMsg::Software(msg)
}

/// Success text naming what was updated, shortened for long transactions.
fn updated_packages_message(pending: &[PendingUpdate]) -> String {
    if pending.is_empty() {
        return "The system has been updated.".to_string();
    }
    let mut lines: Vec<String> = pending
        .iter()
        .take(UPDATE_LIST_LIMIT)
        .map(|u| format!("{} {}", u.name, u.version))
        .collect();
    if pending.len() > UPDATE_LIST_LIMIT {
        lines.push(format!("and {} more", pending.len() - UPDATE_LIST_LIMIT));
    }
    format!("The following packages were updated:\n\n{}", lines.join("\n"))
}

impl AppModel {
    pub(super) fn open_software_page(&mut self, name: &str) {
        match name {
            "updates" => self.load_policy(),
            "repositories" => self.load_repositories(),
            "apps" => self.software.show_apps(&self.sender),
            "external" => self.software.show_external(&self.sender),
            "codecs" => {
                if self.restricted_repo.is_none() {
                    self.spawn_load(
                        async {
                            let machine = probe("uname", &["-m"]).await.unwrap_or_default();
                            packages::restricted_repo(&read_os_release(), &machine)
                        },
                        |repo| software_msg(SoftwareMsg::RestrictedRepoResolved(repo)),
                    );
                }
            }
            _ => {}
        }
    }

    pub(super) fn load_policy(&self) {
        self.spawn_load(updates::read_policy(Path::new(AUTOMATIC_CONF)), |policy| {
            software_msg(SoftwareMsg::PolicyLoaded(policy))
        });
    }

    pub(super) fn load_repositories(&self) {
        self.spawn_load(repositories::query(), |result| {
            software_msg(SoftwareMsg::ReposLoaded(result.map_err(|e| e.user_message())))
        });
    }

    pub(super) fn refresh_app_lists(&self) {
        self.software.show_apps(&self.sender);
        self.software.show_external(&self.sender);
    }

    pub(super) fn mark_app_installed(&mut self, package: &'static str) {
        self.software.installed_apps.insert(package);
        self.refresh_app_lists();
    }

    pub(super) fn update_software(&mut self, msg: SoftwareMsg) {
        match msg {
            SoftwareMsg::CheckUpdates => {
                self.software.check_button.set_sensitive(false);
                self.software.apply_button.set_sensitive(false);
                self.software.updates_spinner.start();
                self.software.updates_status.set_text("Checking for updates...");
                self.log(&format!("$ {}", updates::check_spec().display()));
                self.spawn_load(updates::check(), |result| {
                    software_msg(SoftwareMsg::UpdatesChecked(result.map_err(|e| e.user_message())))
                });
            }
            SoftwareMsg::UpdatesChecked(result) => {
                self.software.check_button.set_sensitive(true);
                self.software.updates_spinner.stop();
                match result {
                    Ok(pending) => {
                        self.log(&updates::summary(&pending));
                        self.software.show_updates(&pending);
                        self.pending_updates = pending;
                    }
                    Err(e) => {
                        self.software.updates_status.set_text("Could not check for updates.");
                        self.message("Update Check Failed", &e);
                    }
                }
            }
            SoftwareMsg::ApplyUpdates => {
                let task = Task::new("Updating System", vec![updates::apply_spec()])
                    .status("Preparing update...")
                    .success(updated_packages_message(&self.pending_updates))
                    .after(AfterTask::ClearUpdates);
                self.request_task(task);
            }
            SoftwareMsg::PolicyLoaded(policy) => self.software.show_policy(policy),
            SoftwareMsg::PolicySelected(policy) => {
                self.spawn_action("Update Frequency", AfterTask::ReloadPolicy, async move {
                    updates::write_policy(policy).await?;
                    Ok("Update frequency saved".to_string())
                });
            }
            SoftwareMsg::ReposLoaded(Ok(states)) => {
                self.software.show_repositories(&states, &self.sender);
                self.repo_states = states;
            }
            SoftwareMsg::ReposLoaded(Err(e)) => self.message("Could Not Read Repositories", &e),
            SoftwareMsg::ToggleRepo(index) => {
                if let Some(state) = self.repo_states.get(index) {
                    let enable = !state.enabled;
                    self.guard(
                        "Change Repository",
                        &format!("{} the {} repository ({})?", if enable { "Enable" } else { "Disable" }, state.repo, state.id),
                        software_msg(SoftwareMsg::SetRepos(vec![state.id.clone()], enable)),
                    );
                }
            }
            SoftwareMsg::ToggleAllRepos => {
                if self.repo_states.is_empty() {
                    return;
                }
                let enable = repositories::all_target(&self.repo_states);
                let ids = self.repo_states.iter().map(|s| s.id.clone()).collect();
                self.guard(
                    "Change Repositories",
                    &format!("{} all optional repositories?", if enable { "Enable" } else { "Disable" }),
                    software_msg(SoftwareMsg::SetRepos(ids, enable)),
                );
            }
            SoftwareMsg::SetRepos(ids, enable) => {
                self.log(&format!("$ {}", repositories::setopt_spec(&ids.iter().map(String::as_str).collect::<Vec<_>>(), enable).display()));
                self.spawn_action("Repositories", AfterTask::ReloadRepositories, async move {
                    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                    repositories::set_enabled(&refs, enable).await?;
                    Ok(format!("Repositories {}", if enable { "enabled" } else { "disabled" }))
                });
            }
            SoftwareMsg::InstallApp(package) => {
                if let Some(app) = packages::find_app(package) {
                    let task = Task::install(app.name, &[app.package])
                        .after(AfterTask::AppInstalled(app.package))
                        .suggest_repositories();
                    self.request_task(task);
                }
            }
            SoftwareMsg::LaunchApp(binary) => {
                if let Err(e) = spawn_detached(binary, &[]) {
                    self.message("Could Not Launch Application", &e.user_message());
                }
            }
            SoftwareMsg::InstallExternal(id) => {
                if let Some(app) = packages::external_app(id) {
                    let task = Task::new(format!("Installing {}", app.name), app.install_steps())
                        .success(format!("{} has been installed successfully.", app.name))
                        .confirm(format!(
                            "This adds the {} repository ({}) and installs {}. Do you want to continue?",
                            app.name,
                            app.repo_path(),
                            app.package
                        ))
                        .after(AfterTask::ReloadApps);
                    self.request_task(task);
                }
            }
            SoftwareMsg::RestrictedRepoResolved(repo) => {
                self.software
                    .codec_repo_label
                    .set_text(&format!("Codecs are installed from the {} repository.", repo));
                self.restricted_repo = Some(repo);
            }
            SoftwareMsg::InstallCodecs => {
                let selected = self.software.selected_codecs();
                let repo = self
                    .restricted_repo
                    .clone()
                    .unwrap_or_else(|| packages::restricted_repo(&read_os_release(), ""));
                match packages::codec_install_spec(&selected, &repo) {
                    Some(spec) => {
                        let task = Task::new("Installing Codecs", vec![spec])
                            .success(format!("{} codec packages have been installed.", selected.len()))
                            .suggest_repositories();
                        self.request_task(task);
                    }
                    None => self.message("No Codecs Selected", "Select at least one codec to install."),
                }
            }
            SoftwareMsg::InstallDriver(id) => {
                if let Some(bundle) = packages::driver(id) {
                    let mut success = format!("{} have been installed successfully.", bundle.name);
                    if let Some(note) = bundle.post_install {
                        success.push_str("\n\n");
                        success.push_str(note);
                    }
                    let task = Task::install(bundle.name, bundle.packages)
                        .success(success)
                        .confirm(bundle.confirmation);
                    self.request_task(task);
                }
            }
            SoftwareMsg::OpenYumex => {
                if which(YUMEX_BINARY).is_some() {
                    if let Err(e) = spawn_detached(YUMEX_BINARY, &[]) {
                        self.message("Could Not Launch Yum Extender", &e.user_message());
                    }
                } else {
                    let task = Task::install("Yum Extender", &[YUMEX_PACKAGE])
                        .confirm("Yum Extender is not installed. Would you like to install it?")
                        .after(AfterTask::Launch(YUMEX_BINARY));
                    self.request_task(task);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::updates::UpdateAction;

    fn pending(n: usize) -> Vec<PendingUpdate> {
        (0..n)
            .map(|i| PendingUpdate {
                name: format!("pkg{}", i),
                arch: "x86_64".into(),
                version: "1.0-1".into(),
                repo: Some("cooker-x86_64".into()),
                action: UpdateAction::Upgrade,
                size: None,
            })
            .collect()
    }

    #[test]
    fn updated_packages_are_listed() {
        let message = updated_packages_message(&pending(2));
        assert_eq!(message, "The following packages were updated:\n\npkg0 1.0-1\npkg1 1.0-1");
        assert_eq!(updated_packages_message(&[]), "The system has been updated.");
    }

    #[test]
    fn long_update_lists_are_shortened() {
        let message = updated_packages_message(&pending(30));
        assert!(message.ends_with("and 5 more"));
        assert!(!message.contains("pkg25"));
    }
}
