use std::cell::Cell;
use std::rc::Rc;

use adw::prelude::*;
use chrono::{Datelike, Local, Timelike};
use relm4::gtk;
use relm4::ComponentSender;

use crate::models::Section;
use crate::system::datetime::{self, TimeSyncStatus};
use crate::system::hardware_info::{self, HardwareInfo, MemoryUsage};
use crate::system::kernels::{self, KernelKind, KernelStatus};
use crate::system::logs;
use crate::system::news::{self, NewsEntry};
use crate::system::system_info::{self, SystemInfo};
use crate::system::tweaks::{self, SHELLS, TWEAKS_BINARY, TWEAKS_PACKAGE};
use crate::ui::category::{
    add_subpage, boxed_list, clear_list, create_category_page, info_row, page_container, placeholder_row,
    section_label, suffix_button, text_row, CategoryOption,
};
use crate::ui::model::AppModel;
use crate::ui::msg::{AppMsg, SystemMsg};
use crate::ui::task::{AfterTask, Task};
use crate::utils::format_bytes;

const OPTIONS: &[CategoryOption] = &[
    CategoryOption::page("System Info", "Distribution, kernel and desktop", "dialog-information-symbolic", "info"),
    CategoryOption::page("Hardware Info", "Processor, memory, storage and graphics", "computer-symbolic", "hardware"),
    CategoryOption::page("Date & Time", "Clock, synchronization and timezone", "preferences-system-time-symbolic", "datetime"),
    CategoryOption::page("System Logs", "Collect the journal and kernel messages", "text-x-generic-symbolic", "logs"),
    CategoryOption::page("Kernels", "Install or remove kernel flavours", "application-x-firmware-symbolic", "kernels"),
    CategoryOption::page("Tweaks", "GNOME Tweaks and the default shell", "preferences-other-symbolic", "tweaks"),
    CategoryOption::page("News", "Latest project announcements", "mail-unread-symbolic", "news"),
];

pub struct SystemPage {
    pub root: gtk::Stack,

    info_list: gtk::ListBox,
    hardware_box: gtk::Box,

    clock_label: gtk::Label,
    date_label: gtk::Label,
    ntp_switch: adw::SwitchRow,
    sync_row: adw::ActionRow,
    timezone_row: adw::ActionRow,
    timezone_dropdown: gtk::DropDown,
    timezones: Vec<String>,
    time_spins: [gtk::SpinButton; 6],
    applying_status: Rc<Cell<bool>>,
    pub ntp_enabled: bool,

    logs_status: gtk::Label,
    collect_button: gtk::Button,

    desktop_kernels: gtk::ListBox,
    server_kernels: gtk::ListBox,
    pub kernels: Vec<KernelStatus>,

    tweaks_button: gtk::Button,
    shell_label: gtk::Label,
    shells_list: gtk::ListBox,

    news_list: gtk::ListBox,
}

fn spin(min: f64, max: f64) -> gtk::SpinButton {
    let spin = gtk::SpinButton::with_range(min, max, 1.0);
    spin.set_numeric(true);
    spin.set_valign(gtk::Align::Center);
    spin
}

impl SystemPage {
    pub fn new(sender: &ComponentSender<AppModel>) -> Self {
        let root = create_category_page(sender, Section::System, OPTIONS);

        // System info
        let (info_page, info_content) = page_container("System Info");
        let info_list = boxed_list();
        info_list.append(&placeholder_row("Collecting system information..."));
        info_content.append(&info_list);
        add_subpage(&root, "info", &info_page);

        // Hardware info
        let (hardware_page, hardware_content) = page_container("Hardware Info");
        let hardware_box = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(18)
            .build();
        hardware_box.append(&placeholder_row("Collecting hardware information..."));
        hardware_content.append(&hardware_box);
        add_subpage(&root, "hardware", &hardware_page);

        // Date & time
        let (datetime_page, datetime_content) = page_container("Date & Time");
        let clock_label = gtk::Label::builder()
            .css_classes(vec!["title-1".to_string(), "numeric".to_string()])
            .build();
        let date_label = gtk::Label::builder()
            .css_classes(vec!["dim-label".to_string()])
            .build();
        datetime_content.append(&clock_label);
        datetime_content.append(&date_label);

        let sync_list = boxed_list();
        let ntp_switch = adw::SwitchRow::builder()
            .title("Automatic Time Synchronization")
            .subtitle("Keep the clock in sync with network time servers")
            .build();
        let applying_status = Rc::new(Cell::new(false));
        let sender_clone = sender.clone();
        let applying = applying_status.clone();
        ntp_switch.connect_active_notify(move |switch| {
            if !applying.get() {
                sender_clone.input(AppMsg::System(SystemMsg::SetNtp(switch.is_active())));
            }
        });
        let sync_row = info_row("Synchronization", "Unknown");
        sync_list.append(&ntp_switch);
        sync_list.append(&sync_row);
        datetime_content.append(&sync_list);

        datetime_content.append(&section_label("Set Time Manually"));
        let manual_list = boxed_list();
        let time_spins = [
            spin(1970.0, 2100.0),
            spin(1.0, 12.0),
            spin(1.0, 31.0),
            spin(0.0, 23.0),
            spin(0.0, 59.0),
            spin(0.0, 59.0),
        ];
        let date_row = adw::ActionRow::builder().title("Date").subtitle("Year / Month / Day").build();
        for spin in &time_spins[..3] {
            date_row.add_suffix(spin);
        }
        let time_row = adw::ActionRow::builder().title("Time").subtitle("Hours / Minutes / Seconds").build();
        for spin in &time_spins[3..] {
            time_row.add_suffix(spin);
        }
        let apply_row = adw::ActionRow::builder()
            .title("Apply")
            .subtitle("Requires automatic synchronization to be off")
            .build();
        let apply_time = suffix_button("Set Time", Some("suggested-action"));
        let sender_clone = sender.clone();
        apply_time.connect_clicked(move |_| {
            sender_clone.input(AppMsg::System(SystemMsg::ApplyManualTime));
        });
        apply_row.add_suffix(&apply_time);
        manual_list.append(&date_row);
        manual_list.append(&time_row);
        manual_list.append(&apply_row);
        datetime_content.append(&manual_list);

        datetime_content.append(&section_label("Timezone"));
        let timezone_list = boxed_list();
        let timezone_row = info_row("Current Timezone", "Unknown");
        let timezone_dropdown = gtk::DropDown::from_strings(&[]);
        timezone_dropdown.set_valign(gtk::Align::Center);
        let choose_row = adw::ActionRow::builder().title("New Timezone").build();
        let apply_timezone = suffix_button("Apply", None);
        let sender_clone = sender.clone();
        apply_timezone.connect_clicked(move |_| {
            sender_clone.input(AppMsg::System(SystemMsg::ApplyTimezone));
        });
        choose_row.add_suffix(&timezone_dropdown);
        choose_row.add_suffix(&apply_timezone);
        timezone_list.append(&timezone_row);
        timezone_list.append(&choose_row);
        datetime_content.append(&timezone_list);
        add_subpage(&root, "datetime", &datetime_page);

        // System logs
        let (logs_page, logs_content) = page_container("System Logs");
        let logs_description = gtk::Label::builder()
            .label("Saves the current boot journal and the kernel ring buffer to your Documents folder and bundles them into a zip archive you can attach to bug reports.")
            .wrap(true)
            .xalign(0.0)
            .build();
        let collect_button = gtk::Button::builder()
            .label("Collect Logs")
            .halign(gtk::Align::Start)
            .css_classes(vec!["suggested-action".to_string(), "pill".to_string()])
            .build();
        let sender_clone = sender.clone();
        collect_button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::System(SystemMsg::CollectLogs));
        });
        let logs_status = gtk::Label::builder()
            .wrap(true)
            .xalign(0.0)
            .selectable(true)
            .css_classes(vec!["dim-label".to_string()])
            .build();
        logs_content.append(&logs_description);
        logs_content.append(&collect_button);
        logs_content.append(&logs_status);
        add_subpage(&root, "logs", &logs_page);

        // Kernels
        let (kernels_page, kernels_content) = page_container("Kernels");
        let desktop_kernels = boxed_list();
        let server_kernels = boxed_list();
        kernels_content.append(&section_label("Desktop Kernels"));
        kernels_content.append(&desktop_kernels);
        kernels_content.append(&section_label("Server Kernels"));
        kernels_content.append(&server_kernels);
        add_subpage(&root, "kernels", &kernels_page);

        // Tweaks
        let (tweaks_page, tweaks_content) = page_container("Tweaks");
        let tweaks_list = boxed_list();
        let tweaks_row = adw::ActionRow::builder()
            .title("GNOME Tweaks")
            .subtitle("Fonts, themes, window titlebars and startup applications")
            .build();
        let tweaks_button = suffix_button("Launch", None);
        let sender_clone = sender.clone();
        tweaks_button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::System(SystemMsg::LaunchTweaks));
        });
        tweaks_row.add_suffix(&tweaks_button);
        tweaks_list.append(&tweaks_row);
        tweaks_content.append(&tweaks_list);

        tweaks_content.append(&section_label("Default Shell"));
        let shell_label = gtk::Label::builder()
            .halign(gtk::Align::Start)
            .css_classes(vec!["dim-label".to_string()])
            .build();
        let shells_list = boxed_list();
        tweaks_content.append(&shell_label);
        tweaks_content.append(&shells_list);
        add_subpage(&root, "tweaks", &tweaks_page);

        // News
        let (news_page, news_content) = page_container("News");
        let news_list = boxed_list();
        news_list.append(&placeholder_row("Loading news..."));
        news_content.append(&news_list);
        add_subpage(&root, "news", &news_page);

        Self {
            root,
            info_list,
            hardware_box,
            clock_label,
            date_label,
            ntp_switch,
            sync_row,
            timezone_row,
            timezone_dropdown,
            timezones: Vec::new(),
            time_spins,
            applying_status,
            ntp_enabled: false,
            logs_status,
            collect_button,
            desktop_kernels,
            server_kernels,
            kernels: Vec::new(),
            tweaks_button,
            shell_label,
            shells_list,
            news_list,
        }
    }

    fn show_info(&self, info: &SystemInfo) {
        clear_list(&self.info_list);
        for (title, value) in info.rows() {
            self.info_list.append(&info_row(title, value));
        }
    }

    fn show_hardware(&self, info: &HardwareInfo) {
        while let Some(child) = self.hardware_box.first_child() {
            self.hardware_box.remove(&child);
        }

        let cpu = boxed_list();
        cpu.append(&info_row("Model", &info.cpu.model));
        cpu.append(&info_row(
            "Cores",
            &format!("{} physical, {} logical", info.cpu.physical_cores, info.cpu.logical_cores),
        ));
        if let Some(mhz) = info.cpu.current_mhz {
            cpu.append(&info_row("Current Frequency", &format!("{:.0} MHz", mhz)));
        }
        if let Some(mhz) = info.cpu.max_mhz {
            cpu.append(&info_row("Maximum Frequency", &format!("{:.0} MHz", mhz)));
        }
        self.append_group("Processor", &cpu);

        let memory = boxed_list();
        memory.append(&usage_row("Memory", &info.memory));
        memory.append(&usage_row("Swap", &info.swap));
        self.append_group("Memory", &memory);

        let storage = boxed_list();
        if info.disks.is_empty() {
            storage.append(&placeholder_row("No disks found"));
        }
        for disk in &info.disks {
            let row = text_row(
                &format!("{} on {}", disk.device, disk.mount),
                &format!(
                    "{} of {} used ({:.1}%)",
                    format_bytes(disk.used),
                    format_bytes(disk.total),
                    disk.percent
                ),
            );
            row.add_suffix(&usage_bar(disk.percent));
            storage.append(&row);
        }
        self.append_group("Storage", &storage);

        let graphics = boxed_list();
        if info.gpus.is_empty() {
            graphics.append(&placeholder_row("No graphics information available"));
        }
        for gpu in &info.gpus {
            let mut details = format!("Driver: {}", gpu.driver);
            if let (Some(used), Some(total)) = (&gpu.memory_used, &gpu.memory_total) {
                details.push_str(&format!(", memory {} / {} MiB", used, total));
            }
            graphics.append(&text_row(&gpu.name, &details));
        }
        self.append_group("Graphics", &graphics);

        let displays = boxed_list();
        if info.displays.is_empty() {
            displays.append(&info_row("Resolution", "unknown"));
        }
        for display in &info.displays {
            displays.append(&info_row(&display.output, &display.resolution));
        }
        self.append_group("Displays", &displays);
    }

    fn append_group(&self, title: &str, list: &gtk::ListBox) {
        self.hardware_box.append(&section_label(title));
        self.hardware_box.append(list);
    }

    pub fn update_clock(&self) {
        let now = Local::now();
        self.clock_label.set_text(&now.format("%H:%M:%S").to_string());
        self.date_label.set_text(&now.format("%A, %d %B %Y").to_string());
    }

    fn reset_manual_time(&self) {
        let now = Local::now();
        let values = [
            now.year() as f64,
            now.month() as f64,
            now.day() as f64,
            now.hour() as f64,
            now.minute() as f64,
            now.second() as f64,
        ];
        for (spin, value) in self.time_spins.iter().zip(values) {
            spin.set_value(value);
        }
    }

    fn show_time_status(&mut self, status: &TimeSyncStatus) {
        self.ntp_enabled = status.ntp_enabled;
        self.applying_status.set(true);
        self.ntp_switch.set_active(status.ntp_enabled);
        self.applying_status.set(false);
        self.sync_row.set_subtitle(if status.synchronized {
            "Clock is synchronized"
        } else {
            "Clock is not synchronized"
        });
        let timezone = status.timezone.as_deref().unwrap_or("Unknown");
        self.timezone_row.set_subtitle(timezone);
        self.select_timezone(status.timezone.as_deref());
    }

    fn show_timezones(&mut self, timezones: Vec<String>, current: Option<&str>) {
        let names: Vec<&str> = timezones.iter().map(String::as_str).collect();
        let model = gtk::StringList::new(&names);
        self.timezone_dropdown.set_model(Some(&model));
        self.timezones = timezones;
        self.select_timezone(current);
    }

    fn select_timezone(&self, current: Option<&str>) {
        if let Some(index) = current.and_then(|tz| self.timezones.iter().position(|t| t == tz)) {
            self.timezone_dropdown.set_selected(index as u32);
        }
    }

    fn show_kernels(&self, sender: &ComponentSender<AppModel>) {
        clear_list(&self.desktop_kernels);
        clear_list(&self.server_kernels);
        for status in &self.kernels {
            let spec = status.spec;
            let mut subtitle = format!("{} (compiler: {})", spec.description, spec.compiler);
            if spec.testing {
                subtitle.push_str(", testing");
            }
            let row = adw::ActionRow::builder()
                .title(spec.name)
                .subtitle(subtitle)
                .build();

            if status.is_default {
                let badge = gtk::Label::builder()
                    .label("Default")
                    .valign(gtk::Align::Center)
                    .css_classes(vec!["accent".to_string()])
                    .build();
                row.add_suffix(&badge);
            }

            let sender_clone = sender.clone();
            let name = spec.name;
            if status.installed {
                let button = suffix_button("Remove", Some("destructive-action"));
                if let Some(blocker) = status.removal_blocker() {
                    button.set_tooltip_text(Some(blocker));
                }
                button.connect_clicked(move |_| {
                    sender_clone.input(AppMsg::System(SystemMsg::RemoveKernel(name)));
                });
                row.add_suffix(&button);
            } else {
                let button = suffix_button("Install", Some("suggested-action"));
                button.connect_clicked(move |_| {
                    sender_clone.input(AppMsg::System(SystemMsg::InstallKernel(name)));
                });
                row.add_suffix(&button);
            }

            match spec.kind {
                KernelKind::Desktop => self.desktop_kernels.append(&row),
                KernelKind::Server => self.server_kernels.append(&row),
            }
        }
    }

    fn show_tweaks(&self, sender: &ComponentSender<AppModel>) {
        self.tweaks_button
            .set_label(if tweaks::tweaks_installed() { "Launch" } else { "Install" });

        let current = tweaks::current_shell();
        self.shell_label.set_text(&format!("Current shell: {}", current));
        clear_list(&self.shells_list);
        for shell in SHELLS {
            let row = adw::ActionRow::builder()
                .title(shell.title())
                .subtitle(shell.description)
                .build();
            let name = shell.name;
            let sender_clone = sender.clone();
            if shell.name == current {
                let label = gtk::Label::builder()
                    .label("Current")
                    .valign(gtk::Align::Center)
                    .css_classes(vec!["dim-label".to_string()])
                    .build();
                row.add_suffix(&label);
            } else if shell.is_installed() {
                let button = suffix_button("Set as Default", None);
                button.connect_clicked(move |_| {
                    sender_clone.input(AppMsg::System(SystemMsg::SetDefaultShell(name)));
                });
                row.add_suffix(&button);
            } else {
                let button = suffix_button("Install", Some("suggested-action"));
                button.connect_clicked(move |_| {
                    sender_clone.input(AppMsg::System(SystemMsg::InstallShell(name)));
                });
                row.add_suffix(&button);
            }
            self.shells_list.append(&row);
        }
    }

    fn show_news(&self, entries: &[NewsEntry]) {
        clear_list(&self.news_list);
        for entry in entries {
            let content = gtk::Box::builder()
                .orientation(gtk::Orientation::Vertical)
                .spacing(6)
                .margin_top(12)
                .margin_bottom(12)
                .margin_start(12)
                .margin_end(12)
                .build();
            content.append(
                &gtk::Label::builder()
                    .label(entry.title())
                    .halign(gtk::Align::Start)
                    .css_classes(vec!["heading".to_string()])
                    .build(),
            );
            content.append(
                &gtk::Label::builder()
                    .label(entry.lines.join("\n"))
                    .halign(gtk::Align::Start)
                    .xalign(0.0)
                    .wrap(true)
                    .selectable(true)
                    .build(),
            );
            self.news_list.append(&content);
        }
    }
}

fn usage_bar(percent: f64) -> gtk::LevelBar {
    let bar = gtk::LevelBar::for_interval(0.0, 100.0);
    bar.set_value(percent.clamp(0.0, 100.0));
    bar.set_width_request(120);
    bar.set_valign(gtk::Align::Center);
    bar
}

fn usage_row(title: &str, usage: &MemoryUsage) -> adw::ActionRow {
    let row = info_row(title, &usage.summary());
    row.add_suffix(&usage_bar(usage.percent));
    row
}

fn system_msg(msg: SystemMsg) -> AppMsg {
    AppMsg::System(msg)
}

impl AppModel {
    pub(super) fn open_system_page(&mut self, name: &str) {
        match name {
            "info" => self.spawn_load(system_info::collect(), |info| system_msg(SystemMsg::InfoLoaded(info))),
            "hardware" => self.load_hardware(),
            "datetime" => {
                self.system.update_clock();
                self.system.reset_manual_time();
                self.load_time_status();
                if self.system.timezones.is_empty() {
                    self.spawn_load(datetime::list_timezones(), |zones| {
                        system_msg(SystemMsg::TimezonesLoaded(zones.unwrap_or_default()))
                    });
                }
            }
            "kernels" => self.spawn_load(kernels::query(), |result| {
                system_msg(SystemMsg::KernelsLoaded(result.map_err(|e| e.user_message())))
            }),
            "tweaks" => self.system.show_tweaks(&self.sender),
            "news" => {
                let url = self.settings.news_url.clone();
                self.spawn_load(async move { news::load(&url).await }, |entries| {
                    system_msg(SystemMsg::NewsLoaded(entries))
                });
            }
            _ => {}
        }
    }

    pub(super) fn load_hardware(&mut self) {
        if self.hardware_loading {
            return;
        }
        self.hardware_loading = true;
        self.spawn_load(hardware_info::collect(), |info| system_msg(SystemMsg::HardwareLoaded(info)));
    }

    pub(super) fn load_time_status(&self) {
        self.spawn_load(datetime::status(), |status| {
            system_msg(SystemMsg::TimeStatusLoaded(status.map_err(|e| e.user_message())))
        });
    }

    pub(super) fn update_system(&mut self, msg: SystemMsg) {
        match msg {
            SystemMsg::InfoLoaded(info) => self.system.show_info(&info),
            SystemMsg::HardwareLoaded(info) => {
                self.hardware_loading = false;
                self.system.show_hardware(&info);
            }
            SystemMsg::TimeStatusLoaded(Ok(status)) => self.system.show_time_status(&status),
            SystemMsg::TimeStatusLoaded(Err(e)) => {
                self.system.sync_row.set_subtitle(&format!("Could not read the clock status: {}", e));
            }
            SystemMsg::TimezonesLoaded(zones) => {
                let current = self.system.timezone_row.subtitle().map(|s| s.to_string());
                self.system.show_timezones(zones, current.as_deref());
            }
            SystemMsg::SetNtp(enabled) => {
                self.log(&format!("Setting automatic time synchronization to {}", enabled));
                let sender = self.sender.clone();
                self.rt.spawn(async move {
                    match datetime::set_ntp(enabled).await {
                        Ok(()) if enabled => {
                            let synced = datetime::wait_for_sync().await;
                            sender.input(system_msg(SystemMsg::NtpSyncFinished(synced)));
                        }
                        Ok(()) => sender.input(AppMsg::ShowToast(
                            "Automatic time synchronization disabled".to_string(),
                        )),
                        Err(e) => sender.input(AppMsg::ShowError(
                            "Time Synchronization".to_string(),
                            e.user_message(),
                        )),
                    }
                    let status = datetime::status().await.map_err(|e| e.user_message());
                    sender.input(system_msg(SystemMsg::TimeStatusLoaded(status)));
                });
            }
            SystemMsg::NtpSyncFinished(true) => {
                self.message("Success", "Automatic time synchronization is enabled and the clock is synchronized.");
            }
            SystemMsg::NtpSyncFinished(false) => {
                self.message(
                    "Warning",
                    "Automatic time synchronization is enabled, but the clock has not synchronized yet. Check your network connection.",
                );
            }
            SystemMsg::ApplyManualTime => {
                if self.system.ntp_enabled {
                    self.message(
                        "Cannot Set Time",
                        "Disable automatic time synchronization before setting the time manually.",
                    );
                    return;
                }
                let [year, month, day, hour, minute, second] =
                    self.system.time_spins.each_ref().map(|spin| spin.value_as_int());
                match datetime::validate_datetime(
                    year,
                    month as u32,
                    day as u32,
                    hour as u32,
                    minute as u32,
                    second as u32,
                ) {
                    Ok(stamp) => self.guard(
                        "Set System Time",
                        &format!("Set the system clock to {}?", stamp.format("%Y-%m-%d %H:%M:%S")),
                        system_msg(SystemMsg::SetTime(stamp)),
                    ),
                    Err(e) => self.message("Invalid Date", &e.user_message()),
                }
            }
            SystemMsg::SetTime(stamp) => {
                self.spawn_action("Set Time", AfterTask::ReloadTime, async move {
                    datetime::set_time(stamp).await?;
                    Ok("System time updated".to_string())
                });
            }
            SystemMsg::ApplyTimezone => {
                let selected = self.system.timezone_dropdown.selected() as usize;
                match self.system.timezones.get(selected) {
                    Some(timezone) => self.guard(
                        "Change Timezone",
                        &format!("Change the system timezone to {}?", timezone),
                        system_msg(SystemMsg::SetTimezone(timezone.clone())),
                    ),
                    None => self.message("No Timezone Selected", "Choose a timezone from the list first."),
                }
            }
            SystemMsg::SetTimezone(timezone) => {
                self.spawn_action("Set Timezone", AfterTask::ReloadTime, async move {
                    datetime::set_timezone(&timezone).await?;
                    Ok(format!("Timezone set to {}", timezone))
                });
            }
            SystemMsg::CollectLogs => {
                self.system.collect_button.set_sensitive(false);
                self.system.logs_status.set_text("Collecting logs...");
                let dir = self.config.logs_dir.clone();
                self.spawn_load(async move { logs::collect(&dir).await }, |result| {
                    system_msg(SystemMsg::LogsCollected(result.map_err(|e| e.user_message())))
                });
            }
            SystemMsg::LogsCollected(result) => {
                self.system.collect_button.set_sensitive(true);
                match result {
                    Ok(collected) => {
                        let text = format!(
                            "Logs saved to {}\n\n{}\n{}\n{}",
                            collected.directory.display(),
                            collected.journal.display(),
                            collected.dmesg.display(),
                            collected.archive.display()
                        );
                        self.system.logs_status.set_text(&text);
                        self.toast("System logs collected");
                        self.message(
                            "Logs Collected",
                            &format!("The logs have been saved to {}", collected.directory.display()),
                        );
                    }
                    Err(e) => {
                        self.system.logs_status.set_text("");
                        self.message("Could Not Collect Logs", &e);
                    }
                }
            }
            SystemMsg::KernelsLoaded(Ok(kernels)) => {
                self.system.kernels = kernels;
                self.system.show_kernels(&self.sender);
            }
            SystemMsg::KernelsLoaded(Err(e)) => self.message("Could Not Read Kernels", &e),
            SystemMsg::InstallKernel(name) => {
                let task = Task::new(format!("Installing {}", name), vec![kernels::install_spec(name)])
                    .success(format!("{} has been installed. Restart the computer to boot it.", name))
                    .after(AfterTask::ReloadKernels);
                self.request_task(task);
            }
            SystemMsg::RemoveKernel(name) => {
                let Some(status) = self.system.kernels.iter().find(|k| k.spec.name == name) else {
                    return;
                };
                if let Some(blocker) = status.removal_blocker() {
                    self.message("Cannot Remove Kernel", blocker);
                    return;
                }
                let task = Task::new(format!("Removing {}", name), vec![kernels::remove_spec(name)])
                    .success(format!("{} has been removed.", name))
                    .after(AfterTask::ReloadKernels);
                self.confirm(
                    "Remove Kernel?",
                    &format!("Are you sure you want to remove {}?", name),
                    "Remove",
                    true,
                    AppMsg::StartTask(Box::new(task)),
                );
            }
            SystemMsg::LaunchTweaks => {
                if tweaks::tweaks_installed() {
                    if let Err(e) = tweaks::launch_tweaks() {
                        self.message("Could Not Launch GNOME Tweaks", &e.user_message());
                    }
                } else {
                    let task = Task::new("Installing GNOME Tweaks", vec![tweaks::install_tweaks_spec()])
                        .success("GNOME Tweaks has been installed successfully.")
                        .confirm(format!(
                            "GNOME Tweaks is not installed. Would you like to install the {} package?",
                            TWEAKS_PACKAGE
                        ))
                        .after(AfterTask::Launch(TWEAKS_BINARY));
                    self.request_task(task);
                }
            }
            SystemMsg::InstallShell(name) => {
                if let Some(shell) = tweaks::shell(name) {
                    let task = Task::new(format!("Installing {}", shell.title()), vec![tweaks::install_shell_spec(shell)])
                        .success(format!("{} has been installed. You can now set it as your default shell.", shell.title()))
                        .after(AfterTask::ReloadShells);
                    self.request_task(task);
                }
            }
            SystemMsg::SetDefaultShell(name) => {
                if let Some(shell) = tweaks::shell(name) {
                    self.guard(
                        "Change Default Shell",
                        &format!("Set {} as your default shell? The change applies to new sessions.", shell.path()),
                        system_msg(SystemMsg::ApplyDefaultShell(name)),
                    );
                }
            }
            SystemMsg::ApplyDefaultShell(name) => {
                if let Some(shell) = tweaks::shell(name) {
                    self.spawn_action("Change Default Shell", AfterTask::ReloadShells, async move {
                        tweaks::set_default_shell(shell).await?;
                        Ok(format!("Default shell changed to {}. Log out to apply it.", shell.title()))
                    });
                }
            }
            SystemMsg::NewsLoaded(entries) => self.system.show_news(&entries),
        }
    }
}
