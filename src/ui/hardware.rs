use std::cell::Cell;
use std::rc::Rc;

use adw::prelude::*;
use relm4::gtk;
use relm4::ComponentSender;

use crate::models::Section;
use crate::system::audio::{
    self, AppStream, AudioState, SoundServer, VolumeState, VolumeTarget, MAX_VOLUME, MIXER_BINARY, MIXER_PACKAGE,
};
use crate::system::hardware_tools::{self, ExternalTool, GNOME_DISKS, GPARTED, HP_TOOLBOX, PRINTER_CONFIG, PRINTER_DRIVERS};
use crate::ui::category::{
    add_subpage, boxed_list, clear_list, create_category_page, info_row, page_container, placeholder_row,
    section_label, suffix_button, text_row, CategoryOption,
};
use crate::ui::model::AppModel;
use crate::ui::msg::{AppMsg, HardwareMsg};
use crate::ui::task::{AfterTask, Task};

const OPTIONS: &[CategoryOption] = &[
    CategoryOption::page("Sound", "Output device, volume and sound server", "audio-speakers-symbolic", "sound"),
    CategoryOption::page("Disks", "Drives, partitions and media", "drive-harddisk-symbolic", "disks"),
    CategoryOption::page("Printers", "Printer setup and drivers", "printer-symbolic", "printers"),
];

const DISK_TOOLS: &[&ExternalTool] = &[&GNOME_DISKS, &GPARTED];
const PRINTER_TOOLS: &[&ExternalTool] = &[&PRINTER_CONFIG, &HP_TOOLBOX];

/// A slider with its mute toggle.
struct VolumeControl {
    scale: gtk::Scale,
    mute: gtk::ToggleButton,
    input: bool,
}

impl VolumeControl {
    fn new(sender: &ComponentSender<AppModel>, target: VolumeTarget, applying: &Rc<Cell<bool>>) -> Self {
        let scale = gtk::Scale::with_range(gtk::Orientation::Horizontal, 0.0, MAX_VOLUME as f64, 1.0);
        scale.set_hexpand(true);
        scale.set_draw_value(true);
        scale.set_value_pos(gtk::PositionType::Right);
        scale.set_digits(0);
        scale.add_mark(100.0, gtk::PositionType::Bottom, None);

        let mute = gtk::ToggleButton::builder()
            .valign(gtk::Align::Center)
            .css_classes(vec!["flat".to_string()])
            .tooltip_text("Mute")
            .build();

        let sender_clone = sender.clone();
        let guard = applying.clone();
        scale.connect_value_changed(move |scale| {
            if !guard.get() {
                sender_clone.input(AppMsg::Hardware(HardwareMsg::VolumeChanged(target, scale.value())));
            }
        });
        let sender_clone = sender.clone();
        let guard = applying.clone();
        mute.connect_toggled(move |button| {
            if !guard.get() {
                sender_clone.input(AppMsg::Hardware(HardwareMsg::MuteToggled(target, button.is_active())));
            }
        });

        Self {
            scale,
            mute,
            input: target == VolumeTarget::Input,
        }
    }

    fn row(&self, title: &str) -> adw::ActionRow {
        let row = text_row(title, "");
        row.add_prefix(&self.mute);
        row.add_suffix(&self.scale);
        row
    }

    fn show(&self, state: VolumeState) {
        self.scale.set_value(state.percent as f64);
        self.mute.set_active(state.muted);
        self.set_icon(state.percent, state.muted);
    }

    fn set_icon(&self, percent: u32, muted: bool) {
        let icon = if !self.input {
            audio::volume_icon(percent, muted)
        } else if muted {
            "microphone-sensitivity-muted-symbolic"
        } else {
            "audio-input-microphone-symbolic"
        };
        self.mute.set_icon_name(icon);
    }
}

pub struct HardwarePage {
    pub root: gtk::Stack,

    applying_audio: Rc<Cell<bool>>,
    sink_dropdown: gtk::DropDown,
    sink_names: Vec<String>,
    output: VolumeControl,
    input: VolumeControl,
    streams_list: gtk::ListBox,
    streams: Vec<(u32, VolumeControl)>,
    server_row: adw::ActionRow,
    switch_button: gtk::Button,

    disk_list: gtk::ListBox,
    printer_list: gtk::ListBox,
}

impl HardwarePage {
    pub fn new(sender: &ComponentSender<AppModel>) -> Self {
        let root = create_category_page(sender, Section::Hardware, OPTIONS);
        let applying_audio = Rc::new(Cell::new(false));

        // Sound
        let (sound_page, sound_content) = page_container("Sound");
        let devices_list = boxed_list();
        let sink_dropdown = gtk::DropDown::builder()
            .model(&gtk::StringList::new(&[]))
            .valign(gtk::Align::Center)
            .build();
        let sender_clone = sender.clone();
        let guard = applying_audio.clone();
        sink_dropdown.connect_selected_notify(move |dropdown| {
            if !guard.get() && dropdown.selected() != gtk::INVALID_LIST_POSITION {
                sender_clone.input(AppMsg::Hardware(HardwareMsg::SinkSelected(dropdown.selected())));
            }
        });
        let sink_row = text_row("Output Device", "");
        sink_row.add_suffix(&sink_dropdown);
        let output = VolumeControl::new(sender, VolumeTarget::Output, &applying_audio);
        let input = VolumeControl::new(sender, VolumeTarget::Input, &applying_audio);
        devices_list.append(&sink_row);
        devices_list.append(&output.row("Output Volume"));
        devices_list.append(&input.row("Input Volume"));

        let streams_list = boxed_list();
        streams_list.append(&placeholder_row("No applications are playing sound"));

        let server_list = boxed_list();
        let server_row = info_row("Sound Server", "Detecting...");
        let switch_button = suffix_button("Switch", None);
        let sender_clone = sender.clone();
        switch_button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::Hardware(HardwareMsg::SwitchServer));
        });
        server_row.add_suffix(&switch_button);
        let mixer_row = text_row("Advanced Mixer", "Per-device settings with PulseAudio Volume Control");
        let mixer_button = suffix_button("Open", None);
        let sender_clone = sender.clone();
        mixer_button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::Hardware(HardwareMsg::OpenMixer));
        });
        mixer_row.add_suffix(&mixer_button);
        server_list.append(&server_row);
        server_list.append(&mixer_row);

        sound_content.append(&devices_list);
        sound_content.append(&section_label("Applications"));
        sound_content.append(&streams_list);
        sound_content.append(&section_label("Sound System"));
        sound_content.append(&server_list);
        add_subpage(&root, "sound", &sound_page);

        // Disks
        let (disks_page, disks_content) = page_container("Disks");
        let disk_list = boxed_list();
        disks_content.append(&disk_list);
        add_subpage(&root, "disks", &disks_page);

        // Printers
        let (printers_page, printers_content) = page_container("Printers");
        let printer_list = boxed_list();
        let drivers_list = boxed_list();
        for drivers in PRINTER_DRIVERS {
            let row = text_row(&format!("{} drivers", drivers.name), drivers.package);
            let button = suffix_button("Install", Some("suggested-action"));
            let sender_clone = sender.clone();
            let id = drivers.id;
            button.connect_clicked(move |_| {
                sender_clone.input(AppMsg::Hardware(HardwareMsg::InstallPrinterDrivers(id)));
            });
            row.add_suffix(&button);
            drivers_list.append(&row);
        }
        printers_content.append(&printer_list);
        printers_content.append(&section_label("Printer Drivers"));
        printers_content.append(&drivers_list);
        add_subpage(&root, "printers", &printers_page);

        let page = Self {
            root,
            applying_audio,
            sink_dropdown,
            sink_names: Vec::new(),
            output,
            input,
            streams_list,
            streams: Vec::new(),
            server_row,
            switch_button,
            disk_list,
            printer_list,
        };
        page.show_tools(sender);
        page
    }

    fn show_audio(&mut self, state: &AudioState, sender: &ComponentSender<AppModel>) {
        self.applying_audio.set(true);

        let names: Vec<String> = state.sinks.iter().map(|s| s.name.clone()).collect();
        if names != self.sink_names {
            let labels: Vec<&str> = state.sinks.iter().map(|s| s.label.as_str()).collect();
            self.sink_dropdown.set_model(Some(&gtk::StringList::new(&labels)));
            self.sink_names = names;
        }
        self.sink_dropdown.set_sensitive(!state.sinks.is_empty());
        if let Some(index) = state.default_sink_index() {
            self.sink_dropdown.set_selected(index as u32);
        }

        self.output.show(state.output);
        self.input.show(state.input);
        self.show_streams(&state.streams, sender);

        self.applying_audio.set(false);
    }

    /// Rebuilds the stream rows only when the set of streams changed, so a
    /// slider being dragged is not replaced under the pointer.
    fn show_streams(&mut self, streams: &[AppStream], sender: &ComponentSender<AppModel>) {
        let same = streams.len() == self.streams.len()
            && streams.iter().zip(&self.streams).all(|(s, (index, _))| s.index == *index);
        if !same {
            clear_list(&self.streams_list);
            self.streams.clear();
            for stream in streams {
                let control = VolumeControl::new(sender, VolumeTarget::Stream(stream.index), &self.applying_audio);
                self.streams_list.append(&control.row(&stream.name));
                self.streams.push((stream.index, control));
            }
            if streams.is_empty() {
                self.streams_list.append(&placeholder_row("No applications are playing sound"));
            }
        }
        for (stream, (_, control)) in streams.iter().zip(&self.streams) {
            control.show(VolumeState {
                percent: stream.volume,
                muted: stream.muted,
            });
        }
    }

    fn control(&self, target: VolumeTarget) -> Option<&VolumeControl> {
        match target {
            VolumeTarget::Output => Some(&self.output),
            VolumeTarget::Input => Some(&self.input),
            VolumeTarget::Stream(index) => self.streams.iter().find(|(i, _)| *i == index).map(|(_, c)| c),
        }
    }

    fn show_server(&self, server: SoundServer) {
        self.server_row.set_subtitle(server.label());
        self.switch_button.set_label(&format!(
            "Switch to {}",
            match server.other() {
                SoundServer::PipeWire => "PipeWire",
                SoundServer::PulseAudio => "PulseAudio",
            }
        ));
    }

    fn show_tools(&self, sender: &ComponentSender<AppModel>) {
        for (list, tools) in [(&self.disk_list, DISK_TOOLS), (&self.printer_list, PRINTER_TOOLS)] {
            clear_list(list);
            for tool in tools {
                let status = if tool.is_installed() { "Installed" } else { "Not installed" };
                let row = text_row(tool.name, &format!("{} ({})", tool.description, status));
                let button = suffix_button(if tool.is_installed() { "Open" } else { "Install" }, None);
                let sender_clone = sender.clone();
                let id = tool.id;
                button.connect_clicked(move |_| {
                    sender_clone.input(AppMsg::Hardware(HardwareMsg::OpenTool(id)));
                });
                row.add_suffix(&button);
                list.append(&row);
            }
        }
    }
}

fn hardware_msg(msg: HardwareMsg) -> AppMsg {
    AppMsg::Hardware(msg)
}

impl AppModel {
    pub(super) fn open_hardware_page(&mut self, name: &str) {
        match name {
            "sound" => {
                self.load_audio();
                self.load_sound_server();
            }
            "disks" | "printers" => self.reload_tools(),
            _ => {}
        }
    }

    pub(super) fn load_audio(&mut self) {
        if self.audio_loading {
            return;
        }
        self.audio_loading = true;
        self.spawn_load(audio::snapshot(), |result| {
            hardware_msg(HardwareMsg::AudioLoaded(result.map_err(|e| e.user_message())))
        });
    }

    pub(super) fn load_sound_server(&self) {
        self.spawn_load(audio::current_server(), |server| hardware_msg(HardwareMsg::ServerLoaded(server)));
    }

    pub(super) fn reload_tools(&self) {
        self.hardware.show_tools(&self.sender);
    }

    pub(super) fn update_hardware(&mut self, msg: HardwareMsg) {
        match msg {
            HardwareMsg::AudioLoaded(Ok(state)) => {
                self.audio_loading = false;
                self.hardware.streams_list.set_sensitive(true);
                self.hardware.show_audio(&state, &self.sender);
                self.audio = state;
            }
            HardwareMsg::AudioLoaded(Err(e)) => {
                self.audio_loading = false;
                tracing::warn!(error = %e, "could not read the audio state");
                self.hardware.streams_list.set_sensitive(false);
            }
            HardwareMsg::SinkSelected(index) => {
                let Some(sink) = self.audio.sinks.get(index as usize) else {
                    return;
                };
                if sink.name == self.audio.default_sink {
                    return;
                }
                let name = sink.name.clone();
                let label = sink.label.clone();
                self.audio.default_sink = name.clone();
                self.spawn_action("Output Device", AfterTask::ReloadAudio, async move {
                    audio::set_default_sink(&name).await?;
                    Ok(format!("Sound output switched to {}", label))
                });
            }
            HardwareMsg::VolumeChanged(target, value) => {
                let percent = audio::clamp_volume(value);
                if let Some(control) = self.hardware.control(target) {
                    control.set_icon(percent, control.mute.is_active());
                }
                self.spawn_action("Volume", AfterTask::Nothing, async move {
                    audio::set_volume(target, percent).await?;
                    Ok(String::new())
                });
            }
            HardwareMsg::MuteToggled(target, muted) => {
                if let Some(control) = self.hardware.control(target) {
                    control.set_icon(audio::clamp_volume(control.scale.value()), muted);
                }
                self.spawn_action("Mute", AfterTask::Nothing, async move {
                    audio::set_mute(target, muted).await?;
                    Ok(String::new())
                });
            }
            HardwareMsg::ServerLoaded(server) => {
                self.sound_server = Some(server);
                self.hardware.show_server(server);
            }
            HardwareMsg::SwitchServer => {
                let Some(current) = self.sound_server else {
                    return;
                };
                let target = current.other();
                let task = Task::new(format!("Switching to {}", target.label()), vec![audio::switch_server_spec(target)])
                    .success(format!(
                        "The sound server is now {}. Log out and back in for the change to take effect.",
                        target.label()
                    ))
                    .confirm(format!(
                        "This replaces {} with {}. Audio may stop working until you log out. Do you want to continue?",
                        current.package(),
                        target.package()
                    ))
                    .after(AfterTask::ReloadAudio);
                self.request_task(task);
            }
            HardwareMsg::OpenMixer => {
                if audio::mixer_available() {
                    if let Err(e) = audio::launch_mixer() {
                        self.message("Could Not Open Mixer", &e.user_message());
                    }
                } else {
                    let task = Task::install("PulseAudio Volume Control", &[MIXER_PACKAGE])
                        .confirm("PulseAudio Volume Control is not installed. Would you like to install it?")
                        .after(AfterTask::Launch(MIXER_BINARY));
                    self.request_task(task);
                }
            }
            HardwareMsg::OpenTool(id) => {
                let Some(tool) = hardware_tools::tool(id) else {
                    return;
                };
                if tool.is_installed() {
                    if let Err(e) = tool.launch() {
                        self.message(&format!("Could Not Open {}", tool.name), &e.user_message());
                    }
                } else {
                    let task = Task::new(format!("Installing {}", tool.name), vec![tool.install_spec()])
                        .success(format!("{} has been installed successfully.", tool.name))
                        .confirm(tool.install_prompt())
                        .after(AfterTask::LaunchTool(tool));
                    self.request_task(task);
                }
            }
            HardwareMsg::InstallPrinterDrivers(id) => {
                if let Some(drivers) = hardware_tools::printer_drivers(id) {
                    let task = Task::install(&format!("{} printer drivers", drivers.name), &[drivers.package])
                        .suggest_repositories()
                        .after(AfterTask::ReloadTools);
                    self.request_task(task);
                }
            }
        }
    }
}
