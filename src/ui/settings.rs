use relm4::gtk;
use relm4::ComponentSender;
use gtk::prelude::*;
use adw::prelude::*;
use crate::ui::model::AppModel;
use crate::ui::msg::AppMsg;
use crate::models::Theme;

pub const SOURCE_URL: &str = "https://github.com/Tears-of-Mandrake";

pub struct SettingsWidgets {
    pub page: gtk::ScrolledWindow,
    pub theme_combo: adw::ComboRow,
    pub hide_console_switch: adw::SwitchRow,
    pub confirm_switch: adw::SwitchRow,
}

pub fn create_settings_page(sender: &ComponentSender<AppModel>) -> SettingsWidgets {
    let scrolled_window = gtk::ScrolledWindow::builder()
        .hexpand(true)
        .vexpand(true)
        .build();

    let content_container = gtk::Box::builder()
        .orientation(gtk::Orientation::Vertical)
        .spacing(24)
        .hexpand(true)
        .halign(gtk::Align::Fill)
        .margin_top(24)
        .margin_bottom(24)
        .margin_start(24)
        .margin_end(24)
        .build();

    let title_label = gtk::Label::builder()
        .label("Settings")
        .halign(gtk::Align::Start)
        .css_classes(vec!["title-1".to_string()])
        .build();

    content_container.append(&title_label);

    let settings_list = gtk::ListBox::new();
    settings_list.add_css_class("boxed-list");
    settings_list.set_selection_mode(gtk::SelectionMode::None);
    settings_list.set_hexpand(true);
    settings_list.set_halign(gtk::Align::Fill);

    // Theme selection
    let theme_row = adw::ComboRow::builder()
        .title("Theme")
        .hexpand(true)
        .halign(gtk::Align::Fill)
        .build();

    let theme_names: Vec<String> = Theme::ALL.iter().map(|t| t.to_string()).collect();
    let theme_names: Vec<&str> = theme_names.iter().map(String::as_str).collect();
    theme_row.set_model(Some(&gtk::StringList::new(&theme_names)));

    let sender_clone = sender.clone();
    theme_row.connect_notify(Some("selected"), move |combo, _| {
        sender_clone.input(AppMsg::ThemeSelected(Theme::from_index(combo.selected())));
    });

    let hide_console_switch = adw::SwitchRow::builder()
        .title("Hide Console")
        .subtitle("Hide the command output log from the sidebar")
        .hexpand(true)
        .halign(gtk::Align::Fill)
        .active(true)
        .build();

    let sender_clone = sender.clone();
    hide_console_switch.connect_active_notify(move |switch| {
        sender_clone.input(AppMsg::ToggleHideConsole(switch.is_active()));
    });

    let confirm_switch = adw::SwitchRow::builder()
        .title("Confirm Privileged Actions")
        .subtitle("Ask before running commands as administrator")
        .hexpand(true)
        .halign(gtk::Align::Fill)
        .active(true)
        .build();

    let sender_clone = sender.clone();
    confirm_switch.connect_active_notify(move |switch| {
        sender_clone.input(AppMsg::ToggleConfirmPrivileged(switch.is_active()));
    });

    // Open configuration folder
    let folder_row = adw::ActionRow::builder()
        .title("Open Configuration Folder")
        .hexpand(true)
        .halign(gtk::Align::Fill)
        .build();

    let folder_button = gtk::Button::builder()
        .label("Open")
        .halign(gtk::Align::Center)
        .valign(gtk::Align::Center)
        .build();

    let sender_clone = sender.clone();
    folder_button.connect_clicked(move |_| {
        sender_clone.input(AppMsg::OpenConfigFolder);
    });

    folder_row.add_suffix(&folder_button);
    folder_row.set_activatable(false);

    settings_list.append(&theme_row);
    settings_list.append(&hide_console_switch);
    settings_list.append(&confirm_switch);
    settings_list.append(&folder_row);

    content_container.append(&settings_list);

    // About
    let about_list = gtk::ListBox::new();
    about_list.add_css_class("boxed-list");
    about_list.set_selection_mode(gtk::SelectionMode::None);
    about_list.set_hexpand(true);
    about_list.set_halign(gtk::Align::Fill);

    let repo_row = adw::ActionRow::builder()
        .title("Source Code")
        .subtitle(SOURCE_URL)
        .build();

    let repo_button = gtk::Button::builder()
        .label("View")
        .valign(gtk::Align::Center)
        .build();

    let sender_clone = sender.clone();
    repo_button.connect_clicked(move |_| {
        if let Err(e) = open::that(SOURCE_URL) {
            sender_clone.input(AppMsg::ShowError(
                "Could Not Open Link".to_string(),
                format!("{}: {}", SOURCE_URL, e),
            ));
        }
    });

    repo_row.add_suffix(&repo_button);
    repo_row.set_activatable(false);

    about_list.append(&repo_row);

    content_container.append(&about_list);

    scrolled_window.set_child(Some(&content_container));
    SettingsWidgets {
        page: scrolled_window,
        theme_combo: theme_row,
        hide_console_switch,
        confirm_switch,
    }
}
