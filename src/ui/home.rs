use relm4::gtk;
use relm4::ComponentSender;
use gtk::prelude::*;
use crate::ui::category::{button_grid, grid_button, page_container};
use crate::ui::model::AppModel;
use crate::ui::msg::AppMsg;
use crate::models::Section;

const CATEGORIES: [(Section, &str); 7] = [
    (Section::System, "Information, time, logs and kernels"),
    (Section::Software, "Updates, repositories and applications"),
    (Section::Network, "Connections and service status"),
    (Section::Hardware, "Sound, disks and printers"),
    (Section::Security, "Firewall"),
    (Section::Users, "Accounts and groups"),
    (Section::Services, "Start and stop system services"),
];

pub fn create_home_page(sender: &ComponentSender<AppModel>) -> gtk::ScrolledWindow {
    let (page, content) = page_container("Welcome to Tears of Mandrake");

    let intro = gtk::Label::builder()
        .label("The control center for OpenMandriva Lx. Pick a category to get started.")
        .halign(gtk::Align::Start)
        .wrap(true)
        .css_classes(vec!["dim-label".to_string()])
        .build();
    content.append(&intro);

    let grid = button_grid();
    for (section, subtitle) in CATEGORIES {
        let button = grid_button(sender, section.title(), subtitle, section.icon_name(), move || {
            AppMsg::NavigateToSection(section)
        });
        grid.insert(&button, -1);
    }

    let boot = grid_button(sender, "Boot", "Boot loader and startup", "system-reboot-symbolic", || {
        AppMsg::NotImplemented("Boot")
    });
    grid.insert(&boot, -1);
    let backup = grid_button(sender, "Backup", "Back up and restore files", "document-save-symbolic", || {
        AppMsg::NotImplemented("Backup")
    });
    grid.insert(&backup, -1);

    content.append(&grid);
    page
}
