use relm4::gtk;
use relm4::ComponentSender;
use gtk::prelude::*;
use crate::ui::model::AppModel;
use crate::ui::msg::AppMsg;
use crate::models::Section;

use adw::NavigationPage;

/// A sidebar entry. The label and box are kept to collapse the sidebar.
pub struct NavButton {
    pub section: Section,
    pub button: gtk::Button,
    pub label: gtk::Label,
    pub container: gtk::Box,
}

pub fn create_sidebar(sender: &ComponentSender<AppModel>) -> (NavigationPage, Vec<NavButton>) {
    let sidebar_content = gtk::Box::builder()
        .orientation(gtk::Orientation::Vertical)
        .spacing(0)
        .vexpand(true)
        .hexpand(true)
        .halign(gtk::Align::Fill)
        .valign(gtk::Align::Fill)
        .margin_top(12)
        .margin_bottom(12)
        .margin_start(12)
        .margin_end(12)
        .build();

    // Styled button with icon and label
    let create_nav_button = |label_text: &str, icon_name: &str| -> (gtk::Button, gtk::Label, gtk::Box) {
        let button = gtk::Button::builder()
            .halign(gtk::Align::Fill)
            .hexpand(true)
            .height_request(40)
            .margin_top(3)
            .margin_bottom(3)
            .tooltip_text(label_text)
            .build();

        let box_container = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(12)
            .halign(gtk::Align::Start)
            .build();

        let icon = gtk::Image::builder()
            .icon_name(icon_name)
            .build();

        let label = gtk::Label::builder()
            .label(label_text)
            .visible(true)
            .build();

        box_container.append(&icon);
        box_container.append(&label);

        button.set_child(Some(&box_container));
        (button, label, box_container)
    };

    let mut buttons = Vec::with_capacity(Section::SIDEBAR.len());
    for section in Section::SIDEBAR {
        let (button, label, container) = create_nav_button(section.title(), section.icon_name());

        let sender_clone = sender.clone();
        button.connect_clicked(move |_| {
            sender_clone.input(AppMsg::NavigateToSection(section));
        });

        // Settings sits below the spacer, at the bottom
        if section != Section::Settings {
            sidebar_content.append(&button);
        }
        buttons.push(NavButton { section, button, label, container });
    }

    // Console entry is hidden until enabled in Settings
    if let Some(console) = buttons.iter().find(|b| b.section == Section::Console) {
        console.button.set_visible(false);
    }

    let spacer = gtk::Box::new(gtk::Orientation::Vertical, 0);
    spacer.set_vexpand(true);
    sidebar_content.append(&spacer);

    if let Some(settings) = buttons.iter().find(|b| b.section == Section::Settings) {
        sidebar_content.append(&settings.button);
    }

    let version_label = gtk::Label::builder()
        .label(concat!("v", env!("CARGO_PKG_VERSION")))
        .css_classes(vec!["dim-label".to_string(), "subtitle".to_string()])
        .margin_top(12)
        .build();
    sidebar_content.append(&version_label);

    let sidebar_page = adw::NavigationPage::builder()
        .title("Navigation")
        .child(&sidebar_content)
        .vexpand(true)
        .hexpand(true)
        .build();

    // Remove any default background from NavigationPage
    sidebar_page.set_css_classes(&["flat"]);

    (sidebar_page, buttons)
}
