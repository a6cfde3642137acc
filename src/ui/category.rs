//! Building blocks shared by the category pages: the option grid shown on a
//! category's main page, the scrolled page scaffold and list helpers.

use adw::prelude::*;
use relm4::gtk;
use relm4::ComponentSender;

use crate::models::Section;
use crate::ui::model::AppModel;
use crate::ui::msg::AppMsg;

pub enum OptionAction {
    Subpage(&'static str),
    Message(fn() -> AppMsg),
}

pub struct CategoryOption {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub icon: &'static str,
    pub action: OptionAction,
}

impl CategoryOption {
    pub const fn page(title: &'static str, subtitle: &'static str, icon: &'static str, name: &'static str) -> Self {
        Self { title, subtitle, icon, action: OptionAction::Subpage(name) }
    }

    pub const fn message(title: &'static str, subtitle: &'static str, icon: &'static str, msg: fn() -> AppMsg) -> Self {
        Self { title, subtitle, icon, action: OptionAction::Message(msg) }
    }
}

fn option_button(title: &str, subtitle: &str, icon: &str) -> gtk::Button {
    let content = gtk::Box::builder()
        .orientation(gtk::Orientation::Vertical)
        .spacing(6)
        .margin_top(12)
        .margin_bottom(12)
        .margin_start(12)
        .margin_end(12)
        .build();

    let image = gtk::Image::builder().icon_name(icon).pixel_size(48).build();
    let title_label = gtk::Label::builder()
        .label(title)
        .css_classes(vec!["heading".to_string()])
        .wrap(true)
        .build();
    let subtitle_label = gtk::Label::builder()
        .label(subtitle)
        .css_classes(vec!["dim-label".to_string(), "caption".to_string()])
        .wrap(true)
        .justify(gtk::Justification::Center)
        .max_width_chars(24)
        .build();

    content.append(&image);
    content.append(&title_label);
    content.append(&subtitle_label);

    gtk::Button::builder()
        .child(&content)
        .css_classes(vec!["card".to_string()])
        .width_request(180)
        .height_request(150)
        .build()
}

/// A flow box of large buttons, three per line.
pub fn button_grid() -> gtk::FlowBox {
    gtk::FlowBox::builder()
        .max_children_per_line(3)
        .min_children_per_line(1)
        .selection_mode(gtk::SelectionMode::None)
        .homogeneous(true)
        .row_spacing(12)
        .column_spacing(12)
        .valign(gtk::Align::Start)
        .build()
}

pub fn grid_button(sender: &ComponentSender<AppModel>, title: &str, subtitle: &str, icon: &str, msg: impl Fn() -> AppMsg + 'static) -> gtk::Button {
    let button = option_button(title, subtitle, icon);
    let sender_clone = sender.clone();
    button.connect_clicked(move |_| {
        sender_clone.input(msg());
    });
    button
}

/// Title plus a vertical content box inside a scrolled window.
pub fn page_container(title: &str) -> (gtk::ScrolledWindow, gtk::Box) {
    let scrolled_window = gtk::ScrolledWindow::builder()
        .hexpand(true)
        .vexpand(true)
        .hscrollbar_policy(gtk::PolicyType::Never)
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
        .label(title)
        .halign(gtk::Align::Start)
        .css_classes(vec!["title-1".to_string()])
        .build();

    content_container.append(&title_label);
    scrolled_window.set_child(Some(&content_container));
    (scrolled_window, content_container)
}

/// The category stack with its option grid as the "main" child.
pub fn create_category_page(sender: &ComponentSender<AppModel>, section: Section, options: &[CategoryOption]) -> gtk::Stack {
    let stack = gtk::Stack::builder()
        .transition_type(gtk::StackTransitionType::SlideLeftRight)
        .transition_duration(200)
        .hexpand(true)
        .vexpand(true)
        .build();

    let (scrolled, content) = page_container(section.title());
    let grid = button_grid();

    for option in options {
        let button = match option.action {
            OptionAction::Subpage(name) => {
                grid_button(sender, option.title, option.subtitle, option.icon, move || AppMsg::OpenSubpage(section, name))
            }
            OptionAction::Message(msg) => grid_button(sender, option.title, option.subtitle, option.icon, msg),
        };
        grid.insert(&button, -1);
    }

    content.append(&grid);
    stack.add_named(&scrolled, Some("main"));
    stack
}

pub fn add_subpage(stack: &gtk::Stack, name: &str, page: &impl IsA<gtk::Widget>) {
    stack.add_named(page, Some(name));
}

pub fn boxed_list() -> gtk::ListBox {
    let list = gtk::ListBox::new();
    list.add_css_class("boxed-list");
    list.set_selection_mode(gtk::SelectionMode::None);
    list.set_hexpand(true);
    list.set_halign(gtk::Align::Fill);
    list
}

pub fn clear_list(list: &gtk::ListBox) {
    while let Some(child) = list.first_child() {
        list.remove(&child);
    }
}

pub fn placeholder_row(text: &str) -> gtk::Label {
    gtk::Label::builder()
        .label(text)
        .halign(gtk::Align::Center)
        .margin_top(24)
        .margin_bottom(24)
        .css_classes(vec!["dim-label".to_string()])
        .build()
}

pub fn section_label(text: &str) -> gtk::Label {
    gtk::Label::builder()
        .label(text)
        .halign(gtk::Align::Start)
        .css_classes(vec!["title-4".to_string()])
        .build()
}

pub fn suffix_button(label: &str, css: Option<&str>) -> gtk::Button {
    let button = gtk::Button::builder()
        .label(label)
        .valign(gtk::Align::Center)
        .build();
    if let Some(class) = css {
        button.add_css_class(class);
    }
    button
}

/// Row for text that comes from the system, so never markup.
pub fn text_row(title: &str, subtitle: &str) -> adw::ActionRow {
    adw::ActionRow::builder()
        .title(title)
        .subtitle(subtitle)
        .use_markup(false)
        .build()
}

/// Row with a value shown as subtitle.
pub fn info_row(title: &str, value: &str) -> adw::ActionRow {
    let row = adw::ActionRow::builder()
        .title(title)
        .subtitle(value)
        .use_markup(false)
        .build();
    row.add_css_class("property");
    row
}
