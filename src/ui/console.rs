use relm4::gtk;
use relm4::ComponentSender;
use gtk::prelude::*;

use crate::ui::model::AppModel;
use crate::ui::msg::AppMsg;

/// Read-only view over the command log, with a clear button.
pub fn create_console_page(sender: &ComponentSender<AppModel>, logs_buffer: &gtk::TextBuffer) -> gtk::Box {
    let page = gtk::Box::builder()
        .orientation(gtk::Orientation::Vertical)
        .hexpand(true)
        .vexpand(true)
        .build();

    let toolbar = gtk::Box::builder()
        .orientation(gtk::Orientation::Horizontal)
        .spacing(12)
        .margin_top(12)
        .margin_start(12)
        .margin_end(12)
        .build();

    let title = gtk::Label::builder()
        .label("Console")
        .halign(gtk::Align::Start)
        .hexpand(true)
        .css_classes(vec!["title-2".to_string()])
        .build();

    let clear_button = gtk::Button::builder()
        .label("Clear")
        .valign(gtk::Align::Center)
        .build();

    let sender_clone = sender.clone();
    clear_button.connect_clicked(move |_| {
        sender_clone.input(AppMsg::ClearConsole);
    });

    toolbar.append(&title);
    toolbar.append(&clear_button);

    let scrolled_window = gtk::ScrolledWindow::builder()
        .hscrollbar_policy(gtk::PolicyType::Automatic)
        .vscrollbar_policy(gtk::PolicyType::Automatic)
        .vexpand(true)
        .hexpand(true)
        .build();

    let text_view = gtk::TextView::builder()
        .buffer(logs_buffer)
        .editable(false)
        .cursor_visible(false)
        .monospace(true)
        .wrap_mode(gtk::WrapMode::WordChar)
        .margin_top(12)
        .margin_bottom(12)
        .margin_start(12)
        .margin_end(12)
        .build();

    // Follow new output
    let view = text_view.clone();
    logs_buffer.connect_changed(move |buffer| {
        let mut end = buffer.end_iter();
        view.scroll_to_iter(&mut end, 0.0, false, 0.0, 0.0);
    });

    scrolled_window.set_child(Some(&text_view));

    page.append(&toolbar);
    page.append(&scrolled_window);
    page
}
