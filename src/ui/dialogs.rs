use std::cell::Cell;

use adw::prelude::*;
use relm4::gtk;
use relm4::ComponentSender;

use crate::progress::ProgressUpdate;
use crate::ui::model::AppModel;
use crate::ui::msg::AppMsg;

fn base(window: Option<&adw::ApplicationWindow>, heading: &str, body: &str) -> adw::MessageDialog {
    let dialog = adw::MessageDialog::builder()
        .heading(heading)
        .body(body)
        .modal(true)
        .build();
    if let Some(window) = window {
        dialog.set_transient_for(Some(window));
    }
    dialog
}

pub fn message(window: Option<&adw::ApplicationWindow>, heading: &str, body: &str) {
    let dialog = base(window, heading, body);
    dialog.add_response("ok", "OK");
    dialog.set_default_response(Some("ok"));
    dialog.connect_response(None, |d, _| d.close());
    dialog.present();
}

/// Sends `msg` once if the user accepts.
pub fn confirm(
    window: Option<&adw::ApplicationWindow>,
    sender: &ComponentSender<AppModel>,
    heading: &str,
    body: &str,
    accept: &str,
    appearance: adw::ResponseAppearance,
    msg: AppMsg,
) {
    let dialog = base(window, heading, body);
    dialog.add_response("cancel", "Cancel");
    dialog.add_response("accept", accept);
    dialog.set_response_appearance("accept", appearance);
    dialog.set_default_response(Some("cancel"));
    dialog.set_close_response("cancel");

    let sender = sender.clone();
    let pending = Cell::new(Some(msg));
    dialog.connect_response(None, move |d, response| {
        if response == "accept" {
            if let Some(msg) = pending.take() {
                sender.input(msg);
            }
        }
        d.close();
    });
    dialog.present();
}

/// A dialog carrying a form. The caller connects the response handler.
pub fn form(
    window: Option<&adw::ApplicationWindow>,
    heading: &str,
    body: &str,
    child: &impl IsA<gtk::Widget>,
    accept: &str,
) -> adw::MessageDialog {
    let dialog = base(window, heading, body);
    dialog.set_extra_child(Some(child));
    dialog.add_response("cancel", "Cancel");
    dialog.add_response("accept", accept);
    dialog.set_response_appearance("accept", adw::ResponseAppearance::Suggested);
    dialog.set_default_response(Some("accept"));
    dialog.set_close_response("cancel");
    dialog
}

/// Modal dialog following a running task.
pub struct ProgressDialog {
    dialog: adw::MessageDialog,
    bar: gtk::ProgressBar,
    status: gtk::Label,
    transcript: gtk::Label,
}

impl ProgressDialog {
    pub fn new(window: Option<&adw::ApplicationWindow>, title: &str) -> Self {
        let dialog = base(window, title, "");

        let content = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(12)
            .width_request(460)
            .build();

        let status = gtk::Label::builder()
            .halign(gtk::Align::Start)
            .wrap(true)
            .build();

        let bar = gtk::ProgressBar::new();
        bar.set_show_text(true);

        let transcript = gtk::Label::builder()
            .halign(gtk::Align::Start)
            .valign(gtk::Align::Start)
            .xalign(0.0)
            .wrap(true)
            .selectable(true)
            .css_classes(vec!["monospace".to_string(), "dim-label".to_string(), "task-transcript".to_string()])
            .build();

        let scrolled = gtk::ScrolledWindow::builder()
            .min_content_height(180)
            .hscrollbar_policy(gtk::PolicyType::Never)
            .child(&transcript)
            .build();

        content.append(&status);
        content.append(&bar);
        content.append(&scrolled);
        dialog.set_extra_child(Some(&content));
        dialog.present();

        Self {
            dialog,
            bar,
            status,
            transcript,
        }
    }

    pub fn update(&self, update: &ProgressUpdate) {
        self.bar.set_fraction(update.fraction);
        self.bar.set_text(Some(&format!("{:.0}%", update.fraction * 100.0)));
        self.status.set_text(&update.status);
        self.transcript.set_text(&update.transcript.join("\n"));
    }

    pub fn close(&self) {
        self.dialog.close();
    }
}
