use relm4::gtk;
use gtk::prelude::*;

use adw::StatusPage;

pub fn create_loading_page() -> StatusPage {
    let status_page = adw::StatusPage::builder()
        .title("Loading Tears of Mandrake")
        .description("Reading your settings...")
        .build();

    let spinner = gtk::Spinner::new();
    spinner.start();
    spinner.set_size_request(48, 48);

    status_page.set_child(Some(&spinner));

    status_page
}
