use crate::constants::{OVERLAY_ID, STATUS_ID};
use sky_core::Status;
use web_sys as web;

#[inline]
pub fn hide(document: &web::Document) {
    if let Some(el) = document.get_element_by_id(OVERLAY_ID) {
        _ = el.class_list().add_1("hidden");
        // fallback for pages without the CSS class
        _ = el.set_attribute("style", "display:none");
    }
}

pub fn set_status(document: &web::Document, status: &Status) {
    log::info!("[status] {}", status);
    if let Some(el) = document.get_element_by_id(STATUS_ID) {
        el.set_text_content(Some(&status.to_string()));
    }
}
