use super::*;

const PAGE_IMAGE: &str = "https://table.example/maps/cave.png";

#[test]
fn absolute_url_matches_itself() {
    assert!(shows_current_image(PAGE_IMAGE, PAGE_IMAGE, Some(PAGE_IMAGE)));
    assert!(shows_current_image(PAGE_IMAGE, &format!(" {PAGE_IMAGE} "), None));
}

#[test]
fn relative_url_matches_through_resolution() {
    assert!(shows_current_image(PAGE_IMAGE, "/maps/cave.png", Some(PAGE_IMAGE)));
    assert!(!shows_current_image(PAGE_IMAGE, "/maps/cave.png", None));
}

#[test]
fn previous_image_does_not_match() {
    // The element still shows the old picture while the new one loads.
    let old = "https://table.example/maps/forest.png";
    assert!(!shows_current_image(old, "/maps/cave.png", Some(PAGE_IMAGE)));
    assert!(!shows_current_image(old, PAGE_IMAGE, Some(PAGE_IMAGE)));
}

#[test]
fn nothing_loaded_never_matches() {
    assert!(!shows_current_image("", PAGE_IMAGE, Some(PAGE_IMAGE)));
    assert!(!shows_current_image(PAGE_IMAGE, "  ", None));
}

#[test]
fn pixel_ratio_query_names_the_current_ratio() {
    assert_eq!(pixel_ratio_query(2.0), "(resolution: 2dppx)");
    assert_eq!(pixel_ratio_query(1.25), "(resolution: 1.25dppx)");
    assert_eq!(pixel_ratio_query(f64::NAN), "(resolution: 1dppx)");
    assert_eq!(pixel_ratio_query(0.0), "(resolution: 1dppx)");
}
