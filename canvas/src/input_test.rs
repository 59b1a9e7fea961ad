use super::*;

#[test]
fn dom_button_codes_map_to_buttons() {
    assert_eq!(Button::from_dom(0), Button::Primary);
    assert_eq!(Button::from_dom(1), Button::Middle);
    assert_eq!(Button::from_dom(2), Button::Secondary);
    assert_eq!(Button::from_dom(4), Button::Primary);
}

#[test]
fn idle_gesture_yields_no_delta() {
    let mut gesture = Gesture::Idle;
    assert_eq!(gesture.pan_to(Point::new(5.0, 5.0)), None);
    assert!(!gesture.is_panning());
}

#[test]
fn pan_deltas_are_relative_to_previous_event() {
    let mut gesture = Gesture::Panning { last_screen: Point::new(10.0, 10.0) };
    assert_eq!(gesture.pan_to(Point::new(15.0, 8.0)), Some((5.0, -2.0)));
    assert_eq!(gesture.pan_to(Point::new(15.0, 10.0)), Some((0.0, 2.0)));
    assert!(gesture.is_panning());
}
