use std::cmp::Ordering;

/// Every ASCII decimal digit of `value`, concatenated in order.
///
/// Other Unicode decimal digits are not counted; the Lviv feed only uses ASCII.
pub fn digit_run(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Integer made of the digits in free text such as `"5 min"`.
pub fn parse_digits(value: &str) -> Option<i64> {
    digit_run(value).parse().ok()
}

/// Ordering used for every route list: names that are plain integers come
/// first in ascending numeric order, everything else follows lexicographically.
pub fn compare_route_names(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[test]
fn digit_run_mixed_test() {
    assert_eq!(digit_run("Тр07"), "07");
    assert_eq!(digit_run("1A2"), "12");
    assert_eq!(digit_run("Нічний"), "");
}

#[test]
fn parse_digits_test() {
    assert_eq!(parse_digits("5 min"), Some(5));
    assert_eq!(parse_digits("< 1 хв"), Some(1));
    assert_eq!(parse_digits("now"), None);
}

#[test]
fn compare_numeric_test() {
    assert_eq!(compare_route_names("2", "10"), Ordering::Less);
    assert_eq!(compare_route_names("10", "2"), Ordering::Greater);
}

#[test]
fn compare_mixed_test() {
    let mut names = vec!["Н5", "184А", "12", "3", "156"];
    names.sort_by(|a, b| compare_route_names(a, b));
    assert_eq!(names, vec!["3", "12", "156", "184А", "Н5"]);
}
