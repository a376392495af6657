use chrono::{DateTime, Datelike};

/// Calendar year (UTC) of a unix timestamp, 0 if out of range.
pub fn year_of(ts: i64) -> u16 {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.year() as u16)
        .unwrap_or(0)
}

/// Digits between the parentheses of `8(912)3456789`.
pub fn phone_code_of(phone: &str) -> u16 {
    let open = match phone.find('(') {
        Some(pos) => pos + 1,
        None => return 0,
    };
    let close = match phone[open..].find(')') {
        Some(pos) => open + pos,
        None => return 0,
    };
    phone[open..close].parse().unwrap_or(0)
}

/// Byte offset just past the `@`.
pub fn email_domain_offset(email: &str) -> Option<usize> {
    let at = email.find('@')?;
    if at == 0 || at + 1 >= email.len() {
        return None;
    }
    Some(at + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn years() {
        assert_eq!(year_of(0), 1970);
        assert_eq!(year_of(1_293_840_000), 2011);
        assert_eq!(year_of(-631_152_000), 1950);
        assert_eq!(year_of(1_325_375_999), 2011);
    }

    #[test]
    fn phone_codes() {
        assert_eq!(phone_code_of("8(912)3456789"), 912);
        assert_eq!(phone_code_of("8(912"), 0);
        assert_eq!(phone_code_of("89123456789"), 0);
    }

    #[test]
    fn email_domains() {
        let email = "user@mail.ru";
        let offset = email_domain_offset(email).unwrap();
        assert_eq!(&email[offset..], "mail.ru");
        assert_eq!(email_domain_offset("nodomain@"), None);
        assert_eq!(email_domain_offset("@mail.ru"), None);
        assert_eq!(email_domain_offset("plain"), None);
    }
}
