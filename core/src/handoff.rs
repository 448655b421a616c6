//! WhatsApp handoff links.
//!
//! After reserving, the visitor is sent to a WhatsApp chat with the seller
//! carrying a prefilled message that names the raffle, the numbers and the
//! amount due.

use crate::types::{Money, TicketNumber};

/// Build `https://wa.me/<digits>?text=<message>`.
///
/// Non-digit characters in `phone` are dropped. Returns `None` when no
/// digits remain.
#[must_use]
pub fn whatsapp_link(phone: &str, message: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!(
        "https://wa.me/{digits}?text={}",
        urlencoding::encode(message)
    ))
}

/// Prefilled chat message for a reservation.
#[must_use]
pub fn reservation_message(raffle_name: &str, numbers: &[TicketNumber], total: Money) -> String {
    let list = numbers
        .iter()
        .map(TicketNumber::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("Hi! I reserved ticket(s) {list} for the raffle \"{raffle_name}\". Total: {total}.")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn strips_formatting_from_phone() {
        let link = whatsapp_link("+52 (55) 1234-5678", "hola").unwrap();
        assert_eq!(link, "https://wa.me/525512345678?text=hola");
    }

    #[test]
    fn empty_phone_disables_link() {
        assert!(whatsapp_link("", "hola").is_none());
        assert!(whatsapp_link(" + - ", "hola").is_none());
    }

    #[test]
    fn message_is_url_encoded() {
        let message = reservation_message("Moto 2026", &["001".into(), "042".into()], Money::from_cents(1500));
        assert_eq!(
            message,
            "Hi! I reserved ticket(s) 001, 042 for the raffle \"Moto 2026\". Total: $15.00."
        );
        let link = whatsapp_link("5215512345678", &message).unwrap();
        assert!(link.starts_with("https://wa.me/5215512345678?text=Hi%21%20I%20reserved"));
        assert!(!link.contains(' '));
    }
}
