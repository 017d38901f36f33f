/// Turns a raw phone string into the WhatsApp chat identifier Twilio
/// expects, or `None` when the number cannot be normalized.
///
/// Rules: keep digits only; a local trunk `0` is replaced by the country
/// code; anything that does not end up as `country_code` plus exactly
/// `national_len` digits is rejected rather than guessed.
pub fn chat_id(raw: &str, country_code: &str, national_len: usize) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let normalized = match digits.strip_prefix('0') {
        Some(rest) => format!("{country_code}{rest}"),
        None => digits,
    };

    if normalized.len() != country_code.len() + national_len
        || !normalized.starts_with(country_code)
    {
        return None;
    }

    Some(format!("whatsapp:+{normalized}"))
}
