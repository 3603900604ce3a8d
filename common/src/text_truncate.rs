/// Shortens an address to `0x` plus `digits` leading characters, `...` and
/// the last `digits` characters. `None` keeps the address as is, and so does
/// an input that the abbreviation would not make any shorter.
pub fn abstract_address(address: &str, digits: Option<usize>) -> String {
    let Some(digits) = digits else {
        return address.to_string();
    };

    let char_count = address.chars().count();
    if char_count <= 2 * digits + 5 {
        return address.to_string();
    }

    let head: String = address.chars().take(digits + 2).collect();
    let tail: String = address.chars().skip(char_count - digits).collect();
    format!("{head}...{tail}")
}
