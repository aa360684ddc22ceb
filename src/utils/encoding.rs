//! URL 编码工具

/// 与 JS `encodeURIComponent` 相同的保留字符集
pub fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("Kinetic Energy physics explanation"), "Kinetic%20Energy%20physics%20explanation");
        assert_eq!(encode_uri_component("a&b=c/d?"), "a%26b%3Dc%2Fd%3F");
        assert_eq!(encode_uri_component("(ok)*~"), "(ok)*~");
    }
}
