// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

/// Generate random string, mainly useful to fill in a `client_id` the caller does not care
/// to choose itself.
///
/// # Errors
///
/// Returns error if the sampled bytes do not form a valid UTF-8 string.
pub fn random_string(len: usize) -> Result<String, StringError> {
    String::from_utf8(
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .collect::<Vec<u8>>(),
    )
    .map_err(|_err| StringError::InvalidRandomString)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringError {
    TooManyData,

    InvalidLength,

    InvalidChar,

    /// Server or client shall DISCONNECT immediately.
    SeriousError,

    InvalidRandomString,
}

impl From<std::string::FromUtf8Error> for StringError {
    fn from(_e: std::string::FromUtf8Error) -> StringError {
        StringError::SeriousError
    }
}

/// Check data length exceeds 64k or not.
#[inline]
pub fn validate_two_bytes_data(data: &[u8]) -> Result<(), StringError> {
    if data.len() > u16::MAX as usize {
        Err(StringError::TooManyData)
    } else {
        Ok(())
    }
}

/// Check string characters and length.
///
/// # Errors
///
/// Returns error if `s` is too long or contains a disallowed code point.
pub fn validate_utf8_string(s: &str) -> Result<(), StringError> {
    if s.len() > u16::MAX as usize {
        return Err(StringError::TooManyData);
    }

    for c in s.chars() {
        // A UTF-8 Encoded String MUST NOT include an encoding of the null character
        // U+0000 [MQTT-1.5.4-2].
        if c == '\u{0000}' {
            return Err(StringError::SeriousError);
        }

        if ('\u{0001}'..='\u{001f}').contains(&c) || ('\u{007f}'..='\u{009f}').contains(&c) {
            return Err(StringError::InvalidChar);
        }
    }

    // Empty string is valid.
    Ok(())
}

/// Convert a range of bytes to a `String`, rejecting only ill-formed UTF-8.
///
/// This is the decode-path conversion: the deeper MQTT text-field rules in
/// [`validate_utf8_string`] (disallowed control code points, embedded NUL) are not
/// applied here, so a well-formed-but-unusual string still decodes; callers that
/// want the stricter rule enforced go through [`StringData::from`][crate::StringData::from],
/// which does call [`validate_utf8_string`].
///
/// # Errors
///
/// Returns error if `buf` is not valid UTF-8.
pub fn to_utf8_string(buf: &[u8]) -> Result<String, StringError> {
    let s = String::from_utf8(buf.to_vec())?;
    Ok(s)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientIdError {
    TooLong,
}

/// Check a caller-supplied `client_id` before it is wrapped in a `StringData`.
///
/// The protocol itself places no charset restriction on the client identifier and
/// even allows an empty one (the zero-length-client-id/clean-session interaction is
/// a `ConnectPacket::validate()` concern, not a constructor-time one); the only thing
/// worth rejecting this early is a value so long it could never fit the two-byte
/// length prefix.
///
/// # Errors
///
/// Returns error if `client_id` is longer than 65535 bytes.
pub fn validate_client_id(client_id: &str) -> Result<(), ClientIdError> {
    if client_id.len() > u16::MAX as usize {
        Err(ClientIdError::TooLong)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_utf8_string() {
        assert!(validate_utf8_string("hello").is_ok());
        assert!(validate_utf8_string("").is_ok());
        assert_eq!(
            validate_utf8_string("a\u{0000}b"),
            Err(StringError::SeriousError)
        );
        assert_eq!(
            validate_utf8_string("a\u{0001}b"),
            Err(StringError::InvalidChar)
        );
    }

    #[test]
    fn test_validate_client_id() {
        assert!(validate_client_id("").is_ok());
        assert!(validate_client_id("client-01").is_ok());
    }

    #[test]
    fn test_to_utf8_string() {
        let buf = [0x68, 0x65, 0x6c, 0x6c, 0x6f];
        assert_eq!(to_utf8_string(&buf).unwrap(), "hello");
    }
}
