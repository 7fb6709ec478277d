//! MC protocol response parsing and validation.
//!
//! A response is upper-case hex ASCII text:
//!
//! | Offset | Size | Description |
//! |--------|------|-------------|
//! | 0 | 14 chars | Subheader (`D000`) and route fields |
//! | 14 | 4 chars | Response data length |
//! | 18 | 4 chars | End code (`0000` = success) |
//! | 22 | 4 chars each | Word data, one element per device point |
//!
//! Fields are cut out like string slices clamped to the text length, so a
//! short response yields a short end code (and therefore a failure) or
//! missing words rather than a parse error.
//!
//! # Example
//!
//! ```
//! use melsec_mc::Response;
//!
//! let response = Response::from_bytes(b"D00000FF03FF00000C000000010002").unwrap();
//! assert!(response.is_success());
//! assert_eq!(response.words(2).unwrap(), vec![Some(1), Some(2)]);
//! ```

use crate::error::{McError, Result};

/// Offset of the end code within a response.
pub const END_CODE_OFFSET: usize = 18;

/// Offset of the first data word within a response.
pub const DATA_OFFSET: usize = 22;

/// Characters per data word.
pub const WORD_CHARS: usize = 4;

/// End code reported for a successful request.
pub const SUCCESS_END_CODE: &str = "0000";

/// Parsed MC protocol response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    text: String,
}

impl Response {
    /// Parses a response from raw received bytes.
    ///
    /// # Errors
    ///
    /// Returns `McError::InvalidResponse` if the bytes are not ASCII text.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if !data.is_ascii() {
            return Err(McError::invalid_response(format!(
                "response is not ASCII text ({} bytes)",
                data.len()
            )));
        }
        // ASCII is always valid UTF-8.
        let text = String::from_utf8_lossy(data).into_owned();
        Ok(Self { text })
    }

    /// Returns the full response text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn field(&self, start: usize, len: usize) -> &str {
        let end = (start + len).min(self.text.len());
        let start = start.min(end);
        &self.text[start..end]
    }

    /// Returns the end code, or as much of it as the response contains.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::Response;
    ///
    /// let response = Response::from_bytes(b"D00000FF03FF000004C059").unwrap();
    /// assert_eq!(response.end_code(), "C059");
    /// ```
    pub fn end_code(&self) -> &str {
        self.field(END_CODE_OFFSET, WORD_CHARS)
    }

    /// Returns whether the end code is `0000`.
    pub fn is_success(&self) -> bool {
        self.end_code() == SUCCESS_END_CODE
    }

    /// Validates the end code.
    ///
    /// # Errors
    ///
    /// Returns `McError::EndCode` if the end code is not `0000`.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::{McError, Response};
    ///
    /// let response = Response::from_bytes(b"D00000FF03FF000004C059").unwrap();
    /// assert!(matches!(response.check_end_code(), Err(McError::EndCode { .. })));
    /// ```
    pub fn check_end_code(&self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(McError::end_code(self.end_code()))
        }
    }

    /// Decodes `count` data words.
    ///
    /// A word whose slot lies past the end of the response is `None`; it is
    /// never reported as zero. A truncated final word is parsed from the
    /// characters that are present.
    ///
    /// # Errors
    ///
    /// Returns `McError::InvalidResponse` if a present word is not hex.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::Response;
    ///
    /// let response = Response::from_bytes(b"D00000FF03FF000008000000FF").unwrap();
    /// assert_eq!(response.words(2).unwrap(), vec![Some(0xFF), None]);
    /// ```
    pub fn words(&self, count: usize) -> Result<Vec<Option<u16>>> {
        (0..count)
            .map(|index| {
                let chunk = self.field(DATA_OFFSET + index * WORD_CHARS, WORD_CHARS);
                if chunk.is_empty() {
                    return Ok(None);
                }
                u16::from_str_radix(chunk, 16).map(Some).map_err(|_| {
                    McError::invalid_response(format!("word {index} is not hex: '{chunk}'"))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(end_code: &str, payload: &str) -> Vec<u8> {
        let body = format!("{end_code}{payload}");
        format!("D00000FF03FF00{:04X}{body}", body.len()).into_bytes()
    }

    #[test]
    fn test_response_success() {
        let response = Response::from_bytes(&make_response("0000", "00010002")).unwrap();
        assert_eq!(response.end_code(), "0000");
        assert!(response.is_success());
        assert!(response.check_end_code().is_ok());
        assert_eq!(response.words(2).unwrap(), vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_words_from_hex_payload() {
        let payload = hex::encode_upper([0x12, 0x34, 0xAB, 0xCD, 0xFF, 0xFF]);
        let response = Response::from_bytes(&make_response("0000", &payload)).unwrap();
        assert_eq!(
            response.words(3).unwrap(),
            vec![Some(0x1234), Some(0xABCD), Some(0xFFFF)]
        );
    }

    #[test]
    fn test_end_code_error() {
        let response = Response::from_bytes(&make_response("C059", "")).unwrap();
        assert!(!response.is_success());
        match response.check_end_code().unwrap_err() {
            McError::EndCode { code } => assert_eq!(code, "C059"),
            other => panic!("Expected EndCode, got {:?}", other),
        }
    }

    #[test]
    fn test_short_response_is_not_success() {
        let response = Response::from_bytes(b"D00000FF03FF0000").unwrap();
        assert_eq!(response.end_code(), "");
        assert!(response.check_end_code().is_err());

        let response = Response::from_bytes(b"D00000FF03FF00000400").unwrap();
        assert_eq!(response.end_code(), "00");
        assert!(!response.is_success());
    }

    #[test]
    fn test_missing_words_are_absent() {
        let response = Response::from_bytes(&make_response("0000", "0001")).unwrap();
        assert_eq!(response.words(3).unwrap(), vec![Some(1), None, None]);
    }

    #[test]
    fn test_absent_is_not_zero() {
        let response = Response::from_bytes(&make_response("0000", "")).unwrap();
        let words = response.words(1).unwrap();
        assert_eq!(words, vec![None]);
        assert_ne!(words, vec![Some(0)]);
    }

    #[test]
    fn test_truncated_word() {
        let response = Response::from_bytes(&make_response("0000", "00010A")).unwrap();
        assert_eq!(response.words(2).unwrap(), vec![Some(1), Some(0x0A)]);
    }

    #[test]
    fn test_non_hex_word() {
        let response = Response::from_bytes(&make_response("0000", "00G1")).unwrap();
        assert!(matches!(
            response.words(1),
            Err(McError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_zero_words() {
        let response = Response::from_bytes(&make_response("0000", "0001")).unwrap();
        assert!(response.words(0).unwrap().is_empty());
    }

    #[test]
    fn test_non_ascii_rejected() {
        assert!(matches!(
            Response::from_bytes(&[0xD0, 0x00, 0xFF]),
            Err(McError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_as_str() {
        let bytes = make_response("0000", "");
        let response = Response::from_bytes(&bytes).unwrap();
        assert_eq!(response.as_str().as_bytes(), bytes.as_slice());
    }
}
