// Copyright (c) 2023 The TQUIC Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error type for congestion control operations.

use strum_macros::EnumIter;

/// Congestion control error.
///
/// The controllers never fail while processing events. Errors are only
/// reported when building them from invalid configuration, or by the tools
/// driving them.
#[derive(Clone, Debug, PartialEq, Eq, EnumIter)]
pub enum Error {
    /// The configuration is invalid.
    InvalidConfig(String),

    /// The operation cannot be completed because it was attempted in an
    /// invalid state.
    InvalidState(String),

    /// I/O error.
    IoError(String),
}

impl Error {
    /// Return the error number used by callers that only deal with integers.
    pub fn to_errno(&self) -> i32 {
        match self {
            Error::InvalidConfig(_) => -1,
            Error::InvalidState(_) => -2,
            Error::IoError(_) => -3,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(format!("{}", err))
    }
}

impl std::convert::From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidState(format!("json: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn error_to_errno() {
        let mut errnos = Vec::new();
        for err in Error::iter() {
            assert!(err.to_errno() < 0);
            assert!(!errnos.contains(&err.to_errno()));
            errnos.push(err.to_errno());
        }
        assert_eq!(errnos.len(), 3);
    }

    #[test]
    fn io_error() {
        use std::error::Error;
        let e = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        let e = super::Error::from(e);

        assert_eq!(format!("{}", e), "IoError(\"unexpected end of file\")");
        assert!(e.source().is_none());
    }

    #[test]
    fn json_error() {
        let e = serde_json::from_str::<u32>("{").unwrap_err();
        let e = super::Error::from(e);
        match e {
            super::Error::InvalidState(reason) => assert!(reason.starts_with("json: ")),
            _ => panic!("unexpected error {:?}", e),
        }
    }
}
