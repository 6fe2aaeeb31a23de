// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Result, SocialError};
use crate::models::UserId;

/// Header carrying the authenticated user id, set by the upstream auth layer
pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of whoever issued a request. Anonymous is a valid state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caller(Option<UserId>);

impl Caller {
    pub const fn anonymous() -> Self {
        Caller(None)
    }

    pub const fn user(id: UserId) -> Self {
        Caller(Some(id))
    }

    /// The caller's id, or `AuthenticationRequired` when anonymous
    pub fn require(&self) -> Result<UserId> {
        self.0.ok_or(SocialError::AuthenticationRequired)
    }

    /// Parse the raw header value; `None` means the header was absent
    pub fn from_header(value: Option<&str>) -> Result<Self> {
        match value {
            None => Ok(Caller::anonymous()),
            Some(raw) => raw
                .trim()
                .parse::<UserId>()
                .map(Caller::user)
                .map_err(|_| SocialError::validation(format!("invalid {} header", USER_ID_HEADER))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn anonymous_callers_must_authenticate() {
        let err = Caller::anonymous().require().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationRequired);
        assert_eq!(Caller::user(7).require().unwrap(), 7);
    }

    #[test]
    fn header_parsing() {
        assert_eq!(Caller::from_header(None).unwrap(), Caller::anonymous());
        assert_eq!(Caller::from_header(Some(" 12 ")).unwrap(), Caller::user(12));
        assert_eq!(
            Caller::from_header(Some("alice")).unwrap_err().kind(),
            ErrorKind::ValidationError
        );
    }
}
