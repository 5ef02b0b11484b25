//! Identity search filter ordering for free-text subject tokens.

use serde::Serialize;

/// Identity directory search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SearchFilter {
    General,
    DirectoryAlias,
    MailAddress,
    AccountName,
    LocalGroupName,
}

impl SearchFilter {
    /// Value of the `searchFilter` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::DirectoryAlias => "DirectoryAlias",
            Self::MailAddress => "MailAddress",
            Self::AccountName => "AccountName",
            Self::LocalGroupName => "LocalGroupName",
        }
    }
}

impl std::fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered search filters to try for a free-text token.
///
/// Tokens that look like a display name or mail address (space or `@`) try `General`
/// first; bare aliases try `DirectoryAlias` first. `AccountName` joins when the token is
/// domain-qualified (`\`). `LocalGroupName` is tried last, and only for tokens that are
/// neither mail addresses nor domain-qualified.
pub fn determine_search_filters(token: &str) -> Vec<SearchFilter> {
    let has_at = token.contains('@');
    let has_backslash = token.contains('\\');

    let mut ordered = if token.contains(' ') || has_at {
        vec![
            SearchFilter::General,
            SearchFilter::DirectoryAlias,
            SearchFilter::MailAddress,
        ]
    } else {
        vec![
            SearchFilter::DirectoryAlias,
            SearchFilter::General,
            SearchFilter::MailAddress,
        ]
    };

    if has_backslash {
        ordered.push(SearchFilter::AccountName);
    }
    if !has_at && !has_backslash {
        ordered.push(SearchFilter::LocalGroupName);
    }

    let mut filters: Vec<SearchFilter> = Vec::with_capacity(ordered.len());
    for filter in ordered {
        if !filters
            .iter()
            .any(|seen| seen.as_str().eq_ignore_ascii_case(filter.as_str()))
        {
            filters.push(filter);
        }
    }
    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use SearchFilter::*;

    #[test]
    fn test_mail_address() {
        assert_eq!(
            determine_search_filters("user@example.com"),
            vec![General, DirectoryAlias, MailAddress]
        );
    }

    #[test]
    fn test_display_name_gets_local_group() {
        assert_eq!(
            determine_search_filters("My Group Name"),
            vec![General, DirectoryAlias, MailAddress, LocalGroupName]
        );
    }

    #[test]
    fn test_alias() {
        assert_eq!(
            determine_search_filters("jdoe"),
            vec![DirectoryAlias, General, MailAddress, LocalGroupName]
        );
    }

    #[test]
    fn test_domain_account() {
        assert_eq!(
            determine_search_filters("CONTOSO\\jdoe"),
            vec![DirectoryAlias, General, MailAddress, AccountName]
        );
        assert_eq!(
            determine_search_filters("CONTOSO\\Build Admins"),
            vec![General, DirectoryAlias, MailAddress, AccountName]
        );
    }

    #[test]
    fn test_mail_always_present() {
        for token in ["", "a", "a b", "a@b", "a\\b", "a@b\\c"] {
            assert!(
                determine_search_filters(token).contains(&MailAddress),
                "{token:?}"
            );
        }
    }

    #[test]
    fn test_as_str() {
        assert_eq!(LocalGroupName.as_str(), "LocalGroupName");
        assert_eq!(AccountName.to_string(), "AccountName");
    }
}
