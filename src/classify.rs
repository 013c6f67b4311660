//! Risk classification of ownership records.
//!
//! The category is an ordered decision list: the first matching rule wins, so
//! a ceased PSC of a dormant company is grey, never orange.

use crate::models::{Category, RegistryFlags};

pub const ACTIVE_STATUS: &str = "Active";
pub const DORMANT_ACCOUNTS: &str = "dormant";

pub fn classify(
    status: &str,
    ceased_on: Option<&str>,
    accounts_overdue: bool,
    office_in_dispute: bool,
    office_undeliverable: bool,
    accounts_type: &str,
) -> Category {
    if status != ACTIVE_STATUS {
        return Category::Black;
    }
    if ceased_on.is_some() {
        return Category::Grey;
    }
    if accounts_overdue || office_in_dispute || office_undeliverable {
        return Category::Red;
    }
    if accounts_type == DORMANT_ACCOUNTS {
        return Category::Orange;
    }
    Category::Green
}

pub fn classify_flags(flags: &RegistryFlags) -> Category {
    classify(
        &flags.company_status,
        flags.ceased_on.as_deref(),
        flags.accounts_overdue,
        flags.office_in_dispute,
        flags.office_undeliverable,
        &flags.accounts_type,
    )
}

/// Human-readable labels for the warning flags that are set, in popup order.
pub fn warning_labels(flags: &RegistryFlags) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if flags.accounts_overdue {
        warnings.push("accounts overdue");
    }
    if flags.office_in_dispute {
        warnings.push("disputed registered office");
    }
    if flags.office_undeliverable {
        warnings.push("undeliverable registered office");
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_company_is_black_regardless_of_other_flags() {
        assert_eq!(classify("Dissolved", None, false, false, false, "full"), Category::Black);
        assert_eq!(classify("", Some("2020-01-01"), true, true, true, "dormant"), Category::Black);
        // Status comparison is exact.
        assert_eq!(classify("active", None, false, false, false, "full"), Category::Black);
    }

    #[test]
    fn test_ceased_beats_warnings_and_dormant() {
        let ceased = Some("2021-03-04");
        assert_eq!(classify("Active", ceased, true, false, false, "full"), Category::Grey);
        assert_eq!(classify("Active", ceased, false, false, false, "dormant"), Category::Grey);
    }

    #[test]
    fn test_any_warning_is_red() {
        assert_eq!(classify("Active", None, true, false, false, "full"), Category::Red);
        assert_eq!(classify("Active", None, false, true, false, "full"), Category::Red);
        assert_eq!(classify("Active", None, false, false, true, "dormant"), Category::Red);
    }

    #[test]
    fn test_dormant_and_default() {
        assert_eq!(classify("Active", None, false, false, false, "dormant"), Category::Orange);
        assert_eq!(classify("Active", None, false, false, false, "full"), Category::Green);
        assert_eq!(classify("Active", None, false, false, false, ""), Category::Green);
    }

    #[test]
    fn test_every_flag_combination_follows_precedence() {
        for status in ["Active", "Liquidation"] {
            for ceased in [None, Some("2022-01-01")] {
                for bits in 0u8..8 {
                    for accounts in ["dormant", "full", ""] {
                        let (overdue, dispute, undeliverable) =
                            (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
                        let expected = if status != "Active" {
                            Category::Black
                        } else if ceased.is_some() {
                            Category::Grey
                        } else if bits != 0 {
                            Category::Red
                        } else if accounts == "dormant" {
                            Category::Orange
                        } else {
                            Category::Green
                        };
                        assert_eq!(
                            classify(status, ceased, overdue, dispute, undeliverable, accounts),
                            expected
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_warning_labels_order() {
        let flags = RegistryFlags {
            accounts_overdue: true,
            office_undeliverable: true,
            ..Default::default()
        };
        assert_eq!(
            warning_labels(&flags),
            vec!["accounts overdue", "undeliverable registered office"]
        );
        assert_eq!(classify_flags(&flags), Category::Black);
    }
}
