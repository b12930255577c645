//! Property tests for distribution normalization

use hostpulse_core::monitoring::{DistroInfo, canonical_id, normalize_distro};
use proptest::prelude::*;

proptest! {
    /// Property: text without an ID line keeps the fallback identity
    #[test]
    fn no_id_keeps_fallback(text in "[a-zA-Z0-9 :\n]{0,200}") {
        let fallback = DistroInfo::new("alpine", "3.20");
        prop_assert_eq!(normalize_distro(&text, &fallback), fallback);
    }

    /// Property: quoting style does not change the result
    #[test]
    fn quoting_is_irrelevant(id in "[a-z]{2,10}", version in "[0-9]{1,2}\\.[0-9]{1,2}") {
        let fallback = DistroInfo::default();
        let bare = normalize_distro(&format!("ID={id}\nVERSION_ID={version}\n"), &fallback);
        let double = normalize_distro(&format!("ID=\"{id}\"\nVERSION_ID=\"{version}\"\n"), &fallback);
        let single = normalize_distro(&format!("ID='{id}'\nVERSION_ID='{version}'\n"), &fallback);
        prop_assert_eq!(&bare, &double);
        prop_assert_eq!(&bare, &single);
        prop_assert_eq!(bare.version_id, version);
    }

    /// Property: every Red Hat spelling collapses to `rhel`
    #[test]
    fn rhel_aliases_collapse(
        alias in prop_oneof![Just("rhel"), Just("RHEL"), Just("redhat"), Just("RedHatEnterpriseServer")],
    ) {
        prop_assert_eq!(canonical_id(alias, None), "rhel");
    }
}
